use ifc_stream_core::Error;
use wasm_bindgen::prelude::*;

/// Set panic hook for better error messages in the browser
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

pub(crate) fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

pub(crate) fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

pub(crate) fn to_js_error(error: Error) -> JsError {
    JsError::new(&error.to_string())
}
