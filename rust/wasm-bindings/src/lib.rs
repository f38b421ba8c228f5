//! IFC-Stream WebAssembly Bindings
//!
//! Browser API for the streaming viewer built with wasm-bindgen. The web-ifc
//! module is the geometry engine, `fetch` the transport.

use wasm_bindgen::prelude::*;

#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

mod engine;
mod nodes;
mod transport;
mod utils;
mod viewer;

pub use engine::{
    copy_out_f32, copy_out_u32, read_transform, IfcApi, WebIfcEngine, WebIfcModule,
};
pub use nodes::SceneNodeJs;
pub use transport::{BrowserFetcher, TimeoutPacer};
pub use utils::set_panic_hook as init_panic_hook;
pub use viewer::StreamViewer;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the version of IFC-Stream
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
