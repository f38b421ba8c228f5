// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript API of the streaming viewer
//!
//! The page wires its file input, express ID text box and stream button to
//! these methods and pulls new scene nodes into its renderer.
//!
//! Example:
//! ```javascript
//! const viewer = new StreamViewer(api, Module, { port: 1234, batchIds: [563782] });
//! viewer.onProgress((total) => label.textContent = `${total} bytes`);
//! await viewer.streamEntity(563782);
//! for (const node of viewer.nodesFrom(0)) { addToScene(node); }
//! ```

use crate::engine::{IfcApi, WebIfcEngine, WebIfcModule};
use crate::nodes::{ids_to_js, SceneNodeJs};
use crate::transport::{BrowserFetcher, TimeoutPacer};
use crate::utils::{log, to_js_error, warn};
use ifc_stream_core::{
    parse_express_id, FragmentReport, ModelHandle, StreamSummary, StreamToggle, StreamingController,
    Toggle, ViewerConfig,
};
use js_sys::{Function, Promise};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

type Controller = StreamingController<WebIfcEngine, BrowserFetcher, TimeoutPacer>;

/// Batch stream outcome passed to the `onStreamFinished` callback
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamSummaryJs {
    completed: Vec<u32>,
    failed: Vec<FailedFragmentJs>,
    cancelled: bool,
    bytes: usize,
    total_downloaded: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailedFragmentJs {
    express_id: u32,
    error: String,
}

impl StreamSummaryJs {
    fn new(summary: &StreamSummary, total_downloaded: u64) -> Self {
        Self {
            completed: summary.completed.iter().map(|r| r.express_id).collect(),
            failed: summary
                .failed
                .iter()
                .map(|(express_id, e)| FailedFragmentJs {
                    express_id: *express_id,
                    error: e.to_string(),
                })
                .collect(),
            cancelled: summary.cancelled,
            bytes: summary.bytes(),
            total_downloaded,
        }
    }
}

#[derive(Default)]
struct Callbacks {
    on_progress: Option<Function>,
    on_stream_finished: Option<Function>,
}

impl Callbacks {
    fn progress(&self, report: &FragmentReport) {
        if let Some(callback) = &self.on_progress {
            let total = JsValue::from_f64(report.total_downloaded as f64);
            if let Err(e) = callback.call2(&JsValue::NULL, &total, &report.express_id.into()) {
                warn(&format!("onProgress callback failed: {:?}", e));
            }
        }
    }

    fn finished(&self, summary: &StreamSummaryJs) {
        if let Some(callback) = &self.on_stream_finished {
            let value = serde_wasm_bindgen::to_value(summary).unwrap_or(JsValue::NULL);
            if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                warn(&format!("onStreamFinished callback failed: {:?}", e));
            }
        }
    }
}

/// Streaming IFC viewer backed by the web-ifc module
#[wasm_bindgen]
pub struct StreamViewer {
    controller: Rc<Controller>,
    toggle: Rc<StreamToggle>,
    callbacks: Rc<RefCell<Callbacks>>,
}

#[wasm_bindgen]
impl StreamViewer {
    /// Create a viewer over a ready web-ifc `IfcAPI` and its `Module`.
    ///
    /// `config` is optional: `{ host, port, fragmentDelayMs, batchIds }`.
    #[wasm_bindgen(constructor)]
    pub fn new(api: JsValue, module: JsValue, config: JsValue) -> Result<StreamViewer, JsError> {
        crate::utils::set_panic_hook();

        let config: ViewerConfig = if config.is_undefined() || config.is_null() {
            ViewerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        config.validate().map_err(to_js_error)?;

        let engine = WebIfcEngine::new(
            api.unchecked_into::<IfcApi>(),
            module.unchecked_into::<WebIfcModule>(),
        );
        let fetcher = BrowserFetcher::new(config.clone());
        Ok(Self {
            controller: Rc::new(StreamingController::new(engine, fetcher, TimeoutPacer, config)),
            toggle: Rc::new(StreamToggle::new()),
            callbacks: Rc::new(RefCell::new(Callbacks::default())),
        })
    }

    /// Register `(totalBytes, expressId) => void`, called after each streamed fragment
    #[wasm_bindgen(js_name = onProgress)]
    pub fn on_progress(&self, callback: Function) {
        self.callbacks.borrow_mut().on_progress = Some(callback);
    }

    /// Register `(summary) => void`, called when a batch stream ends
    #[wasm_bindgen(js_name = onStreamFinished)]
    pub fn on_stream_finished(&self, callback: Function) {
        self.callbacks.borrow_mut().on_stream_finished = Some(callback);
    }

    /// Load a complete IFC file. Returns the model id, or undefined for no data.
    #[wasm_bindgen(js_name = loadFile)]
    pub fn load_file(&self, name: &str, data: &[u8]) -> Result<Option<u32>, JsError> {
        if data.is_empty() {
            log("No file selected");
            return Ok(None);
        }
        let (model, stats) = self
            .controller
            .load_from_bytes(name, data)
            .map_err(to_js_error)?;
        log(&format!(
            "Loaded {} flat meshes ({} placed) in {:.1} ms, upload {:.1} ms",
            stats.flat_meshes, stats.placed_geometries, stats.geometry_ms, stats.upload_ms
        ));
        Ok(Some(model.0))
    }

    /// Stream one fragment. Resolves with the fragment size in bytes.
    #[wasm_bindgen(js_name = streamEntity)]
    pub fn stream_entity(&self, express_id: u32) -> Promise {
        let controller = Rc::clone(&self.controller);
        let callbacks = Rc::clone(&self.callbacks);
        future_to_promise(async move {
            let report = controller
                .stream_one(express_id)
                .await
                .map_err(|e| JsValue::from(to_js_error(e)))?;
            log(&format!("Received {} bytes", report.bytes));
            callbacks.borrow().progress(&report);
            Ok(JsValue::from_f64(report.bytes as f64))
        })
    }

    /// Text box submit: stream the typed express ID, ignore anything non-numeric
    #[wasm_bindgen(js_name = submitExpressId)]
    pub fn submit_express_id(&self, text: &str) -> Option<Promise> {
        parse_express_id(text).map(|express_id| self.stream_entity(express_id))
    }

    /// Start streaming the configured batch list, or stop the running stream.
    /// Returns true when a stream was started.
    #[wasm_bindgen(js_name = toggleStream)]
    pub fn toggle_stream(&self) -> bool {
        let ids = self.controller.config().batch_ids.clone();
        self.toggle_with(ids)
    }

    /// Like `toggleStream`, streaming `ids` instead of the configured list
    #[wasm_bindgen(js_name = toggleStreamIds)]
    pub fn toggle_stream_ids(&self, ids: Vec<u32>) -> bool {
        self.toggle_with(ids)
    }

    #[wasm_bindgen(getter, js_name = isStreaming)]
    pub fn is_streaming(&self) -> bool {
        self.toggle.is_running()
    }

    #[wasm_bindgen(getter, js_name = totalDownloaded)]
    pub fn total_downloaded(&self) -> f64 {
        self.controller.total_downloaded() as f64
    }

    /// Label text for the download counter
    #[wasm_bindgen(getter, js_name = totalDownloadedLabel)]
    pub fn total_downloaded_label(&self) -> String {
        format!("{} bytes", self.controller.total_downloaded())
    }

    #[wasm_bindgen(getter, js_name = nodeCount)]
    pub fn node_count(&self) -> usize {
        self.controller.node_count()
    }

    /// Nodes with id >= `cursor`, in insertion order
    #[wasm_bindgen(js_name = nodesFrom)]
    pub fn nodes_from(&self, cursor: f64) -> js_sys::Array {
        let cursor = cursor.max(0.0) as u64;
        self.controller.with_scene(|scene| {
            scene
                .nodes_from(cursor)
                .map(|(id, node)| JsValue::from(SceneNodeJs::new(id, node)))
                .collect()
        })
    }

    /// Evict the nodes of a model loaded with `loadFile`. Returns the removed node ids.
    #[wasm_bindgen(js_name = removeModel)]
    pub fn remove_model(&self, model_id: u32) -> Vec<f64> {
        ids_to_js(&self.controller.remove_model(ModelHandle(model_id)))
    }

    /// Remove every node. Returns the removed node ids.
    #[wasm_bindgen(js_name = clearScene)]
    pub fn clear_scene(&self) -> Vec<f64> {
        ids_to_js(&self.controller.clear_scene())
    }
}

impl StreamViewer {
    fn toggle_with(&self, ids: Vec<u32>) -> bool {
        let token = match self.toggle.toggle() {
            Toggle::Started(token) => token,
            Toggle::Stopped => {
                log("Stopping stream");
                return false;
            }
        };

        let controller = Rc::clone(&self.controller);
        let toggle = Rc::clone(&self.toggle);
        let callbacks = Rc::clone(&self.callbacks);
        log(&format!("Streaming {} fragments", ids.len()));

        spawn_local(async move {
            let summary = controller
                .stream_all_with(&ids, &token, |report| callbacks.borrow().progress(report))
                .await;
            toggle.finish(&token);

            for (express_id, e) in &summary.failed {
                warn(&format!("Fragment {} failed: {}", express_id, e));
            }
            let summary = StreamSummaryJs::new(&summary, controller.total_downloaded());
            callbacks.borrow().finished(&summary);
        });
        true
    }
}
