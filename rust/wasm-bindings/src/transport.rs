// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Browser fetch and timer implementations

use crate::engine::js_message;
use ifc_stream_core::{Error, Fetcher, Pacer, Result, ViewerConfig};
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

/// Fetches fragments with `window.fetch`
pub struct BrowserFetcher {
    config: ViewerConfig,
}

impl BrowserFetcher {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, express_id: u32) -> Result<Vec<u8>> {
        let network = |e: wasm_bindgen::JsValue| Error::Network {
            express_id,
            message: js_message(&e),
        };

        let window = web_sys::window().ok_or_else(|| Error::Network {
            express_id,
            message: "no window available".into(),
        })?;

        let response: Response = JsFuture::from(window.fetch_with_str(&self.config.fragment_url(express_id)))
            .await
            .map_err(network)?
            .dyn_into()
            .map_err(network)?;

        if !response.ok() {
            return Err(Error::HttpStatus {
                express_id,
                status: response.status(),
            });
        }

        let buffer = JsFuture::from(response.array_buffer().map_err(network)?)
            .await
            .map_err(network)?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }
}

/// Pauses with a browser timeout
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutPacer;

impl Pacer for TimeoutPacer {
    async fn pause(&self, delay: Duration) {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::future::TimeoutFuture::new(millis).await;
    }
}
