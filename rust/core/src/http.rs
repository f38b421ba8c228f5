// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Native transport: reqwest fetcher and tokio pacer

use crate::config::ViewerConfig;
use crate::error::{Error, Result};
use crate::streaming::{Fetcher, Pacer};
use std::time::Duration;

/// Fetches fragments from `GET {base_url}/expressID/{id}`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    /// Build a fetcher for the configured server with its request timeout
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.base_url()))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn fragment_url(&self, express_id: u32) -> String {
        format!("{}/expressID/{}", self.base_url, express_id)
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, express_id: u32) -> Result<Vec<u8>> {
        let network = |e: reqwest::Error| Error::Network {
            express_id,
            message: e.to_string(),
        };

        let response = self
            .client
            .get(self.fragment_url(express_id))
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                express_id,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(network)?;
        Ok(body.to_vec())
    }
}

/// Pauses with `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
