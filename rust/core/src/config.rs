// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer configuration.
//!
//! Natively loaded from environment variables; in the browser deserialized
//! from a JS object. Every field has a default.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Streaming endpoint and pacing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Fragment server host.
    pub host: String,
    /// Fragment server port.
    pub port: u16,
    /// Pause between fragments in a batch stream, in milliseconds.
    pub fragment_delay_ms: u64,
    /// Timeout for one fragment request, in seconds (native fetcher only).
    pub request_timeout_secs: u64,
    /// Express IDs streamed by the batch mode, in order.
    pub batch_ids: Vec<u32>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1234,
            fragment_delay_ms: 10,
            request_timeout_secs: 30,
            batch_ids: Vec::new(),
        }
    }
}

impl ViewerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("IFC_STREAM_HOST").unwrap_or(defaults.host),
            port: std::env::var("IFC_STREAM_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            fragment_delay_ms: std::env::var("IFC_STREAM_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fragment_delay_ms),
            request_timeout_secs: std::env::var("IFC_STREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            batch_ids: std::env::var("IFC_STREAM_BATCH")
                .ok()
                .and_then(|v| parse_id_list(&v).ok())
                .unwrap_or(defaults.batch_ids),
        }
    }

    /// Check values that would make streaming impossible
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(Error::Config("port must not be 0".into()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// URL of the fragment for `express_id`
    pub fn fragment_url(&self, express_id: u32) -> String {
        format!("{}/expressID/{}", self.base_url(), express_id)
    }

    pub fn fragment_delay(&self) -> Duration {
        Duration::from_millis(self.fragment_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse a comma-separated list of express IDs
pub fn parse_id_list(value: &str) -> Result<Vec<u32>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| Error::Config(format!("invalid express id '{s}'")))
        })
        .collect()
}
