// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for viewer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or streaming geometry
#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error fetching fragment {express_id}: {message}")]
    Network { express_id: u32, message: String },

    #[error("Fragment {express_id} request failed with HTTP status {status}")]
    HttpStatus { express_id: u32, status: u16 },

    #[error("Fragment {express_id} returned an empty body")]
    EmptyFragment { express_id: u32 },

    #[error("Failed to open model: {0}")]
    ModelOpen(String),

    #[error("Invalid model handle: {0}")]
    InvalidModelHandle(u32),

    #[error("Geometry #{geometry} not found in model {model}")]
    GeometryNotFound { model: u32, geometry: u32 },

    #[error("Engine call failed: {0}")]
    Engine(String),

    #[error("Buffer range out of bounds: elements {start}..{end} of {available}")]
    BufferOutOfRange {
        start: usize,
        end: usize,
        available: usize,
    },

    #[error("Buffer offset {0} is not aligned to 4 bytes")]
    MisalignedOffset(usize),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error came from the transport rather than the engine
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Network { .. } | Error::HttpStatus { .. } | Error::EmptyFragment { .. }
        )
    }
}
