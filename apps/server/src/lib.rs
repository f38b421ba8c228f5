// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Stream Server - tape fragment server for incremental streaming.
//!
//! The viewer requests one fragment per express ID and loads it as soon as
//! it arrives.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/fragments` - Express IDs available for streaming
//! - `GET /expressID/:express_id` - Raw tape fragment

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use config::Config;
use services::FragmentStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FragmentStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Open the fragment store named by `config`.
    pub async fn new(config: Config) -> Self {
        let store = FragmentStore::new(&config.fragment_dir).await;
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}

/// Build the router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Fragment endpoints
        .route("/api/v1/fragments", get(routes::fragments::list_fragments))
        .route("/expressID/:express_id", get(routes::fragments::get_fragment))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        // The viewer page is served from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
