// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ifc_stream_server::{app, config::Config, AppState};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,ifc_stream_server=debug".into()),
        )
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        fragment_dir = %config.fragment_dir,
        request_timeout_secs = config.request_timeout_secs,
        "Starting IFC-Stream Server"
    );

    let port = config.port;
    let state = AppState::new(config).await;
    match state.store.list().await {
        Ok(ids) => tracing::info!(fragments = ids.len(), "Fragment store ready"),
        Err(e) => tracing::warn!(error = %e, "Fragment store not readable"),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await
}
