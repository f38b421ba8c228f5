// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fragment endpoints.

use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

/// Available fragments.
#[derive(Debug, Serialize)]
pub struct FragmentList {
    pub express_ids: Vec<u32>,
}

/// GET /expressID/:express_id - Raw tape fragment.
pub async fn get_fragment(
    State(state): State<AppState>,
    Path(express_id): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.store.read(express_id).await?;
    tracing::debug!(express_id, size = data.len(), "Serving fragment");
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}

/// GET /api/v1/fragments - Express IDs available for streaming.
pub async fn list_fragments(State(state): State<AppState>) -> Result<Json<FragmentList>, ApiError> {
    let express_ids = state.store.list().await?;
    Ok(Json(FragmentList { express_ids }))
}
