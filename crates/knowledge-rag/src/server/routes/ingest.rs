//! Add endpoint: grow the knowledge base at runtime

use axum::{
    extract::{Query, State},
    Json,
};

use crate::server::state::AppState;
use crate::types::{AddParams, AddResponse};

/// POST /add?text=... - Store a new document
///
/// Always answers 200; a store failure is reported in the `status` field.
pub async fn add_knowledge(
    State(state): State<AppState>,
    Query(params): Query<AddParams>,
) -> Json<AddResponse> {
    match state.knowledge().add(&params.text).await {
        Ok(id) => {
            tracing::info!("/add received new text (id: {})", id);
            Json(AddResponse::success(id))
        }
        Err(e) => {
            tracing::error!("/add failed: {}", e);
            Json(AddResponse::error(e.to_string()))
        }
    }
}
