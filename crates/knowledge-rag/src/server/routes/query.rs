//! Query endpoint: nearest document as context, then generation

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryParams, QueryResponse};

/// POST /query?q=... - Answer a question from the closest stored document
///
/// Store and generation failures are returned as HTTP errors.
pub async fn query_rag(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>> {
    tracing::info!("/query asked: {}", params.q);

    let context = state
        .knowledge()
        .find_nearest(&params.q, 1)
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();

    let answer = state.generator().generate(&context, &params.q).await?;

    Ok(Json(QueryResponse { answer }))
}
