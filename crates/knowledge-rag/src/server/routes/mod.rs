//! API routes for the RAG server

pub mod ingest;
pub mod query;

use axum::{
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;
use crate::types::HealthResponse;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Liveness
        .route("/health", get(health))
        // Retrieval + generation
        .route("/query", post(query::query_rag))
        // Knowledge base growth
        .route("/add", post(ingest::add_knowledge))
}

/// GET /health - constant liveness probe
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
