//! Core types for the RAG service

pub mod document;
pub mod query;
pub mod response;

pub use document::Document;
pub use query::{AddParams, QueryParams};
pub use response::{AddResponse, HealthResponse, QueryResponse};
