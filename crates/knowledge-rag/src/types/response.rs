//! Response payloads

use serde::{Deserialize, Serialize};

/// Message returned when `/add` succeeds
pub const ADD_SUCCESS_MESSAGE: &str = "Content added to knowledge base";

/// `GET /health` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// `POST /query` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer (the raw context in mock mode)
    pub answer: String,
}

/// `POST /add` payload
///
/// Always sent with HTTP 200; `status` tells the caller whether the
/// document was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AddResponse {
    Success { message: String, id: String },
    Error { message: String },
}

impl AddResponse {
    /// Successful add of the document `id`
    pub fn success(id: impl Into<String>) -> Self {
        Self::Success {
            message: ADD_SUCCESS_MESSAGE.to_string(),
            id: id.into(),
        }
    }

    /// Failed add, carrying the failure description
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
