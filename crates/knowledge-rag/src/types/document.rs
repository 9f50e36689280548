//! Document type stored in a collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A stored document with its embedding
///
/// Documents are create-only: once added to a collection they are never
/// updated or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier assigned at add time
    pub id: String,
    /// Raw text content
    pub content: String,
    /// Embedding of `content`
    pub embedding: Vec<f32>,
    /// When the document was added
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a document with an explicit id
    pub fn new(id: impl Into<String>, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding,
            created_at: Utc::now(),
        }
    }

    /// Generate a fresh random document id
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Metadata stored next to the vector in the index
    pub fn to_vector_metadata(&self) -> HashMap<String, serde_json::Value> {
        let mut metadata = HashMap::new();
        metadata.insert(
            "content".to_string(),
            serde_json::Value::String(self.content.clone()),
        );
        metadata.insert(
            "created_at".to_string(),
            serde_json::Value::String(self.created_at.to_rfc3339()),
        );
        metadata
    }

    /// Rebuild a document from index metadata
    ///
    /// The embedding is not kept in metadata, so it comes back empty.
    pub fn from_vector_metadata(id: &str, metadata: &HashMap<String, serde_json::Value>) -> Self {
        let content = metadata
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let created_at = metadata
            .get("created_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Self {
            id: id.to_string(),
            content,
            embedding: Vec::new(),
            created_at,
        }
    }
}
