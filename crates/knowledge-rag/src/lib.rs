//! knowledge-rag: minimal retrieval-augmented generation over HTTP
//!
//! A query is answered by fetching the single most similar document from a
//! persistent vector collection and handing it, as context, to a language
//! model. Documents can be added to the collection at runtime.

pub mod config;
pub mod error;
pub mod generation;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::AnswerGenerator;
pub use retrieval::{Collection, KnowledgeStore, PersistentClient};
pub use server::{create_app, state::AppState, RagServer};
pub use types::{AddResponse, Document, HealthResponse, QueryResponse};
