//! Vector storage and nearest-document retrieval

pub mod collection;
pub mod knowledge;
pub mod search;

pub use collection::{Collection, PersistentClient, QueryResult};
pub use knowledge::KnowledgeStore;
pub use search::{SearchResult, VectorStore};
