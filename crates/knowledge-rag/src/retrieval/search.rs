//! Vector store for document storage and search
//!
//! Wraps a ruvector-core `VectorDB`: an HNSW index with cosine distance over
//! a redb file. Document text lives in the entry metadata.

use parking_lot::Mutex;
use std::path::Path;
use tempfile::TempDir;

use ruvector_core::types::{DbOptions, HnswConfig};
use ruvector_core::{DistanceMetric, SearchQuery as CoreSearchQuery, VectorDB, VectorEntry};

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::Document;

/// Search result with document and cosine distance
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document (without its embedding)
    pub document: Document,
    /// Cosine distance (0.0 = same direction, 2.0 = opposite)
    pub distance: f32,
}

/// Vector store wrapper for ruvector-core
pub struct VectorStore {
    /// Underlying vector database
    db: VectorDB,
    /// Embedding dimensions
    dimensions: usize,
    /// Serialises the duplicate check with the insert that follows it
    write_lock: Mutex<()>,
    /// Keeps the directory of a temporary store alive
    _scratch: Option<TempDir>,
}

impl VectorStore {
    /// Open the database file at `path`, creating it if missing
    pub fn open(
        path: impl AsRef<Path>,
        dimensions: usize,
        config: &VectorDbConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = DbOptions {
            dimensions,
            distance_metric: DistanceMetric::Cosine,
            storage_path: path.to_string_lossy().to_string(),
            hnsw_config: Some(HnswConfig {
                m: config.hnsw_m,
                ef_construction: config.hnsw_ef_construction,
                ef_search: config.hnsw_ef_search,
                max_elements: 10_000_000,
            }),
            quantization: None,
        };

        let db = VectorDB::new(options).map_err(|e| {
            Error::store(format!("Failed to open '{}': {}", path.display(), e))
        })?;

        Ok(Self {
            db,
            dimensions,
            write_lock: Mutex::new(()),
            _scratch: None,
        })
    }

    /// Create a store in a temporary directory that is removed on drop
    pub fn temporary(dimensions: usize) -> Result<Self> {
        let scratch = tempfile::tempdir()?;
        let mut store = Self::open(
            scratch.path().join("vectors.db"),
            dimensions,
            &VectorDbConfig::default(),
        )?;
        store._scratch = Some(scratch);
        Ok(store)
    }

    /// Insert documents
    ///
    /// The whole batch is validated before anything is written: every
    /// document needs an embedding of the store's dimensions and an id that
    /// is new to the store and to the batch.
    pub fn insert(&self, documents: &[Document]) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut batch_ids = std::collections::HashSet::with_capacity(documents.len());
        for doc in documents {
            if doc.embedding.len() != self.dimensions {
                return Err(Error::store(format!(
                    "Embedding dimension mismatch for '{}': expected {}, got {}",
                    doc.id,
                    self.dimensions,
                    doc.embedding.len()
                )));
            }
            if !batch_ids.insert(doc.id.as_str()) || self.db.get(&doc.id)?.is_some() {
                return Err(Error::store(format!("Duplicate document id '{}'", doc.id)));
            }
        }

        for doc in documents {
            let entry = VectorEntry {
                id: Some(doc.id.clone()),
                vector: doc.embedding.clone(),
                metadata: Some(doc.to_vector_metadata()),
            };
            self.db.insert(entry)?;
        }

        Ok(())
    }

    /// Find the `top_k` documents nearest to `query_embedding`
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if query_embedding.len() != self.dimensions {
            return Err(Error::store(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimensions,
                query_embedding.len()
            )));
        }
        if top_k == 0 || self.is_empty()? {
            return Ok(Vec::new());
        }

        let query = CoreSearchQuery {
            vector: query_embedding.to_vec(),
            k: top_k,
            filter: None,
            ef_search: None,
        };

        let results = self.db.search(query)?;

        let mut search_results: Vec<SearchResult> = results
            .into_iter()
            .filter_map(|result| {
                let metadata = result.metadata.as_ref()?;
                Some(SearchResult {
                    document: Document::from_vector_metadata(&result.id, metadata),
                    distance: result.score,
                })
            })
            .collect();

        search_results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        search_results.truncate(top_k);

        Ok(search_results)
    }

    /// Get document count
    pub fn len(&self) -> Result<usize> {
        Ok(self.db.len()?)
    }

    /// Check if empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
