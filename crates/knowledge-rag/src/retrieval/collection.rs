//! Named, persistent collections of embedded documents
//!
//! `PersistentClient` owns a storage directory and hands out one shared
//! `Collection` per name. A collection embeds text with its
//! `EmbeddingProvider` and keeps the vectors in a `VectorStore`, one database
//! file per collection.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Document;

use super::search::VectorStore;

/// Ranked matches, one row per query text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub distances: Vec<Vec<f32>>,
}

/// A named set of documents with similarity search
pub struct Collection {
    name: String,
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Collection {
    /// Create a collection over an existing store
    pub fn new(
        name: impl Into<String>,
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            store,
            embedder,
        }
    }

    /// Create a collection in a temporary directory, sized for `embedder`
    pub fn temporary(
        name: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let store = VectorStore::temporary(embedder.dimensions())?;
        Ok(Self::new(name, Arc::new(store), embedder))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stored documents
    pub fn count(&self) -> Result<usize> {
        self.store.len()
    }

    /// Embed and store `documents` under `ids`
    pub async fn add(&self, documents: &[String], ids: &[String]) -> Result<()> {
        if documents.len() != ids.len() {
            return Err(Error::store(format!(
                "Got {} documents but {} ids",
                documents.len(),
                ids.len()
            )));
        }
        if documents.is_empty() {
            return Ok(());
        }

        let embeddings = self.embedder.embed_batch(documents).await.map_err(into_store_error)?;
        if embeddings.len() != documents.len() {
            return Err(Error::store(format!(
                "Embedder returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let batch: Vec<Document> = ids
            .iter()
            .zip(documents)
            .zip(embeddings)
            .map(|((id, text), embedding)| Document::new(id.clone(), text.clone(), embedding))
            .collect();

        // Index update and storage write are blocking
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.insert(&batch))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    /// Find the `n_results` nearest documents for each query text
    pub async fn query(&self, query_texts: &[String], n_results: usize) -> Result<QueryResult> {
        let embeddings = self.embedder.embed_batch(query_texts).await.map_err(into_store_error)?;

        let store = self.store.clone();
        let rows = tokio::task::spawn_blocking(move || {
            embeddings
                .iter()
                .map(|embedding| store.search(embedding, n_results))
                .collect::<Result<Vec<_>>>()
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        let mut result = QueryResult::default();
        for row in rows {
            let mut ids = Vec::with_capacity(row.len());
            let mut documents = Vec::with_capacity(row.len());
            let mut distances = Vec::with_capacity(row.len());
            for hit in row {
                ids.push(hit.document.id);
                documents.push(hit.document.content);
                distances.push(hit.distance);
            }
            result.ids.push(ids);
            result.documents.push(documents);
            result.distances.push(distances);
        }

        Ok(result)
    }
}

/// The store owns embedding, so embedding failures surface as store failures
fn into_store_error(err: Error) -> Error {
    match err {
        Error::Store(_) => err,
        other => Error::store(other.to_string()),
    }
}

/// Client for collections persisted under one directory
pub struct PersistentClient {
    path: PathBuf,
    config: VectorDbConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    collections: DashMap<String, Arc<Collection>>,
}

impl PersistentClient {
    /// Open (and create if needed) the storage directory `config.path`
    pub fn new(config: &VectorDbConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let storage_error = |e: std::io::Error| {
            Error::store(format!(
                "Failed to open storage directory '{}': {}",
                config.path.display(),
                e
            ))
        };
        std::fs::create_dir_all(&config.path).map_err(storage_error)?;
        // Absolute, so database paths never contain `..`
        let path = std::fs::canonicalize(&config.path).map_err(storage_error)?;

        Ok(Self {
            path,
            config: config.clone(),
            embedder,
            collections: DashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the collection called `name`, loading or creating it
    pub fn get_or_create_collection(&self, name: &str) -> Result<Arc<Collection>> {
        validate_collection_name(name)?;

        match self.collections.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let file = self.path.join(format!("{}.db", name));
                let store = Arc::new(VectorStore::open(
                    file,
                    self.embedder.dimensions(),
                    &self.config,
                )?);
                tracing::debug!("Opened collection '{}' ({} documents)", name, store.len()?);

                let collection = Arc::new(Collection::new(name, store, self.embedder.clone()));
                entry.insert(collection.clone());
                Ok(collection)
            }
        }
    }

    /// Names of collections opened through this client
    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

fn validate_collection_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(Error::store(format!(
            "Invalid collection name '{}': use letters, digits, '-' or '_'",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::TrigramEmbedder;

    fn embedder() -> Arc<dyn EmbeddingProvider> {
        Arc::new(TrigramEmbedder::default())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn config_at(path: &Path) -> VectorDbConfig {
        VectorDbConfig {
            path: path.to_path_buf(),
            ..VectorDbConfig::default()
        }
    }

    #[tokio::test]
    async fn test_add_and_query() {
        let collection = Collection::temporary("docs", embedder()).unwrap();
        collection
            .add(
                &strings(&["Paris is the capital of France", "Rust has no garbage collector"]),
                &strings(&["1", "2"]),
            )
            .await
            .unwrap();

        let result = collection
            .query(&strings(&["capital of France"]), 1)
            .await
            .unwrap();

        assert_eq!(result.ids, vec![vec!["1".to_string()]]);
        assert_eq!(
            result.documents,
            vec![vec!["Paris is the capital of France".to_string()]]
        );
        assert_eq!(result.distances[0].len(), 1);
    }

    #[tokio::test]
    async fn test_query_empty_collection() {
        let collection = Collection::temporary("docs", embedder()).unwrap();
        let result = collection.query(&strings(&["anything"]), 1).await.unwrap();

        assert_eq!(result.documents, vec![Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_mismatched_lengths() {
        let collection = Collection::temporary("docs", embedder()).unwrap();
        let err = collection
            .add(&strings(&["a", "b"]), &strings(&["1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store(_)));
    }

    #[tokio::test]
    async fn test_index_write_failure_is_store_error() {
        // Store sized for another model than the embedder produces
        let store = Arc::new(VectorStore::temporary(8).unwrap());
        let collection = Collection::new("docs", store, embedder());

        let err = collection
            .add(&strings(&["text"]), &strings(&["1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store(_)));
        assert_eq!(collection.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_client_reuses_and_persists_collections() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_at(dir.path());

        {
            let client = PersistentClient::new(&config, embedder()).unwrap();
            let first = client.get_or_create_collection("docs").unwrap();
            let second = client.get_or_create_collection("docs").unwrap();
            assert!(Arc::ptr_eq(&first, &second));

            first
                .add(&strings(&["stored text"]), &strings(&["id-1"]))
                .await
                .unwrap();
        }

        let client = PersistentClient::new(&config, embedder()).unwrap();
        let collection = client.get_or_create_collection("docs").unwrap();
        assert_eq!(collection.count().unwrap(), 1);
        assert_eq!(client.list_collections(), vec!["docs".to_string()]);
        assert!(client.path().join("docs.db").is_file());
    }

    #[test]
    fn test_client_path_is_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("..").join("db");

        let client = PersistentClient::new(&config_at(&nested), embedder()).unwrap();

        assert!(client.path().is_absolute());
        assert!(!client.path().to_string_lossy().contains(".."));
    }

    #[test]
    fn test_collection_names() {
        assert!(validate_collection_name("docs").is_ok());
        assert!(validate_collection_name("team_notes-2").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("../etc").is_err());
    }
}
