//! Knowledge store: the document-level view of a collection

use std::sync::Arc;

use crate::error::Result;
use crate::types::Document;

use super::collection::Collection;

/// Adds documents and finds the ones closest to a query
#[derive(Clone)]
pub struct KnowledgeStore {
    collection: Arc<Collection>,
}

impl KnowledgeStore {
    pub fn new(collection: Arc<Collection>) -> Self {
        Self { collection }
    }

    /// Number of stored documents
    pub fn len(&self) -> Result<usize> {
        self.collection.count()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Store `text` under a freshly generated id and return the id
    pub async fn add(&self, text: &str) -> Result<String> {
        let id = Document::generate_id();
        self.collection
            .add(&[text.to_string()], &[id.clone()])
            .await?;
        Ok(id)
    }

    /// Texts of the `k` stored documents closest to `query`
    ///
    /// Empty when nothing has been stored yet; the query is then not embedded.
    pub async fn find_nearest(&self, query: &str, k: usize) -> Result<Vec<String>> {
        if self.is_empty()? {
            return Ok(Vec::new());
        }

        let result = self.collection.query(&[query.to_string()], k).await?;
        Ok(result.documents.into_iter().next().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::testing::TrigramEmbedder;
    use crate::providers::EmbeddingProvider;
    use async_trait::async_trait;

    fn store() -> KnowledgeStore {
        let collection = Collection::temporary("docs", Arc::new(TrigramEmbedder::default()));
        KnowledgeStore::new(Arc::new(collection.unwrap()))
    }

    /// Fails every call, like an embedding backend that is down
    struct DownEmbedder;

    #[async_trait]
    impl EmbeddingProvider for DownEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::embedding("connection refused"))
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    #[tokio::test]
    async fn test_add_then_find_same_text() {
        let store = store();
        let texts = ["alpha beta", "gamma delta epsilon", "x", "C#", "C++", "🦀🦀🦀"];
        for text in texts {
            store.add(text).await.unwrap();
        }

        for text in texts {
            let nearest = store.find_nearest(text, 1).await.unwrap();
            assert_eq!(nearest, vec![text.to_string()]);
        }
    }

    #[tokio::test]
    async fn test_find_nearest_on_empty_store() {
        let store = store();
        assert!(store.find_nearest("anything", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_store_skips_embedding() {
        let collection = Collection::temporary("docs", Arc::new(DownEmbedder)).unwrap();
        let store = KnowledgeStore::new(Arc::new(collection));

        assert!(store.find_nearest("anything", 1).await.unwrap().is_empty());
        assert!(matches!(store.add("text").await, Err(Error::Store(_))));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = store();
        let a = store.add("same text").await.unwrap();
        let b = store.add("same text").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len().unwrap(), 2);
    }
}
