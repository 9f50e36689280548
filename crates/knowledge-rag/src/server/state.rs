//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::providers;
use crate::retrieval::{KnowledgeStore, PersistentClient};

/// Shared application state
///
/// Built once at startup and handed to the router; nothing here is global.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Knowledge store over the configured collection
    knowledge: KnowledgeStore,
    /// Answer generator (Ollama or mock)
    generator: AnswerGenerator,
}

impl AppState {
    /// Create application state from configuration
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG application state...");

        let embedder = providers::embedder_from_config(&config).await?;
        tracing::info!(
            "Embedding provider: {} ({} dimensions)",
            embedder.name(),
            embedder.dimensions()
        );

        let client = PersistentClient::new(&config.vector_db, embedder)?;
        let collection = client.get_or_create_collection(&config.vector_db.collection)?;
        tracing::info!(
            "Collection '{}' loaded from {} ({} documents)",
            collection.name(),
            client.path().display(),
            collection.count()?
        );

        let generator = AnswerGenerator::from_config(&config.llm)?;
        tracing::info!("Using model: {}", config.llm.model);
        tracing::info!("Mock mode: {}", config.llm.use_mock);

        Ok(Self::from_parts(
            config,
            KnowledgeStore::new(collection),
            generator,
        ))
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        config: RagConfig,
        knowledge: KnowledgeStore,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                knowledge,
                generator,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get knowledge store
    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.inner.knowledge
    }

    /// Get answer generator
    pub fn generator(&self) -> &AnswerGenerator {
        &self.inner.generator
    }
}
