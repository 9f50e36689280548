//! Provider abstractions for embeddings and LLM generation
//!
//! Trait objects let the server switch between the ONNX embedder and Ollama,
//! and let tests inject their own backends.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod onnx;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use onnx::OnnxEmbedder;

/// Build the embedding provider selected by the configuration
pub async fn embedder_from_config(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
        EmbeddingBackend::Onnx => Arc::new(OnnxEmbedder::new(&config.embeddings).await?),
        EmbeddingBackend::Ollama => {
            Arc::new(OllamaEmbedder::new(&config.llm, &config.embeddings)?)
        }
    };
    Ok(embedder)
}
