//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for text generation from a complete prompt
///
/// Implementations:
/// - `OllamaLlm`: local Ollama server (tinyllama, phi3, ...)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a prompt in a single non-streaming call
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
