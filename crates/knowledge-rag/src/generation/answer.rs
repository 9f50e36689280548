//! Answer generator: context + question in, answer text out

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::providers::{LlmProvider, OllamaLlm};

use super::prompt::PromptBuilder;

/// Turns retrieved context and a question into an answer
///
/// In mock mode the context is returned unchanged and the backend is never
/// called, which keeps answers deterministic without a running model.
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    use_mock: bool,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, use_mock: bool) -> Self {
        Self { llm, use_mock }
    }

    /// Build an Ollama-backed generator from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let llm = OllamaLlm::new(config)?;
        Ok(Self::new(Arc::new(llm), config.use_mock))
    }

    /// Underlying generation backend
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Answer `question` using `context`
    pub async fn generate(&self, context: &str, question: &str) -> Result<String> {
        if self.use_mock {
            return Ok(context.to_string());
        }

        let prompt = PromptBuilder::build_rag_prompt(context, question);
        self.llm.generate(&prompt).await
    }
}
