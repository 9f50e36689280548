//! Answer generation with an LLM

pub mod answer;
pub mod ollama;
pub mod prompt;

pub use answer::AnswerGenerator;
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
