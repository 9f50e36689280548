//! Prompt template for RAG generation

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the prompt embedding the retrieved context and the question
    pub fn build_rag_prompt(context: &str, question: &str) -> String {
        format!(
            "Context:\n{}\n\nQuestion: {}\n\nAnswer clearly and concisely:",
            context, question
        )
    }
}
