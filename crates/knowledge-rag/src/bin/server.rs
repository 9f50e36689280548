//! RAG Server binary
//!
//! Run with: cargo run -p knowledge-rag --bin knowledge-rag-server

use knowledge_rag::config::RagConfig;
use knowledge_rag::server::RagServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "knowledge_rag=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Mock mode: {}", config.llm.use_mock);
    tracing::info!("  - Embedding provider: {:?}", config.embeddings.provider);
    tracing::info!("  - Store: {}", config.vector_db.path.display());

    // Create server (loads the embedding model and opens the collection)
    let server = RagServer::new(config).await?;

    // Check Ollama, unless no request will ever reach it
    let state = server.state();
    if state.config().uses_ollama() {
        let base_url = &state.config().llm.base_url;
        tracing::info!("Checking Ollama at {}...", base_url);
        if state.generator().llm().health_check().await? {
            tracing::info!("Ollama is running");
        } else {
            tracing::warn!("Ollama not available at {}", base_url);
            tracing::warn!(
                "  Start it with `ollama serve` and pull the model: ollama pull {}",
                state.generator().llm().model()
            );
        }
    }

    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health     - Liveness probe");
    tracing::info!("  POST /query?q=   - Ask a question");
    tracing::info!("  POST /add?text=  - Add a document");

    server.start().await?;

    Ok(())
}
