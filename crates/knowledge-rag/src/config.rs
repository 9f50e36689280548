//! Configuration for the RAG service
//!
//! Defaults are overlaid by an optional TOML file (`RAG_CONFIG`) and then by
//! environment variables. Configuration is read once at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML config file
pub const CONFIG_FILE_ENV: &str = "RAG_CONFIG";

/// Main RAG service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Generation backend configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Vector store configuration
    pub vector_db: VectorDbConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable permissive CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Return the retrieved context instead of calling the model
    pub use_mock: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "tinyllama".to_string(),
            use_mock: false,
        }
    }
}

/// Which embedding backend the vector store uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX Runtime model (all-MiniLM-L6-v2)
    #[default]
    Onnx,
    /// Ollama embeddings endpoint
    Ollama,
}

impl FromStr for EmbeddingBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "ollama" => Ok(Self::Ollama),
            other => Err(Error::config(format!(
                "Unknown embedding provider '{}' (expected 'onnx' or 'ollama')",
                other
            ))),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend used to embed documents and queries
    pub provider: EmbeddingBackend,
    /// Sentence-transformers model run by the ONNX backend
    pub model: String,
    /// Model served by Ollama for the Ollama backend
    pub ollama_model: String,
    /// Embedding dimensions (384 for MiniLM, 768 for nomic-embed-text)
    pub dimensions: usize,
    /// Batch size for embedding generation
    pub batch_size: usize,
    /// Maximum sequence length
    pub max_length: usize,
    /// Cache directory for downloaded models
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Onnx,
            model: "all-MiniLM-L6-v2".to_string(),
            ollama_model: "nomic-embed-text".to_string(),
            dimensions: 384,
            batch_size: 32,
            max_length: 256,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("knowledge-rag")
                .join("models"),
        }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Directory holding one database file per collection
    pub path: PathBuf,
    /// Collection that stores the knowledge base
    pub collection: String,
    /// HNSW M parameter (connections per layer)
    pub hnsw_m: usize,
    /// HNSW ef_construction parameter
    pub hnsw_ef_construction: usize,
    /// HNSW ef_search parameter
    pub hnsw_ef_search: usize,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./db"),
            collection: "docs".to_string(),
            hnsw_m: 32,
            hnsw_ef_construction: 200,
            hnsw_ef_search: 100,
        }
    }
}

impl RagConfig {
    /// Load configuration from `RAG_CONFIG` (if set) and the process environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse TOML configuration text
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("Invalid config: {}", e)))
    }

    /// Whether any request can reach the Ollama server
    pub fn uses_ollama(&self) -> bool {
        !self.llm.use_mock || self.embeddings.provider == EmbeddingBackend::Ollama
    }

    /// Override fields from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("MODEL_NAME") {
            self.llm.model = model;
        }
        if let Some(flag) = lookup("USE_MOCK_LLM") {
            self.llm.use_mock = flag == "1";
        }
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.llm.base_url = normalize_base_url(&host);
        }
        if let Some(provider) = lookup("EMBEDDING_PROVIDER") {
            self.embeddings.provider = provider.parse()?;
        }
        if let Some(model) = lookup("EMBED_MODEL") {
            match self.embeddings.provider {
                EmbeddingBackend::Onnx => self.embeddings.model = model,
                EmbeddingBackend::Ollama => self.embeddings.ollama_model = model,
            }
        }
        if let Some(dimensions) = lookup("EMBED_DIMENSIONS") {
            self.embeddings.dimensions = dimensions.parse().map_err(|_| {
                Error::config(format!("Invalid EMBED_DIMENSIONS '{}'", dimensions))
            })?;
        }
        if let Some(dir) = lookup("MODEL_CACHE_DIR") {
            self.embeddings.cache_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("DB_PATH") {
            self.vector_db.path = PathBuf::from(path);
        }
        if let Some(name) = lookup("COLLECTION_NAME") {
            self.vector_db.collection = name;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::config(format!("Invalid PORT '{}'", port)))?;
        }
        Ok(())
    }
}

/// Accept `host:port` as well as full URLs, like the Ollama CLI does
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.llm.model, "tinyllama");
        assert!(!config.llm.use_mock);
        assert_eq!(config.vector_db.collection, "docs");
        assert_eq!(config.vector_db.path, PathBuf::from("./db"));
        assert_eq!(config.embeddings.provider, EmbeddingBackend::Onnx);
        assert_eq!(config.embeddings.model, "all-MiniLM-L6-v2");
        assert_eq!(config.embeddings.dimensions, 384);
        assert_eq!(config.vector_db.hnsw_m, 32);
    }

    #[test]
    fn test_mock_flag_only_accepts_one() {
        let mut config = RagConfig::default();
        config.apply_env(env(&[("USE_MOCK_LLM", "1")])).unwrap();
        assert!(config.llm.use_mock);

        config.apply_env(env(&[("USE_MOCK_LLM", "true")])).unwrap();
        assert!(!config.llm.use_mock);
    }

    #[test]
    fn test_ollama_needed_for_generation_or_embeddings() {
        let mut config = RagConfig::default();
        assert!(config.uses_ollama());

        config.llm.use_mock = true;
        assert!(!config.uses_ollama());

        config.embeddings.provider = EmbeddingBackend::Ollama;
        assert!(config.uses_ollama());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RagConfig::default();
        config
            .apply_env(env(&[
                ("MODEL_NAME", "llama3.2:1b"),
                ("OLLAMA_HOST", "ollama:11434/"),
                ("EMBEDDING_PROVIDER", "Ollama"),
                ("EMBED_MODEL", "mxbai-embed-large"),
                ("EMBED_DIMENSIONS", "1024"),
                ("PORT", "9000"),
            ]))
            .unwrap();

        assert_eq!(config.llm.model, "llama3.2:1b");
        assert_eq!(config.llm.base_url, "http://ollama:11434");
        assert_eq!(config.embeddings.provider, EmbeddingBackend::Ollama);
        assert_eq!(config.embeddings.ollama_model, "mxbai-embed-large");
        assert_eq!(config.embeddings.model, "all-MiniLM-L6-v2");
        assert_eq!(config.embeddings.dimensions, 1024);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let mut config = RagConfig::default();
        assert!(matches!(
            config.apply_env(env(&[("PORT", "eighty")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config.apply_env(env(&[("EMBEDDING_PROVIDER", "hashing")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_partial_toml() {
        let config = RagConfig::from_toml(
            r#"
            [llm]
            model = "phi3"

            [vector_db]
            collection = "notes"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "phi3");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.vector_db.collection, "notes");
        assert_eq!(config.server.port, 8000);
    }
}
