//! ONNX-based embedding generation
//!
//! Uses all-MiniLM-L6-v2 model for fast, high-quality 384-dimensional embeddings.
//! The model and tokenizer are downloaded from Hugging Face on first use and
//! cached under `EmbeddingConfig::cache_dir`.

use async_trait::async_trait;
use ndarray::{Array1, ArrayView2, ArrayView3};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

/// ONNX-based text embedder
pub struct OnnxEmbedder {
    model: Arc<OnnxModel>,
}

struct OnnxModel {
    /// ONNX Runtime session
    session: Mutex<Session>,
    /// HuggingFace tokenizer
    tokenizer: Tokenizer,
    /// Embedding dimensions
    dimensions: usize,
    /// Maximum sequence length
    max_length: usize,
    /// Batch size
    batch_size: usize,
}

impl OnnxEmbedder {
    /// Load the configured model, downloading it if it is not cached yet
    pub async fn new(config: &EmbeddingConfig) -> Result<Self> {
        tracing::info!("Initializing ONNX embedder with model: {}", config.model);

        let model_dir = config.cache_dir.join(&config.model);
        std::fs::create_dir_all(&model_dir).map_err(|e| {
            Error::config(format!("Failed to create cache directory: {}", e))
        })?;

        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            download(&model_url(&config.model, "onnx/model.onnx"), &model_path).await?;
        }
        if !tokenizer_path.exists() {
            download(&model_url(&config.model, "tokenizer.json"), &tokenizer_path).await?;
        }

        let session = Session::builder()
            .map_err(|e| Error::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::embedding(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| Error::embedding(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| Error::embedding(format!("Failed to load model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::embedding(format!("Failed to load tokenizer: {}", e)))?;

        tracing::info!("ONNX embedder initialized successfully");

        Ok(Self {
            model: Arc::new(OnnxModel {
                session: Mutex::new(session),
                tokenizer,
                dimensions: config.dimensions,
                max_length: config.max_length,
                batch_size: config.batch_size.max(1),
            }),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::embedding("Empty embedding result"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Inference is CPU-bound
        let model = self.model.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.embed_batch(&texts))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.model.dimensions
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

impl OnnxModel {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            all_embeddings.extend(self.embed_chunk(batch)?);
        }
        Ok(all_embeddings)
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batch_size = texts.len();
        if batch_size == 0 {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| Error::embedding(format!("Tokenization failed: {}", e)))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.max_length)
            .max(1);

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut token_type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();

            for j in 0..ids.len().min(max_len) {
                input_ids[i * max_len + j] = ids[j] as i64;
                attention_mask[i * max_len + j] = mask[j] as i64;
                token_type_ids[i * max_len + j] = types[j] as i64;
            }
        }

        let tensor_error =
            |e: ort::Error| Error::embedding(format!("Tensor creation failed: {}", e));
        let input_ids_tensor =
            Tensor::from_array((vec![batch_size, max_len], input_ids.into_boxed_slice()))
                .map_err(tensor_error)?;
        let attention_mask_tensor = Tensor::from_array((
            vec![batch_size, max_len],
            attention_mask.clone().into_boxed_slice(),
        ))
        .map_err(tensor_error)?;
        let token_type_ids_tensor =
            Tensor::from_array((vec![batch_size, max_len], token_type_ids.into_boxed_slice()))
                .map_err(tensor_error)?;

        let inputs = vec![
            ("input_ids", input_ids_tensor.into_dyn()),
            ("attention_mask", attention_mask_tensor.into_dyn()),
            ("token_type_ids", token_type_ids_tensor.into_dyn()),
        ];

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| Error::embedding(format!("Inference failed: {}", e)))?;

        // last_hidden_state: [batch, seq, hidden]
        let output_iter: Vec<_> = outputs.iter().collect();
        let output = output_iter
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| Error::embedding("No output tensor"))?;

        let (tensor_shape, tensor_data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::embedding(format!("Failed to extract tensor: {}", e)))?;

        let dims: Vec<usize> = tensor_shape.iter().map(|&d| d as usize).collect();
        let (seq_len, hidden_size) = match dims.as_slice() {
            [_, seq, hidden] => (*seq, *hidden),
            _ => {
                return Err(Error::embedding(format!(
                    "Unexpected output shape {:?}",
                    dims
                )))
            }
        };
        if hidden_size != self.dimensions {
            return Err(Error::embedding(format!(
                "Model produces {} dimensions but {} are configured",
                hidden_size, self.dimensions
            )));
        }

        let hidden = ArrayView3::from_shape((batch_size, seq_len, hidden_size), tensor_data)
            .map_err(|e| Error::embedding(format!("Bad output tensor: {}", e)))?;
        let mask = ArrayView2::from_shape((batch_size, max_len), attention_mask.as_slice())
            .map_err(|e| Error::embedding(format!("Bad attention mask: {}", e)))?;

        Ok(mean_pool(hidden, mask))
    }
}

/// Mean of the unmasked token vectors of each row, L2-normalised
fn mean_pool(hidden: ArrayView3<f32>, mask: ArrayView2<i64>) -> Vec<Vec<f32>> {
    hidden
        .outer_iter()
        .zip(mask.outer_iter())
        .map(|(tokens, mask)| {
            let mut sum = Array1::<f32>::zeros(tokens.ncols());
            let mut count = 0.0f32;

            for (token, &m) in tokens.outer_iter().zip(mask.iter()) {
                if m > 0 {
                    sum += &token;
                    count += 1.0;
                }
            }

            if count > 0.0 {
                sum /= count;
            }

            let norm = sum.dot(&sum).sqrt();
            if norm > 0.0 {
                sum /= norm;
            }

            sum.to_vec()
        })
        .collect()
}

fn model_url(model_name: &str, file: &str) -> String {
    format!(
        "https://huggingface.co/sentence-transformers/{}/resolve/main/{}",
        model_name, file
    )
}

/// Fetch `url` into `path`, never leaving a partial file behind
async fn download(url: &str, path: &Path) -> Result<()> {
    tracing::info!("Downloading {}", url);

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::embedding(format!("Failed to download {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(Error::embedding(format!(
            "Download of {} failed: HTTP {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::embedding(format!("Failed to read {}: {}", url, e)))?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(&bytes)?;
    file.persist(path)
        .map_err(|e| Error::embedding(format!("Failed to save {}: {}", path.display(), e)))?;

    tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_mean_pool_ignores_padding() {
        // Two rows of three tokens; the second row has one padding token
        let hidden = Array3::from_shape_vec(
            (2, 3, 2),
            vec![
                3.0, 0.0, 0.0, 4.0, 3.0, 4.0, //
                1.0, 0.0, 1.0, 0.0, 0.0, 100.0,
            ],
        )
        .unwrap();
        let mask = Array2::from_shape_vec((2, 3), vec![1, 1, 1, 1, 1, 0]).unwrap();

        let pooled = mean_pool(hidden.view(), mask.view());

        assert_eq!(pooled.len(), 2);
        // Mean (2, 8/3) normalised
        assert!((pooled[0][0] - 0.6).abs() < 1e-5);
        assert!((pooled[0][1] - 0.8).abs() < 1e-5);
        // Padding vector (0, 100) must not leak in
        assert!((pooled[1][0] - 1.0).abs() < 1e-6);
        assert!(pooled[1][1].abs() < 1e-6);
    }

    #[test]
    fn test_mean_pool_all_masked_is_zero() {
        let hidden = Array3::from_shape_vec((1, 2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mask = Array2::from_shape_vec((1, 2), vec![0, 0]).unwrap();

        assert_eq!(mean_pool(hidden.view(), mask.view()), vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_model_url() {
        assert_eq!(
            model_url("all-MiniLM-L6-v2", "tokenizer.json"),
            "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json"
        );
    }

    #[tokio::test]
    #[ignore = "downloads all-MiniLM-L6-v2 from Hugging Face"]
    async fn test_exact_text_finds_itself() {
        use crate::retrieval::{Collection, KnowledgeStore};

        let dir = tempfile::tempdir().unwrap();
        let config = EmbeddingConfig {
            cache_dir: dir.path().to_path_buf(),
            ..EmbeddingConfig::default()
        };
        let embedder = OnnxEmbedder::new(&config).await.unwrap();
        assert_eq!(embedder.embed("C#").await.unwrap().len(), 384);

        let collection = Collection::temporary("docs", Arc::new(embedder)).unwrap();
        let store = KnowledgeStore::new(Arc::new(collection));
        let texts = ["C#", "C++", "Paris is the capital of France", "🦀🦀🦀"];
        for text in texts {
            store.add(text).await.unwrap();
        }

        for text in texts {
            assert_eq!(store.find_nearest(text, 1).await.unwrap(), vec![text.to_string()]);
        }
    }
}
