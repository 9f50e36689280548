//! Deterministic embedder for unit tests
//!
//! Hashes the character trigrams of the lowercased text (symbols and emoji
//! included) into signed buckets. Texts sharing many trigrams land close
//! together, which is enough to exercise retrieval without a model.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::Result;

use super::embedding::EmbeddingProvider;

pub struct TrigramEmbedder {
    dimensions: usize,
}

impl TrigramEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        // Bucket 0 is shared by every text so that no vector is all zeros
        vector[0] = 1.0;

        let chars: Vec<char> = format!(" {} ", text.to_lowercase()).chars().collect();
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            let digest = Sha256::digest(trigram.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let spread = self.dimensions as u64 - 1;
            let bucket = 1 + (u64::from_le_bytes(bucket_bytes) % spread) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        for value in &mut vector {
            *value /= norm;
        }
        vector
    }
}

impl Default for TrigramEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for TrigramEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "trigram"
    }
}
