//! Embedding capability.
//!
//! Maps text to fixed-dimension vectors. Providers return L2-normalized
//! vectors so the similarity index can score with a plain dot product.

pub mod ollama;

use anyhow::Result;
use async_trait::async_trait;

pub use ollama::OllamaEmbedder;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text into a normalized vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, one normalized vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
#[inline]
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}
