//! Embedding backends behind the `Embedder` trait.
//!
//! `FastEmbedder` wraps a local ONNX MiniLM model via fastembed; the first run
//! downloads model weights, and that download failing is the main way the
//! semantic index becomes unavailable. `HashEmbedder` is a deterministic
//! FNV-1a feature-hashing embedder with no model at all — used in tests and
//! as an offline backend.

use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;

/// Dimension shared by both backends (all-MiniLM-L6-v2 output size).
pub const EMBEDDING_DIM: usize = 384;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding backend unavailable: {0}")]
    Unavailable(String),

    #[error("embedding failed: {0}")]
    Failed(String),
}

/// Text embedding backend. Vectors come back L2-normalized so similarity is a
/// plain dot product.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &'static str;
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

// ────────────────────────────────────────────────────────────────────────────
// FastEmbedder — ML backend (fastembed / MiniLM)
// ────────────────────────────────────────────────────────────────────────────

pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
}

impl FastEmbedder {
    /// Loads (downloading on first run) the MiniLM model. Failure here is
    /// recoverable: callers run lexical-only until the model is available.
    pub fn new() -> Result<Self, EmbedError> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
        )
        .map_err(|e| EmbedError::Unavailable(e.to_string()))?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl Embedder for FastEmbedder {
    fn name(&self) -> &'static str {
        "fastembed"
    }

    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| EmbedError::Failed("embedding model lock poisoned".to_string()))?;
        let mut vectors = model
            .embed(vec![text.to_string()], None)
            .map_err(|e| EmbedError::Failed(e.to_string()))?;
        let mut vector = vectors
            .pop()
            .ok_or_else(|| EmbedError::Failed("model returned no vector".to_string()))?;
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HashEmbedder — deterministic feature hashing (no model)
// ────────────────────────────────────────────────────────────────────────────

pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0.0_f32; self.dim];
        for token in tokenize(text) {
            let hash = fnv1a64(token.as_bytes());
            let bucket = (hash % self.dim as u64) as usize;
            // a high bit decides the sign so collisions can cancel
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

/// Scales to unit length; the zero vector stays zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Dot product; with normalized inputs this is cosine similarity.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("python sql docker").unwrap();
        let b = embedder.embed("python sql docker").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_embedder_output_is_unit_length() {
        let embedder = HashEmbedder::default();
        let vector = embedder.embed("a realistic sentence about data platforms").unwrap();
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn test_hash_embedder_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::default();
        let vector = embedder.embed("").unwrap();
        assert!(vector.iter().all(|&x| x == 0.0));
        assert_eq!(vector.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_similar_texts_score_higher_than_unrelated() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("python sql data pipelines").unwrap();
        let close = embedder.embed("python sql data warehouse pipelines").unwrap();
        let far = embedder.embed("marketing brand outreach social media").unwrap();
        assert!(dot(&query, &close) > dot(&query, &far));
    }

    #[test]
    fn test_tokenize_splits_on_non_alphanumeric() {
        let tokens: Vec<String> = tokenize("Python, SQL/PostgreSQL!").collect();
        assert_eq!(tokens, vec!["python", "sql", "postgresql"]);
    }

    #[test]
    fn test_dot_of_identical_normalized_vectors_is_one() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("stable text").unwrap();
        assert!((dot(&v, &v) - 1.0).abs() < 1e-5);
    }
}
