//! Deterministic embedding provider
//!
//! Produces vectors by feature hashing: each lowercase word of the input is
//! hashed into a bucket with a sign, and the result is normalised to unit length.
//! Texts that share vocabulary therefore get positive cosine similarity, which
//! makes the provider usable for offline runs and tests without model files.
//!
//! # Examples
//!
//! ```rust
//! use heraclitus_domain::traits::EmbeddingProvider;
//! use heraclitus_store::HashEmbeddingProvider;
//!
//! let provider = HashEmbeddingProvider::new(384);
//! assert_eq!(provider.dimension(), 384);
//! assert_eq!(provider.model_name(), "feature-hash-384");
//! ```

use async_trait::async_trait;
use heraclitus_domain::traits::EmbeddingProvider;
use heraclitus_domain::EmbeddingError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default embedding dimension, matching common small sentence encoders
pub const DEFAULT_DIMENSION: usize = 384;

/// Hash-based embedding provider
///
/// Embeddings are:
///
/// - **Deterministic**: same text always produces the same vector
/// - **Normalized**: unit length
/// - **Lexical**: word overlap translates into similarity
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimension: usize,
    model_name: String,
}

impl HashEmbeddingProvider {
    /// Create a provider producing vectors of `dimension` components
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            model_name: format!("feature-hash-{}", dimension.max(1)),
        }
    }

    fn hash_token(token: &str, seed: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        seed.hash(&mut hasher);
        hasher.finish()
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }

    fn embed_sync(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embedding = vec![0.0f32; self.dimension];
        let mut seen = 0usize;

        for token in Self::tokens(text) {
            let bucket = Self::hash_token(&token, 0) as usize % self.dimension;
            let sign = if Self::hash_token(&token, 1) & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
            seen += 1;
        }

        if seen == 0 {
            return Err(EmbeddingError::Model(
                "Text has no embeddable tokens".to_string(),
            ));
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_sync(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let provider = HashEmbeddingProvider::new(64);
        let a = provider.embed("The sky is blue").await.unwrap();
        let b = provider.embed("The sky is blue").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_case_and_punctuation_insensitive() {
        let provider = HashEmbeddingProvider::new(64);
        let a = provider.embed("Coral reefs, bleaching!").await.unwrap();
        let b = provider.embed("coral REEFS bleaching").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let provider = HashEmbeddingProvider::new(256);
        let base = provider.embed("protein folding energy landscape").await.unwrap();
        let near = provider.embed("protein folding kinetics").await.unwrap();
        let far = provider.embed("monetary policy inflation").await.unwrap();
        assert!(dot(&base, &near) > dot(&base, &far));
    }

    #[tokio::test]
    async fn test_blank_text_is_model_error() {
        let provider = HashEmbeddingProvider::default();
        let err = provider.embed("  ... ").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Model(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let provider = HashEmbeddingProvider::new(32);
        let texts = vec!["alpha beta".to_string(), "gamma".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[1], provider.embed("gamma").await.unwrap());
    }
}
