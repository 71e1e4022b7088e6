//! Embedding provider trait and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait that every backend implements,
//! plus the distance and similarity helpers used by the index.
//!
//! Concrete providers (hash stub, OpenAI, Ollama, fastembed) live in the
//! `form-standardizer` app crate.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// A capability that maps label text to a fixed-length vector.
///
/// Implementations must return exactly one vector per input text, in input
/// order. Tests substitute a deterministic stub; production uses a
/// model-backed provider.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Empty embedding response"))
    }
}

/// Squared Euclidean distance between two vectors of equal length.
///
/// Lengths are assumed to match; extra components of the longer vector
/// are ignored.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Convert a distance into a similarity score.
///
/// ```text
/// similarity = 1 / (1 + distance)
/// ```
///
/// Strictly decreasing in `distance`, `1.0` at distance zero, and always in
/// `(0, 1]` for non-negative finite distances. A NaN distance yields NaN,
/// which never passes a threshold comparison.
///
/// ```rust
/// use form_standardizer_core::embedding::similarity_from_distance;
///
/// assert_eq!(similarity_from_distance(0.0), 1.0);
/// assert!((similarity_from_distance(0.2) - 0.8333).abs() < 1e-3);
/// ```
pub fn similarity_from_distance(distance: f32) -> f64 {
    1.0 / (1.0 + distance as f64)
}

/// Cosine similarity in `[-1, 1]`; `0.0` when either vector has zero norm.
///
/// Not used for matching decisions, which stay on L2 distance. Reported
/// alongside the distance by inspection tools.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_l2(&[], &[]), 0.0);
    }

    #[test]
    fn test_similarity_at_zero() {
        assert_eq!(similarity_from_distance(0.0), 1.0);
    }

    #[test]
    fn test_similarity_strictly_decreasing_and_bounded() {
        let distances = [0.0f32, 0.01, 0.2, 1.0, 5.0, 100.0, 1.0e6];
        let sims: Vec<f64> = distances
            .iter()
            .map(|d| similarity_from_distance(*d))
            .collect();
        for pair in sims.windows(2) {
            assert!(pair[0] > pair[1], "not decreasing: {:?}", pair);
        }
        for s in &sims {
            assert!(*s > 0.0 && *s <= 1.0, "out of range: {}", s);
        }
    }

    #[test]
    fn test_similarity_reference_points() {
        assert!((similarity_from_distance(0.2) - 1.0 / 1.2).abs() < 1e-6);
        assert!((similarity_from_distance(5.0) - 1.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_nan_distance_is_never_similar() {
        let s = similarity_from_distance(f32::NAN);
        assert!(s.is_nan());
        assert!(s.partial_cmp(&0.0).is_none());
        assert_eq!(similarity_from_distance(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    struct Fixed;

    #[async_trait]
    impl EmbeddingProvider for Fixed {
        fn model_name(&self) -> &str {
            "fixed"
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[tokio::test]
    async fn test_embed_one_default() {
        let v = Fixed.embed_one("abcd").await.unwrap();
        assert_eq!(v, vec![4.0]);
    }
}
