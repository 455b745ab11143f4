//! Cosine similarity

/// Cosine similarity of two vectors, computed in f64
///
/// Returns 0 when either vector has zero norm or the lengths differ; the result
/// is clamped to [-1, 1] and symmetric in its arguments.
///
/// ```
/// use heraclitus_semantic::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 || !dot.is_finite() {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Whether a vector has a usable direction
pub(crate) fn has_norm(v: &[f32]) -> bool {
    v.iter().any(|x| *x != 0.0) && v.iter().all(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mismatched_lengths_are_unrelated() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_bridge_pair() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.82, 0.572364]);
        assert!((sim - 0.82).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors() {
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_has_norm() {
        assert!(has_norm(&[0.0, 0.1]));
        assert!(!has_norm(&[0.0, 0.0]));
        assert!(!has_norm(&[f32::NAN, 1.0]));
    }

    fn vector() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-100.0f32..100.0, 8)
    }

    proptest! {
        #[test]
        fn prop_symmetric(a in vector(), b in vector()) {
            prop_assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        }

        #[test]
        fn prop_bounded(a in vector(), b in vector()) {
            let sim = cosine_similarity(&a, &b);
            prop_assert!((-1.0..=1.0).contains(&sim));
        }

        #[test]
        fn prop_scale_invariant(a in vector(), b in vector(), k in 0.1f32..10.0) {
            let scaled: Vec<f32> = a.iter().map(|x| x * k).collect();
            prop_assert!((cosine_similarity(&a, &b) - cosine_similarity(&scaled, &b)).abs() < 1e-5);
        }
    }
}
