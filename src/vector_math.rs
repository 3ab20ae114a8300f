use ndarray::ArrayView1;

use crate::core::errors::ApiError;

/// Guards the denominator when either vector has zero norm.
pub const COSINE_EPSILON: f32 = 1e-9;

/// `dot(a, b) / (|a| * |b| + eps)`.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, ApiError> {
    if query.len() != candidate.len() {
        return Err(ApiError::Internal(format!(
            "Vector length mismatch: {} != {}",
            query.len(),
            candidate.len()
        )));
    }

    let query = ArrayView1::from(query);
    let candidate = ArrayView1::from(candidate);

    let dot = query.dot(&candidate);
    let denom = l2_norm(&query) * l2_norm(&candidate) + COSINE_EPSILON;
    Ok(dot / denom)
}

fn l2_norm(vector: &ArrayView1<'_, f32>) -> f32 {
    vector.dot(vector).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let vec = vec![1.0, 2.0, 3.0, 4.0];
        let score = cosine_similarity(&vec, &vec).expect("cosine should work");
        assert!(approx_eq(score, 1.0));
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_vectors() {
        let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).expect("cosine should work");
        assert!(approx_eq(score, 0.0));
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = [0.3, -1.2, 4.0];
        let b = [2.0, 0.5, -0.7];
        let ab = cosine_similarity(&a, &b).expect("cosine should work");
        let ba = cosine_similarity(&b, &a).expect("cosine should work");
        assert_eq!(ab, ba);
    }

    #[test]
    fn zero_vector_scores_zero_instead_of_nan() {
        let score = cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).expect("cosine should work");
        assert!(score.is_finite());
        assert!(approx_eq(score, 0.0));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let result = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]);
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }
}
