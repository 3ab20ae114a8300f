use serde::Serialize;

use crate::core::errors::ApiError;
use crate::vector_math::cosine_similarity;
use super::store::IndexRecord;

/// A record with its cosine similarity to the current query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: IndexRecord,
    pub score: f32,
}

/// Linear scan: scores every record, returns the best `k` in descending
/// order. Ties keep index order.
pub fn top_k(
    items: &[IndexRecord],
    query: &[f32],
    k: usize,
) -> Result<Vec<ScoredRecord>, ApiError> {
    let mut scores = Vec::with_capacity(items.len());
    for (idx, record) in items.iter().enumerate() {
        let score = cosine_similarity(query, &record.embedding)?;
        scores.push((idx, score));
    }

    scores.sort_by(|left, right| right.1.total_cmp(&left.1));
    scores.truncate(k);

    Ok(scores
        .into_iter()
        .map(|(idx, score)| ScoredRecord {
            record: items[idx].clone(),
            score,
        })
        .collect())
}
