use serde::Serialize;

/// Hard similarity thresholds that decide between answering and refusing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceGate {
    pub min_top_sim: f32,
    pub min_avg_top3: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateOutcome {
    pub passed: bool,
    /// Score of rank 1, or 0 when nothing was retrieved.
    pub top_sim: f32,
    /// Mean score of ranks 1..=min(3, n).
    pub avg_top3: f32,
}

impl ConfidenceGate {
    pub fn new(min_top_sim: f32, min_avg_top3: f32) -> Self {
        Self {
            min_top_sim,
            min_avg_top3,
        }
    }

    /// `scores` must be sorted descending, as returned by the retriever.
    pub fn evaluate(&self, scores: &[f32]) -> GateOutcome {
        if scores.is_empty() {
            return GateOutcome {
                passed: false,
                top_sim: 0.0,
                avg_top3: 0.0,
            };
        }

        let top_sim = scores[0];
        let head = &scores[..scores.len().min(3)];
        let avg_top3 = head.iter().sum::<f32>() / head.len() as f32;
        let passed = top_sim >= self.min_top_sim && avg_top3 >= self.min_avg_top3;

        GateOutcome {
            passed,
            top_sim,
            avg_top3,
        }
    }
}
