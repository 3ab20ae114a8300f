use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::Embedder;
use super::answer::{Answer, AnswerGenerator};
use super::gate::ConfidenceGate;
use super::store::VectorStore;

/// Query-time pipeline: embed → top-K → gate → answer or refuse.
#[derive(Clone)]
pub struct QaService {
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
    generator: AnswerGenerator,
    gate: ConfidenceGate,
    top_k: usize,
}

impl QaService {
    pub fn new(
        store: VectorStore,
        embedder: Arc<dyn Embedder>,
        generator: AnswerGenerator,
        gate: ConfidenceGate,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            gate,
            top_k,
        }
    }

    pub fn gate(&self) -> &ConfidenceGate {
        &self.gate
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn ask(&self, question: &str) -> Result<Answer, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::BadRequest("message must not be empty".to_string()));
        }

        if self.store.is_empty()? {
            tracing::info!("Refusing question: index is empty");
            return Ok(Answer::refusal());
        }

        let query = self.embedder.embed_one(question).await?;
        let hits = self.store.search(&query, self.top_k)?;
        let scores: Vec<f32> = hits.iter().map(|hit| hit.score).collect();
        let outcome = self.gate.evaluate(&scores);
        tracing::debug!(
            "Gate scores: top_sim={:.3} avg_top3={:.3} passed={}",
            outcome.top_sim,
            outcome.avg_top3,
            outcome.passed
        );

        if !outcome.passed {
            tracing::info!(
                "Refusing question: top_sim={:.3} avg_top3={:.3} below thresholds",
                outcome.top_sim,
                outcome.avg_top3
            );
            return Ok(Answer::refusal());
        }

        self.generator.generate(question, &hits).await
    }
}
