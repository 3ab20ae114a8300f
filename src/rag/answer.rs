//! Prompt assembly and answer generation over retrieved chunks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, Completer};
use super::retriever::ScoredRecord;

pub const SYSTEM_PROMPT: &str = "You are a careful assistant that answers questions using only the provided context. \
If the context does not contain enough information to answer, say that you don't know and do not guess. \
Cite the passages you rely on with their bracketed index, for example [[1]] or [[2]]. \
Do not use outside knowledge.";

pub const REFUSAL_MESSAGE: &str = "I'm sorry, I couldn't find enough information in the indexed documents to answer that question confidently.";

/// One cited source in a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// 1-based position in the context block, matching `[[id]]`.
    pub id: usize,
    pub source: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

impl Answer {
    pub fn refusal() -> Self {
        Self {
            answer: REFUSAL_MESSAGE.to_string(),
            sources: Vec::new(),
        }
    }
}

/// `[[i]] (source)` header followed by the chunk text, blank line between.
pub fn format_context(hits: &[ScoredRecord]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("[[{}]] ({})\n{}", i + 1, hit.record.source, hit.record.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_messages(question: &str, hits: &[ScoredRecord]) -> Vec<ChatMessage> {
    let user = format!(
        "Question: {}\n\nContext:\n{}\n\nAnswer the question using only the context above and cite sources as [[n]].",
        question,
        format_context(hits)
    );
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

pub fn source_refs(hits: &[ScoredRecord]) -> Vec<SourceRef> {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| SourceRef {
            id: i + 1,
            source: hit.record.source.clone(),
            score: round3(hit.score),
        })
        .collect()
}

fn round3(score: f32) -> f64 {
    (f64::from(score) * 1000.0).round() / 1000.0
}

#[derive(Clone)]
pub struct AnswerGenerator {
    completer: Arc<dyn Completer>,
}

impl AnswerGenerator {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    pub async fn generate(&self, question: &str, hits: &[ScoredRecord]) -> Result<Answer, ApiError> {
        let messages = build_messages(question, hits);
        let answer = self.completer.complete(messages).await?;
        Ok(Answer {
            answer,
            sources: source_refs(hits),
        })
    }
}
