use async_trait::async_trait;

use crate::core::errors::ApiError;
use super::types::ChatMessage;

/// Turns text into fixed-dimension vectors, one per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ApiError::Upstream("embedding service returned no vector".to_string()))
    }
}

/// Non-streaming chat completion.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ApiError>;
}

/// Fetches a URL and returns its normalized plain text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, ApiError>;
}
