use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::config::Settings;
use crate::core::errors::ApiError;
use super::provider::{Completer, Embedder};
use super::types::ChatMessage;

/// Client for an OpenAI-compatible `/embeddings` + `/chat/completions` API.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    embedding_model: String,
    chat_model: String,
    temperature: f32,
    batch_size: usize,
    client: Client,
}

impl OpenAiClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            api_key: settings.openai_api_key.clone(),
            embedding_model: settings.embedding_model.clone(),
            chat_model: settings.chat_model.clone(),
            temperature: settings.temperature,
            batch_size: settings.embed_batch_size.max(1),
            client: Client::new(),
        }
    }

    fn ensure_key(&self) -> Result<(), ApiError> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::Upstream(
                "OPENAI_API_KEY is not configured".to_string(),
            ));
        }
        Ok(())
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: batch,
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;
        let res = check_status(res, "embedding").await?;

        let payload: EmbeddingResponse = res.json().await.map_err(ApiError::upstream)?;
        order_embeddings(payload.data, batch.len())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_key()?;

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        tracing::debug!(
            "Embedded {} texts with {}",
            texts.len(),
            self.embedding_model
        );
        Ok(vectors)
    }
}

#[async_trait]
impl Completer for OpenAiClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ApiError> {
        self.ensure_key()?;
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.chat_model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": false,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;
        let res = check_status(res, "completion").await?;

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;
        completion_text(&payload)
    }
}

async fn check_status(res: Response, what: &str) -> Result<Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    Err(ApiError::Upstream(format!(
        "{} HTTP {}: {}",
        what,
        status.as_u16(),
        text.trim()
    )))
}

fn order_embeddings(
    mut data: Vec<EmbeddingDatum>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, ApiError> {
    if data.len() != expected {
        return Err(ApiError::Upstream(format!(
            "embedding service returned {} vectors for {} inputs",
            data.len(),
            expected
        )));
    }
    data.sort_by_key(|datum| datum.index);
    if let Some((position, datum)) = data
        .iter()
        .enumerate()
        .find(|(position, datum)| datum.index != *position)
    {
        return Err(ApiError::Upstream(format!(
            "embedding response indices are not 0..{}: found {} at position {}",
            expected, datum.index, position
        )));
    }
    Ok(data.into_iter().map(|datum| datum.embedding).collect())
}

fn completion_text(payload: &Value) -> Result<String, ApiError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ApiError::Upstream("completion response had no message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeddings_are_returned_in_input_order() {
        let data = vec![
            EmbeddingDatum {
                index: 1,
                embedding: vec![0.0, 1.0],
            },
            EmbeddingDatum {
                index: 0,
                embedding: vec![1.0, 0.0],
            },
        ];

        let ordered = order_embeddings(data, 2).expect("ordering should work");

        assert_eq!(ordered, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn duplicate_or_out_of_range_indices_are_rejected() {
        let datum = |index: usize| EmbeddingDatum {
            index,
            embedding: vec![index as f32],
        };

        let duplicate = order_embeddings(vec![datum(0), datum(0)], 2);
        let out_of_range = order_embeddings(vec![datum(0), datum(5)], 2);

        assert!(matches!(duplicate, Err(ApiError::Upstream(_))));
        assert!(matches!(out_of_range, Err(ApiError::Upstream(_))));
    }

    #[test]
    fn short_embedding_response_is_an_upstream_error() {
        let data = vec![EmbeddingDatum {
            index: 0,
            embedding: vec![1.0],
        }];

        let result = order_embeddings(data, 3);

        assert!(matches!(result, Err(ApiError::Upstream(_))));
    }

    #[test]
    fn completion_text_reads_first_choice() {
        let payload = json!({
            "choices": [{"message": {"role": "assistant", "content": "  Paris [[1]]\n"}}]
        });
        assert_eq!(completion_text(&payload).expect("text"), "Paris [[1]]");

        let empty = json!({"choices": []});
        assert!(matches!(completion_text(&empty), Err(ApiError::Upstream(_))));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = OpenAiClient::new(&Settings::default());

        let embed = client.embed(&["hello".to_string()]).await;
        let complete = client.complete(vec![ChatMessage::user("hi")]).await;

        assert!(matches!(embed, Err(ApiError::Upstream(_))));
        assert!(matches!(complete, Err(ApiError::Upstream(_))));
    }

    #[tokio::test]
    async fn empty_input_needs_no_request() {
        let client = OpenAiClient::new(&Settings::default());
        let vectors = client.embed(&[]).await.expect("empty embed");
        assert!(vectors.is_empty());
    }
}
