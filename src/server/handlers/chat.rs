use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::rag::Answer;
use crate::state::AppState;
use super::utils::json_rejection;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Answer>, ApiError> {
    let Json(payload) = payload.map_err(json_rejection)?;
    let message = payload
        .message
        .ok_or_else(|| ApiError::BadRequest("message is required".to_string()))?;

    let answer = state.qa.ask(&message).await?;
    Ok(Json(answer))
}
