use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let gate = state.qa.gate();
    Ok(Json(json!({
        "status": "ok",
        "items": state.store.len()?,
        "embedding_dimension": state.store.dimension()?,
        "thresholds": {
            "min_top_sim": gate.min_top_sim,
            "min_avg_top3": gate.min_avg_top3,
        },
        "top_k": state.qa.top_k(),
        "started_at": state.started_at.to_rfc3339(),
    })))
}
