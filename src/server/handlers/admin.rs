use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::core::security::require_admin;
use crate::rag::{RebuildReport, RemovedSource};
use crate::state::AppState;
use super::utils::{json_rejection, multipart_error, query_rejection};

#[derive(Debug, Deserialize)]
pub struct SourceQuery {
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub struct AddUrlRequest {
    #[serde(default)]
    pub url: Option<String>,
}

pub async fn list_sources(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_admin(&headers, &state.admin_token)?;
    let sources = state.store.sources()?;
    let total_chunks: usize = sources.iter().map(|s| s.chunks).sum();
    Ok(Json(json!({
        "sources": sources,
        "total_chunks": total_chunks,
    })))
}

pub async fn delete_source(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<SourceQuery>, QueryRejection>,
) -> Result<Json<RemovedSource>, ApiError> {
    require_admin(&headers, &state.admin_token)?;
    let Query(query) = query.map_err(query_rejection)?;
    let source = query.source.trim();
    if source.is_empty() {
        return Err(ApiError::BadRequest("source is required".to_string()));
    }

    let removed = state.ingestor.delete_source(source).await?;
    Ok(Json(removed))
}

/// Indexes every file part. One bad file does not fail the others.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    require_admin(&headers, &state.admin_token)?;

    let mut results = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(filename) = field.file_name().map(|name| name.to_string()) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(multipart_error)?;

        match state.ingestor.ingest_upload(&filename, bytes.to_vec()).await {
            Ok(ingested) => results.push(json!({
                "file": ingested.source,
                "chunks": ingested.chunks,
            })),
            Err(err) => {
                tracing::warn!("Failed to ingest upload {}: {}", filename, err);
                results.push(json!({
                    "file": filename,
                    "error": err.message(),
                }));
            }
        }
    }

    if results.is_empty() {
        return Err(ApiError::BadRequest("no files in upload".to_string()));
    }
    Ok(Json(json!({ "files": results })))
}

pub async fn add_url(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<AddUrlRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&headers, &state.admin_token)?;
    let Json(payload) = payload.map_err(json_rejection)?;
    let url = payload
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("url is required".to_string()))?;

    let ingested = state.ingestor.add_url(&url).await?;
    Ok(Json(json!({
        "url": ingested.source,
        "chunks": ingested.chunks,
    })))
}

pub async fn rebuild(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RebuildReport>, ApiError> {
    require_admin(&headers, &state.admin_token)?;
    let report = state.ingestor.rebuild().await?;
    Ok(Json(report))
}
