//! Flat vector index persisted as a single JSON document.
//!
//! The whole index lives in memory behind one `RwLock`. Every mutation is
//! written to disk while the write lock is held, so writers are serialized
//! and readers only ever see a fully applied change.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use super::retriever::{top_k, ScoredRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Url,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::File => "file",
            SourceKind::Url => "url",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One embedded chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// `<kind>:<source>::<chunk index>`, unique within the index.
    pub id: String,
    /// Original filename or URL.
    pub source: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl IndexRecord {
    pub fn new(
        kind: SourceKind,
        source: &str,
        chunk_index: usize,
        text: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: record_id(kind, source, chunk_index),
            source: source.to_string(),
            kind,
            text,
            embedding,
        }
    }
}

pub fn record_id(kind: SourceKind, source: &str, chunk_index: usize) -> String {
    format!("{}:{}::{}", kind, source, chunk_index)
}

/// The persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    #[serde(default)]
    pub items: Vec<IndexRecord>,
}

impl Index {
    pub fn dimension(&self) -> Option<usize> {
        self.items.first().map(|record| record.embedding.len())
    }
}

/// Chunk count per source, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub chunks: usize,
}

#[derive(Clone)]
pub struct VectorStore {
    inner: Arc<RwLock<Index>>,
    path: PathBuf,
}

impl VectorStore {
    /// Loads the index at `path`. A missing or unreadable document yields an
    /// empty index.
    pub fn open(path: &Path) -> Self {
        let index = load_index(path).unwrap_or_default();
        tracing::info!(
            "Loaded {} index records from {}",
            index.items.len(),
            path.display()
        );
        Self {
            inner: Arc::new(RwLock::new(index)),
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> Result<usize, ApiError> {
        let guard = self.inner.read().map_err(ApiError::internal)?;
        Ok(guard.items.len())
    }

    pub fn is_empty(&self) -> Result<bool, ApiError> {
        Ok(self.len()? == 0)
    }

    pub fn dimension(&self) -> Result<Option<usize>, ApiError> {
        let guard = self.inner.read().map_err(ApiError::internal)?;
        Ok(guard.dimension())
    }

    pub fn records(&self) -> Result<Vec<IndexRecord>, ApiError> {
        let guard = self.inner.read().map_err(ApiError::internal)?;
        Ok(guard.items.clone())
    }

    /// Appends records and persists the index. Returns the number appended.
    pub fn append(&self, records: Vec<IndexRecord>) -> Result<usize, ApiError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut guard = self.inner.write().map_err(ApiError::internal)?;
        check_dimensions(guard.dimension(), &records)?;

        let count = records.len();
        let mut next = guard.clone();
        next.items.extend(records);
        self.persist(&next)?;
        *guard = next;
        Ok(count)
    }

    /// Drops every record of `source` and appends `records` in one write.
    pub fn replace_source(
        &self,
        source: &str,
        records: Vec<IndexRecord>,
    ) -> Result<usize, ApiError> {
        let mut guard = self.inner.write().map_err(ApiError::internal)?;

        let mut next = Index {
            items: guard
                .items
                .iter()
                .filter(|record| record.source != source)
                .cloned()
                .collect(),
        };
        check_dimensions(next.dimension(), &records)?;

        let count = records.len();
        next.items.extend(records);
        self.persist(&next)?;
        *guard = next;
        Ok(count)
    }

    /// Removes every record whose `source` equals `source`, keeping the order
    /// of the rest. Returns the number removed.
    pub fn delete_by_source(&self, source: &str) -> Result<usize, ApiError> {
        let mut guard = self.inner.write().map_err(ApiError::internal)?;
        let before = guard.items.len();
        let kept: Vec<IndexRecord> = guard
            .items
            .iter()
            .filter(|record| record.source != source)
            .cloned()
            .collect();
        let removed = before - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let next = Index { items: kept };
        self.persist(&next)?;
        *guard = next;
        Ok(removed)
    }

    /// Swaps in an entirely new record list.
    pub fn replace_all(&self, records: Vec<IndexRecord>) -> Result<(), ApiError> {
        check_dimensions(None, &records)?;
        let next = Index { items: records };
        let mut guard = self.inner.write().map_err(ApiError::internal)?;
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    /// Top-`k` records by cosine similarity to `query`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredRecord>, ApiError> {
        let guard = self.inner.read().map_err(ApiError::internal)?;
        top_k(&guard.items, query, k)
    }

    pub fn sources(&self) -> Result<Vec<SourceSummary>, ApiError> {
        let guard = self.inner.read().map_err(ApiError::internal)?;
        let mut summaries: Vec<SourceSummary> = Vec::new();
        for record in &guard.items {
            match summaries
                .iter_mut()
                .find(|summary| summary.source == record.source)
            {
                Some(summary) => summary.chunks += 1,
                None => summaries.push(SourceSummary {
                    source: record.source.clone(),
                    kind: record.kind,
                    chunks: 1,
                }),
            }
        }
        Ok(summaries)
    }

    fn persist(&self, index: &Index) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ApiError::internal)?;
        }
        let data = serde_json::to_vec(index).map_err(ApiError::internal)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data).map_err(ApiError::internal)?;
        fs::rename(&tmp_path, &self.path).map_err(ApiError::internal)?;
        Ok(())
    }
}

fn load_index(path: &Path) -> Option<Index> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!("Failed to read index {}: {}; starting empty", path.display(), err);
            return None;
        }
    };
    match serde_json::from_str::<Index>(&contents) {
        Ok(index) => Some(index),
        Err(err) => {
            tracing::warn!("Malformed index {}: {}; starting empty", path.display(), err);
            None
        }
    }
}

fn check_dimensions(expected: Option<usize>, records: &[IndexRecord]) -> Result<(), ApiError> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let dimension = expected.unwrap_or(first.embedding.len());
    if dimension == 0 {
        return Err(ApiError::Internal("embedding must not be empty".to_string()));
    }
    if let Some(bad) = records
        .iter()
        .find(|record| record.embedding.len() != dimension)
    {
        return Err(ApiError::Internal(format!(
            "embedding dimension mismatch for {}: expected {}, got {}",
            bad.id,
            dimension,
            bad.embedding.len()
        )));
    }
    Ok(())
}
