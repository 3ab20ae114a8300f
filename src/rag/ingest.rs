//! Extract → chunk → embed → store.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::core::errors::ApiError;
use crate::llm::fetch::validate_url;
use crate::llm::{Embedder, Fetcher};
use super::chunker::Chunker;
use super::extract::extract_document;
use super::sources::{display_name, sanitize_filename, SourceRegistry};
use super::store::{IndexRecord, SourceKind, VectorStore};

/// Outcome of ingesting one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestedSource {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Summary of a full rebuild. Failed sources are skipped, not fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub sources: usize,
    pub chunks: usize,
    pub failed: Vec<SourceFailure>,
}

/// Outcome of removing one source from the index and the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedSource {
    pub source: String,
    pub removed: usize,
    pub untracked: bool,
}

/// Owns every admin-side write to the index and the source registry.
///
/// Writes hold `write_lock` from the first read of tracked state to the last
/// store mutation, so a rebuild cannot swap in a snapshot that predates an
/// upload, URL add, or delete that finished while it was embedding.
#[derive(Clone)]
pub struct Ingestor {
    store: VectorStore,
    registry: SourceRegistry,
    embedder: Arc<dyn Embedder>,
    fetcher: Arc<dyn Fetcher>,
    chunker: Chunker,
    write_lock: Arc<Mutex<()>>,
}

impl Ingestor {
    pub fn new(
        store: VectorStore,
        registry: SourceRegistry,
        embedder: Arc<dyn Embedder>,
        fetcher: Arc<dyn Fetcher>,
        chunker: Chunker,
    ) -> Self {
        Self {
            store,
            registry,
            embedder,
            fetcher,
            chunker,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Chunks and embeds `text` without touching the store.
    pub async fn embed_source(
        &self,
        kind: SourceKind,
        source: &str,
        text: &str,
    ) -> Result<Vec<IndexRecord>, ApiError> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "No text could be extracted from {}",
                source
            )));
        }

        let embeddings = self.embedder.embed(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(ApiError::Upstream(format!(
                "embedding service returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        Ok(chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| IndexRecord::new(kind, source, i, chunk, embedding))
            .collect())
    }

    /// Indexes `text` under `source`, replacing earlier records of that source.
    pub async fn ingest_text(
        &self,
        kind: SourceKind,
        source: &str,
        text: &str,
    ) -> Result<IngestedSource, ApiError> {
        let _guard = self.write_lock.lock().await;
        self.index_text(kind, source, text).await
    }

    async fn index_text(
        &self,
        kind: SourceKind,
        source: &str,
        text: &str,
    ) -> Result<IngestedSource, ApiError> {
        let records = self.embed_source(kind, source, text).await?;
        let chunks = self.store.replace_source(source, records)?;
        tracing::info!("Indexed {} ({} chunks)", source, chunks);
        Ok(IngestedSource {
            source: source.to_string(),
            kind,
            chunks,
        })
    }

    /// Extracts, embeds and indexes an uploaded file, then backs it up for
    /// rebuilds. The backup is only written once the index accepted the
    /// records, so a failed upload is never picked up by a later rebuild.
    pub async fn ingest_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestedSource, ApiError> {
        let _guard = self.write_lock.lock().await;
        let name = sanitize_filename(filename)?;
        let text = extract_document(&name, bytes.clone()).await?;
        let records = self.embed_source(SourceKind::File, &name, &text).await?;

        let chunks = self.store.replace_source(&name, records)?;
        if let Err(err) = self.registry.backup_file(&name, &bytes) {
            // an indexed file without a backup would vanish on rebuild
            if let Err(undo) = self.store.delete_by_source(&name) {
                tracing::error!("Failed to drop {} after backup error: {}", name, undo);
            }
            return Err(err);
        }
        tracing::info!("Indexed upload {} ({} chunks)", name, chunks);
        Ok(IngestedSource {
            source: name,
            kind: SourceKind::File,
            chunks,
        })
    }

    /// Fetches and indexes `url`, then adds it to the tracked URL list.
    pub async fn add_url(&self, url: &str) -> Result<IngestedSource, ApiError> {
        let url = validate_url(url)?.to_string();
        let _guard = self.write_lock.lock().await;
        let text = self.fetcher.fetch_text(&url).await?;
        let ingested = self.index_text(SourceKind::Url, &url, &text).await?;
        if self.registry.add_url(&url)? {
            tracing::info!("Tracking URL {}", url);
        }
        Ok(ingested)
    }

    /// Drops every record of `source` and stops tracking it, so a rebuild
    /// does not bring it back.
    pub async fn delete_source(&self, source: &str) -> Result<RemovedSource, ApiError> {
        let _guard = self.write_lock.lock().await;
        let removed = self.store.delete_by_source(source)?;
        let untracked = self.registry.untrack(source)?;
        tracing::info!("Deleted {} records for {}", removed, source);
        Ok(RemovedSource {
            source: source.to_string(),
            removed,
            untracked,
        })
    }

    /// Re-ingests every tracked file and URL and swaps in the result as the
    /// whole index. A source that fails is logged and left out.
    pub async fn rebuild(&self) -> Result<RebuildReport, ApiError> {
        let _guard = self.write_lock.lock().await;
        let files = self.registry.list_files()?;
        let urls = self.registry.list_urls()?;
        tracing::info!(
            "Rebuilding index from {} files and {} URLs",
            files.len(),
            urls.len()
        );

        let mut report = RebuildReport::default();
        let mut records = Vec::new();

        for path in &files {
            let source = display_name(path);
            match self.rebuild_file(path, &source).await {
                Ok(mut batch) => {
                    report.sources += 1;
                    report.chunks += batch.len();
                    records.append(&mut batch);
                }
                Err(err) => {
                    tracing::warn!("Skipping file {} during rebuild: {}", source, err);
                    report.failed.push(SourceFailure {
                        source,
                        error: err.message(),
                    });
                }
            }
        }

        for url in &urls {
            match self.rebuild_url(url).await {
                Ok(mut batch) => {
                    report.sources += 1;
                    report.chunks += batch.len();
                    records.append(&mut batch);
                }
                Err(err) => {
                    tracing::warn!("Skipping URL {} during rebuild: {}", url, err);
                    report.failed.push(SourceFailure {
                        source: url.clone(),
                        error: err.message(),
                    });
                }
            }
        }

        self.store.replace_all(records)?;
        tracing::info!(
            "Rebuild finished: {} sources, {} chunks, {} failed",
            report.sources,
            report.chunks,
            report.failed.len()
        );
        Ok(report)
    }

    async fn rebuild_file(&self, path: &Path, source: &str) -> Result<Vec<IndexRecord>, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(ApiError::internal)?;
        let text = extract_document(source, bytes).await?;
        self.embed_source(SourceKind::File, source, &text).await
    }

    async fn rebuild_url(&self, url: &str) -> Result<Vec<IndexRecord>, ApiError> {
        let text = self.fetcher.fetch_text(url).await?;
        self.embed_source(SourceKind::Url, url, &text).await
    }
}
