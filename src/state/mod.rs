use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppPaths, Settings};
use crate::core::security::AdminToken;
use crate::llm::{Completer, Embedder, Fetcher, HttpFetcher, OpenAiClient};
use crate::rag::{
    AnswerGenerator, Chunker, ConfidenceGate, Ingestor, QaService, SourceRegistry, VectorStore,
};

pub mod error;

use error::InitializationError;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Arc<Settings>,
    pub admin_token: AdminToken,
    pub store: VectorStore,
    pub ingestor: Ingestor,
    pub qa: QaService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Builds state backed by the OpenAI-compatible API and a real HTTP
    /// fetcher.
    pub fn initialize(settings: Settings) -> Result<Arc<Self>, InitializationError> {
        if settings.openai_api_key.trim().is_empty() {
            tracing::warn!("OPENAI_API_KEY is not set; embedding and completion calls will fail");
        }

        let openai = Arc::new(OpenAiClient::new(&settings));
        let fetcher = Arc::new(
            HttpFetcher::new(settings.fetch_timeout_secs)
                .map_err(InitializationError::HttpClient)?,
        );
        Self::with_services(settings, openai.clone(), openai, fetcher)
    }

    /// Builds state around caller-supplied external services.
    pub fn with_services(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new(&settings.data_dir));
        let admin_token = AdminToken::new(settings.admin_token.clone());
        if !admin_token.is_configured() {
            tracing::warn!("Admin token is not set; admin routes will reject every request");
        }

        let chunker = Chunker::new(settings.chunk_size, settings.chunk_overlap)?;
        let store = VectorStore::open(&paths.index_path);
        let registry = SourceRegistry::new(&paths);

        let ingestor = Ingestor::new(
            store.clone(),
            registry,
            embedder.clone(),
            fetcher,
            chunker,
        );
        let qa = QaService::new(
            store.clone(),
            embedder,
            AnswerGenerator::new(completer),
            ConfidenceGate::new(settings.min_top_sim, settings.min_avg_top3),
            settings.top_k,
        );

        Ok(Arc::new(AppState {
            paths,
            settings: Arc::new(settings),
            admin_token,
            store,
            ingestor,
            qa,
            started_at: Utc::now(),
        }))
    }
}
