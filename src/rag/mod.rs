//! Retrieval-augmented question answering.
//!
//! Ingestion: `extract` → `chunker` → embedder → `store`.
//! Query: embedder → `retriever` (via the store) → `gate` → `answer` or refusal.

pub mod answer;
pub mod chunker;
pub mod extract;
pub mod gate;
pub mod ingest;
pub mod qa;
pub mod retriever;
pub mod sources;
pub mod store;

pub use answer::{Answer, AnswerGenerator, SourceRef};
pub use chunker::Chunker;
pub use gate::{ConfidenceGate, GateOutcome};
pub use ingest::{IngestedSource, Ingestor, RebuildReport, RemovedSource, SourceFailure};
pub use qa::QaService;
pub use retriever::ScoredRecord;
pub use sources::SourceRegistry;
pub use store::{IndexRecord, SourceKind, SourceSummary, VectorStore};
