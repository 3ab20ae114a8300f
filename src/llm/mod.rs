//! Clients for the external services the pipeline depends on.
//!
//! The retrieval and gating code only sees the [`Embedder`], [`Completer`]
//! and [`Fetcher`] traits; the OpenAI-compatible client and the HTTP fetcher
//! are the production implementations.

pub mod fetch;
pub mod openai;
pub mod provider;
pub mod types;

pub use fetch::HttpFetcher;
pub use openai::OpenAiClient;
pub use provider::{Completer, Embedder, Fetcher};
pub use types::ChatMessage;
