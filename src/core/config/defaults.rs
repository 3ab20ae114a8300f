pub const HOST: &str = "127.0.0.1";
pub const PORT: u16 = 3000;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const CHAT_MODEL: &str = "gpt-4o-mini";
pub const TEMPERATURE: f32 = 0.1;

/// Rank-1 similarity below this refuses the question.
pub const MIN_TOP_SIM: f32 = 0.78;
/// Mean similarity of ranks 1..=3 below this refuses the question.
pub const MIN_AVG_TOP3: f32 = 0.72;
pub const TOP_K: usize = 6;

pub const CHUNK_SIZE: usize = 800;
pub const CHUNK_OVERLAP: usize = 200;
pub const EMBED_BATCH_SIZE: usize = 64;

pub const LOG_FILTER: &str = "ragate=info,tower_http=info";
pub const LOG_FILE: &str = "ragate.log";

pub const FETCH_TIMEOUT_SECS: u64 = 30;
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
