use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use super::defaults;
use super::error::ConfigError;
use super::validation::validate_settings;

const REDACT_PLACEHOLDER: &str = "****";

/// Runtime settings, resolved from defaults, an optional YAML file and the
/// process environment (highest precedence).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_dir: Option<PathBuf>,
    pub admin_token: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
    pub min_top_sim: f32,
    pub min_avg_top3: f32,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
    pub fetch_timeout_secs: u64,
    pub max_upload_bytes: usize,
    /// `tracing` filter directives, e.g. `ragate=debug,tower_http=info`.
    pub log_filter: String,
    /// Prefix of the daily log files under `<data_dir>/logs`.
    pub log_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            data_dir: default_data_dir(),
            public_dir: None,
            admin_token: String::new(),
            openai_api_key: String::new(),
            openai_base_url: defaults::OPENAI_BASE_URL.to_string(),
            embedding_model: defaults::EMBEDDING_MODEL.to_string(),
            chat_model: defaults::CHAT_MODEL.to_string(),
            temperature: defaults::TEMPERATURE,
            min_top_sim: defaults::MIN_TOP_SIM,
            min_avg_top3: defaults::MIN_AVG_TOP3,
            top_k: defaults::TOP_K,
            chunk_size: defaults::CHUNK_SIZE,
            chunk_overlap: defaults::CHUNK_OVERLAP,
            embed_batch_size: defaults::EMBED_BATCH_SIZE,
            fetch_timeout_secs: defaults::FETCH_TIMEOUT_SECS,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
            log_filter: defaults::LOG_FILTER.to_string(),
            log_file: defaults::LOG_FILE.to_string(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("public_dir", &self.public_dir)
            .field("admin_token", &redact(&self.admin_token))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("min_top_sim", &self.min_top_sim)
            .field("min_avg_top3", &self.min_avg_top3)
            .field("top_k", &self.top_k)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("embed_batch_size", &self.embed_batch_size)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("log_filter", &self.log_filter)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&|key| env::var(key).ok())
    }

    /// Loads settings with `lookup` standing in for the environment.
    pub fn load_from(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("RAGATE_DATA_DIR").map(PathBuf::from);
        let config_path = lookup("RAGATE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                data_dir
                    .clone()
                    .unwrap_or_else(default_data_dir)
                    .join("config.yml")
            });

        let mut settings = load_yaml_file(&config_path)?.unwrap_or_default();
        settings.apply_env(lookup)?;
        validate_settings(&settings)?;
        Ok(settings)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn apply_env(&mut self, lookup: &dyn Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        override_string(&mut self.host, lookup, &["HOST"]);
        override_parsed(&mut self.port, lookup, &["PORT"])?;
        if let Some((_, dir)) = first_present(lookup, &["RAGATE_DATA_DIR"]) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some((_, dir)) = first_present(lookup, &["RAGATE_PUBLIC_DIR"]) {
            self.public_dir = Some(PathBuf::from(dir));
        }
        override_string(&mut self.admin_token, lookup, &["RAGATE_ADMIN_TOKEN", "ADMIN_TOKEN"]);
        override_string(&mut self.openai_api_key, lookup, &["OPENAI_API_KEY"]);
        override_string(&mut self.openai_base_url, lookup, &["OPENAI_BASE_URL"]);
        override_string(&mut self.embedding_model, lookup, &["RAGATE_EMBEDDING_MODEL"]);
        override_string(&mut self.chat_model, lookup, &["RAGATE_CHAT_MODEL"]);
        override_parsed(&mut self.temperature, lookup, &["RAGATE_TEMPERATURE"])?;
        override_parsed(
            &mut self.min_top_sim,
            lookup,
            &["RAGATE_MIN_TOP_SIM", "MIN_TOP_SIM"],
        )?;
        override_parsed(
            &mut self.min_avg_top3,
            lookup,
            &["RAGATE_MIN_AVG_TOP3", "MIN_AVG_TOP3"],
        )?;
        override_parsed(&mut self.top_k, lookup, &["RAGATE_TOP_K"])?;
        override_parsed(&mut self.chunk_size, lookup, &["RAGATE_CHUNK_SIZE"])?;
        override_parsed(&mut self.chunk_overlap, lookup, &["RAGATE_CHUNK_OVERLAP"])?;
        override_parsed(&mut self.embed_batch_size, lookup, &["RAGATE_EMBED_BATCH_SIZE"])?;
        override_parsed(
            &mut self.fetch_timeout_secs,
            lookup,
            &["RAGATE_FETCH_TIMEOUT_SECS"],
        )?;
        override_parsed(&mut self.max_upload_bytes, lookup, &["RAGATE_MAX_UPLOAD_BYTES"])?;
        override_string(&mut self.log_filter, lookup, &["RAGATE_LOG", "RUST_LOG"]);
        override_string(&mut self.log_file, lookup, &["RAGATE_LOG_FILE"]);
        Ok(())
    }
}

fn load_yaml_file(path: &Path) -> Result<Option<Settings>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(None);
    }

    serde_yaml::from_str::<Settings>(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn first_present(
    lookup: &dyn Fn(&str) -> Option<String>,
    keys: &[&str],
) -> Option<(String, String)> {
    keys.iter().find_map(|key| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| (key.to_string(), value))
    })
}

fn override_string(target: &mut String, lookup: &dyn Fn(&str) -> Option<String>, keys: &[&str]) {
    if let Some((_, value)) = first_present(lookup, keys) {
        *target = value;
    }
}

fn override_parsed<T: FromStr>(
    target: &mut T,
    lookup: &dyn Fn(&str) -> Option<String>,
    keys: &[&str],
) -> Result<(), ConfigError> {
    let Some((key, value)) = first_present(lookup, keys) else {
        return Ok(());
    };
    *target = value
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidEnv { key, value })?;
    Ok(())
}

fn default_data_dir() -> PathBuf {
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("data")
}

fn redact(value: &str) -> &str {
    if value.is_empty() {
        ""
    } else {
        REDACT_PLACEHOLDER
    }
}
