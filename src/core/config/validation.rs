use tracing_subscriber::EnvFilter;

use super::error::ConfigError;
use super::settings::Settings;

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    validate_chunking(settings.chunk_size, settings.chunk_overlap)?;
    validate_threshold("min_top_sim", settings.min_top_sim)?;
    validate_threshold("min_avg_top3", settings.min_avg_top3)?;
    validate_nonzero("top_k", settings.top_k)?;
    validate_nonzero("embed_batch_size", settings.embed_batch_size)?;
    validate_nonzero("max_upload_bytes", settings.max_upload_bytes)?;

    if settings.fetch_timeout_secs == 0 {
        return Err(invalid("fetch_timeout_secs", "must be at least 1 second"));
    }
    if !(0.0..=2.0).contains(&settings.temperature) {
        return Err(invalid(
            "temperature",
            format!("{} is outside 0.0..=2.0", settings.temperature),
        ));
    }
    if settings.openai_base_url.trim().is_empty() {
        return Err(invalid("openai_base_url", "must not be empty"));
    }
    if let Err(err) = EnvFilter::try_new(&settings.log_filter) {
        return Err(invalid("log_filter", err.to_string()));
    }
    let log_file = settings.log_file.trim();
    if log_file.is_empty() || log_file.contains(['/', '\\']) {
        return Err(invalid("log_file", "must be a bare file name"));
    }

    Ok(())
}

/// A window that does not advance would never terminate.
pub fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<(), ConfigError> {
    if chunk_size == 0 {
        return Err(invalid("chunk_size", "must be greater than zero"));
    }
    if chunk_overlap >= chunk_size {
        return Err(invalid(
            "chunk_overlap",
            format!(
                "overlap {} must be smaller than chunk size {}",
                chunk_overlap, chunk_size
            ),
        ));
    }
    Ok(())
}

fn validate_threshold(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("{} is outside -1.0..=1.0", value)));
    }
    Ok(())
}

fn validate_nonzero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let settings = Settings {
            min_top_sim: 1.5,
            ..Settings::default()
        };
        let err = validate_settings(&settings).expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid { field: "min_top_sim", .. }));
    }

    #[test]
    fn rejects_zero_top_k() {
        let settings = Settings {
            top_k: 0,
            ..Settings::default()
        };
        let err = validate_settings(&settings).expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid { field: "top_k", .. }));
    }

    #[test]
    fn rejects_bad_log_settings() {
        let settings = Settings {
            log_filter: "ragate=loud".to_string(),
            ..Settings::default()
        };
        let err = validate_settings(&settings).expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid { field: "log_filter", .. }));

        let settings = Settings {
            log_file: "../escape.log".to_string(),
            ..Settings::default()
        };
        let err = validate_settings(&settings).expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid { field: "log_file", .. }));
    }

    #[test]
    fn chunking_requires_advancing_window() {
        assert!(validate_chunking(800, 200).is_ok());
        assert!(validate_chunking(800, 799).is_ok());
        assert!(validate_chunking(800, 800).is_err());
        assert!(validate_chunking(800, 900).is_err());
        assert!(validate_chunking(0, 0).is_err());
    }
}
