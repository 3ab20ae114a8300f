use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};

use crate::core::errors::ApiError;
use crate::rag::extract::{html_to_text, normalize_whitespace, pdf_to_text};
use super::provider::Fetcher;

/// Fetches web pages and PDFs over HTTP(S) and reduces them to plain text.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("ragate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self { client })
    }
}

/// Accepts only absolute `http`/`https` URLs.
pub fn validate_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid URL {:?}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::BadRequest(format!(
            "Unsupported URL scheme: {}",
            other
        ))),
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, ApiError> {
        let url = validate_url(url)?;
        let res = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(ApiError::upstream)?;

        let status = res.status();
        if !status.is_success() {
            return Err(ApiError::Upstream(format!(
                "fetch {} failed with HTTP {}",
                url,
                status.as_u16()
            )));
        }

        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.contains("application/pdf") || url.path().to_ascii_lowercase().ends_with(".pdf") {
            let bytes = res.bytes().await.map_err(ApiError::upstream)?.to_vec();
            return tokio::task::spawn_blocking(move || pdf_to_text(&bytes))
                .await
                .map_err(|e| ApiError::BadRequest(format!("PDF extraction failed: {}", e)))?;
        }

        let body = res.text().await.map_err(ApiError::upstream)?;
        if content_type.contains("text/plain") {
            return Ok(normalize_whitespace(&body));
        }
        Ok(html_to_text(&body))
    }
}
