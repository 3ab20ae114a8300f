use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

use crate::core::errors::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// Static token guarding the admin routes.
#[derive(Clone)]
pub struct AdminToken {
    value: String,
}

impl AdminToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into().trim().to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.value.is_empty()
    }

    fn matches(&self, candidate: &str) -> bool {
        if !self.is_configured() {
            return false;
        }
        self.value.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminToken")
            .field("configured", &self.is_configured())
            .finish()
    }
}

pub fn require_admin(headers: &HeaderMap, expected: &AdminToken) -> Result<(), ApiError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let Some(token) = header_value.strip_prefix(BEARER_PREFIX) else {
        return Err(ApiError::Unauthorized);
    };

    if !expected.matches(token.trim()) {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}
