//! Bearer token validation for spider requests
//!
//! Tokens are never stored; the config lists hex-encoded SHA-256 hashes and
//! a presented token is accepted if its hash is one of them.

use crate::config::AuthConfig;
use crate::AuthError;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Checks `Authorization` header values against configured token hashes
#[derive(Debug, Clone, Default)]
pub struct TokenValidator {
    token_hashes: HashSet<String>,
}

impl TokenValidator {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            token_hashes: config
                .token_hashes
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Auth is disabled when no token hashes are configured
    pub fn is_enabled(&self) -> bool {
        !self.token_hashes.is_empty()
    }

    /// Validates an `Authorization` header value (`Bearer <token>`)
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Token accepted, or auth disabled
    /// * `Err(AuthError::MissingToken)` - No header or not a bearer token
    /// * `Err(AuthError::InvalidToken)` - Token hash not configured
    pub fn validate(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let token = authorization
            .map(str::trim)
            .and_then(|value| {
                let (scheme, token) = value.split_once(' ')?;
                scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
            })
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        if self.token_hashes.contains(&hash_token(token)) {
            Ok(())
        } else {
            tracing::warn!("Rejected request with unknown bearer token");
            Err(AuthError::InvalidToken)
        }
    }
}

/// Hex-encoded SHA-256 of a token, the form stored in `token-hashes`
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
