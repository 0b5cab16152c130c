//! Configuration types for the exchange clients
//!
//! Every section has defaults, so an empty YAML document is a valid
//! configuration pointing at the production endpoints.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::constants::{
    DEFAULT_CHALLENGE_PROGRAM, DEFAULT_CHALLENGE_SCRIPT, DEFAULT_CHALLENGE_TIMEOUT_SECS,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PUBLIC_URL, DEFAULT_TRADE_URL,
};

// ============================================================================
// Sections
// ============================================================================

/// Base URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub trade_url: String,
    /// Must end with `/`
    pub public_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            trade_url: DEFAULT_TRADE_URL.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
        }
    }
}

/// Where nonce and session files live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for `yobit_nonce_<key>.txt` and `yobit_trade_<key>_cookie.json`
    pub dir: PathBuf,
    /// Single nonce file shared by every credential pair, instead of one per pair
    pub nonce_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
            nonce_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// External challenge solver invocation: `<program> [script] <url> <payload>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub program: String,
    pub script: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_CHALLENGE_PROGRAM.to_string(),
            script: Some(PathBuf::from(DEFAULT_CHALLENGE_SCRIPT)),
            timeout_secs: DEFAULT_CHALLENGE_TIMEOUT_SECS,
        }
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoints: EndpointConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
    pub challenge: ChallengeConfig,
}

impl ClientConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, url) in [
            ("trade_url", &self.endpoints.trade_url),
            ("public_url", &self.endpoints.public_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(AppError::Config(format!(
                    "endpoints.{} must be an http(s) URL (got '{}')",
                    name, url
                )));
            }
        }

        if !self.endpoints.public_url.ends_with('/') {
            return Err(AppError::Config(format!(
                "endpoints.public_url must end with '/' (got '{}')",
                self.endpoints.public_url
            )));
        }

        if self.storage.dir.as_os_str().is_empty() {
            return Err(AppError::Config("storage.dir cannot be empty".to_string()));
        }

        if self.http.timeout_secs == 0 {
            return Err(AppError::Config("http.timeout_secs must be > 0".to_string()));
        }

        if self.challenge.program.trim().is_empty() {
            return Err(AppError::Config(
                "challenge.program cannot be empty".to_string(),
            ));
        }

        if self.challenge.timeout_secs == 0 {
            return Err(AppError::Config(
                "challenge.timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
