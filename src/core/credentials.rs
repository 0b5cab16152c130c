//! API credential pair
//!
//! The pair identifies the nonce counter and the session file on disk, so
//! two different pairs never share either.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::adapters::errors::{TradeApiError, TradeApiResult};
use crate::core::logging::SanitizedValue;

/// Environment variable holding the public API key
pub const PUBLIC_KEY_ENV: &str = "YOBIT_PUBLIC_KEY";
/// Environment variable holding the private API key
pub const PRIVATE_KEY_ENV: &str = "YOBIT_PRIVATE_KEY";

/// Immutable (public key, private key) pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    public_key: String,
    private_key: String,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> TradeApiResult<Self> {
        let public_key = public_key.into();
        let private_key = private_key.into();
        if public_key.trim().is_empty() {
            return Err(TradeApiError::InvalidCredentials("public key is empty".into()));
        }
        if private_key.trim().is_empty() {
            return Err(TradeApiError::InvalidCredentials("private key is empty".into()));
        }
        Ok(Self {
            public_key,
            private_key,
        })
    }

    /// Create credentials from `YOBIT_PUBLIC_KEY` / `YOBIT_PRIVATE_KEY`
    pub fn from_env() -> TradeApiResult<Self> {
        let public_key = std::env::var(PUBLIC_KEY_ENV)
            .map_err(|_| TradeApiError::InvalidCredentials(format!("{} not set", PUBLIC_KEY_ENV)))?;
        let private_key = std::env::var(PRIVATE_KEY_ENV)
            .map_err(|_| TradeApiError::InvalidCredentials(format!("{} not set", PRIVATE_KEY_ENV)))?;
        Self::new(public_key, private_key)
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Stable per-pair key used to name the nonce and session files.
    ///
    /// Lowercase hex SHA-256 of `public_key ++ private_key`.
    pub fn storage_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.public_key.as_bytes());
        hasher.update(self.private_key.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &SanitizedValue::new(&self.public_key).to_string())
            .field("private_key", &"REDACTED")
            .finish()
    }
}
