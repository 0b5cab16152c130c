//! Trading API error types
//!
//! Every failure of the request pipeline is surfaced as a `TradeApiError`.
//! Nothing is swallowed and nothing is retried beyond the single
//! challenge retry performed by the trade client.

use thiserror::Error;

use crate::core::storage::StorageError;

/// Failure of the out-of-process browser challenge solver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChallengeError {
    /// The solver could not be run at all (missing program, timeout)
    #[error("Challenge solver unavailable: {0}")]
    Unavailable(String),

    /// The solver ran but produced no usable cookies
    #[error("Challenge solver failed: {0}")]
    Failed(String),
}

/// No response object could be obtained from the exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Errors returned by the trade and public API clients
#[derive(Error, Debug)]
pub enum TradeApiError {
    /// No usable response from the exchange (connection refused, timeout)
    #[error("API disabled: {0}")]
    ApiDisabled(String),

    /// Edge-proxy block not resolved within the one allowed challenge retry
    #[error("API blocked by DDoS protection")]
    ApiBlocked {
        /// Raw body of the last blocked response
        body: String,
        /// Solver failure that prevented the resend, if any
        #[source]
        challenge: Option<ChallengeError>,
    },

    /// Response was neither blocked nor disabled but is not valid JSON
    #[error("Malformed response: {source}")]
    MalformedResponse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// Nonce or session persistence failed
    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),

    /// Empty or otherwise unusable API keys
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Request parameters could not be form-encoded
    #[error("Parameter encoding failed: {0}")]
    Encoding(#[from] serde_urlencoded::ser::Error),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TradeApiError {
    /// Raw response body attached to the error, when one was received
    pub fn body(&self) -> Option<&str> {
        match self {
            TradeApiError::ApiBlocked { body, .. } => Some(body),
            TradeApiError::MalformedResponse { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Solver failure behind an `ApiBlocked`, if the resend never happened
    pub fn challenge_error(&self) -> Option<&ChallengeError> {
        match self {
            TradeApiError::ApiBlocked { challenge, .. } => challenge.as_ref(),
            _ => None,
        }
    }
}

/// Result type alias for trading API operations
pub type TradeApiResult<T> = std::result::Result<T, TradeApiError>;
