//! Application-wide error types using thiserror
//!
//! Configuration loading and binaries report through `AppError`; the
//! trading pipeline's own failures arrive wrapped as `AppError::Api`.

use thiserror::Error;

use crate::adapters::errors::TradeApiError;
use crate::core::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Trade API error: {0}")]
    Api(#[from] TradeApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_api_error_converts_to_app_error() {
        let api_err = TradeApiError::ApiDisabled("timeout".into());
        let app_err: AppError = api_err.into();
        let msg = app_err.to_string();
        assert!(msg.contains("Trade API error"), "Got: {}", msg);
        assert!(msg.contains("timeout"), "Got: {}", msg);
    }

    #[test]
    fn test_serde_error_converts_to_app_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = serde_err.into();
        assert!(app_err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_io_error_converts_to_app_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let app_err: AppError = io_err.into();
        let msg = app_err.to_string();
        assert!(msg.contains("IO error"), "Got: {}", msg);
        assert!(msg.contains("file missing"), "Got: {}", msg);
    }

    #[test]
    fn test_config_error_display() {
        let err = AppError::Config("missing API key".into());
        assert_eq!(err.to_string(), "Configuration error: missing API key");
    }
}
