//! Configuration module for client settings and YAML loading
//!
//! This module provides:
//! - Configuration types (`ClientConfig` and its sections)
//! - YAML loading functionality (`load_config`)
//! - Endpoint defaults and timeouts with environment variable overrides

pub mod constants;
mod loader;
pub mod types;

pub use types::{ChallengeConfig, ClientConfig, EndpointConfig, HttpConfig, StorageConfig};

pub use loader::{load_config, load_config_from_str};
