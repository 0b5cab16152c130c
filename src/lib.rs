//! YoBit trading client
//!
//! - Durable per-credential nonce counter and cookie session
//! - HMAC-SHA512 request signing
//! - Edge-proxy block detection with a single challenge-and-retry
//! - Public market-data client

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;

pub use adapters::{PublicApiClient, TradeApiClient, TradeApiError};
pub use error::AppError;
