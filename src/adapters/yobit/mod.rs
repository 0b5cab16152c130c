//! YoBit exchange clients
//!
//! - `adapter`: authenticated trade API with challenge-and-retry
//! - `public`: market-data API
//! - `signing`, `classify`: pure request/response helpers
//! - `transport`, `challenge`: default HTTP and solver backends

pub mod adapter;
pub mod challenge;
pub mod classify;
pub mod public;
pub mod signing;
pub mod transport;

pub use adapter::{TradeApiClient, TradeApiClientBuilder};
pub use challenge::{normalize_cookies, CommandChallengeSolver};
pub use classify::{classify, is_block_page, BLOCK_MARKER, BLOCK_STATUS};
pub use public::PublicApiClient;
pub use signing::{sign, RequestSigner, SignedRequest};
pub use transport::ReqwestTransport;
