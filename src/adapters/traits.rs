//! Seams of the request pipeline
//!
//! The trade client depends on these traits only, so the HTTP stack and
//! the browser-challenge backend can be swapped (stubs in tests, a
//! different solver in production).

use async_trait::async_trait;

use crate::adapters::errors::{ChallengeError, TransportError};
use crate::adapters::types::{FormPost, HttpResponse};
use crate::core::session::Cookie;

/// Raw HTTP transport
///
/// `Err` means no response object was obtained (no TCP connection,
/// timeout, unreadable body). Any status code, including 4xx/5xx, is an
/// `Ok` response for the classifier to inspect.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_form(&self, request: FormPost<'_>) -> Result<HttpResponse, TransportError>;

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Out-of-process browser challenge solver
///
/// Given the POST target and the URL-encoded payload that was blocked,
/// returns the cookie set that proves the challenge was passed.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    async fn solve(&self, base_url: &str, payload: &str) -> Result<Vec<Cookie>, ChallengeError>;
}
