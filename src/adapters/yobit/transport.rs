//! reqwest-backed transport
//!
//! Any HTTP status is handed back as a response; only the absence of a
//! response (connect failure, timeout, unreadable body) is an error.

use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};

use crate::adapters::errors::{TradeApiResult, TransportError};
use crate::adapters::traits::Transport;
use crate::adapters::types::{FormPost, HttpResponse};
use crate::config::constants::HTTP_CONNECT_TIMEOUT_SECS;
use crate::core::session::Cookie;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Transport over a pooled `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> TradeApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS).min(timeout))
            .build()?;
        tracing::info!(
            phase = "init",
            timeout_s = timeout.as_secs(),
            "HTTP client configured"
        );
        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let cookies = response.cookies().map(|c| cookie_from_set_cookie(&c)).collect();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("failed to read response body: {}", e)))?;
        Ok(HttpResponse {
            status,
            body,
            cookies,
        })
    }
}

fn cookie_from_set_cookie(c: &reqwest::cookie::Cookie<'_>) -> Cookie {
    Cookie {
        name: c.name().to_string(),
        value: c.value().to_string(),
        domain: c.domain().map(str::to_string),
        path: c.path().unwrap_or("/").to_string(),
        max_age: c.max_age().map(|d| d.as_secs()),
        expires: c
            .expires()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64),
        secure: c.secure(),
        discard: false,
        http_only: c.http_only(),
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_form(&self, request: FormPost<'_>) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .post(request.url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(request.body.to_string());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(cookie) = &request.cookie_header {
            builder = builder.header(COOKIE, cookie);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(url = request.url, error = %e, "POST failed without a response");
            TransportError(e.to_string())
        })?;
        Self::read(response).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!(url, error = %e, "GET failed without a response");
            TransportError(e.to_string())
        })?;
        Self::read(response).await
    }
}
