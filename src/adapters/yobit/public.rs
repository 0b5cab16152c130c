//! YoBit public market-data API (`/api/3/`)
//!
//! Unauthenticated GETs. There is no challenge path here: a block page is
//! reported as `ApiDisabled` together with its body.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::adapters::errors::{TradeApiError, TradeApiResult};
use crate::adapters::traits::Transport;
use crate::adapters::types::{join_pairs, CurrencyPair, Outcome};
use crate::config::types::ClientConfig;

use super::classify::classify;
use super::transport::ReqwestTransport;

/// Client for the public market-data endpoints
pub struct PublicApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl PublicApiClient {
    /// `base_url` must end with `/`; endpoint paths are appended to it
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn from_config(config: &ClientConfig) -> TradeApiResult<Self> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.http.timeout_secs))?;
        Ok(Self::new(config.endpoints.public_url.clone(), Arc::new(transport)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Server time and per-pair trading rules
    pub async fn get_info(&self) -> TradeApiResult<Value> {
        self.fetch("info").await
    }

    /// Order books for several pairs
    pub async fn get_depths(&self, pairs: &[CurrencyPair]) -> TradeApiResult<Value> {
        self.fetch(&format!("depth/{}", join_pairs(pairs))).await
    }

    pub async fn get_depth(&self, from: &str, to: &str) -> TradeApiResult<Value> {
        self.get_depths(&[CurrencyPair::new(from, to)]).await
    }

    /// Recent trades for several pairs
    pub async fn get_trades(&self, pairs: &[CurrencyPair]) -> TradeApiResult<Value> {
        self.fetch(&format!("trades/{}", join_pairs(pairs))).await
    }

    pub async fn get_trade(&self, from: &str, to: &str) -> TradeApiResult<Value> {
        self.get_trades(&[CurrencyPair::new(from, to)]).await
    }

    /// 24h ticker statistics for several pairs
    pub async fn get_tickers(&self, pairs: &[CurrencyPair]) -> TradeApiResult<Value> {
        self.fetch(&format!("ticker/{}", join_pairs(pairs))).await
    }

    pub async fn get_ticker(&self, from: &str, to: &str) -> TradeApiResult<Value> {
        self.get_tickers(&[CurrencyPair::new(from, to)]).await
    }

    async fn fetch(&self, path: &str) -> TradeApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.transport.get(&url).await;
        let outcome = classify(response.as_ref().ok())?;

        match outcome {
            Outcome::Success(payload) => Ok(payload),
            Outcome::ServiceDisabled => Err(TradeApiError::ApiDisabled(
                response.err().map(|e| e.0).unwrap_or_default(),
            )),
            Outcome::Blocked(body) => {
                tracing::warn!(url = %url, "Public API blocked by edge proxy");
                Err(TradeApiError::ApiDisabled(body))
            }
        }
    }
}
