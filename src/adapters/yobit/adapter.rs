//! YoBit trade API client
//!
//! `TradeApiClient::call` drives one request through a small state machine:
//!
//! ```text
//! Send(First) --Blocked--> Challenge --solved--> Send(Resend) --Blocked--> ApiBlocked
//!      |                       |                      |
//!   Success / Disabled     solver error           Success / Disabled
//! ```
//!
//! The nonce is taken once, before the first send. The resend reuses the
//! same signed payload, so a challenge never consumes a second nonce.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::adapters::errors::{TradeApiError, TradeApiResult, TransportError};
use crate::adapters::traits::{ChallengeSolver, Transport};
use crate::adapters::types::{CurrencyPair, FormPost, HttpResponse, Outcome, Params, TradeSide};
use crate::config::constants::{challenge_timeout, http_timeout, DEFAULT_TRADE_URL};
use crate::config::types::{ChallengeConfig, ClientConfig};
use crate::core::credentials::Credentials;
use crate::core::logging::{sanitize_signature, SanitizedValue};
use crate::core::nonce::{FileNonceStore, NonceStore};
use crate::core::session::{FileSessionStore, Session, SessionStore};
use crate::core::storage::StorageError;

use super::challenge::CommandChallengeSolver;
use super::classify::classify;
use super::signing::{RequestSigner, SignedRequest};
use super::transport::ReqwestTransport;

// =============================================================================
// Call state machine
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Resend,
}

#[derive(Debug)]
enum CallState {
    Send(Attempt),
    /// Blocked on the first attempt; carries the block page body
    Challenge(String),
}

// =============================================================================
// Trade API Client
// =============================================================================

/// Authenticated client for the YoBit trade API (`/tapi/`)
pub struct TradeApiClient {
    base_url: String,
    credentials: Credentials,
    signer: RequestSigner,
    nonce_store: Arc<dyn NonceStore>,
    session_store: Arc<dyn SessionStore>,
    /// In-memory session; merged from `Set-Cookie`, replaced after a challenge
    session: Mutex<Session>,
    transport: Arc<dyn Transport>,
    solver: Arc<dyn ChallengeSolver>,
}

impl std::fmt::Debug for TradeApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeApiClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl TradeApiClient {
    pub fn builder(credentials: Credentials) -> TradeApiClientBuilder {
        TradeApiClientBuilder::new(credentials)
    }

    /// Client with file-backed stores, the reqwest transport and the
    /// command solver, all taken from `config`
    pub fn from_config(config: &ClientConfig, credentials: Credentials) -> TradeApiResult<Self> {
        let nonce_store = match &config.storage.nonce_file {
            Some(path) => FileNonceStore::open(path)?,
            None => FileNonceStore::for_credentials(&config.storage.dir, &credentials)?,
        };
        let session_store = FileSessionStore::for_credentials(&config.storage.dir, &credentials);
        let transport = ReqwestTransport::new(Duration::from_secs(config.http.timeout_secs))?;
        let solver = CommandChallengeSolver::from_config(&config.challenge);

        TradeApiClientBuilder::new(credentials)
            .base_url(config.endpoints.trade_url.clone())
            .nonce_store(Arc::new(nonce_store))
            .session_store(Arc::new(session_store))
            .transport(Arc::new(transport))
            .challenge_solver(Arc::new(solver))
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Snapshot of the current cookie session
    pub fn session(&self) -> Session {
        self.session_guard().clone()
    }

    /// Persist the in-memory session, including cookies merged from
    /// ordinary responses
    pub fn save_session(&self) -> TradeApiResult<()> {
        let session = self.session();
        self.session_store.save(&session)?;
        tracing::debug!(cookie_count = session.len(), "Session saved");
        Ok(())
    }

    /// Send `method` with `params` and return the decoded payload.
    ///
    /// Exchange-level errors (`{"success":0,"error":...}`) are returned as
    /// payload. At most one challenge solve and one resend happen per call.
    pub async fn call(&self, method: &str, params: Params) -> TradeApiResult<Value> {
        // File-backed stores block on disk I/O and the cross-process lock
        let store = Arc::clone(&self.nonce_store);
        let nonce = tokio::task::spawn_blocking(move || store.next())
            .await
            .map_err(|e| StorageError::Worker(e.to_string()))??;
        let request = self.signer.sign_request(method, params, nonce)?;

        tracing::debug!(
            method,
            nonce,
            key = %SanitizedValue::new(self.credentials.public_key()),
            sign = %sanitize_signature(&request.signature),
            "Trade API request"
        );

        let mut state = CallState::Send(Attempt::First);
        loop {
            state = match state {
                CallState::Send(attempt) => {
                    let response = self.send(&request).await;
                    let outcome = classify(response.as_ref().ok())?;
                    match outcome {
                        Outcome::Success(payload) => {
                            if attempt == Attempt::Resend {
                                tracing::info!(method, nonce, "Request succeeded after challenge");
                            }
                            return Ok(payload);
                        }
                        Outcome::ServiceDisabled => {
                            let cause = response.err().map(|e| e.0).unwrap_or_default();
                            tracing::warn!(method, nonce, cause = %cause, "Trade API unreachable");
                            return Err(TradeApiError::ApiDisabled(cause));
                        }
                        Outcome::Blocked(body) => match attempt {
                            Attempt::First => {
                                tracing::warn!(method, nonce, "Blocked by edge proxy, solving challenge");
                                CallState::Challenge(body)
                            }
                            Attempt::Resend => {
                                tracing::error!(method, nonce, "Still blocked after challenge");
                                return Err(TradeApiError::ApiBlocked {
                                    body,
                                    challenge: None,
                                });
                            }
                        },
                    }
                }
                CallState::Challenge(body) => {
                    match self.solver.solve(&self.base_url, &request.payload).await {
                        Ok(cookies) => {
                            self.replace_session(Session::from_cookies(cookies))?;
                            CallState::Send(Attempt::Resend)
                        }
                        Err(e) => {
                            tracing::error!(method, nonce, error = %e, "Challenge not solved");
                            return Err(TradeApiError::ApiBlocked {
                                body,
                                challenge: Some(e),
                            });
                        }
                    }
                }
            };
        }
    }

    // =========================================================================
    // Trade API methods
    // =========================================================================

    /// Balances, rights and open order counts
    pub async fn get_info(&self) -> TradeApiResult<Value> {
        self.call("getInfo", Params::new()).await
    }

    pub async fn get_active_orders(&self, pair: impl Into<CurrencyPair>) -> TradeApiResult<Value> {
        self.call("ActiveOrders", Params::new().with("pair", pair.into()))
            .await
    }

    /// Place a limit order
    pub async fn trade(
        &self,
        pair: impl Into<CurrencyPair>,
        side: TradeSide,
        rate: Decimal,
        amount: Decimal,
    ) -> TradeApiResult<Value> {
        let params = Params::new()
            .with("pair", pair.into())
            .with("type", side)
            .with("rate", rate.normalize())
            .with("amount", amount.normalize());
        self.call("Trade", params).await
    }

    pub async fn cancel_order(&self, order_id: u64) -> TradeApiResult<Value> {
        self.call("CancelOrder", Params::new().with("order_id", order_id))
            .await
    }

    pub async fn get_order_info(&self, order_id: u64) -> TradeApiResult<Value> {
        self.call("OrderInfo", Params::new().with("order_id", order_id))
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn session_guard(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn send(&self, request: &SignedRequest) -> Result<HttpResponse, TransportError> {
        let cookie_header = self.session_guard().cookie_header(now());
        let post = FormPost {
            url: &self.base_url,
            body: &request.payload,
            headers: vec![
                ("Key", self.credentials.public_key().to_string()),
                ("Sign", request.signature.clone()),
            ],
            cookie_header,
        };

        let response = self.transport.post_form(post).await?;
        if !response.cookies.is_empty() {
            let mut session = self.session_guard();
            for cookie in &response.cookies {
                session.merge(cookie.clone());
            }
        }
        tracing::debug!(status = response.status, "Trade API response");
        Ok(response)
    }

    fn replace_session(&self, session: Session) -> TradeApiResult<()> {
        self.session_store.save(&session)?;
        tracing::info!(cookie_count = session.len(), "Session replaced after challenge");
        *self.session_guard() = session;
        Ok(())
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`TradeApiClient`]
///
/// Unset collaborators default to file stores under the system temp
/// directory, the reqwest transport and the command solver.
pub struct TradeApiClientBuilder {
    credentials: Credentials,
    base_url: String,
    storage_dir: Option<PathBuf>,
    nonce_store: Option<Arc<dyn NonceStore>>,
    session_store: Option<Arc<dyn SessionStore>>,
    transport: Option<Arc<dyn Transport>>,
    solver: Option<Arc<dyn ChallengeSolver>>,
}

impl TradeApiClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_TRADE_URL.to_string(),
            storage_dir: None,
            nonce_store: None,
            session_store: None,
            transport: None,
            solver: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Directory for the default nonce and session files
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn nonce_store(mut self, store: Arc<dyn NonceStore>) -> Self {
        self.nonce_store = Some(store);
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn challenge_solver(mut self, solver: Arc<dyn ChallengeSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Build the client, loading the persisted session
    pub fn build(self) -> TradeApiResult<TradeApiClient> {
        let dir = self.storage_dir.unwrap_or_else(std::env::temp_dir);
        let credentials = self.credentials;

        let nonce_store: Arc<dyn NonceStore> = match self.nonce_store {
            Some(store) => store,
            None => Arc::new(FileNonceStore::for_credentials(&dir, &credentials)?),
        };
        let session_store: Arc<dyn SessionStore> = match self.session_store {
            Some(store) => store,
            None => Arc::new(FileSessionStore::for_credentials(&dir, &credentials)),
        };
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(http_timeout())?),
        };
        let solver: Arc<dyn ChallengeSolver> = match self.solver {
            Some(solver) => solver,
            None => Arc::new(CommandChallengeSolver::from_config(&ChallengeConfig {
                timeout_secs: challenge_timeout().as_secs(),
                ..ChallengeConfig::default()
            })),
        };

        let session = session_store.load()?;
        let signer = RequestSigner::new(credentials.private_key())?;

        tracing::info!(
            base_url = %self.base_url,
            key = %SanitizedValue::new(credentials.public_key()),
            cookie_count = session.len(),
            "Trade API client ready"
        );

        Ok(TradeApiClient {
            base_url: self.base_url,
            credentials,
            signer,
            nonce_store,
            session_store,
            session: Mutex::new(session),
            transport,
            solver,
        })
    }
}
