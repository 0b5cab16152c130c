//! YoBit request signing
//!
//! The `Sign` header is HMAC-SHA512 over the exact form-encoded body,
//! keyed by the private API key, lowercase hex.

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::adapters::errors::{TradeApiError, TradeApiResult};
use crate::adapters::types::Params;

type HmacSha512 = Hmac<Sha512>;

/// A request ready to be sent (and re-sent) unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: String,
    pub nonce: u64,
    /// Form-encoded body; also the signed message
    pub payload: String,
    /// Lowercase hex HMAC-SHA512 of `payload`
    pub signature: String,
}

/// HMAC-SHA512 signer keyed by the private API key
#[derive(Clone)]
pub struct RequestSigner {
    private_key: String,
}

impl RequestSigner {
    pub fn new(private_key: impl Into<String>) -> TradeApiResult<Self> {
        let private_key = private_key.into();
        if private_key.is_empty() {
            return Err(TradeApiError::InvalidCredentials(
                "cannot sign with an empty private key".into(),
            ));
        }
        Ok(Self { private_key })
    }

    /// Signature of an already-encoded payload
    pub fn sign_payload(&self, payload: &str) -> TradeApiResult<String> {
        let mut mac = HmacSha512::new_from_slice(self.private_key.as_bytes())
            .map_err(|e| TradeApiError::InvalidCredentials(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Canonicalize, encode and sign `params`
    pub fn sign(&self, params: &Params) -> TradeApiResult<String> {
        self.sign_payload(&params.encode()?)
    }

    /// Append `method` and `nonce`, then encode and sign the result
    pub fn sign_request(&self, method: &str, mut params: Params, nonce: u64) -> TradeApiResult<SignedRequest> {
        params.push("method", method);
        params.push("nonce", nonce);
        let payload = params.encode()?;
        let signature = self.sign_payload(&payload)?;
        Ok(SignedRequest {
            method: method.to_string(),
            nonce,
            payload,
            signature,
        })
    }
}

/// Free-function form of [`RequestSigner::sign`]
pub fn sign(params: &Params, private_key: &str) -> TradeApiResult<String> {
    RequestSigner::new(private_key)?.sign(params)
}
