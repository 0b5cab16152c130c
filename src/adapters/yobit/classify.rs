//! Response classification
//!
//! The edge proxy answers with its block page instead of the API: either
//! a 503, or any status with a body mentioning "ddos". Both are `Blocked`
//! and recoverable through the challenge. No response at all is
//! `ServiceDisabled` and is not.

use serde_json::Value;

use crate::adapters::errors::{TradeApiError, TradeApiResult};
use crate::adapters::types::{HttpResponse, Outcome};

/// Status the edge proxy uses for its block page
pub const BLOCK_STATUS: u16 = 503;

/// Case-insensitive body marker of the block page
pub const BLOCK_MARKER: &str = "ddos";

pub fn is_block_page(response: &HttpResponse) -> bool {
    response.status == BLOCK_STATUS || response.body.to_ascii_lowercase().contains(BLOCK_MARKER)
}

/// Turn a raw response (or its absence) into an `Outcome`.
///
/// A body that is neither a block page nor valid JSON is a
/// `MalformedResponse` error.
pub fn classify(response: Option<&HttpResponse>) -> TradeApiResult<Outcome> {
    let Some(response) = response else {
        return Ok(Outcome::ServiceDisabled);
    };

    if is_block_page(response) {
        return Ok(Outcome::Blocked(response.body.clone()));
    }

    serde_json::from_str::<Value>(&response.body)
        .map(Outcome::Success)
        .map_err(|source| TradeApiError::MalformedResponse {
            body: response.body.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_response_is_service_disabled() {
        assert_eq!(classify(None).unwrap(), Outcome::ServiceDisabled);
    }

    #[test]
    fn test_503_is_blocked_even_with_json_body() {
        let response = HttpResponse::new(503, r#"{"success":1}"#);
        assert_eq!(
            classify(Some(&response)).unwrap(),
            Outcome::Blocked(r#"{"success":1}"#.to_string())
        );
    }

    #[test]
    fn test_ddos_marker_is_blocked_regardless_of_status() {
        let body = "<html><title>DDoS-Guard</title></html>";
        for status in [200, 403, 429] {
            let response = HttpResponse::new(status, body);
            assert_eq!(
                classify(Some(&response)).unwrap(),
                Outcome::Blocked(body.to_string()),
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_valid_json_is_success() {
        let response = HttpResponse::new(200, r#"{"success":1}"#);
        assert_eq!(
            classify(Some(&response)).unwrap(),
            Outcome::Success(json!({"success": 1}))
        );
    }

    #[test]
    fn test_exchange_error_payload_is_still_success() {
        let response = HttpResponse::new(200, r#"{"success":0,"error":"invalid nonce"}"#);
        match classify(Some(&response)).unwrap() {
            Outcome::Success(payload) => assert_eq!(payload["success"], json!(0)),
            other => panic!("Expected Success, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let response = HttpResponse::new(200, "<html>maintenance</html>");
        match classify(Some(&response)) {
            Err(TradeApiError::MalformedResponse { body, .. }) => {
                assert_eq!(body, "<html>maintenance</html>")
            }
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
    }
}
