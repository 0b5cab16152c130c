//! Endpoint defaults and tunables
//!
//! Timeouts can be overridden via environment variables.

use std::time::Duration;

// =============================================================================
// Endpoints
// =============================================================================

/// Authenticated trade API
pub const DEFAULT_TRADE_URL: &str = "https://yobit.net/tapi/";

/// Public market-data API (paths are appended)
pub const DEFAULT_PUBLIC_URL: &str = "https://yobit.net/api/3/";

// =============================================================================
// HTTP
// =============================================================================

/// Environment variable overriding the request timeout
pub const HTTP_TIMEOUT_ENV: &str = "HTTP_TIMEOUT_SECS";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Upper bound on the TCP/TLS connect phase
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Whole-request timeout (default: 30 seconds)
///
/// Environment variable: `HTTP_TIMEOUT_SECS`
pub fn http_timeout() -> Duration {
    let secs = std::env::var(HTTP_TIMEOUT_ENV)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

// =============================================================================
// Challenge solver
// =============================================================================

/// Environment variable overriding the solver timeout
pub const CHALLENGE_TIMEOUT_ENV: &str = "CHALLENGE_TIMEOUT_SECS";

pub const DEFAULT_CHALLENGE_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_CHALLENGE_PROGRAM: &str = "phantomjs";

pub const DEFAULT_CHALLENGE_SCRIPT: &str = "cloudflare-challenge.js";

/// Time allowed for one challenge solve (default: 60 seconds)
///
/// Environment variable: `CHALLENGE_TIMEOUT_SECS`
pub fn challenge_timeout() -> Duration {
    let secs = std::env::var(CHALLENGE_TIMEOUT_ENV)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_CHALLENGE_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Log the effective tunables at startup
pub fn log_configuration() {
    tracing::info!(
        http_timeout_s = http_timeout().as_secs(),
        challenge_timeout_s = challenge_timeout().as_secs(),
        "Client tunables"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn test_default_values() {
        std::env::remove_var(HTTP_TIMEOUT_ENV);
        std::env::remove_var(CHALLENGE_TIMEOUT_ENV);
        assert_eq!(http_timeout(), Duration::from_secs(30));
        assert_eq!(challenge_timeout(), Duration::from_secs(60));
    }

    #[test]
    #[serial(env)]
    fn test_env_override() {
        std::env::set_var(CHALLENGE_TIMEOUT_ENV, "5");
        assert_eq!(challenge_timeout(), Duration::from_secs(5));
        std::env::remove_var(CHALLENGE_TIMEOUT_ENV);
    }

    #[test]
    #[serial(env)]
    fn test_unparseable_env_falls_back() {
        std::env::set_var(HTTP_TIMEOUT_ENV, "soon");
        assert_eq!(http_timeout(), Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
        std::env::remove_var(HTTP_TIMEOUT_ENV);
    }

    #[test]
    fn test_public_url_is_directory() {
        assert!(DEFAULT_PUBLIC_URL.ends_with('/'));
    }
}
