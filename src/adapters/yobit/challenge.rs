//! Out-of-process browser challenge solver
//!
//! Runs `<program> [script] <base_url> <payload>` and reads a JSON array of
//! browser cookies from stdout. The headless browser reports cookies with
//! lowercase keys (`name`, `value`, `expiry` or `expires`, `httponly`...),
//! which `normalize_cookies` maps onto the session format.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::process::Command;

use crate::adapters::errors::ChallengeError;
use crate::adapters::traits::ChallengeSolver;
use crate::config::types::ChallengeConfig;
use crate::core::session::Cookie;

/// Solver backed by an external program (PhantomJS and a challenge script
/// by default)
#[derive(Debug, Clone)]
pub struct CommandChallengeSolver {
    program: String,
    script: Option<PathBuf>,
    timeout: Duration,
}

impl CommandChallengeSolver {
    pub fn new(program: impl Into<String>, script: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            script,
            timeout,
        }
    }

    pub fn from_config(config: &ChallengeConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.script.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn command(&self, base_url: &str, payload: &str) -> Command {
        let mut command = Command::new(&self.program);
        if let Some(script) = &self.script {
            command.arg(script);
        }
        command
            .arg(base_url)
            .arg(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl ChallengeSolver for CommandChallengeSolver {
    async fn solve(&self, base_url: &str, payload: &str) -> Result<Vec<Cookie>, ChallengeError> {
        tracing::info!(program = %self.program, base_url, "Running challenge solver");

        let child = self.command(base_url, payload).spawn().map_err(|e| {
            ChallengeError::Unavailable(format!("cannot start {}: {}", self.program, e))
        })?;

        // Dropping the future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| ChallengeError::Unavailable(e.to_string()))?,
            Err(_) => {
                tracing::warn!(timeout_s = self.timeout.as_secs(), "Challenge solver timed out");
                return Err(ChallengeError::Unavailable(format!(
                    "timed out after {:?}",
                    self.timeout
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ChallengeError::Failed(format!(
                "solver exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let cookies = normalize_cookies(&String::from_utf8_lossy(&output.stdout))?;
        tracing::info!(cookie_count = cookies.len(), "Challenge solved");
        Ok(cookies)
    }
}

/// Map the solver's cookie objects onto [`Cookie`].
///
/// Keys are matched case-insensitively. `expiry` (unix seconds) and
/// `expires` (unix seconds or an HTTP date) both land in `expires`.
/// Entries without a name are skipped; an empty result is a failure.
pub fn normalize_cookies(raw: &str) -> Result<Vec<Cookie>, ChallengeError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ChallengeError::Failed(format!("solver output is not JSON: {}", e)))?;
    let Value::Array(entries) = value else {
        return Err(ChallengeError::Failed(
            "solver output is not a cookie array".into(),
        ));
    };

    let cookies: Vec<Cookie> = entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(normalize_cookie)
        .collect();

    if cookies.is_empty() {
        return Err(ChallengeError::Failed("solver returned no cookies".into()));
    }
    Ok(cookies)
}

fn normalize_cookie(object: &Map<String, Value>) -> Option<Cookie> {
    let mut cookie = Cookie::new("", "");
    for (key, value) in object {
        match key.to_ascii_lowercase().as_str() {
            "name" => cookie.name = as_string(value)?,
            "value" => cookie.value = as_string(value).unwrap_or_default(),
            "domain" => cookie.domain = as_string(value),
            "path" => {
                if let Some(path) = as_string(value) {
                    cookie.path = path;
                }
            }
            "expiry" | "expires" => cookie.expires = cookie.expires.or(as_timestamp(value)),
            "max-age" | "maxage" => cookie.max_age = value.as_u64(),
            "secure" => cookie.secure = as_bool(value),
            "httponly" => cookie.http_only = as_bool(value),
            "discard" => cookie.discard = as_bool(value),
            _ => {}
        }
    }
    (!cookie.name.is_empty()).then_some(cookie)
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().unwrap_or(0) != 0,
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    }
}

fn as_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse::<i64>().ok().or_else(|| {
            chrono::DateTime::parse_from_rfc2822(s)
                .ok()
                .map(|dt| dt.timestamp())
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phantomjs_cookies() {
        let raw = r#"[
            {"domain":".yobit.net","expiry":1767225600,"httponly":true,
             "name":"__ddg1","path":"/","secure":true,"value":"abc"},
            {"name":"__ddgid","value":"xyz","expires":"Thu, 01 Jan 2026 00:00:00 GMT"}
        ]"#;
        let cookies = normalize_cookies(raw).unwrap();

        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "__ddg1");
        assert_eq!(cookies[0].value, "abc");
        assert_eq!(cookies[0].domain.as_deref(), Some(".yobit.net"));
        assert_eq!(cookies[0].expires, Some(1767225600));
        assert!(cookies[0].http_only);
        assert!(cookies[0].secure);
        assert_eq!(cookies[1].expires, Some(1767225600));
        assert_eq!(cookies[1].path, "/");
    }

    #[test]
    fn test_normalize_accepts_mixed_case_keys() {
        let cookies = normalize_cookies(r#"[{"Name":"a","Value":"1","HttpOnly":1}]"#).unwrap();
        assert_eq!(cookies[0].name, "a");
        assert!(cookies[0].http_only);
    }

    #[test]
    fn test_normalize_skips_nameless_entries() {
        let cookies = normalize_cookies(r#"[{"value":"orphan"},{"name":"a","value":"1"}]"#).unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "a");
    }

    #[test]
    fn test_normalize_empty_or_garbage_fails() {
        assert!(matches!(normalize_cookies("[]"), Err(ChallengeError::Failed(_))));
        assert!(matches!(normalize_cookies("not json"), Err(ChallengeError::Failed(_))));
        assert!(matches!(
            normalize_cookies(r#"{"name":"a"}"#),
            Err(ChallengeError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let solver = CommandChallengeSolver::new(
            "definitely-not-a-real-solver-binary",
            None,
            Duration::from_secs(1),
        );
        let result = solver.solve("https://yobit.net/tapi/", "method=getInfo&nonce=1").await;
        assert!(matches!(result, Err(ChallengeError::Unavailable(_))));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::io::Write;

        fn script(body: &str) -> tempfile::NamedTempFile {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "{}", body).unwrap();
            file
        }

        #[tokio::test]
        async fn test_solver_receives_url_and_payload() {
            let file = script(r#"printf '[{"name":"url","value":"%s"},{"name":"payload","value":"%s"}]' "$1" "$2""#);
            let solver = CommandChallengeSolver::new(
                "sh",
                Some(file.path().to_path_buf()),
                Duration::from_secs(5),
            );

            let cookies = solver
                .solve("https://yobit.net/tapi/", "method=getInfo&nonce=7")
                .await
                .unwrap();

            assert_eq!(cookies[0].value, "https://yobit.net/tapi/");
            assert_eq!(cookies[1].value, "method=getInfo&nonce=7");
        }

        #[tokio::test]
        async fn test_solver_timeout_is_unavailable() {
            let file = script("sleep 5");
            let solver = CommandChallengeSolver::new(
                "sh",
                Some(file.path().to_path_buf()),
                Duration::from_millis(100),
            );

            let result = solver.solve("https://yobit.net/tapi/", "nonce=1").await;
            assert!(matches!(result, Err(ChallengeError::Unavailable(_))));
        }

        #[tokio::test]
        async fn test_solver_nonzero_exit_is_failed() {
            let file = script("echo boom >&2; exit 3");
            let solver = CommandChallengeSolver::new(
                "sh",
                Some(file.path().to_path_buf()),
                Duration::from_secs(5),
            );

            match solver.solve("https://yobit.net/tapi/", "nonce=1").await {
                Err(ChallengeError::Failed(msg)) => assert!(msg.contains("boom")),
                other => panic!("Expected Failed, got {:?}", other),
            }
        }
    }
}
