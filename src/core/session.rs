//! Browser-like cookie session
//!
//! A `Session` is the cookie set proving the edge-proxy challenge was
//! passed. It is replaced wholesale after a challenge solve and merged
//! incrementally from `Set-Cookie` headers otherwise. `SessionStore`
//! persists it so a later process reuses it.
//!
//! The on-disk shape is a JSON array of cookie-jar objects with
//! capitalized field names:
//!
//! ```json
//! [{"Name":"__ddg1","Value":"abc","Domain":".yobit.net","Path":"/",
//!   "Max-Age":null,"Expires":1767225600,"Secure":true,"Discard":false,"HttpOnly":true}]
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::core::credentials::Credentials;
use crate::core::storage::{read_optional, write_atomic, StorageError, StorageResult};

fn default_path() -> String {
    "/".to_string()
}

/// One stored cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(rename = "Max-Age", default)]
    pub max_age: Option<u64>,
    /// Unix timestamp (seconds); `None` for a session cookie
    #[serde(default)]
    pub expires: Option<i64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub discard: bool,
    #[serde(rename = "HttpOnly", default)]
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: default_path(),
            max_age: None,
            expires: None,
            secure: false,
            discard: false,
            http_only: false,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires, Some(expires) if expires <= now)
    }

    fn same_identity(&self, other: &Cookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }
}

/// Cookie set for one credential pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session {
    cookies: Vec<Cookie>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cookies(cookies: Vec<Cookie>) -> Self {
        let mut session = Self::new();
        for cookie in cookies {
            session.merge(cookie);
        }
        session
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Insert or replace a cookie; an empty value deletes it.
    pub fn merge(&mut self, cookie: Cookie) {
        self.cookies.retain(|existing| !existing.same_identity(&cookie));
        if !cookie.value.is_empty() {
            self.cookies.push(cookie);
        }
    }

    /// Drop cookies whose expiry is at or before `now`
    pub fn prune_expired(&mut self, now: i64) {
        self.cookies.retain(|c| !c.is_expired(now));
    }

    /// `Cookie` request header value for the live cookies, if any
    pub fn cookie_header(&self, now: i64) -> Option<String> {
        let header = self
            .cookies
            .iter()
            .filter(|c| !c.is_expired(now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        (!header.is_empty()).then_some(header)
    }
}

/// Durable home of a `Session`
pub trait SessionStore: Send + Sync {
    fn load(&self) -> StorageResult<Session>;
    fn save(&self, session: &Session) -> StorageResult<()>;
}

/// Session persisted as a JSON cookie list (`yobit_trade_<key>_cookie.json`)
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_credentials(dir: &Path, credentials: &Credentials) -> Self {
        Self::new(dir.join(Self::file_name(credentials)))
    }

    pub fn file_name(credentials: &Credentials) -> String {
        format!("yobit_trade_{}_cookie.json", credentials.storage_key())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> StorageResult<Session> {
        let Some(content) = read_optional(&self.path)? else {
            return Ok(Session::new());
        };
        if content.trim().is_empty() {
            return Ok(Session::new());
        }
        let mut session: Session =
            serde_json::from_str(&content).map_err(|source| StorageError::CorruptSession {
                path: self.path.clone(),
                source,
            })?;
        session.prune_expired(chrono::Utc::now().timestamp());
        Ok(session)
    }

    fn save(&self, session: &Session) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(session).map_err(StorageError::Serialize)?;
        write_atomic(&self.path, &json)?;
        tracing::debug!(path = %self.path.display(), cookies = session.len(), "Session saved");
        Ok(())
    }
}

/// In-memory store; counts saves so callers can assert on persistence
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    saved: Mutex<Session>,
    saves: AtomicUsize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            saved: Mutex::new(session),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> StorageResult<Session> {
        Ok(self.saved.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn save(&self, session: &Session) -> StorageResult<()> {
        *self.saved.lock().unwrap_or_else(|p| p.into_inner()) = session.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cookie(name: &str, value: &str) -> Cookie {
        Cookie::new(name, value)
    }

    #[test]
    fn test_cookie_serializes_capitalized_fields() {
        let mut c = cookie("__ddg1", "abc");
        c.domain = Some(".yobit.net".to_string());
        c.http_only = true;
        c.expires = Some(1_767_225_600);

        let json = serde_json::to_value(&c).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["Name", "Value", "Domain", "Path", "Max-Age", "Expires", "Secure", "Discard", "HttpOnly"] {
            assert!(obj.contains_key(key), "missing {} in {}", key, json);
        }
        assert_eq!(obj["HttpOnly"], serde_json::json!(true));
    }

    #[test]
    fn test_merge_replaces_same_identity() {
        let mut session = Session::new();
        session.merge(cookie("a", "1"));
        session.merge(cookie("b", "2"));
        session.merge(cookie("a", "3"));

        assert_eq!(session.len(), 2);
        assert_eq!(session.get("a").unwrap().value, "3");
    }

    #[test]
    fn test_merge_empty_value_deletes() {
        let mut session = Session::from_cookies(vec![cookie("a", "1")]);
        session.merge(cookie("a", ""));
        assert!(session.is_empty());
    }

    #[test]
    fn test_cookie_header_skips_expired() {
        let mut stale = cookie("old", "x");
        stale.expires = Some(100);
        let session = Session::from_cookies(vec![cookie("a", "1"), stale, cookie("b", "2")]);

        assert_eq!(session.cookie_header(200).as_deref(), Some("a=1; b=2"));
        assert_eq!(Session::new().cookie_header(200), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty_session() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("cookies.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let session = Session::from_cookies(vec![cookie("__ddg1", "abc"), cookie("PHPSESSID", "s1")]);

        FileSessionStore::new(&path).save(&session).unwrap();
        let reloaded = FileSessionStore::new(&path).load().unwrap();

        assert_eq!(reloaded, session);
    }

    #[test]
    fn test_file_store_drops_expired_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(
            &path,
            r#"[{"Name":"gone","Value":"1","Expires":1},{"Name":"kept","Value":"2"}]"#,
        )
        .unwrap();

        let session = FileSessionStore::new(&path).load().unwrap();
        assert_eq!(session.len(), 1);
        assert_eq!(session.get("kept").unwrap().path, "/");
    }

    #[test]
    fn test_file_store_corrupt_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{not a list").unwrap();

        let result = FileSessionStore::new(&path).load();
        assert!(matches!(result, Err(StorageError::CorruptSession { .. })));
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemorySessionStore::new();
        store.save(&Session::from_cookies(vec![cookie("a", "1")])).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
