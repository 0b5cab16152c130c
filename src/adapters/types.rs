//! Shared request/response types for the exchange clients

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::core::session::Cookie;

// =============================================================================
// Currency pair / side
// =============================================================================

/// Currency pair, serialized as `"{from}_{to}"` in lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
}

impl CurrencyPair {
    pub fn new(from: impl AsRef<str>, to: impl AsRef<str>) -> Self {
        Self {
            from: from.as_ref().to_lowercase(),
            to: to.as_ref().to_lowercase(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.from, self.to)
    }
}

impl<A: AsRef<str>, B: AsRef<str>> From<(A, B)> for CurrencyPair {
    fn from((from, to): (A, B)) -> Self {
        Self::new(from, to)
    }
}

/// Join pairs for the public API path (`ltc_btc-eth_btc`)
pub fn join_pairs(pairs: &[CurrencyPair]) -> String {
    pairs
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

/// Order side for the `Trade` method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeSide::Buy),
            "sell" => Ok(TradeSide::Sell),
            other => Err(format!("unknown trade side: {}", other)),
        }
    }
}

// =============================================================================
// Request parameters
// =============================================================================

/// Request parameters in insertion order.
///
/// Order is significant: the exchange checks the signature against the
/// exact body bytes, so the signed string and the sent body are both
/// produced from this sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `push`
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    /// Boolean parameter as the exchange expects it: `1`, or `0` (dropped)
    pub fn flag(self, key: impl Into<String>, value: bool) -> Self {
        self.with(key, if value { "1" } else { "0" })
    }

    /// Append a parameter, replacing the value in place if the key exists
    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that survive canonicalization: `""` and `"0"` values are dropped.
    ///
    /// Other strings, `"false"` included, are kept. Use [`Params::flag`] for booleans.
    pub fn canonical(&self) -> Vec<(&str, &str)> {
        self.iter().filter(|(_, v)| !is_falsy(v)).collect()
    }

    /// URL-form-encode the canonical entries in insertion order
    pub fn encode(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self.canonical())
    }
}

fn is_falsy(value: &str) -> bool {
    matches!(value, "" | "0")
}

// =============================================================================
// Transport-level types
// =============================================================================

/// A form POST as handed to the transport
#[derive(Debug, Clone)]
pub struct FormPost<'a> {
    pub url: &'a str,
    pub body: &'a str,
    pub headers: Vec<(&'static str, String)>,
    pub cookie_header: Option<String>,
}

/// Raw HTTP response as seen by the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Cookies parsed from `Set-Cookie` headers
    pub cookies: Vec<Cookie>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            cookies: Vec::new(),
        }
    }
}

/// Classification of one exchange round-trip
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    /// No response was obtained at all
    ServiceDisabled,
    /// The edge proxy served its block page instead of the API
    Blocked(String),
}
