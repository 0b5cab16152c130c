//! Core module - credentials, durable nonce counter, cookie session, storage, logging
//!
//! This module uses **explicit re-exports** instead of glob exports so the
//! public API stays visible in one place.
//!
//! ## Usage
//! ```ignore
//! use yobit_trade::core::{FileNonceStore, NonceStore, Session};
//! ```

pub mod credentials;
pub mod logging;
pub mod nonce;
pub mod session;
pub mod storage;

pub use credentials::{Credentials, PRIVATE_KEY_ENV, PUBLIC_KEY_ENV};

pub use logging::{
    init_logging, init_logging_with_config, sanitize_signature, LoggingConfig, SanitizedValue,
    DEFAULT_LOG_LEVEL,
};

pub use nonce::{FileNonceStore, MemoryNonceStore, NonceStore};

pub use session::{Cookie, FileSessionStore, MemorySessionStore, Session, SessionStore};

pub use storage::{StorageError, StorageResult};
