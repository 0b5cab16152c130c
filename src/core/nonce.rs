//! Durable nonce counter
//!
//! The exchange rejects any nonce not greater than the last one it
//! accepted. `next()` therefore persists the incremented value before
//! handing it out: a crash after the write can only skip values, never
//! reuse one.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::credentials::Credentials;
use crate::core::storage::{read_optional, write_atomic, FileLock, StorageError, StorageResult};

/// Source of strictly increasing nonces for one credential pair.
///
/// Implementations must make `next()` atomic end-to-end: two concurrent
/// callers never observe the same value. `next()` may block on file I/O
/// and locks; async callers run it on the blocking pool.
pub trait NonceStore: Send + Sync {
    /// Persist and return `last + 1`.
    fn next(&self) -> StorageResult<u64>;

    /// Last value handed out (0 when none was ever issued).
    fn current(&self) -> StorageResult<u64>;
}

/// Nonce counter kept in a small decimal text file.
///
/// Read-modify-write runs under an in-process mutex plus an exclusive
/// lock on `<file>.lock`, so threads and processes sharing the pair
/// serialize on it.
#[derive(Debug)]
pub struct FileNonceStore {
    path: PathBuf,
    file_lock: FileLock,
    guard: Mutex<()>,
}

impl FileNonceStore {
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        let file_lock = FileLock::open(PathBuf::from(lock_path))?;
        Ok(Self {
            path,
            file_lock,
            guard: Mutex::new(()),
        })
    }

    /// Store for `credentials` inside `dir` (`yobit_nonce_<key>.txt`)
    pub fn for_credentials(dir: &Path, credentials: &Credentials) -> StorageResult<Self> {
        Self::open(dir.join(Self::file_name(credentials)))
    }

    pub fn file_name(credentials: &Credentials) -> String {
        format!("yobit_nonce_{}.txt", credentials.storage_key())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file is 0; an empty file is corrupt.
    fn read_last(&self) -> StorageResult<u64> {
        let Some(content) = read_optional(&self.path)? else {
            return Ok(0);
        };
        let trimmed = content.trim();
        trimmed.parse::<u64>().map_err(|_| StorageError::CorruptNonce {
            path: self.path.clone(),
            content: trimmed.to_string(),
        })
    }
}

impl NonceStore for FileNonceStore {
    fn next(&self) -> StorageResult<u64> {
        let _thread_guard = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let _file_guard = self.file_lock.lock()?;

        let next = self
            .read_last()?
            .checked_add(1)
            .ok_or_else(|| StorageError::NonceExhausted {
                location: self.path.display().to_string(),
            })?;
        write_atomic(&self.path, next.to_string().as_bytes())?;

        tracing::trace!(path = %self.path.display(), nonce = next, "Nonce persisted");
        Ok(next)
    }

    fn current(&self) -> StorageResult<u64> {
        let _thread_guard = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let _file_guard = self.file_lock.lock()?;
        self.read_last()
    }
}

/// Process-local counter for single-process use and tests.
///
/// Does not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryNonceStore {
    last: Mutex<u64>,
}

impl MemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(last: u64) -> Self {
        Self {
            last: Mutex::new(last),
        }
    }
}

impl NonceStore for MemoryNonceStore {
    fn next(&self) -> StorageResult<u64> {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = last.checked_add(1).ok_or_else(|| StorageError::NonceExhausted {
            location: "memory".to_string(),
        })?;
        Ok(*last)
    }

    fn current(&self) -> StorageResult<u64> {
        Ok(*self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}
