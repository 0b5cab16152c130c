//! On-disk primitives shared by the nonce and session stores
//!
//! - `write_atomic`: temp file in the target directory, fsync, rename
//! - `read_optional`: missing file is `None`, not an error
//! - `FileLock`: exclusive advisory lock serializing read-modify-write
//!   across processes (`flock` on Unix, `LockFileEx` on Windows)

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Persistence failures for nonce and session files
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Nonce file {} does not hold an integer: {content:?}", .path.display())]
    CorruptNonce { path: PathBuf, content: String },

    #[error("Session file {} is not a cookie list: {source}", .path.display())]
    CorruptSession {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Session could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Nonce counter in {location} reached u64::MAX")]
    NonceExhausted { location: String },

    #[error("Storage worker did not complete: {0}")]
    Worker(String),
}

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Read a whole file, treating a missing file as `None`
pub fn read_optional(path: &Path) -> StorageResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path)(e)),
    }
}

/// Replace `path` with `contents` so readers only ever see the old or the new value.
///
/// The data is flushed to disk before the rename, so a value returned to the
/// caller after this succeeds survives a crash.
pub fn write_atomic(path: &Path, contents: &[u8]) -> StorageResult<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir).map_err(io_error(path))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error(path))?;
    tmp.write_all(contents).map_err(io_error(path))?;
    tmp.as_file().sync_all().map_err(io_error(path))?;
    tmp.persist(path).map_err(|e| io_error(path)(e.error))?;
    Ok(())
}

/// A file-backed lock that serializes storage mutations across processes.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    file: File,
}

/// Guard that holds the exclusive lock for its lifetime.
#[derive(Debug)]
pub struct FileLockGuard<'a> {
    lock: &'a FileLock,
}

impl FileLock {
    /// Opens or creates the lock file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        fs::create_dir_all(parent_dir(&path)).map_err(io_error(&path))?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_error(&path))?;
        Ok(Self { path, file })
    }

    /// Blocks until the exclusive lock is acquired.
    pub fn lock(&self) -> StorageResult<FileLockGuard<'_>> {
        imp::lock_exclusive(&self.file).map_err(|source| StorageError::Lock {
            path: self.path.clone(),
            source,
        })?;
        Ok(FileLockGuard { lock: self })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = imp::unlock(&self.lock.file) {
            tracing::warn!(path = %self.lock.path.display(), error = %e, "Failed to release storage lock");
        }
    }
}

#[cfg(unix)]
mod imp {
    use std::fs::File;
    use std::os::raw::c_int;
    use std::os::unix::io::AsRawFd;

    const LOCK_EX: c_int = 2;
    const LOCK_UN: c_int = 8;

    extern "C" {
        fn flock(fd: c_int, operation: c_int) -> c_int;
    }

    pub(super) fn lock_exclusive(file: &File) -> std::io::Result<()> {
        loop {
            // SAFETY: the descriptor is owned by `file` and stays open for the call.
            let result = unsafe { flock(file.as_raw_fd(), LOCK_EX) };
            if result == 0 {
                return Ok(());
            }
            let err = std::io::Error::last_os_error();
            if err.kind() != std::io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    pub(super) fn unlock(file: &File) -> std::io::Result<()> {
        // SAFETY: see `lock_exclusive`.
        let result = unsafe { flock(file.as_raw_fd(), LOCK_UN) };
        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

#[cfg(windows)]
mod imp {
    use std::fs::File;
    use std::os::windows::io::AsRawHandle;

    type Handle = *mut std::ffi::c_void;

    #[repr(C)]
    struct Overlapped {
        internal: usize,
        internal_high: usize,
        offset: u32,
        offset_high: u32,
        h_event: Handle,
    }

    const LOCKFILE_EXCLUSIVE_LOCK: u32 = 0x2;

    extern "system" {
        fn LockFileEx(
            h_file: Handle,
            flags: u32,
            reserved: u32,
            bytes_to_lock_low: u32,
            bytes_to_lock_high: u32,
            overlapped: *mut Overlapped,
        ) -> i32;
        fn UnlockFileEx(
            h_file: Handle,
            reserved: u32,
            bytes_to_unlock_low: u32,
            bytes_to_unlock_high: u32,
            overlapped: *mut Overlapped,
        ) -> i32;
    }

    fn overlapped() -> Overlapped {
        Overlapped {
            internal: 0,
            internal_high: 0,
            offset: 0,
            offset_high: 0,
            h_event: std::ptr::null_mut(),
        }
    }

    pub(super) fn lock_exclusive(file: &File) -> std::io::Result<()> {
        let mut ov = overlapped();
        // SAFETY: the handle is owned by `file` and `ov` outlives the blocking call.
        let result = unsafe {
            LockFileEx(
                file.as_raw_handle() as Handle,
                LOCKFILE_EXCLUSIVE_LOCK,
                0,
                1,
                0,
                &mut ov,
            )
        };
        if result != 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    pub(super) fn unlock(file: &File) -> std::io::Result<()> {
        let mut ov = overlapped();
        // SAFETY: see `lock_exclusive`.
        let result = unsafe { UnlockFileEx(file.as_raw_handle() as Handle, 0, 1, 0, &mut ov) };
        if result != 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

#[cfg(not(any(unix, windows)))]
compile_error!("storage locking is implemented for Unix (flock) and Windows (LockFileEx) only");
