//! Exclusive-create primitives and the retry policy around them.
//!
//! Every create failure is classified exactly once, at the call site, into a
//! [`CreateFailure`]. The retry loop only ever looks at that classification.

use crate::config::types::MAX_RETRY_BACKOFF_MS;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Longest delay between two create attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_millis(MAX_RETRY_BACKOFF_MS);

/// Filesystem operations used by the lock protocol.
///
/// Every method defaults to the real filesystem, so [`OsFs`] is just the
/// empty implementation. Test doubles override the one step they need to
/// break.
pub trait LockFs: fmt::Debug + Send + Sync {
    /// Create a directory and any missing ancestors. Must succeed if the
    /// directory already exists.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    /// Create `path` for writing, failing if it already exists.
    fn create_new(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new().write(true).create_new(true).open(path)
    }

    /// Write lock metadata into a freshly created lock file and sync it.
    fn write_metadata(&self, file: &mut File, contents: &[u8]) -> io::Result<()> {
        file.write_all(contents)?;
        file.sync_all()
    }

    /// Remove a lock file.
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl LockFs for OsFs {}

/// Why an exclusive create failed.
#[derive(Debug)]
pub enum CreateFailure {
    /// The namespace directory was removed between creating it and creating
    /// the lock file. Retryable.
    DirectoryVanished(io::Error),
    /// Another holder already created the lock file.
    AlreadyExists,
    /// Anything else: permissions, disk, unexpected I/O.
    Other(io::Error),
}

impl CreateFailure {
    /// Classify a create error.
    pub fn classify(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => CreateFailure::DirectoryVanished(err),
            io::ErrorKind::AlreadyExists => CreateFailure::AlreadyExists,
            _ => CreateFailure::Other(err),
        }
    }

    /// Whether another create attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CreateFailure::DirectoryVanished(_))
    }
}

/// What to do after a failed create attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, recreate the namespace directory and try again.
    Retry(Duration),
    /// Surface the failure.
    GiveUp,
}

/// Bounded retry policy for the vanished-directory race.
///
/// The delay grows linearly with the attempt number and is capped at 100ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decide whether to retry after `retries_done` retries have already
    /// been spent and the latest attempt failed with `failure`.
    pub fn decide(&self, retries_done: u32, failure: &CreateFailure) -> RetryDecision {
        if !failure.is_retryable() || retries_done >= self.max_retries {
            return RetryDecision::GiveUp;
        }

        let delay = self
            .backoff
            .saturating_mul(retries_done.saturating_add(1))
            .min(MAX_RETRY_DELAY);
        RetryDecision::Retry(delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(16, Duration::from_millis(2))
    }
}
