//! Error types for nslock.
//!
//! Uses thiserror for derive macros. Each variant is a distinct failure kind
//! so callers can decide whether retrying at a higher level makes sense.

use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for nslock operations.
///
/// The race where a namespace directory disappears between its creation and
/// the lock file create is retried internally and never shows up here.
#[derive(Error, Debug)]
pub enum NsLockError {
    /// Invalid lock name, bad configuration, or a registry request for a lock
    /// that does not exist.
    #[error("{0}")]
    UserError(String),

    /// Exclusive create found an existing lock file.
    #[error("lock is held by another process: {}{}", .path.display(), holder_suffix(.holder))]
    AlreadyLocked {
        path: PathBuf,
        /// Description of the current holder, read from the lock file when possible.
        holder: Option<String>,
    },

    /// Any other failure while acquiring a lock.
    #[error("{context}: {source}")]
    IoFailure {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The lock file could not be removed on release.
    #[error("failed to release lock '{}': {source}", .path.display())]
    ReleaseFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn holder_suffix(holder: &Option<String>) -> String {
    match holder {
        Some(h) => format!(" ({})", h),
        None => String::new(),
    }
}

impl NsLockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            NsLockError::UserError(_) => exit_codes::USER_ERROR,
            NsLockError::IoFailure { .. } => exit_codes::IO_FAILURE,
            NsLockError::ReleaseFailure { .. } => exit_codes::RELEASE_FAILURE,
            NsLockError::AlreadyLocked { .. } => exit_codes::LOCK_FAILURE,
        }
    }

    /// An `IoFailure` with a context message.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        NsLockError::IoFailure {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for nslock operations.
pub type Result<T> = std::result::Result<T, NsLockError>;
