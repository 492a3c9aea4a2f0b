//! Namespaced advisory file locks.
//!
//! A lock is a file at `<base_dir>/<namespace>/<name>`, or
//! `<base_dir>/.nil/<name>` when no namespace is given. Holding the lock means
//! having created that file.
//!
//! # Acquisition
//!
//! Lock files are created with **create_new** semantics (exclusive create),
//! so exactly one acquirer wins no matter how many processes race. Nothing is
//! coordinated in memory. Before every create attempt the namespace directory
//! is (re)created; if it is removed again before the file can be created, the
//! attempt is retried a bounded number of times. An existing lock file fails
//! immediately with `AlreadyLocked`; there is no waiting.
//!
//! # Lock Metadata
//!
//! Unless disabled, each lock file contains JSON metadata:
//! - `owner`: The owner of the lock (e.g., `user@HOST`)
//! - `pid`: The process ID
//! - `created_at`: RFC3339 timestamp
//! - `namespace` and `name`
//!
//! # Release
//!
//! `Lock::release` closes the handle and deletes the file. `Locker::with_lock`
//! is the scoped form. Dropping a held `Lock` releases it as a fallback and
//! logs a warning if deletion fails.

mod create;
mod guard;
mod metadata;
mod operations;
mod types;


// Re-export public API
pub use create::{CreateFailure, LockFs, OsFs, RetryDecision, RetryPolicy};
pub use guard::Lock;
pub use metadata::LockMetadata;
pub use operations::{Locker, acquire, clear_lock, list_locks, prune_namespaces};
pub use types::{LockInfo, NIL_NAMESPACE, lock_path, namespace_dir, validate_lock_id};
