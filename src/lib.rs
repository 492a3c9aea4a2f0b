//! nslock: namespaced advisory file locks.
//!
//! A lock is a file under `<base_dir>/<namespace>/`; whoever creates it
//! exclusively holds the lock until the file is removed. See [`locks`] for
//! the protocol.
//!
//! ```no_run
//! use nslock::Locker;
//!
//! let locker = Locker::new("/tmp/nslock");
//! locker.with_lock("nightly-backup", Some("jobs"), |lock| {
//!     println!("holding {}", lock.path().display());
//! })?;
//! # Ok::<(), nslock::NsLockError>(())
//! ```

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod locks;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{NsLockError, Result};
pub use locks::{Lock, LockInfo, LockMetadata, Locker, RetryPolicy, acquire};
