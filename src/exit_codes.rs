//! Exit code constants for the nslock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid name, bad config)
//! - 2: I/O failure while acquiring
//! - 3: Lock could not be released
//! - 4: Lock is held by another process

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid lock name, or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// I/O failure unrelated to lock contention.
pub const IO_FAILURE: i32 = 2;

/// The lock file could not be removed on release.
pub const RELEASE_FAILURE: i32 = 3;

/// Lock acquisition failure: the lock is already held.
pub const LOCK_FAILURE: i32 = 4;
