//! Constants and serde default functions for the config model.

use std::path::PathBuf;

/// Environment variable that overrides the configured base directory.
pub const BASE_DIR_ENV: &str = "NSLOCK_BASE_DIR";

/// Environment variable naming the config file to load.
pub const CONFIG_PATH_ENV: &str = "NSLOCK_CONFIG";

/// Directory name under the system temp dir used when no base dir is configured.
pub const DEFAULT_BASE_DIR_NAME: &str = "nslock";

/// Upper bound for `retry_backoff_ms`, and for every sleep between retries.
pub const MAX_RETRY_BACKOFF_MS: u64 = 100;

/// Base directory used when neither the environment nor the config names one.
pub fn default_base_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_BASE_DIR_NAME)
}

// Default value functions for serde
pub(crate) fn default_stale_minutes() -> u32 {
    120
}
pub(crate) fn default_max_create_retries() -> u32 {
    16
}
pub(crate) fn default_retry_backoff_ms() -> u64 {
    2
}
pub(crate) fn default_true() -> bool {
    true
}
