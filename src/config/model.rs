//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for nslock.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory under which all lock namespaces live.
    ///
    /// `None` means `<temp_dir>/nslock`. `NSLOCK_BASE_DIR` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    /// Minutes after which a listed lock is reported as stale.
    #[serde(default = "default_stale_minutes")]
    pub stale_minutes: u32,

    /// How many times a create is retried when the namespace directory
    /// vanished underneath it.
    #[serde(default = "default_max_create_retries")]
    pub max_create_retries: u32,

    /// Base delay between those retries, in milliseconds. The n-th retry
    /// waits n times this long, but never more than 100ms, which is also the
    /// largest accepted value.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Whether to write owner metadata into lock files.
    #[serde(default = "default_true")]
    pub write_metadata: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: None,
            stale_minutes: default_stale_minutes(),
            max_create_retries: default_max_create_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            write_metadata: default_true(),
        }
    }
}
