//! Config loading, validation, and resolution operations.

use super::model::Config;
use super::types::{BASE_DIR_ENV, CONFIG_PATH_ENV, MAX_RETRY_BACKOFF_MS, default_base_dir};
use crate::error::{NsLockError, Result};
use crate::locks::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(NsLockError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            NsLockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Find and load the config for this invocation.
    ///
    /// An explicit path wins, then `NSLOCK_CONFIG`. With neither set the
    /// defaults are used; a named file that cannot be read is an error.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::load(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document; treat it as "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| NsLockError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            NsLockError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `stale_minutes` must be positive
    /// - `retry_backoff_ms` must not exceed one second
    /// - `base_dir`, when set, must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.stale_minutes == 0 {
            return Err(NsLockError::UserError(
                "config validation failed: stale_minutes must be greater than 0".to_string(),
            ));
        }

        if self.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
            return Err(NsLockError::UserError(format!(
                "config validation failed: retry_backoff_ms must be at most {} (found {})",
                MAX_RETRY_BACKOFF_MS, self.retry_backoff_ms
            )));
        }

        if let Some(base_dir) = &self.base_dir
            && base_dir.as_os_str().is_empty()
        {
            return Err(NsLockError::UserError(
                "config validation failed: base_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The directory all namespaces live under.
    ///
    /// `NSLOCK_BASE_DIR` overrides `base_dir`, which overrides the default.
    pub fn resolve_base_dir(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os(BASE_DIR_ENV)
            && !dir.is_empty()
        {
            return PathBuf::from(dir);
        }

        self.base_dir.clone().unwrap_or_else(default_base_dir)
    }

    /// Retry policy for the vanished-directory race.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_create_retries,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }
}
