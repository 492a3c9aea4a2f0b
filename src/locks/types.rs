//! Lock naming, path layout and information structures.

use super::metadata::LockMetadata;
use crate::error::{NsLockError, Result};
use std::path::{Path, PathBuf};

/// Directory used for locks acquired without a namespace.
pub const NIL_NAMESPACE: &str = ".nil";

/// Directory name for a namespace, mapping `None` to [`NIL_NAMESPACE`].
pub fn namespace_dir_name(namespace: Option<&str>) -> &str {
    namespace.unwrap_or(NIL_NAMESPACE)
}

/// Inverse of [`namespace_dir_name`].
pub fn namespace_from_dir_name(dir_name: &str) -> Option<String> {
    if dir_name == NIL_NAMESPACE {
        None
    } else {
        Some(dir_name.to_string())
    }
}

/// Check that a lock name or namespace is a single, plain path component.
fn validate_component(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(NsLockError::UserError(format!("lock {} must not be empty", kind)));
    }

    if value == "." || value == ".." {
        return Err(NsLockError::UserError(format!(
            "lock {} must not be '{}'",
            kind, value
        )));
    }

    if value.contains(['/', '\\', '\0']) {
        return Err(NsLockError::UserError(format!(
            "lock {} '{}' must not contain path separators",
            kind,
            value.escape_debug()
        )));
    }

    Ok(())
}

/// Validate a lock name and optional namespace.
///
/// An explicit namespace may not be the nil marker itself, otherwise it would
/// silently share locks with the nil namespace.
pub fn validate_lock_id(name: &str, namespace: Option<&str>) -> Result<()> {
    validate_component("name", name)?;

    if let Some(ns) = namespace {
        validate_component("namespace", ns)?;
        if ns == NIL_NAMESPACE {
            return Err(NsLockError::UserError(format!(
                "lock namespace '{}' is reserved for locks without a namespace",
                NIL_NAMESPACE
            )));
        }
    }

    Ok(())
}

/// `base_dir / (namespace or .nil)`.
pub fn namespace_dir(base_dir: &Path, namespace: Option<&str>) -> PathBuf {
    base_dir.join(namespace_dir_name(namespace))
}

/// `base_dir / (namespace or .nil) / name`, after validating both parts.
pub fn lock_path(base_dir: &Path, name: &str, namespace: Option<&str>) -> Result<PathBuf> {
    validate_lock_id(name, namespace)?;
    Ok(namespace_dir(base_dir, namespace).join(name))
}

/// Information about a lock observed on disk.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The lock file path.
    pub path: PathBuf,

    /// The namespace, `None` for the nil namespace.
    pub namespace: Option<String>,

    /// The lock name.
    pub name: String,

    /// Metadata, if the file holds any that parses.
    pub metadata: Option<LockMetadata>,

    /// Whether the lock is older than the stale threshold.
    pub is_stale: bool,
}

impl LockInfo {
    /// `namespace/name`, with `.nil` standing in for no namespace.
    pub fn qualified_name(&self) -> String {
        format!(
            "{}/{}",
            namespace_dir_name(self.namespace.as_deref()),
            self.name
        )
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.metadata {
            Some(meta) => write!(
                f,
                "{} (owner: {}, age: {}{})",
                self.qualified_name(),
                meta.owner,
                meta.age_string(),
                if self.is_stale { ", STALE" } else { "" }
            ),
            None => write!(f, "{} (no metadata)", self.qualified_name()),
        }
    }
}
