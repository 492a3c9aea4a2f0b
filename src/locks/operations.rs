//! Lock acquisition, listing, clearing and pruning operations.

use super::create::{CreateFailure, LockFs, OsFs, RetryDecision, RetryPolicy};
use super::guard::Lock;
use super::metadata::LockMetadata;
use super::types::{LockInfo, lock_path, namespace_dir, namespace_from_dir_name};
use crate::config::Config;
use crate::error::{NsLockError, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// Acquires locks under one base directory.
#[derive(Debug, Clone)]
pub struct Locker {
    base_dir: PathBuf,
    retry: RetryPolicy,
    write_metadata: bool,
    fs: Arc<dyn LockFs>,
}

impl Locker {
    /// A locker over `base_dir` with the default retry policy, writing
    /// metadata into lock files.
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
            retry: RetryPolicy::default(),
            write_metadata: true,
            fs: Arc::new(OsFs),
        }
    }

    /// A locker configured from `config`, honoring `NSLOCK_BASE_DIR`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.resolve_base_dir())
            .with_retry_policy(config.retry_policy())
            .with_metadata(config.write_metadata)
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether to write [`LockMetadata`] into newly created lock files.
    pub fn with_metadata(mut self, write_metadata: bool) -> Self {
        self.write_metadata = write_metadata;
        self
    }

    /// Replace the filesystem used for the lock protocol.
    pub fn with_fs(mut self, fs: Arc<dyn LockFs>) -> Self {
        self.fs = fs;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the lock file for `name` in `namespace`.
    pub fn lock_path(&self, name: &str, namespace: Option<&str>) -> Result<PathBuf> {
        lock_path(&self.base_dir, name, namespace)
    }

    /// Acquire the lock `name` in `namespace`.
    ///
    /// Creates the namespace directory if needed, then creates the lock file
    /// exclusively. If the directory disappears before the file is created
    /// (another process pruned it), both steps are repeated as the retry
    /// policy allows.
    ///
    /// # Returns
    ///
    /// * `Ok(Lock)` - The lock is held
    /// * `Err(NsLockError::AlreadyLocked)` - Another holder has the lock
    /// * `Err(NsLockError::IoFailure)` - Any other failure; nothing is left on disk
    /// * `Err(NsLockError::UserError)` - Invalid name or namespace
    pub fn acquire(&self, name: &str, namespace: Option<&str>) -> Result<Lock> {
        let path = self.lock_path(name, namespace)?;
        let dir = namespace_dir(&self.base_dir, namespace);

        let metadata = if self.write_metadata {
            Some(LockMetadata::new(name, namespace).to_json()?)
        } else {
            None
        };

        let mut lock = Lock::pending(name, namespace, path.clone(), Arc::clone(&self.fs));
        let mut retries = 0u32;

        let file = loop {
            self.fs.create_dir_all(&dir).map_err(|e| {
                NsLockError::io(
                    format!("failed to create namespace directory '{}'", dir.display()),
                    e,
                )
            })?;

            let failure = match self.fs.create_new(&path) {
                Ok(file) => break file,
                Err(e) => CreateFailure::classify(e),
            };

            match self.retry.decide(retries, &failure) {
                RetryDecision::Retry(delay) => {
                    retries += 1;
                    debug!(
                        "namespace directory '{}' vanished, retrying ({}/{})",
                        dir.display(),
                        retries,
                        self.retry.max_retries()
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                RetryDecision::GiveUp => return Err(self.create_error(&path, failure, retries)),
            }
        };

        lock.adopt(file);

        if let Some(json) = metadata
            && let Err(e) = lock.write_metadata(json.as_bytes())
        {
            if let Err(release_err) = lock.release() {
                warn!("{}", release_err);
            }
            return Err(NsLockError::io(
                format!("failed to write lock metadata to '{}'", path.display()),
                e,
            ));
        }

        debug!("acquired lock '{}'", path.display());
        Ok(lock)
    }

    /// Hold the lock `name` in `namespace` while `f` runs.
    ///
    /// The lock is released explicitly after `f` returns and a failed release
    /// is reported. If `f` panics the lock is released on unwind.
    pub fn with_lock<T, F>(&self, name: &str, namespace: Option<&str>, f: F) -> Result<T>
    where
        F: FnOnce(&Lock) -> T,
    {
        let mut lock = self.acquire(name, namespace)?;
        let out = f(&lock);
        lock.release()?;
        Ok(out)
    }

    fn create_error(&self, path: &Path, failure: CreateFailure, retries: u32) -> NsLockError {
        match failure {
            CreateFailure::AlreadyExists => NsLockError::AlreadyLocked {
                path: path.to_path_buf(),
                holder: LockMetadata::from_file(path).ok().map(|m| m.describe()),
            },
            CreateFailure::DirectoryVanished(e) => NsLockError::io(
                format!(
                    "namespace directory for '{}' kept vanishing after {} retries",
                    path.display(),
                    retries
                ),
                e,
            ),
            CreateFailure::Other(e) => {
                NsLockError::io(format!("failed to create lock file '{}'", path.display()), e)
            }
        }
    }
}

/// Acquire a lock with the default policy.
///
/// See [`Locker::acquire`].
pub fn acquire<P: Into<PathBuf>>(
    name: &str,
    namespace: Option<&str>,
    base_dir: P,
) -> Result<Lock> {
    Locker::new(base_dir).acquire(name, namespace)
}

fn lock_info(path: PathBuf, dir_name: &str, name: &str, stale_minutes: u32) -> LockInfo {
    // Empty or foreign files are still locks; they just carry no metadata.
    let metadata = LockMetadata::from_file(&path).ok();
    let is_stale = metadata
        .as_ref()
        .is_some_and(|m| m.is_stale(stale_minutes));

    LockInfo {
        path,
        namespace: namespace_from_dir_name(dir_name),
        name: name.to_string(),
        metadata,
        is_stale,
    }
}

fn read_dir(dir: &Path) -> Result<fs::ReadDir> {
    fs::read_dir(dir).map_err(|e| {
        NsLockError::io(
            format!("failed to read lock directory '{}'", dir.display()),
            e,
        )
    })
}

/// List all locks under `base_dir`, sorted by namespace then name.
///
/// A missing `base_dir` has no locks.
pub fn list_locks(base_dir: &Path, stale_minutes: u32) -> Result<Vec<LockInfo>> {
    let mut locks = Vec::new();

    if !base_dir.exists() {
        return Ok(locks);
    }

    for ns_entry in read_dir(base_dir)? {
        let ns_entry = ns_entry.map_err(|e| {
            NsLockError::io(
                format!("failed to read lock directory entry in '{}'", base_dir.display()),
                e,
            )
        })?;

        let ns_path = ns_entry.path();
        if !ns_path.is_dir() {
            continue;
        }
        let Some(dir_name) = ns_entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        // A namespace pruned while we walk simply has no locks.
        let entries = match fs::read_dir(&ns_path) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            locks.push(lock_info(path, &dir_name, &name, stale_minutes));
        }
    }

    // Sort by namespace (nil first) then name for consistent output
    locks.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));

    Ok(locks)
}

/// Forcibly remove a lock file.
///
/// This is operator recovery for a holder that died without releasing. The
/// caller is responsible for deciding that clearing is appropriate.
///
/// # Returns
///
/// * `Ok(LockInfo)` - What was cleared
/// * `Err(NsLockError::UserError)` - No such lock, or invalid name
/// * `Err(NsLockError::IoFailure)` - The lock file could not be removed
pub fn clear_lock(
    base_dir: &Path,
    name: &str,
    namespace: Option<&str>,
    stale_minutes: u32,
) -> Result<LockInfo> {
    let path = lock_path(base_dir, name, namespace)?;

    if !path.is_file() {
        return Err(NsLockError::UserError(format!(
            "lock '{}' does not exist at: {}",
            name,
            path.display()
        )));
    }

    let dir_name = super::types::namespace_dir_name(namespace).to_string();
    let info = lock_info(path.clone(), &dir_name, name, stale_minutes);

    fs::remove_file(&path)
        .map_err(|e| NsLockError::io(format!("failed to clear lock '{}'", path.display()), e))?;

    debug!("cleared lock '{}'", path.display());
    Ok(info)
}

/// Remove empty namespace directories under `base_dir`.
///
/// Runs concurrently with acquisitions; a directory that gains a lock file
/// between the emptiness check and the removal is left alone. Returns the
/// number of directories removed.
pub fn prune_namespaces(base_dir: &Path) -> Result<usize> {
    if !base_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in read_dir(base_dir)?.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }

        let is_empty = match fs::read_dir(&dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => false,
        };
        if !is_empty {
            continue;
        }

        match fs::remove_dir(&dir) {
            Ok(()) => {
                debug!("pruned namespace directory '{}'", dir.display());
                removed += 1;
            }
            Err(e) => debug!("skipping namespace directory '{}': {}", dir.display(), e),
        }
    }

    Ok(removed)
}
