//! The held lock.

use super::create::LockFs;
use crate::error::{NsLockError, Result};
use log::{debug, warn};
use std::fs::{self, File, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A named, namespaced lock backed by a lock file.
///
/// The lock is held from the moment [`Locker::acquire`](super::Locker::acquire)
/// returns it until [`Lock::release`] is called. Prefer
/// [`Locker::with_lock`](super::Locker::with_lock) or an explicit `release`:
/// dropping a held `Lock` also releases it, but only as a backstop, and drop
/// cannot report a failed release except through the log.
#[derive(Debug)]
pub struct Lock {
    name: String,
    namespace: Option<String>,
    path: PathBuf,

    /// Open handle from the exclusive create. `None` before the create
    /// succeeded and after release.
    file: Option<File>,

    /// Whether the lock file on disk was created by this instance and not
    /// yet removed.
    owns_file: bool,

    /// Identity of the file this instance created, if the platform exposes one.
    created: Option<FileId>,

    fs: Arc<dyn LockFs>,
}

/// Device and inode of a lock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(unix), allow(dead_code))]
struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    #[cfg(unix)]
    fn of(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn of(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

impl Lock {
    /// A lock that has not created its file yet.
    pub(super) fn pending(
        name: &str,
        namespace: Option<&str>,
        path: PathBuf,
        fs: Arc<dyn LockFs>,
    ) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            path,
            file: None,
            owns_file: false,
            created: None,
            fs,
        }
    }

    /// Take ownership of the handle returned by a successful exclusive create.
    pub(super) fn adopt(&mut self, file: File) {
        self.created = file.metadata().ok().as_ref().and_then(FileId::of);
        self.file = Some(file);
        self.owns_file = true;
    }

    /// Write metadata through the held handle.
    pub(super) fn write_metadata(&mut self, contents: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => self.fs.write_metadata(file, contents),
            None => Err(io::Error::other("lock file handle is not open")),
        }
    }

    /// Lock name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace, `None` for the nil namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this instance still owns the lock file.
    pub fn is_held(&self) -> bool {
        self.owns_file
    }

    /// Release the lock: close the handle, then delete the lock file.
    ///
    /// Safe to call more than once; later calls are no-ops. On a lock whose
    /// file was never created this only closes the handle, if any.
    ///
    /// If the file cannot be deleted a [`NsLockError::ReleaseFailure`] is
    /// returned and the lock stays held, so calling `release` again retries
    /// the deletion. A file that is already gone (for example cleared by an
    /// operator) counts as released, and so does a file at the same path that
    /// another holder created after such a clear. That file is left alone.
    pub fn release(&mut self) -> Result<()> {
        // Close before delete; some platforms refuse to delete open files.
        drop(self.file.take());

        if !self.owns_file {
            return Ok(());
        }

        if self.replaced_on_disk()? {
            warn!(
                "lock file '{}' now belongs to another holder, leaving it in place",
                self.path.display()
            );
            self.owns_file = false;
            return Ok(());
        }

        match self.fs.remove_file(&self.path) {
            Ok(()) => {
                debug!("released lock '{}'", self.path.display());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "lock file '{}' was already removed before release",
                    self.path.display()
                );
            }
            Err(e) => {
                return Err(NsLockError::ReleaseFailure {
                    path: self.path.clone(),
                    source: e,
                });
            }
        }

        self.owns_file = false;
        Ok(())
    }

    /// Whether the file at `path` is no longer the one this instance created.
    fn replaced_on_disk(&self) -> Result<bool> {
        let Some(created) = self.created else {
            return Ok(false);
        };

        match fs::metadata(&self.path) {
            Ok(current) => Ok(FileId::of(&current) != Some(created)),
            // Gone entirely; removal reports it.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(NsLockError::ReleaseFailure {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        if (self.owns_file || self.file.is_some())
            && let Err(e) = self.release()
        {
            warn!("{}", e);
        }
    }
}
