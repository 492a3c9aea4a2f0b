use crate::locks::{LockFs, Locker, RetryPolicy};
use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Sets an environment variable for the lifetime of the guard.
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<OsString>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: Option<&str>) -> Self {
        // The process environment is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = ENV_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::var_os(key);
        // SAFETY: every test that touches the environment holds ENV_LOCK.
        unsafe {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
        Self {
            key,
            original,
            _lock: lock,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: ENV_LOCK is still held by this guard.
        unsafe {
            match &self.original {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }
}

/// A fresh base directory and a locker over it that never sleeps between retries.
pub(crate) fn temp_locker() -> (TempDir, Locker) {
    let temp_dir = TempDir::new().unwrap();
    let locker = Locker::new(temp_dir.path().join("locks"))
        .with_retry_policy(RetryPolicy::new(16, std::time::Duration::ZERO));
    (temp_dir, locker)
}

/// Fails the first `failures` creates with NotFound after removing the
/// namespace directory, like a concurrent prune would.
#[derive(Debug)]
pub(crate) struct VanishingDirFs {
    failures: AtomicUsize,
    pub(crate) dir_creates: AtomicUsize,
    pub(crate) creates: AtomicUsize,
}

impl VanishingDirFs {
    pub(crate) fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures: AtomicUsize::new(failures),
            dir_creates: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        })
    }
}

impl LockFs for VanishingDirFs {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        self.dir_creates.fetch_add(1, Ordering::SeqCst);
        std::fs::create_dir_all(dir)
    }

    fn create_new(&self, path: &Path) -> io::Result<File> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            if let Some(dir) = path.parent() {
                let _ = std::fs::remove_dir(dir);
            }
            return Err(io::Error::new(io::ErrorKind::NotFound, "No such file"));
        }
        std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
    }
}

/// Fails every create with the given error kind.
#[derive(Debug)]
pub(crate) struct FailingCreateFs {
    kind: io::ErrorKind,
    pub(crate) creates: AtomicUsize,
}

impl FailingCreateFs {
    pub(crate) fn new(kind: io::ErrorKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            creates: AtomicUsize::new(0),
        })
    }
}

impl LockFs for FailingCreateFs {
    fn create_new(&self, _path: &Path) -> io::Result<File> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::new(self.kind, "injected create failure"))
    }
}

/// Creates the lock file, then fails writing metadata into it.
#[derive(Debug, Default)]
pub(crate) struct FailingMetadataFs;

impl LockFs for FailingMetadataFs {
    fn write_metadata(&self, _file: &mut File, _contents: &[u8]) -> io::Result<()> {
        Err(io::Error::other("injected write failure"))
    }
}

/// Fails the first `failures` removals with PermissionDenied.
#[derive(Debug)]
pub(crate) struct FailingRemoveFs {
    failures: AtomicUsize,
    pub(crate) removes: AtomicUsize,
}

impl FailingRemoveFs {
    pub(crate) fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures: AtomicUsize::new(failures),
            removes: AtomicUsize::new(0),
        })
    }
}

impl LockFs for FailingRemoveFs {
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "injected remove failure",
            ));
        }
        std::fs::remove_file(path)
    }
}
