//! `nslock run`: hold a lock for the lifetime of a child process.

use crate::cli::RunArgs;
use log::debug;
use nslock::error::{NsLockError, Result};
use nslock::exit_codes;
use nslock::locks::Locker;
use std::process::{Command, ExitStatus};

pub(super) fn cmd_run(locker: &Locker, args: RunArgs) -> Result<i32> {
    let (program, rest) = args
        .command
        .split_first()
        .ok_or_else(|| NsLockError::UserError("no command given to run".to_string()))?;

    let status = locker.with_lock(&args.lock.name, args.lock.namespace.as_deref(), |lock| {
        debug!(
            "running {:?} while holding '{}'",
            program,
            lock.path().display()
        );
        Command::new(program).args(rest).status()
    })?;

    let status = status.map_err(|e| {
        NsLockError::io(format!("failed to run '{}'", program.to_string_lossy()), e)
    })?;

    Ok(exit_code(status))
}

/// The child's exit code, or `128 + signal` when it was killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    exit_codes::IO_FAILURE
}
