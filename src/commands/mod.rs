//! Command implementations for nslock.
//!
//! This module resolves configuration once and routes each CLI command to
//! its handler. Handlers return the process exit code.

mod run;
#[cfg(test)]
mod tests;

use crate::cli::{ClearArgs, Cli, Command, LockIdArgs};
use nslock::error::{NsLockError, Result};
use nslock::exit_codes;
use nslock::locks::{self, LockInfo, LockMetadata, Locker};
use nslock::Config;
use std::path::PathBuf;

/// Configuration resolved for one invocation.
struct Context {
    config: Config,
    base_dir: PathBuf,
}

impl Context {
    /// `--base-dir` beats `NSLOCK_BASE_DIR`, which beats the config file.
    fn resolve(cli: &Cli) -> Result<Self> {
        let config = Config::discover(cli.config.as_deref())?;
        let base_dir = cli
            .base_dir
            .clone()
            .unwrap_or_else(|| config.resolve_base_dir());
        Ok(Self { config, base_dir })
    }

    fn locker(&self) -> Locker {
        Locker::new(&self.base_dir)
            .with_retry_policy(self.config.retry_policy())
            .with_metadata(self.config.write_metadata)
    }
}

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let ctx = Context::resolve(&cli)?;

    match cli.command {
        Command::Run(args) => run::cmd_run(&ctx.locker(), args),
        Command::List => cmd_list(&ctx),
        Command::Clear(args) => cmd_clear(&ctx, args),
        Command::Prune => cmd_prune(&ctx),
        Command::Path(args) => cmd_path(&ctx, args),
    }
}

/// Convert a handler's exit code into a process exit status.
///
/// Codes outside `0..=255` cannot be reported faithfully and would wrap, so
/// they become [`exit_codes::IO_FAILURE`].
pub fn process_exit_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(exit_codes::IO_FAILURE as u8)
}

fn print_metadata(meta: &LockMetadata, indent: &str) {
    println!("{}Owner:      {}", indent, meta.owner);
    if let Some(pid) = meta.pid {
        println!("{}PID:        {}", indent, pid);
    }
    println!(
        "{}Created:    {}",
        indent,
        meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{}Age:        {}", indent, meta.age_string());
}

fn cmd_list(ctx: &Context) -> Result<i32> {
    let locks = locks::list_locks(&ctx.base_dir, ctx.config.stale_minutes)?;

    if locks.is_empty() {
        println!("No active locks.");
        return Ok(exit_codes::SUCCESS);
    }

    println!("Active locks ({}):", locks.len());
    println!();

    for lock in &locks {
        println!("  {}:", lock.qualified_name());
        match &lock.metadata {
            Some(meta) => print_metadata(meta, "    "),
            None => println!("    Owner:      (no metadata)"),
        }
        if lock.is_stale {
            println!(
                "    Status:     STALE (exceeds {} min threshold)",
                ctx.config.stale_minutes
            );
        }
        println!("    Path:       {}", lock.path.display());
        println!();
    }

    let stale_count = locks.iter().filter(|l| l.is_stale).count();
    if stale_count > 0 {
        println!(
            "Note: {} lock(s) are stale. Use `nslock clear <name> [-n <namespace>] --force` to clear.",
            stale_count
        );
    }

    Ok(exit_codes::SUCCESS)
}

fn cmd_clear(ctx: &Context, args: ClearArgs) -> Result<i32> {
    let LockIdArgs { name, namespace } = args.lock;

    if !args.force {
        let ns_flag = namespace
            .as_deref()
            .map(|ns| format!(" -n {}", ns))
            .unwrap_or_default();
        return Err(NsLockError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing a lock while its holder is still running breaks mutual exclusion.\n\
             Only clear locks if you are certain the lock holder has exited.\n\n\
             To clear the lock, run:\n  nslock clear {}{} --force",
            name, ns_flag
        )));
    }

    let cleared: LockInfo = locks::clear_lock(
        &ctx.base_dir,
        &name,
        namespace.as_deref(),
        ctx.config.stale_minutes,
    )?;

    println!("Cleared lock: {}", cleared.qualified_name());
    if let Some(meta) = &cleared.metadata {
        println!();
        println!("Lock details:");
        print_metadata(meta, "  ");
        if cleared.is_stale {
            println!("  Status:     was STALE");
        }
    }
    println!("  Path:       {}", cleared.path.display());

    Ok(exit_codes::SUCCESS)
}

fn cmd_prune(ctx: &Context) -> Result<i32> {
    let removed = locks::prune_namespaces(&ctx.base_dir)?;
    println!(
        "Removed {} empty namespace {}.",
        removed,
        if removed == 1 { "directory" } else { "directories" }
    );
    Ok(exit_codes::SUCCESS)
}

fn cmd_path(ctx: &Context, args: LockIdArgs) -> Result<i32> {
    let path = locks::lock_path(&ctx.base_dir, &args.name, args.namespace.as_deref())?;
    println!("{}", path.display());
    Ok(exit_codes::SUCCESS)
}
