//! CLI argument parsing for nslock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// nslock: namespaced advisory file locks.
///
/// A lock is a file under `<base-dir>/<namespace>/`. Locks without a
/// namespace live under `<base-dir>/.nil/`.
#[derive(Parser, Debug)]
#[command(name = "nslock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding all lock namespaces (overrides config and NSLOCK_BASE_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Config file to load (overrides NSLOCK_CONFIG).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for nslock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding a lock.
    ///
    /// Fails immediately if the lock is held elsewhere. The lock is released
    /// when the command exits, and nslock exits with the command's code.
    Run(RunArgs),

    /// List all locks with their owner and age.
    List,

    /// Forcibly remove a lock left behind by a dead holder.
    ///
    /// Requires --force flag to prevent accidental clearing.
    Clear(ClearArgs),

    /// Remove empty namespace directories.
    Prune,

    /// Print the lock file path for a lock.
    Path(LockIdArgs),
}

/// Lock name and optional namespace.
#[derive(Parser, Debug)]
pub struct LockIdArgs {
    /// Lock name.
    pub name: String,

    /// Namespace; omit for the nil namespace.
    #[arg(short, long)]
    pub namespace: Option<String>,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub lock: LockIdArgs,

    /// Command and arguments to run while the lock is held.
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<OsString>,
}

/// Arguments for the `clear` command.
#[derive(Parser, Debug)]
pub struct ClearArgs {
    #[command(flatten)]
    pub lock: LockIdArgs,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
