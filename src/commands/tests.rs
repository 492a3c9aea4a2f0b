//! Tests for the list, clear, prune and path command handlers.

use super::*;
use clap::Parser;
use std::ffi::OsString;
use tempfile::TempDir;

fn context(temp_dir: &TempDir) -> Context {
    Context {
        config: Config::default(),
        base_dir: temp_dir.path().join("locks"),
    }
}

fn clear_args(name: &str, namespace: Option<&str>, force: bool) -> ClearArgs {
    ClearArgs {
        lock: LockIdArgs {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        },
        force,
    }
}

#[test]
fn test_clear_without_force_is_refused() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir);
    let lock = ctx.locker().acquire("job1", Some("batch")).unwrap();
    std::mem::forget(lock);

    let err = cmd_clear(&ctx, clear_args("job1", Some("batch"), false)).unwrap_err();

    assert!(matches!(err, NsLockError::UserError(_)));
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert!(err.to_string().contains("--force"));
    assert!(err.to_string().contains("nslock clear job1 -n batch --force"));
    assert!(ctx.base_dir.join("batch").join("job1").exists());
}

#[test]
fn test_clear_with_force_removes_lock() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir);
    let lock = ctx.locker().acquire("job1", None).unwrap();
    std::mem::forget(lock);

    let code = cmd_clear(&ctx, clear_args("job1", None, true)).unwrap();

    assert_eq!(code, exit_codes::SUCCESS);
    assert!(!ctx.base_dir.join(".nil").join("job1").exists());
}

#[test]
fn test_clear_missing_lock_is_user_error() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir);

    let err = cmd_clear(&ctx, clear_args("job1", None, true)).unwrap_err();

    assert!(matches!(err, NsLockError::UserError(_)));
}

#[test]
fn test_list_with_and_without_locks() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir);

    assert_eq!(cmd_list(&ctx).unwrap(), exit_codes::SUCCESS);

    let _held = ctx.locker().acquire("job1", Some("batch")).unwrap();
    std::fs::create_dir_all(ctx.base_dir.join(".nil")).unwrap();
    std::fs::write(ctx.base_dir.join(".nil").join("foreign"), "").unwrap();

    assert_eq!(cmd_list(&ctx).unwrap(), exit_codes::SUCCESS);
}

#[test]
fn test_list_on_unreadable_base_dir_is_io_failure() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("plain-file");
    std::fs::write(&file, "").unwrap();
    let ctx = Context {
        config: Config::default(),
        base_dir: file,
    };

    let err = cmd_list(&ctx).unwrap_err();

    assert_eq!(err.exit_code(), exit_codes::IO_FAILURE);
}

#[test]
fn test_prune_removes_empty_namespaces() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir);
    let mut idle = ctx.locker().acquire("job1", Some("idle")).unwrap();
    idle.release().unwrap();
    let _busy = ctx.locker().acquire("job1", Some("busy")).unwrap();

    assert_eq!(cmd_prune(&ctx).unwrap(), exit_codes::SUCCESS);

    assert!(!ctx.base_dir.join("idle").exists());
    assert!(ctx.base_dir.join("busy").join("job1").exists());
}

#[test]
fn test_path_validates_name() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = context(&temp_dir);

    let ok = LockIdArgs {
        name: "job1".to_string(),
        namespace: None,
    };
    assert_eq!(cmd_path(&ctx, ok).unwrap(), exit_codes::SUCCESS);

    let bad = LockIdArgs {
        name: "../escape".to_string(),
        namespace: None,
    };
    let err = cmd_path(&ctx, bad).unwrap_err();
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}

#[test]
fn test_dispatch_uses_base_dir_flag_over_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nslock.yaml");
    let from_config = temp_dir.path().join("from-config");
    let from_flag = temp_dir.path().join("from-flag");
    std::fs::write(&config_path, format!("base_dir: {}\n", from_config.display())).unwrap();

    let lock = Locker::new(&from_flag).acquire("job1", None).unwrap();
    std::mem::forget(lock);

    let args: Vec<OsString> = vec![
        "nslock".into(),
        "--config".into(),
        config_path.into(),
        "--base-dir".into(),
        from_flag.clone().into(),
        "clear".into(),
        "job1".into(),
        "--force".into(),
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    assert_eq!(dispatch(cli).unwrap(), exit_codes::SUCCESS);
    assert!(!from_flag.join(".nil").join("job1").exists());
}

#[test]
fn test_process_exit_code_does_not_wrap() {
    assert_eq!(process_exit_code(0), 0);
    assert_eq!(process_exit_code(7), 7);
    assert_eq!(process_exit_code(255), 255);
    assert_eq!(process_exit_code(256), exit_codes::IO_FAILURE as u8);
    assert_eq!(process_exit_code(-1), exit_codes::IO_FAILURE as u8);
}
