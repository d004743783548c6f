use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_ccstatus");

/// Run the binary with an isolated home and cache, feeding `stdin`.
fn run(home: &Path, args: &[&str], stdin: &str) -> Output {
    run_with(home, Command::new(BIN), args, stdin)
}

fn run_with(home: &Path, mut command: Command, args: &[&str], stdin: &str) -> Output {
    let mut child = command
        .args(args)
        .env("HOME", home)
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env("CCSTATUS_CACHE_DIR", home.join("cache"))
        .env("NO_COLOR", "1")
        .env_remove("CCSTATUS_CONFIG")
        .env_remove("CCSTATUS_DEBUG")
        .env_remove("CLAUDE_CODE_OAUTH_TOKEN")
        .env_remove("ANTHROPIC_AUTH_TOKEN")
        .env_remove("CLAUDE_CONFIG_DIR")
        .env_remove("CCSTATUS_USER_AGENT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8(out.stdout.clone()).unwrap()
}

#[test]
fn empty_stdin_prints_help() {
    let home = tempfile::tempdir().unwrap();
    let out = run(home.path(), &[], "");
    assert!(out.status.success());
    assert!(stdout(&out).contains("USAGE"));
}

#[test]
fn invalid_stdin_prints_help() {
    let home = tempfile::tempdir().unwrap();
    for input in ["not json", "null", "42"] {
        let out = run(home.path(), &[], input);
        assert!(out.status.success(), "{input}");
        assert!(stdout(&out).contains("EXAMPLE INPUT"), "{input}");
    }
}

#[test]
fn version_subcommand_and_flag() {
    let home = tempfile::tempdir().unwrap();
    for args in [&["version"][..], &["--version"][..]] {
        let out = run(home.path(), args, "");
        assert!(out.status.success());
        assert!(stdout(&out).starts_with(&format!("ccstatus {}", env!("CARGO_PKG_VERSION"))));
    }
}

#[test]
fn renders_a_session() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("ccstatus.yaml");
    std::fs::write(&config, "active: [model, changes, version]\n").unwrap();

    let session = r#"{
        "session_id": "cli-test",
        "model": {"id": "claude-opus-4-1", "display_name": "Opus 4.1"},
        "workspace": {"current_dir": "/work/app", "project_dir": "/work/app"},
        "version": "1.0.80",
        "cost": {"total_lines_added": 3, "total_lines_removed": 1}
    }"#;
    let out = run(home.path(), &["--config", config.to_str().unwrap()], session);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "\u{f2db} Opus | +3-1 | v1.0.80");
}

#[test]
fn default_layout_shows_only_what_has_data() {
    let home = tempfile::tempdir().unwrap();
    let session = r#"{
        "session_id": "defaults",
        "transcript_path": "",
        "model": {"id": "claude-opus-4-1", "display_name": "Opus 4.1"},
        "cost": {"total_cost_usd": 0, "total_duration_ms": 0, "total_lines_added": 0, "total_lines_removed": 0}
    }"#;
    let mut command = Command::new(BIN);
    command.env("CCSTATUS_NO_CACHE", "1");
    let out = run_with(home.path(), command, &[], session);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "\u{f2db} Opus");
    assert!(!home.path().join("cache/ccstatus_defaults.json").exists());
}

#[test]
fn session_cache_file_is_written() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("ccstatus.yaml");
    std::fs::write(&config, "active: [tokens]\n").unwrap();

    let session = r#"{"session_id": "cached-run", "transcript_path": "/nonexistent/t.jsonl"}"#;
    let out = run(home.path(), &["--config", config.to_str().unwrap()], session);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "");
    assert!(home.path().join("cache/ccstatus_cached-run.json").exists());
}
