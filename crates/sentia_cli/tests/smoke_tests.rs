//! CLI smoke tests: verify basic binary behavior.

use std::io::Write;
use std::process::{Command, Stdio};

fn cli_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sentia"))
}

#[test]
fn test_help_flag() {
    let output = cli_bin().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "Expected usage info in --help output");
    assert!(stdout.contains("--scenario"));
}

#[test]
fn test_version_flag() {
    let output = cli_bin().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sentia"), "Expected name in --version output");
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let output = cli_bin()
        .args(["--config", "/tmp/nonexistent_sentia_config_12345.toml"])
        .args(["--deterministic", "--cycles", "12"])
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("step   11"));
    assert!(stdout.contains("12 cycles, 2 events"));
}

#[test]
fn test_unknown_scenario_is_rejected() {
    let output = cli_bin().args(["--scenario", "nope"]).output().expect("failed to run");
    assert!(!output.status.success());
}

#[test]
fn test_deterministic_runs_match() {
    let run = || {
        cli_bin()
            .args(["--config", "/tmp/nonexistent_sentia_config_12345.toml"])
            .args(["--deterministic", "--seed", "7", "--cycles", "40", "--scenario", "oscillation"])
            .output()
            .expect("failed to run")
    };
    let (a, b) = (run(), run());
    assert!(a.status.success());
    let strip = |out: &[u8]| -> String {
        // the final summary carries a wall-clock timestamp
        String::from_utf8_lossy(out)
            .lines()
            .filter(|l| !l.starts_with('['))
            .collect::<Vec<_>>()
            .join("\n")
    };
    assert_eq!(strip(&a.stdout), strip(&b.stdout));
}

#[test]
fn test_save_and_resume_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.json");

    let saved = cli_bin()
        .args(["--config", "/tmp/nonexistent_sentia_config_12345.toml"])
        .args(["--deterministic", "--cycles", "5", "--save"])
        .arg(&path)
        .output()
        .expect("failed to run");
    assert!(saved.status.success());
    assert!(path.exists());

    let resumed = cli_bin()
        .args(["--cycles", "3", "--scenario", "idle", "--resume"])
        .arg(&path)
        .output()
        .expect("failed to run");
    assert!(resumed.status.success(), "stderr: {}", String::from_utf8_lossy(&resumed.stderr));
}

#[test]
fn test_live_mode_exits_on_closed_stdin() {
    let mut child = cli_bin()
        .args(["--mode", "live", "--deterministic", "--interval-ms", "10"])
        .args(["--config", "/tmp/nonexistent_sentia_config_12345.toml"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn");
    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, "exit").unwrap();
    }
    let output = child.wait_with_output().expect("failed to wait");
    assert!(output.status.success());
}
