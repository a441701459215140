#![cfg(feature = "mysql")]

use std::io::Write;
use std::process::Command;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn import_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mysql-import"));
    cmd.env_remove("MYSQL_URL");
    cmd
}

#[test]
fn empty_script_fails_before_connecting() -> TestResult {
    let mut script = tempfile::NamedTempFile::new()?;
    writeln!(script, "   ")?;

    let output = import_command()
        .arg(script.path())
        .args(["--url", "mysql://nobody@127.0.0.1:1/none"])
        .output()?;

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Empty input"), "stdout: {stdout}");
    Ok(())
}

#[test]
fn unreachable_server_is_a_connection_error() -> TestResult {
    let mut script = tempfile::NamedTempFile::new()?;
    writeln!(script, "SELECT 1;")?;

    let output = import_command()
        .arg(script.path())
        .args(["--url", "mysql://nobody@127.0.0.1:1/none"])
        .output()?;

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Connection error"), "stdout: {stdout}");
    Ok(())
}

#[test]
fn invalid_prefix_is_rejected() -> TestResult {
    let mut script = tempfile::NamedTempFile::new()?;
    writeln!(script, "SELECT 1;")?;

    let output = import_command()
        .arg(script.path())
        .args(["--host", "127.0.0.1", "--user", "nobody", "--prefix", "bad-prefix"])
        .output()?;

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration error"), "stdout: {stdout}");
    Ok(())
}
