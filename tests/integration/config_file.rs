//! Config file discovery, precedence and error reporting.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[allow(deprecated)]
fn loggify_with_xdg(xdg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("loggify").unwrap();
    cmd.env("XDG_CONFIG_HOME", xdg);
    cmd
}

fn write_config(dir: &TempDir, content: &str) {
    let config_dir = dir.path().join("loggify");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), content).unwrap();
}

const QUIET: &str = r#"
color = "never"
badge = "off"
memory = false
init_silent = true

[timestamp]
enabled = false

[caller]
enabled = false
"#;

#[test]
fn discovered_file_configures_output() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, QUIET);

    loggify_with_xdg(dir.path())
        .write_stdin("from file\n")
        .assert()
        .success()
        .stdout("from file\n");
}

#[test]
fn file_level_gates_lines() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &format!("log_level = \"off\"\n{QUIET}"));

    loggify_with_xdg(dir.path())
        .write_stdin("hidden\n")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn cli_flags_override_file() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &format!("log_level = \"off\"\n{QUIET}"));

    loggify_with_xdg(dir.path())
        .args(["--level=full", "--badge=full", "--type=info"])
        .write_stdin("shown\n")
        .assert()
        .success()
        .stdout("   INFO     shown\n");
}

#[test]
fn explicit_config_path_is_used() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, QUIET).unwrap();
    let empty = TempDir::new().unwrap();

    loggify_with_xdg(empty.path())
        .arg("--config")
        .arg(&path)
        .write_stdin("custom\n")
        .assert()
        .success()
        .stdout("custom\n");
}

#[test]
fn missing_explicit_config_fails() {
    let empty = TempDir::new().unwrap();

    loggify_with_xdg(empty.path())
        .args(["--config", "/nonexistent/loggify.toml"])
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn invalid_toml_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "log_level = [unclosed\n");

    loggify_with_xdg(dir.path())
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config file error"));
}

#[test]
fn unknown_level_in_file_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "log_level = \"loud\"\n");

    loggify_with_xdg(dir.path())
        .write_stdin("")
        .assert()
        .code(1);
}
