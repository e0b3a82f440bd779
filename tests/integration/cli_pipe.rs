//! Integration tests for stdin->stdout logging through the binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn loggify() -> Command {
    let mut cmd = Command::cargo_bin("loggify").unwrap();
    cmd.env("XDG_CONFIG_HOME", "/tmp/loggify-test-no-config");
    cmd
}

/// Message segment only, no banner, no colors.
fn plain() -> Command {
    let mut cmd = loggify();
    cmd.args([
        "--color=never",
        "--silent",
        "--no-caller",
        "--no-memory",
        "--no-timestamp",
        "--badge=off",
    ]);
    cmd
}

#[test]
fn empty_stdin_exits_zero() {
    plain().write_stdin("").assert().success().stdout("");
}

#[test]
fn each_line_is_logged() {
    plain()
        .write_stdin("one\ntwo\n")
        .assert()
        .success()
        .stdout("one\ntwo\n");
}

#[test]
fn tokens_are_substituted() {
    plain()
        .write_stdin("[emoji:rocket] [ansi:green]deployed[ansi:reset]\n")
        .assert()
        .success()
        .stdout("🚀 deployed\n");
}

#[test]
fn banner_is_printed_unless_silent() {
    loggify()
        .args(["--color=never", "--no-caller", "--no-memory", "--no-timestamp"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("╭ Loggify v"))
        .stdout(predicate::str::contains("├─── Log level: full"))
        .stdout(predicate::str::contains("╰─── Log memory usage: false"));
}

#[test]
fn always_color_keeps_control_codes() {
    plain()
        .arg("--color=always")
        .write_stdin("[ansi:red]hot[ansi:reset]\n")
        .assert()
        .success()
        .stdout("\x1b[31mhot\x1b[0m\n");
}

#[test]
fn full_badge_names_the_type() {
    plain()
        .args(["--badge=full", "--type=error"])
        .write_stdin("boom\n")
        .assert()
        .success()
        .stdout("   ERROR    boom\n");
}

#[test]
fn emoji_badge_pads_unknown_types() {
    plain()
        .args(["--badge=emoji", "--type=nothing-here"])
        .write_stdin("x\n")
        .assert()
        .success()
        .stdout("   x\n");
}

#[test]
fn caller_is_reported_or_marked_unknown() {
    let output = loggify()
        .args(["--color=never", "--silent", "--no-memory", "--no-timestamp", "--badge=off"])
        .write_stdin("where\n")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.ends_with(" where\n"), "{stdout:?}");
    assert!(stdout.len() > " where\n".len());
}

#[test]
fn json_lines_render_as_objects() {
    plain()
        .write_stdin("{\"user\": \"ann\", \"tags\": [\"a\"]}\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Found object in message => object:\n         {\n           user: \"ann\",\n           tags: [\n             'a'\n           ]\n         }\n",
        ))
        .stdout(predicate::str::contains("Object has \"27\" characters with a total size of 27 Bytes"));
}

#[test]
fn context_is_framed_and_flushed_at_end() {
    let output = plain()
        .args(["--context=job", "--context-title=Import"])
        .write_stdin("one\ntwo\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "╔═══════════════< Context start: Import");
    assert_eq!(lines[1], "║ one");
    assert_eq!(lines[2], "║ two");
    assert!(lines[3].starts_with("╚═══════════════> Context end: Import | Duration: "));
}

#[test]
fn context_start_end_mode() {
    let output = plain()
        .args(["--context=job", "--context-mode=startEnd"])
        .write_stdin("only\n")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines[0],
        "<───────────────| Context start: contextId: job |───────────────>"
    );
    assert_eq!(lines[1], "only");
    assert_eq!(lines[2], "┌───────────────│ Context end:contextID: job");
    assert!(lines[3].starts_with("└───────────────> Duration: "));
}

#[test]
fn discarded_context_prints_nothing() {
    plain()
        .args(["--context=job", "--discard"])
        .write_stdin("one\ntwo\n")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn minimal_level_hides_plain_lines() {
    plain()
        .arg("--level=minimal")
        .write_stdin("hidden\n")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn line_level_override_passes_minimal() {
    plain()
        .args(["--level=minimal", "--line-level=minimal"])
        .write_stdin("shown\n")
        .assert()
        .success()
        .stdout("shown\n");
}

#[test]
fn off_level_still_prints_banner() {
    loggify()
        .args(["--color=never", "--level=off", "--no-caller", "--no-memory", "--no-timestamp"])
        .write_stdin("hidden\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Log level: off"))
        .stdout(predicate::str::contains("hidden").not());
}

#[test]
fn invalid_level_is_rejected() {
    loggify()
        .arg("--level=verbose")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid log level"));
}

#[test]
fn context_flags_require_context() {
    loggify()
        .arg("--discard")
        .write_stdin("")
        .assert()
        .failure();
}
