#![cfg(unix)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use hook_harness::{
    assert_allowed, assert_blocked, assert_context_added, assert_modified_input, create_payload,
    run_hook, HookEvent, PayloadOverrides, RunOptions,
};
use serde_json::{json, Value};
use serial_test::serial;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("failed to write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("failed to chmod");
    path
}

fn run_bin(bin: &str, args: &[&str], envs: &[(&str, &Path)]) -> (String, String, i32) {
    let output = Command::new(bin)
        .args(args)
        .envs(envs.iter().map(|(k, v)| (*k, v.as_os_str())))
        .output()
        .expect("failed to spawn");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

fn bash_payload(command: &str) -> hook_harness::Payload {
    create_payload(
        HookEvent::PreToolUse,
        &PayloadOverrides {
            tool_input: Some(json!({ "command": command })),
            ..Default::default()
        },
    )
}

#[test]
#[serial]
fn test_guard_hook_blocks_dangerous_command() {
    let temp = TempDir::new().unwrap();
    let hook = write_script(
        temp.path(),
        "guard.sh",
        r#"if grep -q 'rm -rf'; then echo "dangerous command detected" >&2; exit 2; fi"#,
    );

    let result = run_hook(&hook, &bash_payload("rm -rf /"), &RunOptions::default()).unwrap();
    assert!(result.blocked());
    assert_blocked(&result, Some("dangerous")).unwrap();
    assert!(assert_blocked(&result, Some("safe")).is_err());
    assert!(assert_allowed(&result).is_err());

    let result = run_hook(&hook, &bash_payload("ls"), &RunOptions::default()).unwrap();
    assert_allowed(&result).unwrap();
}

#[test]
#[serial]
fn test_block_decision_in_json_is_not_allowed() {
    let temp = TempDir::new().unwrap();
    let hook = write_script(temp.path(), "stop.sh", r#"echo '{"decision":"block"}'"#);
    let payload = create_payload(HookEvent::Stop, &PayloadOverrides::default());

    let result = run_hook(&hook, &payload, &RunOptions::default()).unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(assert_allowed(&result).is_err());
}

#[test]
#[serial]
fn test_rewriting_hook_modifies_input() {
    let temp = TempDir::new().unwrap();
    let hook = write_script(
        temp.path(),
        "rewrite.sh",
        r#"echo '{"hookSpecificOutput":{"updatedInput":{"command":"ls"}}}'"#,
    );

    let result = run_hook(&hook, &bash_payload("ls -la"), &RunOptions::default()).unwrap();
    assert_modified_input(&result, "command", "ls").unwrap();
    assert!(assert_modified_input(&result, "other", "x").is_err());
}

#[test]
#[serial]
fn test_plain_text_context() {
    let temp = TempDir::new().unwrap();
    let hook = write_script(temp.path(), "start.sh", "echo 'Loaded 3 files'");
    let payload = create_payload(HookEvent::SessionStart, &PayloadOverrides::default());

    let result = run_hook(&hook, &payload, &RunOptions::default()).unwrap();
    assert!(result.json_output().is_none());
    assert_context_added(&result, "Loaded 3 files").unwrap();
}

#[test]
#[serial]
fn test_slow_hook_times_out() {
    let temp = TempDir::new().unwrap();
    let hook = write_script(temp.path(), "slow.sh", "sleep 30");
    let options = RunOptions::default().with_timeout(Duration::from_secs(1));

    let result = run_hook(&hook, &bash_payload("ls"), &options).unwrap();
    assert!(result.timed_out);
    assert_eq!(result.exit_code, -1);
    assert!(result.stderr.contains("1s"), "stderr: {}", result.stderr);
}

#[test]
#[serial]
fn test_payload_command_prints_json() {
    let (stdout, _stderr, code) = run_bin(
        env!("CARGO_BIN_EXE_hook-harness"),
        &["payload", "Notification", "--set", "message=hi"],
        &[],
    );

    assert_eq!(code, 0);
    let payload: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(payload["hook_event_name"], json!("Notification"));
    assert_eq!(payload["message"], json!("hi"));
    assert_eq!(payload["notification_type"], json!("permission_prompt"));
    assert!(payload.get("tool_name").is_none());
}

#[test]
#[serial]
fn test_payload_command_unknown_event_fails() {
    let (_stdout, _stderr, code) = run_bin(
        env!("CARGO_BIN_EXE_hook-harness"),
        &["payload", "Start"],
        &[],
    );
    assert_ne!(code, 0, "Unknown events should be rejected");
}

#[test]
#[serial]
fn test_run_command_reports_result() {
    let temp = TempDir::new().unwrap();
    let hook = write_script(temp.path(), "deny.sh", "echo nope >&2; exit 2");

    let (stdout, _stderr, code) = run_bin(
        env!("CARGO_BIN_EXE_hook-harness"),
        &["run", hook.to_str().unwrap(), "PreToolUse"],
        &[],
    );

    assert_eq!(code, 0);
    let result: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["exit_code"], json!(2));
    assert_eq!(result["stderr"], json!("nope\n"));
    assert_eq!(result["timed_out"], json!(false));
}

#[test]
#[serial]
fn test_suite_command_exit_code_reflects_failures() {
    let temp = TempDir::new().unwrap();
    write_script(temp.path(), "allow.sh", "exit 0");
    let passing = temp.path().join("pass.test.yaml");
    fs::write(
        &passing,
        r#"
hook: allow.sh
cases:
  - name: allows stop
    event: Stop
    expect: [allowed]
"#,
    )
    .unwrap();

    let bin = env!("CARGO_BIN_EXE_hook-harness");
    let (stdout, _stderr, code) = run_bin(bin, &["suite", passing.to_str().unwrap()], &[]);
    assert_eq!(code, 0, "stdout: {}", stdout);
    assert!(stdout.contains("PASS allows stop"));
    assert!(stdout.contains("1 passed, 0 failed"));

    let failing = temp.path().join("fail.test.yaml");
    fs::write(
        &failing,
        r#"
hook: allow.sh
cases:
  - name: expects block
    event: PreToolUse
    expect:
      - blocked:
"#,
    )
    .unwrap();

    let pattern = format!("{}/*.test.yaml", temp.path().display());
    let (stdout, _stderr, code) = run_bin(bin, &["suite", &pattern], &[]);
    assert_ne!(code, 0);
    assert!(stdout.contains("FAIL expects block"));
    assert!(stdout.contains("1 passed, 1 failed"));
}

#[test]
#[serial]
fn test_validate_skill_mirrors_tool() {
    let temp = TempDir::new().unwrap();
    let tool = write_script(
        temp.path(),
        "skills-ref",
        r#"echo "checked $2"; echo "1 warning" >&2; exit 3"#,
    );

    let direct = run_bin(tool.to_str().unwrap(), &["--check", "skill.md"], &[]);
    let delegated = run_bin(
        env!("CARGO_BIN_EXE_validate-skill"),
        &["--check", "skill.md"],
        &[("SKILLS_REF_BIN", &tool)],
    );

    assert_eq!(delegated, direct);
    assert_eq!(delegated.0, "checked skill.md\n");
    assert_eq!(delegated.2, 3);
}

#[test]
#[serial]
fn test_validate_skill_missing_tool_fails() {
    let (_stdout, stderr, code) = run_bin(
        env!("CARGO_BIN_EXE_validate-skill"),
        &[],
        &[("SKILLS_REF_BIN", Path::new("/nonexistent/skills-ref"))],
    );
    assert_eq!(code, 1);
    assert_eq!(
        stderr.matches("/nonexistent/skills-ref").count(),
        1,
        "stderr: {}",
        stderr
    );
}
