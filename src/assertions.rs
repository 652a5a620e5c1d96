//! Checks on a [`HookResult`] following the hook exit-code and output contract.
//!
//! Each check returns an [`AssertionFailure`] describing what was observed
//! when the expectation does not hold, so tests can `?` or `unwrap()` them.

use crate::result::{HookResult, EXIT_ALLOW, EXIT_BLOCK};
use serde_json::{Map, Value};
use std::fmt::Display;

/// An expectation about a hook's behaviour that did not hold
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AssertionFailure {
    pub message: String,
}

impl AssertionFailure {
    fn new(message: impl Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

pub type AssertionResult = Result<(), AssertionFailure>;

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn render(output: &Map<String, Value>) -> String {
    Value::Object(output.clone()).to_string()
}

fn expect_exit(result: &HookResult, expected: i32, label: &str) -> AssertionResult {
    if result.exit_code == expected {
        return Ok(());
    }
    Err(AssertionFailure::new(format!(
        "Expected exit code {} ({}), got {}. Stderr: {}",
        expected, label, result.exit_code, result.stderr
    )))
}

/// The hook blocked the action (exit code 2), optionally giving a reason
/// containing `reason_contains` (case-insensitive) on stderr.
pub fn assert_blocked(result: &HookResult, reason_contains: Option<&str>) -> AssertionResult {
    expect_exit(result, EXIT_BLOCK, "block")?;

    match reason_contains {
        Some(reason) if !reason.is_empty() && !contains_ignore_case(&result.stderr, reason) => {
            Err(AssertionFailure::new(format!(
                "Expected stderr to contain '{}', got: {}",
                reason, result.stderr
            )))
        }
        _ => Ok(()),
    }
}

/// The hook allowed the action: exit code 0 and no block/deny decision in
/// its structured output.
pub fn assert_allowed(result: &HookResult) -> AssertionResult {
    expect_exit(result, EXIT_ALLOW, "allow")?;

    let Some(output) = result.json_output() else {
        return Ok(());
    };
    if output.get("decision").and_then(Value::as_str) == Some("block") {
        return Err(AssertionFailure::new(format!(
            "Hook returned block decision: {}",
            render(output)
        )));
    }
    if result
        .hook_specific("permissionDecision")
        .and_then(Value::as_str)
        == Some("deny")
    {
        return Err(AssertionFailure::new(format!(
            "Hook returned deny decision: {}",
            render(output)
        )));
    }
    Ok(())
}

/// The hook rewrote the tool input so that `field` equals `expected`.
pub fn assert_modified_input(
    result: &HookResult,
    field: &str,
    expected: impl Into<Value>,
) -> AssertionResult {
    let expected = expected.into();
    if result.exit_code != EXIT_ALLOW {
        return Err(AssertionFailure::new(format!(
            "Expected exit code 0, got {}",
            result.exit_code
        )));
    }

    let has_output = result.json_output().is_some_and(|output| !output.is_empty());
    if !has_output {
        return Err(AssertionFailure::new(format!(
            "Expected JSON output, got: {}",
            result.stdout
        )));
    }

    let empty = Map::new();
    let updated = result
        .hook_specific("updatedInput")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    match updated.get(field) {
        None => Err(AssertionFailure::new(format!(
            "Field '{}' not in updatedInput: {}",
            field,
            render(updated)
        ))),
        Some(actual) if *actual != expected => Err(AssertionFailure::new(format!(
            "Expected {}={}, got {}",
            field, expected, actual
        ))),
        Some(_) => Ok(()),
    }
}

/// The hook added context mentioning `contains`, either as plain stdout or
/// through `hookSpecificOutput.additionalContext`.
pub fn assert_context_added(result: &HookResult, contains: &str) -> AssertionResult {
    if result.exit_code != EXIT_ALLOW {
        return Err(AssertionFailure::new(format!(
            "Expected exit code 0, got {}",
            result.exit_code
        )));
    }

    if contains_ignore_case(&result.stdout, contains) {
        return Ok(());
    }

    match result.json_output() {
        Some(output) if !output.is_empty() => {
            let context = result
                .hook_specific("additionalContext")
                .and_then(Value::as_str)
                .unwrap_or("");
            if contains_ignore_case(context, contains) {
                Ok(())
            } else {
                Err(AssertionFailure::new(format!(
                    "Expected context to contain '{}', got: {}",
                    contains, context
                )))
            }
        }
        _ => Err(AssertionFailure::new(format!(
            "Expected output to contain '{}', got: {}",
            contains, result.stdout
        ))),
    }
}
