use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::OnceCell;
use std::time::Duration;

/// Exit code a hook uses to allow the action
pub const EXIT_ALLOW: i32 = 0;
/// Exit code a hook uses to block the action
pub const EXIT_BLOCK: i32 = 2;
/// Exit code reported when the harness killed a hook for running too long
pub const EXIT_TIMEOUT: i32 = -1;

/// Outcome of a single hook invocation
#[derive(Debug, Clone, Serialize)]
pub struct HookResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    #[serde(skip)]
    json: OnceCell<Option<Map<String, Value>>>,
}

impl HookResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
            json: OnceCell::new(),
        }
    }

    pub(crate) fn timeout(after: Duration) -> Self {
        Self {
            exit_code: EXIT_TIMEOUT,
            stdout: String::new(),
            stderr: format!("Hook timed out after {}", format_duration(after)),
            timed_out: true,
            json: OnceCell::new(),
        }
    }

    pub fn blocked(&self) -> bool {
        self.exit_code == EXIT_BLOCK
    }

    pub fn allowed(&self) -> bool {
        self.exit_code == EXIT_ALLOW
    }

    /// Structured output, parsed on first access.
    ///
    /// Only a successful hook whose stdout is a JSON object has structured
    /// output; anything else (plain text, arrays, bad JSON) yields `None`.
    pub fn json_output(&self) -> Option<&Map<String, Value>> {
        self.json
            .get_or_init(|| {
                if !self.allowed() {
                    return None;
                }
                match serde_json::from_str::<Value>(&self.stdout) {
                    Ok(Value::Object(map)) => Some(map),
                    _ => None,
                }
            })
            .as_ref()
    }

    /// Look up `hookSpecificOutput.<field>` in the structured output
    pub fn hook_specific(&self, field: &str) -> Option<&Value> {
        self.json_output()?
            .get("hookSpecificOutput")?
            .as_object()?
            .get(field)
    }
}

/// Render a timeout the way a person would write it: `60s`, `250ms`, `500µs`
pub fn format_duration(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else if duration.as_millis() > 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:?}", duration)
    }
}
