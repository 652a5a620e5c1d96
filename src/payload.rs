use crate::error::{HarnessError, Result};
use crate::input::HookEvent;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const DEFAULT_SESSION_ID: &str = "test-session-123";
pub const DEFAULT_CWD: &str = "/test/project";
const DEFAULT_PERMISSION_MODE: &str = "default";
const DEFAULT_TOOL_NAME: &str = "Bash";
const DEFAULT_NOTIFICATION_TYPE: &str = "permission_prompt";
const DEFAULT_TRIGGER: &str = "manual";
const DEFAULT_SOURCE: &str = "startup";
const DEFAULT_REASON: &str = "other";
const TOOL_USE_ID: &str = "toolu_01TestHookHarness";

/// Field values that replace the builder's defaults.
///
/// Overrides for fields the event does not carry are ignored, so one set of
/// overrides can be reused across events.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayloadOverrides {
    pub session_id: Option<String>,
    pub cwd: Option<String>,
    pub permission_mode: Option<String>,
    pub tool_name: Option<String>,
    pub tool_input: Option<Value>,
    pub tool_response: Option<Value>,
    pub prompt: Option<String>,
    pub message: Option<String>,
    pub notification_type: Option<String>,
    pub stop_hook_active: Option<bool>,
    pub trigger: Option<String>,
    pub custom_instructions: Option<String>,
    pub source: Option<String>,
    pub reason: Option<String>,
}

impl PayloadOverrides {
    /// Apply a `key=value` style override given as text.
    /// `tool_input` and `tool_response` are parsed as JSON.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| HarnessError::InvalidOverride {
            key: key.to_string(),
            reason,
        };
        let text = Some(value.to_string());

        match key {
            "session_id" => self.session_id = text,
            "cwd" => self.cwd = text,
            "permission_mode" => self.permission_mode = text,
            "tool_name" => self.tool_name = text,
            "tool_input" => {
                self.tool_input =
                    Some(serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?)
            }
            "tool_response" => {
                self.tool_response =
                    Some(serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?)
            }
            "prompt" => self.prompt = text,
            "message" => self.message = text,
            "notification_type" => self.notification_type = text,
            "stop_hook_active" => {
                self.stop_hook_active = Some(
                    value
                        .parse()
                        .map_err(|_| invalid(format!("expected true or false, got '{}'", value)))?,
                )
            }
            "trigger" => self.trigger = text,
            "custom_instructions" => self.custom_instructions = text,
            "source" => self.source = text,
            "reason" => self.reason = text,
            _ => return Err(invalid("no such payload field".to_string())),
        }

        Ok(())
    }

    /// Parse a `key=value` pair, as given on the command line.
    pub fn set_pair(&mut self, pair: &str) -> Result<()> {
        match pair.split_once('=') {
            Some((key, value)) => self.set(key.trim(), value),
            None => Err(HarnessError::InvalidOverride {
                key: pair.to_string(),
                reason: "expected key=value".to_string(),
            }),
        }
    }
}

/// Event payload delivered to a hook on stdin
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Working directory the hook should treat as the project root
    pub fn cwd(&self) -> Option<&str> {
        self.0.get("cwd").and_then(Value::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}

fn text(value: &Option<String>, default: &str) -> Value {
    Value::String(value.as_deref().unwrap_or(default).to_string())
}

/// Like `text`, but an empty override also falls back to the default
fn non_empty(value: &Option<String>, default: &str) -> Value {
    let value = value.as_deref().filter(|v| !v.is_empty());
    Value::String(value.unwrap_or(default).to_string())
}

fn object(value: &Option<Value>) -> Value {
    value.clone().unwrap_or_else(|| json!({}))
}

/// Build the payload the host framework would send for `event`.
pub fn create_payload(event: HookEvent, overrides: &PayloadOverrides) -> Payload {
    let session_id = overrides
        .session_id
        .as_deref()
        .unwrap_or(DEFAULT_SESSION_ID);

    let mut fields = Map::new();
    fields.insert("session_id".into(), json!(session_id));
    fields.insert(
        "transcript_path".into(),
        json!(format!("/tmp/.claude/sessions/{}.jsonl", session_id)),
    );
    fields.insert("cwd".into(), text(&overrides.cwd, DEFAULT_CWD));
    fields.insert(
        "permission_mode".into(),
        text(&overrides.permission_mode, DEFAULT_PERMISSION_MODE),
    );
    fields.insert("hook_event_name".into(), json!(event.name()));

    match event {
        HookEvent::PreToolUse | HookEvent::PostToolUse => {
            fields.insert(
                "tool_name".into(),
                non_empty(&overrides.tool_name, DEFAULT_TOOL_NAME),
            );
            fields.insert("tool_input".into(), object(&overrides.tool_input));
            fields.insert("tool_use_id".into(), json!(TOOL_USE_ID));
            if event == HookEvent::PostToolUse {
                fields.insert("tool_response".into(), object(&overrides.tool_response));
            }
        }
        HookEvent::UserPromptSubmit => {
            fields.insert("prompt".into(), text(&overrides.prompt, ""));
        }
        HookEvent::Notification => {
            fields.insert("message".into(), text(&overrides.message, ""));
            fields.insert(
                "notification_type".into(),
                non_empty(&overrides.notification_type, DEFAULT_NOTIFICATION_TYPE),
            );
        }
        HookEvent::Stop | HookEvent::SubagentStop => {
            fields.insert(
                "stop_hook_active".into(),
                json!(overrides.stop_hook_active.unwrap_or(false)),
            );
        }
        HookEvent::PreCompact => {
            fields.insert("trigger".into(), text(&overrides.trigger, DEFAULT_TRIGGER));
            fields.insert(
                "custom_instructions".into(),
                text(&overrides.custom_instructions, ""),
            );
        }
        HookEvent::SessionStart => {
            fields.insert("source".into(), text(&overrides.source, DEFAULT_SOURCE));
        }
        HookEvent::SessionEnd => {
            fields.insert("reason".into(), text(&overrides.reason, DEFAULT_REASON));
        }
    }

    Payload(fields)
}
