//! Test harness for Claude Code hooks.
//!
//! Build the payload the host would send, run the hook with it, and check
//! what the hook decided:
//!
//! ```no_run
//! use hook_harness::{assert_blocked, create_payload, run_hook, HookEvent, PayloadOverrides, RunOptions};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let payload = create_payload(
//!     HookEvent::PreToolUse,
//!     &PayloadOverrides {
//!         tool_input: Some(json!({"command": "rm -rf /"})),
//!         ..Default::default()
//!     },
//! );
//! let result = run_hook(Path::new("./my-hook.sh"), &payload, &RunOptions::default()).unwrap();
//! assert_blocked(&result, Some("dangerous")).unwrap();
//! ```

pub mod assertions;
pub mod delegate;
pub mod error;
pub mod input;
pub mod logging;
pub mod payload;
pub mod result;
pub mod runner;
pub mod suite;

#[cfg(all(test, unix))]
mod testing;

pub use assertions::{
    assert_allowed, assert_blocked, assert_context_added, assert_modified_input,
    AssertionFailure,
};
pub use error::HarnessError;
pub use input::HookEvent;
pub use payload::{create_payload, Payload, PayloadOverrides};
pub use result::HookResult;
pub use runner::{run_hook, RunOptions};
