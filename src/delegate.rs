use crate::error::{HarnessError, Result};
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// Environment variable that replaces the validator binary
pub const VALIDATOR_ENV: &str = "SKILLS_REF_BIN";
pub const DEFAULT_VALIDATOR: &str = "skills-ref";

/// The skill validator to run: `$SKILLS_REF_BIN` or `skills-ref` on `PATH`
pub fn validator_program() -> OsString {
    std::env::var_os(VALIDATOR_ENV)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| OsString::from(DEFAULT_VALIDATOR))
}

/// Run `program` with `args` untouched, copy its output streams to `stdout`
/// and `stderr`, and return its exit code.
///
/// A validator killed by a signal has no exit code and is reported as 1.
pub fn delegate<I, S>(
    program: &OsStr,
    args: I,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> Result<i32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| HarnessError::Spawn {
            path: PathBuf::from(program),
            source,
        })?;

    stdout.write_all(&output.stdout)?;
    stdout.flush()?;
    stderr.write_all(&output.stderr)?;
    stderr.flush()?;

    let code = output.status.code().unwrap_or(1);
    tracing::debug!(program = ?program, code, "validator finished");
    Ok(code)
}
