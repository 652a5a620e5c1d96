use crate::assertions::{
    assert_allowed, assert_blocked, assert_context_added, assert_modified_input, AssertionResult,
};
use crate::input::HookEvent;
use crate::payload::{create_payload, PayloadOverrides};
use crate::result::HookResult;
use crate::runner::{run_hook, RunOptions};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// One check applied to a hook's result
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// Exit code 2, with stderr mentioning the text if given
    Blocked(Option<String>),
    /// Exit code 0 without a block or deny decision
    Allowed,
    /// `updatedInput.<field>` equals `value`
    ModifiedInput { field: String, value: Value },
    /// Context mentioning the text was added
    ContextAdded(String),
}

impl Expectation {
    pub fn check(&self, result: &HookResult) -> AssertionResult {
        match self {
            Expectation::Blocked(reason) => assert_blocked(result, reason.as_deref()),
            Expectation::Allowed => assert_allowed(result),
            Expectation::ModifiedInput { field, value } => {
                assert_modified_input(result, field, value.clone())
            }
            Expectation::ContextAdded(text) => assert_context_added(result, text),
        }
    }
}

/// A single hook test case
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Case {
    pub name: String,
    pub event: HookEvent,
    /// Overrides for the generated payload
    #[serde(default)]
    pub payload: PayloadOverrides,
    /// Hook for this case only (relative to the suite file)
    pub hook: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub expect: Vec<Expectation>,
}

/// Suite file as written
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteRaw {
    hook: Option<PathBuf>,
    timeout_secs: Option<u64>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    cases: Option<Vec<Case>>,
}

/// Validated suite with hook paths resolved
#[derive(Debug)]
pub struct Suite {
    pub path: PathBuf,
    pub timeout: Duration,
    pub env: BTreeMap<String, String>,
    pub cases: Vec<ResolvedCase>,
}

#[derive(Debug)]
pub struct ResolvedCase {
    pub hook: PathBuf,
    pub case: Case,
}

/// What happened when a case ran
#[derive(Debug)]
pub struct CaseOutcome {
    pub name: String,
    pub failures: Vec<String>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

fn validate_case(case: &Case, suite_path: &Path) -> Result<()> {
    if case.name.trim().is_empty() {
        bail!(
            "Invalid suite at {}: case missing 'name'",
            suite_path.display()
        );
    }
    if case.expect.is_empty() {
        bail!(
            "Invalid suite at {}: case '{}' has no 'expect' entries",
            suite_path.display(),
            case.name
        );
    }
    Ok(())
}

/// Loads and validates a suite file.
/// Hook paths are resolved against the directory holding the suite.
pub fn load_suite(suite_path: &Path) -> Result<Suite> {
    let content = fs::read_to_string(suite_path)
        .with_context(|| format!("Failed to read suite: {}", suite_path.display()))?;

    let parsed: SuiteRaw = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse suite: {}", suite_path.display()))?;

    let cases = parsed.cases.unwrap_or_default();
    if cases.is_empty() {
        bail!(
            "Invalid suite at {}: no cases defined",
            suite_path.display()
        );
    }

    let suite_dir = suite_path.parent().unwrap_or(Path::new("."));
    let mut resolved = Vec::with_capacity(cases.len());
    for case in cases {
        validate_case(&case, suite_path)?;
        let hook = match case.hook.as_ref().or(parsed.hook.as_ref()) {
            Some(hook) => suite_dir.join(hook),
            None => bail!(
                "Invalid suite at {}: case '{}' has no 'hook' and the suite sets none",
                suite_path.display(),
                case.name
            ),
        };
        resolved.push(ResolvedCase { hook, case });
    }

    Ok(Suite {
        path: suite_path.to_path_buf(),
        timeout: Duration::from_secs(parsed.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        env: parsed.env,
        cases: resolved,
    })
}

/// Expands glob patterns into suite files, in pattern order.
pub fn find_suites(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let before = paths.len();
        let entries =
            glob::glob(pattern).with_context(|| format!("Invalid suite pattern '{}'", pattern))?;
        for entry in entries {
            paths.push(entry.with_context(|| format!("Failed to read match of '{}'", pattern))?);
        }
        if paths.len() == before {
            bail!("No suite files match '{}'", pattern);
        }
    }
    Ok(paths)
}

/// Runs one case: build payload, run hook, check every expectation.
pub fn run_case(suite: &Suite, resolved: &ResolvedCase) -> CaseOutcome {
    let case = &resolved.case;
    let payload = create_payload(case.event, &case.payload);

    let mut options = RunOptions {
        timeout: suite.timeout,
        env: suite.env.clone(),
    };
    options.env.extend(case.env.clone());

    let failures = match run_hook(&resolved.hook, &payload, &options) {
        Ok(result) => case
            .expect
            .iter()
            .filter_map(|expectation| expectation.check(&result).err())
            .map(|failure| failure.message)
            .collect(),
        Err(e) => vec![e.to_string()],
    };

    tracing::debug!(case = %case.name, failures = failures.len(), "case finished");
    CaseOutcome {
        name: case.name.clone(),
        failures,
    }
}

pub fn run_suite(suite: &Suite) -> Vec<CaseOutcome> {
    suite
        .cases
        .iter()
        .map(|resolved| run_case(suite, resolved))
        .collect()
}
