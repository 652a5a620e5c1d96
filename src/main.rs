use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hook_harness::payload::{create_payload, PayloadOverrides};
use hook_harness::runner::{run_hook, RunOptions};
use hook_harness::suite::{find_suites, load_suite, run_suite};
use hook_harness::HookEvent;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "hook-harness",
    version,
    about = "Run Claude Code hooks against synthetic events"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the payload a hook would receive for EVENT
    Payload {
        event: HookEvent,
        /// Override a payload field, e.g. tool_input={"command":"ls"}
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Run HOOK once with a synthetic EVENT and print the result as JSON
    Run {
        hook: PathBuf,
        event: HookEvent,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Extra environment variable for the hook
        #[arg(long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
        /// Seconds before the hook is killed
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },
    /// Run the cases in one or more YAML suite files (glob patterns allowed)
    Suite {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
}

fn overrides_from(pairs: &[String]) -> Result<PayloadOverrides> {
    let mut overrides = PayloadOverrides::default();
    for pair in pairs {
        overrides.set_pair(pair)?;
    }
    Ok(overrides)
}

fn env_from(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid --env '{}': expected KEY=VALUE", pair);
        };
        env.insert(key.to_string(), value.to_string());
    }
    Ok(env)
}

fn run_suites(patterns: &[String]) -> Result<ExitCode> {
    let mut out = io::stdout().lock();
    let mut passed = 0;
    let mut failed = 0;

    for path in find_suites(patterns)? {
        let suite = load_suite(&path)?;
        tracing::info!(suite = %path.display(), cases = suite.cases.len(), "running suite");
        writeln!(out, "{}", path.display())?;

        for outcome in run_suite(&suite) {
            if outcome.passed() {
                passed += 1;
                writeln!(out, "  PASS {}", outcome.name)?;
            } else {
                failed += 1;
                writeln!(out, "  FAIL {}", outcome.name)?;
                for failure in &outcome.failures {
                    writeln!(out, "       {}", failure)?;
                }
            }
        }
    }

    writeln!(out, "{} passed, {} failed", passed, failed)?;
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> Result<ExitCode> {
    hook_harness::logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Payload { event, set } => {
            let payload = create_payload(event, &overrides_from(&set)?);
            writeln!(io::stdout().lock(), "{}", payload.to_json_pretty()?)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            hook,
            event,
            set,
            env,
            timeout,
        } => {
            let payload = create_payload(event, &overrides_from(&set)?);
            let options = RunOptions {
                timeout: Duration::from_secs(timeout),
                env: env_from(&env)?,
            };
            let result = run_hook(&hook, &payload, &options)
                .with_context(|| format!("Failed to run hook {}", hook.display()))?;
            writeln!(
                io::stdout().lock(),
                "{}",
                serde_json::to_string_pretty(&result)?
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Suite { patterns } => run_suites(&patterns),
    }
}
