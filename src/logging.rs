use tracing_subscriber::EnvFilter;

/// Variable holding the log filter, e.g. `HOOK_HARNESS_LOG=hook_harness=debug`
pub const LOG_ENV: &str = "HOOK_HARNESS_LOG";

/// Send logs to stderr; stdout carries payloads and results.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
