use std::path::PathBuf;

/// Errors raised by the harness itself (as opposed to a hook's verdict).
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The event tag is not one the host framework emits.
    #[error("unknown hook event: {0}")]
    UnknownEvent(String),

    /// A payload override could not be applied.
    #[error("invalid payload override '{key}': {reason}")]
    InvalidOverride { key: String, reason: String },

    /// A hook or validator executable could not be started.
    #[error("failed to spawn {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
