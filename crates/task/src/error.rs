//! Pipeline error types.

/// Errors an action's Execute may fail with.
///
/// The pipeline converts every variant into an exception entry on the
/// step; none of them escape a run.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("cancelled")]
    Cancelled,

    #[error("panicked: {0}")]
    Panicked(String),
}

/// Errors produced while loading or validating a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown action kind: {0}")]
    UnknownAction(String),

    #[error("duplicate action id {0}")]
    DuplicateId(u32),

    #[error("action {index} ({action}) is not ready: {reason}")]
    NotReady {
        index: usize,
        action: String,
        reason: String,
    },
}
