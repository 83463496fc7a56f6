//! Butler session error types.

/// Errors produced while locating the butler executable.
#[derive(Debug, thiserror::Error)]
pub enum ButlerError {
    #[error("butler executable not found at {0}")]
    NotFound(String),

    #[error("butler executable not found on PATH")]
    NotOnPath,
}
