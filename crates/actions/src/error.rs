//! Setup errors.

/// Errors building the shared services.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("discord client: {0}")]
    Discord(#[from] launchpad_discord::Error),

    #[error("github client: {0}")]
    Github(#[from] launchpad_github::Error),
}
