//! Push command construction.

use std::path::PathBuf;

/// One `butler push` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// File or directory to push.
    pub path: PathBuf,
    pub user: String,
    pub game: String,
    /// Channel names in display order; lower-cased when pushed.
    pub channels: Vec<String>,
    pub version: String,
}

impl PushRequest {
    /// `<user>/<game>:<channel1>-<channel2>-...`
    pub fn target(&self) -> String {
        let channels = self
            .channels
            .iter()
            .map(|c| c.to_lowercase())
            .collect::<Vec<_>>()
            .join("-");
        format!("{}/{}:{}", self.user, self.game, channels)
    }

    /// Arguments passed to the process, one per element.
    pub fn args(&self) -> Vec<String> {
        vec![
            "push".to_string(),
            self.path.display().to_string(),
            self.target(),
            "--userversion".to_string(),
            self.version.clone(),
        ]
    }

    /// The same arguments as a single quoted command line.
    pub fn argument_string(&self) -> String {
        format!(
            "push \"{}\" {} --userversion \"{}\"",
            self.path.display(),
            self.target(),
            self.version
        )
    }
}
