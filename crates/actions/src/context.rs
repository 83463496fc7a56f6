//! Run contexts for build and upload pipelines.
//!
//! Both contexts share the same [`Services`] and expose the current
//! artifact through [`ReleaseEnv`], so upload-style actions run on
//! either side of a release.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use launchpad_itchio::ButlerSession;
use launchpad_task::ActionError;
use tokio_util::sync::CancellationToken;

use crate::archive::{ZipArchiver, Zipper};
use crate::error::SetupError;
use crate::settings::ReleaseSettings;

/// Long-lived collaborators shared by every run.
pub struct Services {
    pub settings: ReleaseSettings,
    pub butler: Arc<ButlerSession>,
    pub discord: launchpad_discord::Client,
    pub github: launchpad_github::Client,
    pub zipper: Arc<dyn Zipper>,
}

impl Services {
    /// Builds the default services for `settings`.
    pub fn new(settings: ReleaseSettings) -> Result<Self, SetupError> {
        let butler = Arc::new(ButlerSession::new(settings.butler_config()));
        Ok(Self {
            butler,
            discord: launchpad_discord::Client::new()?,
            github: launchpad_github::Client::new()?,
            zipper: Arc::new(ZipArchiver),
            settings,
        })
    }
}

/// What release actions need from their context.
pub trait ReleaseEnv: Send {
    fn services(&self) -> &Arc<Services>;

    /// Version string of the release.
    fn version(&self) -> &str;

    /// The file produced so far, if any.
    fn artifact(&self) -> Option<&Path>;

    fn set_artifact(&mut self, path: PathBuf);

    fn cancel_token(&self) -> &CancellationToken;

    fn settings(&self) -> &ReleaseSettings {
        &self.services().settings
    }

    fn check_cancelled(&self) -> Result<(), ActionError> {
        if self.cancel_token().is_cancelled() {
            Err(ActionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Context of a build pipeline.
pub struct BuildContext {
    pub services: Arc<Services>,
    /// Directory holding the built game.
    pub build_dir: PathBuf,
    /// Where build actions write their output.
    pub output_dir: PathBuf,
    pub version: String,
    pub artifact: Option<PathBuf>,
    pub cancel: CancellationToken,
}

impl BuildContext {
    pub fn new(
        services: Arc<Services>,
        build_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            services,
            build_dir: build_dir.into(),
            output_dir: output_dir.into(),
            version: version.into(),
            artifact: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Hands the build output over to an upload context.
    pub fn into_upload(self) -> UploadContext {
        UploadContext {
            services: self.services,
            version: self.version,
            artifact: self.artifact,
            cancel: self.cancel,
        }
    }
}

/// Context of an upload pipeline.
pub struct UploadContext {
    pub services: Arc<Services>,
    pub version: String,
    pub artifact: Option<PathBuf>,
    pub cancel: CancellationToken,
}

impl UploadContext {
    pub fn new(services: Arc<Services>, version: impl Into<String>) -> Self {
        Self {
            services,
            version: version.into(),
            artifact: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact = Some(path.into());
        self
    }
}

macro_rules! release_env {
    ($ty:ty) => {
        impl ReleaseEnv for $ty {
            fn services(&self) -> &Arc<Services> {
                &self.services
            }
            fn version(&self) -> &str {
                &self.version
            }
            fn artifact(&self) -> Option<&Path> {
                self.artifact.as_deref()
            }
            fn set_artifact(&mut self, path: PathBuf) {
                self.artifact = Some(path);
            }
            fn cancel_token(&self) -> &CancellationToken {
                &self.cancel
            }
        }
    };
}

release_env!(BuildContext);
release_env!(UploadContext);
