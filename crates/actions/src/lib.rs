//! Concrete release actions.
//!
//! Build pipelines run against a [`BuildContext`] and upload pipelines
//! against an [`UploadContext`]. Apart from [`ZipBuild`], every action
//! works on both sides through the [`ReleaseEnv`] trait.
//!
//! Entity references (Discord channels, itch.io games, GitHub
//! repositories) are stored as ids from [`ReleaseSettings`] and resolved
//! again each time a pipeline is loaded.

pub mod archive;
pub mod context;
pub mod discord_message;
pub mod error;
pub mod github_release;
pub mod itchio_upload;
pub mod pipelines;
pub mod registry;
pub mod settings;
pub mod template;
pub mod zip_build;

#[cfg(test)]
mod testing;

pub use archive::{ArchiveInfo, ZipArchiver, Zipper};
pub use context::{BuildContext, ReleaseEnv, Services, UploadContext};
pub use discord_message::{DiscordMessage, PostOn};
pub use error::SetupError;
pub use github_release::GithubRelease;
pub use itchio_upload::ItchioUpload;
pub use pipelines::PipelineFile;
pub use registry::{BUILD_ACTIONS, UPLOAD_ACTIONS};
pub use settings::ReleaseSettings;
pub use zip_build::ZipBuild;
