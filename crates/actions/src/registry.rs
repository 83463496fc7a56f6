//! Action tables for build and upload pipelines.

use launchpad_task::{Action, ActionEntry};

use crate::context::{BuildContext, ReleaseEnv, UploadContext};
use crate::discord_message::{self, DiscordMessage};
use crate::github_release::{self, GithubRelease};
use crate::itchio_upload::{self, ItchioUpload};
use crate::zip_build::{self, ZipBuild};

/// Actions available in a build pipeline.
pub static BUILD_ACTIONS: &[ActionEntry<BuildContext>] = &[
    ActionEntry {
        descriptor: &zip_build::DESCRIPTOR,
        create: create_zip_build,
    },
    ActionEntry {
        descriptor: &itchio_upload::DESCRIPTOR,
        create: create::<ItchioUpload, BuildContext>,
    },
    ActionEntry {
        descriptor: &discord_message::DESCRIPTOR,
        create: create::<DiscordMessage, BuildContext>,
    },
    ActionEntry {
        descriptor: &github_release::DESCRIPTOR,
        create: create::<GithubRelease, BuildContext>,
    },
];

/// Actions available in an upload pipeline.
pub static UPLOAD_ACTIONS: &[ActionEntry<UploadContext>] = &[
    ActionEntry {
        descriptor: &itchio_upload::DESCRIPTOR,
        create: create::<ItchioUpload, UploadContext>,
    },
    ActionEntry {
        descriptor: &discord_message::DESCRIPTOR,
        create: create::<DiscordMessage, UploadContext>,
    },
    ActionEntry {
        descriptor: &github_release::DESCRIPTOR,
        create: create::<GithubRelease, UploadContext>,
    },
];

fn create_zip_build() -> Box<dyn Action<BuildContext>> {
    Box::new(ZipBuild::default())
}

fn create<A, C>() -> Box<dyn Action<C>>
where
    A: Action<C> + Default + 'static,
    C: ReleaseEnv,
{
    Box::new(A::default())
}
