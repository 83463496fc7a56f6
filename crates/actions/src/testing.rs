//! Shared test fixtures: sample settings, fakes and a mock HTTP server.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use launchpad_discord::Identity;
use launchpad_itchio::{ButlerSession, ProcessOutput, ProcessRunner};
use launchpad_task::ActionError;

use crate::archive::{ZipArchiver, ZipFuture, Zipper};
use crate::context::Services;
use crate::settings::*;

pub use launchpad_mock_http::{bind, mock_server, serve};

/// Nothing listens on the discard port.
const DEAD_URL: &str = "http://127.0.0.1:9";

pub fn sample_settings() -> ReleaseSettings {
    ReleaseSettings {
        discord: DiscordSettings {
            token: "discord-token".into(),
            identity: Identity::Bot,
            servers: vec![DiscordServer {
                id: 1,
                name: "Studio".into(),
                channels: vec![
                    DiscordChannel {
                        id: 10,
                        name: "releases".into(),
                        channel_id: "111".into(),
                    },
                    DiscordChannel {
                        id: 11,
                        name: "builds".into(),
                        channel_id: "222".into(),
                    },
                ],
            }],
        },
        itchio: ItchioSettings {
            users: vec![ItchioUser {
                id: 2,
                name: "alice".into(),
                games: vec![ItchioGame {
                    id: 20,
                    name: "My Game".into(),
                    slug: "mygame".into(),
                }],
            }],
            ..Default::default()
        },
        github: GithubSettings {
            token: "ghp_x".into(),
            repositories: vec![GithubRepository {
                id: 3,
                owner: "acme".into(),
                name: "rocket".into(),
            }],
        },
    }
}

struct Parts {
    settings: ReleaseSettings,
    runner: Arc<dyn ProcessRunner>,
    discord_url: String,
    github_url: String,
    zipper: Arc<dyn Zipper>,
}

impl Default for Parts {
    fn default() -> Self {
        Self {
            settings: sample_settings(),
            runner: Arc::new(FakeRunner::new(Vec::new())),
            discord_url: DEAD_URL.into(),
            github_url: DEAD_URL.into(),
            zipper: Arc::new(ZipArchiver),
        }
    }
}

fn assemble(parts: Parts) -> Arc<Services> {
    Arc::new(Services {
        butler: Arc::new(ButlerSession::with_runner(
            parts.settings.butler_config(),
            parts.runner,
        )),
        discord: launchpad_discord::Client::new()
            .unwrap()
            .with_base_url(parts.discord_url),
        github: launchpad_github::Client::new()
            .unwrap()
            .with_base_url(parts.github_url),
        zipper: parts.zipper,
        settings: parts.settings,
    })
}

pub fn services() -> Arc<Services> {
    assemble(Parts::default())
}

pub fn services_for(settings: ReleaseSettings) -> Arc<Services> {
    assemble(Parts {
        settings,
        ..Default::default()
    })
}

pub fn services_with_zipper(zipper: Arc<dyn Zipper>) -> Arc<Services> {
    assemble(Parts {
        zipper,
        ..Default::default()
    })
}

pub fn services_with_runner(runner: Arc<FakeRunner>, butler: Option<PathBuf>) -> Arc<Services> {
    let mut settings = sample_settings();
    settings.itchio.butler_path = butler;
    assemble(Parts {
        settings,
        runner,
        ..Default::default()
    })
}

pub fn services_with_urls(discord_url: &str, github_url: &str) -> Arc<Services> {
    assemble(Parts {
        discord_url: discord_url.to_string(),
        github_url: github_url.to_string(),
        ..Default::default()
    })
}

/// Writes a stub archive and then fails.
pub struct FailingZipper;

impl Zipper for FailingZipper {
    fn zip<'a>(&'a self, _source: &'a Path, destination: &'a Path) -> ZipFuture<'a> {
        Box::pin(async move {
            tokio::fs::write(destination, b"PK-partial").await?;
            Err(ActionError::Backend("disk full".into()))
        })
    }
}

/// Scripted butler stand-in that records its arguments.
pub struct FakeRunner {
    outputs: Mutex<Vec<ProcessOutput>>,
    last_args: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new(mut outputs: Vec<ProcessOutput>) -> Self {
        outputs.reverse();
        Self {
            outputs: Mutex::new(outputs),
            last_args: Mutex::new(Vec::new()),
        }
    }

    pub fn last_args(&self) -> Vec<String> {
        self.last_args.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        _program: &'a Path,
        args: &'a [String],
    ) -> Pin<Box<dyn Future<Output = io::Result<ProcessOutput>> + Send + 'a>> {
        *self.last_args.lock().unwrap() = args.to_vec();
        let next = self.outputs.lock().unwrap().pop();
        Box::pin(async move {
            next.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no scripted output"))
        })
    }
}

