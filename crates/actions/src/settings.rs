//! Release settings: credentials and the entities actions point at.
//!
//! Every entity carries a stable numeric id. Actions store that id and
//! look the entity up again on load, so renaming a server or game does
//! not break saved pipelines.

use std::path::PathBuf;

use launchpad_discord::Identity;
use launchpad_itchio::ButlerConfig;
use launchpad_itchio::session::DEFAULT_MAX_ATTEMPTS;
use launchpad_task::{Identified, resolve_id};
use serde::{Deserialize, Serialize};

/// All release settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseSettings {
    pub discord: DiscordSettings,
    pub itchio: ItchioSettings,
    pub github: GithubSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    pub token: String,
    pub identity: Identity,
    pub servers: Vec<DiscordServer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordServer {
    pub id: u32,
    pub name: String,
    pub channels: Vec<DiscordChannel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordChannel {
    pub id: u32,
    pub name: String,
    /// Discord snowflake of the channel.
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItchioSettings {
    /// Explicit butler executable; `PATH` is searched when unset.
    pub butler_path: Option<PathBuf>,
    pub max_attempts: u32,
    pub users: Vec<ItchioUser>,
}

impl Default for ItchioSettings {
    fn default() -> Self {
        Self {
            butler_path: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItchioUser {
    pub id: u32,
    /// itch.io account name, first half of the push target.
    pub name: String,
    pub games: Vec<ItchioGame>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItchioGame {
    pub id: u32,
    pub name: String,
    /// URL slug used in the push target.
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    pub token: String,
    pub repositories: Vec<GithubRepository>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubRepository {
    pub id: u32,
    pub owner: String,
    pub name: String,
}

impl GithubRepository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(impl Identified for $ty {
            fn id(&self) -> u32 {
                self.id
            }
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

identified!(DiscordServer, DiscordChannel, ItchioUser, ItchioGame, GithubRepository);

impl ReleaseSettings {
    pub fn discord_server(&self, id: u32) -> Option<&DiscordServer> {
        resolve_id(&self.discord.servers, id)
    }

    /// Channels of a server, empty when the server is unknown.
    pub fn discord_channels(&self, server_id: Option<u32>) -> &[DiscordChannel] {
        server_id
            .and_then(|id| self.discord_server(id))
            .map(|s| s.channels.as_slice())
            .unwrap_or_default()
    }

    pub fn discord_channel(&self, server_id: u32, channel_id: u32) -> Option<&DiscordChannel> {
        resolve_id(self.discord_channels(Some(server_id)), channel_id)
    }

    pub fn itchio_user(&self, id: u32) -> Option<&ItchioUser> {
        resolve_id(&self.itchio.users, id)
    }

    /// Games of a user, empty when the user is unknown.
    pub fn itchio_games(&self, user_id: Option<u32>) -> &[ItchioGame] {
        user_id
            .and_then(|id| self.itchio_user(id))
            .map(|u| u.games.as_slice())
            .unwrap_or_default()
    }

    pub fn itchio_game(&self, user_id: u32, game_id: u32) -> Option<&ItchioGame> {
        resolve_id(self.itchio_games(Some(user_id)), game_id)
    }

    pub fn github_repository(&self, id: u32) -> Option<&GithubRepository> {
        resolve_id(&self.github.repositories, id)
    }

    /// Discord credentials, or `None` when no token is set.
    pub fn discord_credentials(&self) -> Option<launchpad_discord::Credentials> {
        let token = self.discord.token.trim();
        (!token.is_empty()).then(|| launchpad_discord::Credentials {
            token: token.to_string(),
            identity: self.discord.identity,
        })
    }

    /// GitHub credentials, or `None` when no token is set.
    pub fn github_credentials(&self) -> Option<launchpad_github::Credentials> {
        let token = self.github.token.trim();
        (!token.is_empty()).then(|| launchpad_github::Credentials {
            token: token.to_string(),
        })
    }

    pub fn butler_config(&self) -> ButlerConfig {
        ButlerConfig {
            executable: self.itchio.butler_path.clone(),
            max_attempts: self.itchio.max_attempts,
        }
    }
}
