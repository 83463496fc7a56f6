//! Discord message action: announces a release in a channel.

use std::sync::Arc;

use launchpad_discord::MessagePayload;
use launchpad_task::{Action, ActionConfig, ActionDescriptor, ActionFuture, ActionId, StepResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::ReleaseEnv;
use crate::template;

pub static DESCRIPTOR: ActionDescriptor = ActionDescriptor {
    kind: "discord_message",
    display_name: "Discord Message",
    button_label: "Add Discord Message",
};

/// When a message is posted, relative to the steps before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostOn {
    #[default]
    Always,
    Success,
    Failure,
}

impl PostOn {
    pub fn as_str(self) -> &'static str {
        match self {
            PostOn::Always => "always",
            PostOn::Success => "success",
            PostOn::Failure => "failure",
        }
    }

    fn applies(self, prior_success: bool) -> bool {
        match self {
            PostOn::Always => true,
            PostOn::Success => prior_success,
            PostOn::Failure => !prior_success,
        }
    }
}

/// Posts a templated message, optionally with the artifact attached.
///
/// The message may use `{version}`, `{status}` and `{description}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscordMessage {
    id: ActionId,
    pub server_id: Option<u32>,
    pub channel_id: Option<u32>,
    pub message: String,
    pub post_on: PostOn,
    pub attach_artifact: bool,
    prior_success: bool,
    description: String,
}

impl<C: ReleaseEnv> Action<C> for DiscordMessage {
    fn descriptor(&self) -> &'static ActionDescriptor {
        &DESCRIPTOR
    }

    fn id(&self) -> ActionId {
        self.id
    }

    fn set_id(&mut self, id: ActionId) {
        self.id = id;
    }

    fn readiness(&self, ctx: &C) -> Result<(), String> {
        let settings = ctx.settings();
        settings
            .discord_credentials()
            .ok_or("Discord token is not set")?;
        let server_id = self.server_id.ok_or("No Discord server selected")?;
        let channel_id = self.channel_id.ok_or("No Discord channel selected")?;
        settings
            .discord_channel(server_id, channel_id)
            .ok_or("Selected Discord channel no longer exists")?;
        Ok(())
    }

    fn prepare(
        &mut self,
        _ctx: &C,
        prior_success: bool,
        description: &str,
        result: &mut StepResult,
    ) -> bool {
        self.prior_success = prior_success;
        self.description = description.to_string();

        let applies = self.post_on.applies(prior_success);
        if !applies {
            result.add_log(format!(
                "Not posting: message is only sent on {}",
                if prior_success { "failure" } else { "success" }
            ));
        }
        applies
    }

    fn execute<'a>(&'a mut self, ctx: &'a mut C, result: &'a mut StepResult) -> ActionFuture<'a> {
        Box::pin(async move {
            ctx.check_cancelled()?;

            let services = Arc::clone(ctx.services());
            let settings = &services.settings;
            let Some(credentials) = settings.discord_credentials() else {
                result.set_failed("Discord message failed: token is not set");
                return Ok(false);
            };
            let Some(channel) = self
                .server_id
                .zip(self.channel_id)
                .and_then(|(server, channel)| settings.discord_channel(server, channel))
            else {
                result.set_failed("Discord message failed: channel is not configured");
                return Ok(false);
            };

            let mut attachments = Vec::new();
            if self.attach_artifact {
                match ctx.artifact() {
                    Some(path) => attachments.push(path.to_path_buf()),
                    None => {
                        result.set_failed("Discord message failed: no artifact to attach");
                        return Ok(false);
                    }
                }
            }

            let status = if self.prior_success { "succeeded" } else { "failed" };
            let payload = MessagePayload {
                content: template::render(
                    &self.message,
                    &[
                        ("version", ctx.version()),
                        ("status", status),
                        ("description", self.description.as_str()),
                    ],
                ),
                attachments,
            };

            match services
                .discord
                .send_message(&channel.channel_id, &payload, &credentials)
                .await
            {
                Ok(message) => {
                    info!(channel = %channel.name, message_id = %message.id, "discord message posted");
                    result.add_log(format!("Posted message {} to #{}", message.id, channel.name));
                    Ok(true)
                }
                Err(e) => {
                    result.set_failed(format!("Discord message failed: {e}"));
                    Ok(false)
                }
            }
        })
    }

    fn warnings(&self, _ctx: &C) -> Vec<String> {
        if self.message.trim().is_empty() && !self.attach_artifact {
            vec!["Discord message has no content".to_string()]
        } else {
            Vec::new()
        }
    }

    fn serialize(&self) -> ActionConfig {
        let mut config = ActionConfig::new();
        config.insert_opt("server_id", self.server_id);
        config.insert_opt("channel_id", self.channel_id);
        config.insert("message", self.message.as_str());
        config.insert("post_on", self.post_on.as_str());
        config.insert("attach_artifact", self.attach_artifact);
        config
    }

    fn deserialize(&mut self, config: &ActionConfig, ctx: &C) {
        let settings = ctx.settings();
        self.server_id = config.entity_ref("server_id", "server", &settings.discord.servers);
        self.channel_id = config.entity_ref(
            "channel_id",
            "channel",
            settings.discord_channels(self.server_id),
        );
        self.message = config.get_str("message").unwrap_or_default().to_string();
        self.post_on = config.get_as("post_on").unwrap_or_default();
        self.attach_artifact = config.get_bool("attach_artifact").unwrap_or(false);
    }
}
