//! itch.io upload action: pushes the current artifact through butler.

use std::sync::Arc;

use launchpad_itchio::PushRequest;
use launchpad_task::{Action, ActionConfig, ActionDescriptor, ActionFuture, ActionId, StepResult};

use crate::context::ReleaseEnv;

pub static DESCRIPTOR: ActionDescriptor = ActionDescriptor {
    kind: "itchio_upload",
    display_name: "Itch.io Upload",
    button_label: "Add Itch.io Upload",
};

/// Pushes the artifact to `user/game:channels`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItchioUpload {
    id: ActionId,
    pub user_id: Option<u32>,
    pub game_id: Option<u32>,
    /// Channel names in push order, e.g. `["Windows", "Mac"]`.
    pub channels: Vec<String>,
}

impl<C: ReleaseEnv> Action<C> for ItchioUpload {
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
        let user_id = self.user_id.ok_or("No itch.io user selected")?;
        settings
            .itchio_user(user_id)
            .ok_or("Selected itch.io user no longer exists")?;
        let game_id = self.game_id.ok_or("No itch.io game selected")?;
        settings
            .itchio_game(user_id, game_id)
            .ok_or("Selected itch.io game no longer exists")?;
        Ok(())
    }

    fn prepare(
        &mut self,
        _ctx: &C,
        prior_success: bool,
        _description: &str,
        result: &mut StepResult,
    ) -> bool {
        if !prior_success {
            result.add_log("Not uploading to itch.io: an earlier step failed");
        }
        prior_success
    }

    fn execute<'a>(&'a mut self, ctx: &'a mut C, result: &'a mut StepResult) -> ActionFuture<'a> {
        Box::pin(async move {
            ctx.check_cancelled()?;

            let services = Arc::clone(ctx.services());
            let Some(path) = ctx.artifact().map(|p| p.to_path_buf()) else {
                result.set_failed("Itchio upload failed: no artifact to upload");
                return Ok(false);
            };

            let settings = &services.settings;
            let user = self.user_id.and_then(|id| settings.itchio_user(id));
            let game = self
                .user_id
                .zip(self.game_id)
                .and_then(|(user, game)| settings.itchio_game(user, game));
            let (Some(user), Some(game)) = (user, game) else {
                result.set_failed("Itchio upload failed: user or game is not configured");
                return Ok(false);
            };

            let request = PushRequest {
                path,
                user: user.name.clone(),
                game: game.slug.clone(),
                channels: self.channels.clone(),
                version: ctx.version().to_string(),
            };
            Ok(services.butler.upload(&request, result).await)
        })
    }

    fn warnings(&self, _ctx: &C) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.channels.is_empty() {
            warnings.push("No itch.io channels configured".to_string());
        }
        if self.channels.iter().any(|c| c.contains(char::is_whitespace)) {
            warnings.push("itch.io channel names should not contain spaces".to_string());
        }
        warnings
    }

    fn serialize(&self) -> ActionConfig {
        let mut config = ActionConfig::new();
        config.insert_opt("user_id", self.user_id);
        config.insert_opt("game_id", self.game_id);
        config.insert("channels", self.channels.clone());
        config
    }

    fn deserialize(&mut self, config: &ActionConfig, ctx: &C) {
        let settings = ctx.settings();
        self.user_id = config.entity_ref("user_id", "user", &settings.itchio.users);
        self.game_id = config.entity_ref("game_id", "game", settings.itchio_games(self.user_id));
        self.channels = config.get_strings("channels").unwrap_or_default();
    }
}
