//! GitHub release action: tags a release and attaches the artifact.

use std::sync::Arc;

use launchpad_github::ReleaseRequest;
use launchpad_task::{Action, ActionConfig, ActionDescriptor, ActionFuture, ActionId, StepResult};
use tracing::info;

use crate::context::ReleaseEnv;
use crate::template;

pub static DESCRIPTOR: ActionDescriptor = ActionDescriptor {
    kind: "github_release",
    display_name: "GitHub Release",
    button_label: "Add GitHub Release",
};

const DEFAULT_TAG: &str = "v{version}";
const DEFAULT_NAME: &str = "{version}";

/// Creates a release on a configured repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRelease {
    id: ActionId,
    pub repository_id: Option<u32>,
    /// Tag template; `{version}` is substituted.
    pub tag_name: String,
    /// Title template; `{version}` is substituted.
    pub release_name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
    pub attach_artifact: bool,
    description: String,
}

impl Default for GithubRelease {
    fn default() -> Self {
        Self {
            id: 0,
            repository_id: None,
            tag_name: DEFAULT_TAG.to_string(),
            release_name: DEFAULT_NAME.to_string(),
            body: String::new(),
            draft: false,
            prerelease: false,
            attach_artifact: true,
            description: String::new(),
        }
    }
}

impl<C: ReleaseEnv> Action<C> for GithubRelease {
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
            .github_credentials()
            .ok_or("GitHub token is not set")?;
        let repository_id = self.repository_id.ok_or("No GitHub repository selected")?;
        settings
            .github_repository(repository_id)
            .ok_or("Selected GitHub repository no longer exists")?;
        if self.tag_name.trim().is_empty() {
            return Err("GitHub release tag is empty".into());
        }
        Ok(())
    }

    fn prepare(
        &mut self,
        _ctx: &C,
        prior_success: bool,
        description: &str,
        result: &mut StepResult,
    ) -> bool {
        self.description = description.to_string();
        if !prior_success {
            result.add_log("Not publishing a GitHub release: an earlier step failed");
        }
        prior_success
    }

    fn execute<'a>(&'a mut self, ctx: &'a mut C, result: &'a mut StepResult) -> ActionFuture<'a> {
        Box::pin(async move {
            ctx.check_cancelled()?;

            let services = Arc::clone(ctx.services());
            let settings = &services.settings;
            let Some(credentials) = settings.github_credentials() else {
                result.set_failed("GitHub release failed: token is not set");
                return Ok(false);
            };
            let Some(repository) = self.repository_id.and_then(|id| settings.github_repository(id))
            else {
                result.set_failed("GitHub release failed: repository is not configured");
                return Ok(false);
            };

            let mut assets = Vec::new();
            if self.attach_artifact {
                match ctx.artifact() {
                    Some(path) => assets.push(path.to_path_buf()),
                    None => {
                        result.set_failed("GitHub release failed: no artifact to attach");
                        return Ok(false);
                    }
                }
            }

            let version = ctx.version().to_string();
            let vars = [
                ("version", version.as_str()),
                ("description", self.description.as_str()),
            ];
            let request = ReleaseRequest {
                tag_name: template::render(&self.tag_name, &vars),
                name: template::render(&self.release_name, &vars),
                body: template::render(&self.body, &vars),
                draft: self.draft,
                prerelease: self.prerelease,
                target_commitish: None,
            };

            result.add_log(format!(
                "Creating release {} on {}",
                request.tag_name,
                repository.full_name()
            ));
            match services
                .github
                .publish_release(
                    &repository.owner,
                    &repository.name,
                    &request,
                    &assets,
                    &credentials,
                )
                .await
            {
                Ok(published) => {
                    info!(
                        repository = %repository.full_name(),
                        tag = %request.tag_name,
                        assets = published.assets.len(),
                        "github release published"
                    );
                    for asset in &published.assets {
                        result.add_log(format!("Attached {}", asset.name));
                    }
                    result.add_log(format!("Published {}", published.release.html_url));
                    Ok(true)
                }
                Err(e) => {
                    result.set_failed(format!("GitHub release failed: {e}"));
                    Ok(false)
                }
            }
        })
    }

    fn warnings(&self, _ctx: &C) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.draft {
            warnings.push("GitHub release will be created as a draft".to_string());
        }
        if !self.tag_name.contains("{version}") {
            warnings.push("GitHub tag has no {version} placeholder".to_string());
        }
        warnings
    }

    fn serialize(&self) -> ActionConfig {
        let mut config = ActionConfig::new();
        config.insert_opt("repository_id", self.repository_id);
        config.insert("tag_name", self.tag_name.as_str());
        config.insert("release_name", self.release_name.as_str());
        config.insert("body", self.body.as_str());
        config.insert("draft", self.draft);
        config.insert("prerelease", self.prerelease);
        config.insert("attach_artifact", self.attach_artifact);
        config
    }

    fn deserialize(&mut self, config: &ActionConfig, ctx: &C) {
        let settings = ctx.settings();
        self.repository_id =
            config.entity_ref("repository_id", "repository", &settings.github.repositories);
        self.tag_name = config.get_str("tag_name").unwrap_or(DEFAULT_TAG).to_string();
        self.release_name = config
            .get_str("release_name")
            .unwrap_or(DEFAULT_NAME)
            .to_string();
        self.body = config.get_str("body").unwrap_or_default().to_string();
        self.draft = config.get_bool("draft").unwrap_or(false);
        self.prerelease = config.get_bool("prerelease").unwrap_or(false);
        self.attach_artifact = config.get_bool("attach_artifact").unwrap_or(true);
    }
}
