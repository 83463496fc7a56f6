//! Zip build action: archives the build directory.

use std::path::PathBuf;

use launchpad_task::{
    Action, ActionConfig, ActionDescriptor, ActionFuture, ActionId, StepResult,
};
use tracing::{info, warn};

use crate::context::{BuildContext, ReleaseEnv};
use crate::template;

pub static DESCRIPTOR: ActionDescriptor = ActionDescriptor {
    kind: "zip_build",
    display_name: "Zip Build",
    button_label: "Add Zip Build",
};

const DEFAULT_FILE_NAME: &str = "build-{version}";

/// Writes `<output_dir>/<file_name>.zip` and makes it the current artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipBuild {
    id: ActionId,
    /// Archive name without extension; `{version}` is substituted.
    pub file_name: String,
    /// Archive being written by the current run, removed if unfinished.
    partial: Option<PathBuf>,
}

impl Default for ZipBuild {
    fn default() -> Self {
        Self {
            id: 0,
            file_name: DEFAULT_FILE_NAME.to_string(),
            partial: None,
        }
    }
}

impl ZipBuild {
    fn archive_name(&self, version: &str) -> String {
        format!("{}.zip", template::render(&self.file_name, &[("version", version)]))
    }
}

impl Action<BuildContext> for ZipBuild {
    fn descriptor(&self) -> &'static ActionDescriptor {
        &DESCRIPTOR
    }

    fn id(&self) -> ActionId {
        self.id
    }

    fn set_id(&mut self, id: ActionId) {
        self.id = id;
    }

    fn readiness(&self, _ctx: &BuildContext) -> Result<(), String> {
        let name = self.file_name.trim();
        if name.is_empty() {
            return Err("Archive file name is empty".into());
        }
        if name.contains(['/', '\\']) {
            return Err(format!("Archive file name '{name}' must not contain path separators"));
        }
        Ok(())
    }

    fn prepare(
        &mut self,
        _ctx: &BuildContext,
        prior_success: bool,
        _description: &str,
        result: &mut StepResult,
    ) -> bool {
        self.partial = None;
        if !prior_success {
            result.add_log("Not zipping: an earlier step failed");
        }
        prior_success
    }

    fn execute<'a>(
        &'a mut self,
        ctx: &'a mut BuildContext,
        result: &'a mut StepResult,
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            ctx.check_cancelled()?;

            let source = ctx.build_dir.clone();
            let destination = ctx.output_dir.join(self.archive_name(&ctx.version));
            let zipper = ctx.services.zipper.clone();

            if !source.is_dir() {
                result.set_failed(format!(
                    "Zip failed: build directory {} does not exist",
                    source.display()
                ));
                return Ok(false);
            }

            result.add_log(format!(
                "Zipping {} to {}",
                source.display(),
                destination.display()
            ));
            self.partial = Some(destination.clone());

            match zipper.zip(&source, &destination).await {
                Ok(archive) => {
                    self.partial = None;
                    info!(
                        archive = %archive.path.display(),
                        files = archive.files,
                        bytes = archive.bytes,
                        sha256 = %archive.sha256,
                        "build zipped"
                    );
                    result.add_log(format!(
                        "Zipped {} files ({} bytes), sha256 {}",
                        archive.files, archive.bytes, archive.sha256
                    ));
                    ctx.set_artifact(archive.path);
                    Ok(true)
                }
                Err(e) => {
                    result.set_failed(format!("Zip failed: {e}"));
                    Ok(false)
                }
            }
        })
    }

    fn clean_up(&mut self, _ctx: &mut BuildContext, result: &mut StepResult) {
        let Some(partial) = self.partial.take() else {
            return;
        };
        if partial.exists()
            && let Err(e) = std::fs::remove_file(&partial)
        {
            warn!(path = %partial.display(), error = %e, "failed to remove partial archive");
            result.add_warning(format!(
                "Could not remove partial archive {}: {e}",
                partial.display()
            ));
        }
    }

    fn warnings(&self, _ctx: &BuildContext) -> Vec<String> {
        if self.file_name.contains("{version}") {
            Vec::new()
        } else {
            vec!["Archive name has no {version} placeholder; each build overwrites the last".into()]
        }
    }

    fn serialize(&self) -> ActionConfig {
        ActionConfig::new().with("file_name", self.file_name.as_str())
    }

    fn deserialize(&mut self, config: &ActionConfig, _ctx: &BuildContext) {
        self.file_name = config
            .get_str("file_name")
            .unwrap_or(DEFAULT_FILE_NAME)
            .to_string();
    }
}
