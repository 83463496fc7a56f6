//! Persisted pipeline files.
//!
//! A pipeline file holds both halves of a release:
//!
//! ```json
//! { "build": [{ "kind": "zip_build", "id": 1, "config": { ... } }],
//!   "upload": [{ "kind": "itchio_upload", "id": 2, "config": { ... } }] }
//! ```

use launchpad_task::{ActionPipeline, PipelineError, SerializedAction};
use serde::{Deserialize, Serialize};

use crate::context::{BuildContext, UploadContext};
use crate::registry::{BUILD_ACTIONS, UPLOAD_ACTIONS};

/// Serialized build and upload pipelines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineFile {
    pub build: Vec<SerializedAction>,
    pub upload: Vec<SerializedAction>,
}

impl PipelineFile {
    pub fn from_json(text: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Captures the current pipelines.
    pub fn capture(
        build: &ActionPipeline<BuildContext>,
        upload: &ActionPipeline<UploadContext>,
    ) -> Self {
        Self {
            build: build.serialize(),
            upload: upload.serialize(),
        }
    }

    pub fn build_pipeline(
        &self,
        ctx: &BuildContext,
    ) -> Result<ActionPipeline<BuildContext>, PipelineError> {
        ActionPipeline::from_serialized(&self.build, BUILD_ACTIONS, ctx)
    }

    pub fn upload_pipeline(
        &self,
        ctx: &UploadContext,
    ) -> Result<ActionPipeline<UploadContext>, PipelineError> {
        ActionPipeline::from_serialized(&self.upload, UPLOAD_ACTIONS, ctx)
    }
}
