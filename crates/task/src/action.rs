//! The action contract.
//!
//! An [`Action`] is one configurable, serializable unit of work. It is
//! generic over the context type `C` it runs against, so build-side and
//! upload-side actions share one contract and differ only in context.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::config::ActionConfig;
use crate::error::ActionError;
use crate::registry::ActionDescriptor;
use crate::result::StepResult;

/// Identifier of an action, unique within its pipeline.
pub type ActionId = u32;

/// Future returned by [`Action::execute`].
///
/// `Ok(true)` means the unit of work completed. `Ok(false)` means it
/// failed and the step result already carries the reason. `Err` is an
/// uncaught failure; the pipeline records it as an exception.
pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = Result<bool, ActionError>> + Send + 'a>>;

/// Lifecycle state of an action within one run.
///
/// Transitions are driven by the pipeline only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    Idle,
    Preparing,
    Ready,
    /// Prepare opted out; Execute will not run.
    Skipped,
    Executing,
    Completed,
    CleanedUp,
}

/// One ordered, result-reporting unit of work.
pub trait Action<C: Send>: Send {
    /// Static display metadata for this action kind.
    fn descriptor(&self) -> &'static ActionDescriptor;

    fn id(&self) -> ActionId;

    fn set_id(&mut self, id: ActionId);

    /// Stable kind key used in persisted pipelines.
    fn kind(&self) -> &'static str {
        self.descriptor().kind
    }

    /// Human-readable name used for the step result.
    fn name(&self) -> &str {
        self.descriptor().display_name
    }

    /// Reports a blocking configuration problem before anything runs.
    fn readiness(&self, _ctx: &C) -> Result<(), String> {
        Ok(())
    }

    /// Records run-wide inputs and decides whether to execute.
    ///
    /// Returning `false` skips Execute; the step is neutral and does not
    /// fail the run. Must not perform the unit of work.
    fn prepare(
        &mut self,
        ctx: &C,
        prior_success: bool,
        description: &str,
        result: &mut StepResult,
    ) -> bool;

    /// Performs the unit of work.
    ///
    /// On failure, calls [`StepResult::set_failed`] before returning
    /// `Ok(false)`.
    fn execute<'a>(&'a mut self, ctx: &'a mut C, result: &'a mut StepResult) -> ActionFuture<'a>;

    /// Releases anything the action acquired. Always called, after
    /// Execute or after Prepare opted out. Problems are recorded as
    /// warnings.
    fn clean_up(&mut self, _ctx: &mut C, _result: &mut StepResult) {}

    /// Advisory warnings collected after CleanUp.
    fn warnings(&self, _ctx: &C) -> Vec<String> {
        Vec::new()
    }

    /// Advisory errors collected after CleanUp.
    fn errors(&self, _ctx: &C) -> Vec<String> {
        Vec::new()
    }

    /// Writes the full configuration to a key-value mapping.
    fn serialize(&self) -> ActionConfig;

    /// Loads configuration, re-resolving entity references against `ctx`.
    ///
    /// References that no longer resolve are left unset.
    fn deserialize(&mut self, config: &ActionConfig, ctx: &C);
}
