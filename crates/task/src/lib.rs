//! Step-tracked action pipeline.
//!
//! This crate implements the **task execution core** shared by every
//! release pipeline: a generic, serializable unit of work ([`Action`]),
//! the per-action execution record ([`StepResult`]), the aggregate of one
//! run ([`TaskReport`]) and the runner that drives them ([`ActionPipeline`]).
//! It has no knowledge of concrete upload backends; the actions crate
//! plugs those in.
//!
//! # Lifecycle
//!
//! 1. **Prepare** — the action may opt out (e.g. a prerequisite failed)
//! 2. **Execute** — the unit of work; failures and panics are recorded
//! 3. **CleanUp** — always runs, never escalates
//! 4. **Collect** — advisory warnings/errors are pulled into the step

pub mod action;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod result;

// Re-export primary types for convenience.
pub use action::{Action, ActionFuture, ActionId, ActionState};
pub use config::{ActionConfig, Identified, SerializedAction, resolve_id};
pub use error::{ActionError, PipelineError};
pub use pipeline::{ActionPipeline, PipelineEvent};
pub use registry::{ActionDescriptor, ActionEntry, find_entry};
pub use report::TaskReport;
pub use result::{LogEntry, Severity, StepResult};
