//! Sequential action runner.
//!
//! Drives each action through Prepare, Execute and CleanUp in order and
//! aggregates the step results into a [`TaskReport`]. One failing action
//! never stops the run: later actions still prepare and observe the
//! failure through `prior_success`.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionId, ActionState};
use crate::config::SerializedAction;
use crate::error::PipelineError;
use crate::registry::{ActionEntry, find_entry};
use crate::report::TaskReport;
use crate::result::{Severity, StepResult};

/// Progress event emitted during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// An action moved to a new lifecycle state.
    StateChanged {
        index: usize,
        action_id: ActionId,
        state: ActionState,
    },
    /// An action's step result was appended to the report.
    StepFinished {
        index: usize,
        name: String,
        success: bool,
    },
}

/// Owns an ordered list of actions and runs them.
pub struct ActionPipeline<C: Send> {
    actions: Vec<Box<dyn Action<C>>>,
    events_tx: mpsc::Sender<PipelineEvent>,
    events_rx: Option<mpsc::Receiver<PipelineEvent>>,
}

impl<C: Send> Default for ActionPipeline<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send> ActionPipeline<C> {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            actions: Vec::new(),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<PipelineEvent>> {
        self.events_rx.take()
    }

    /// Appends an action, assigning a fresh id if its id is taken or zero.
    pub fn push(&mut self, mut action: Box<dyn Action<C>>) -> ActionId {
        let taken = action.id() == 0 || self.actions.iter().any(|a| a.id() == action.id());
        if taken {
            action.set_id(self.next_id());
        }
        let id = action.id();
        self.actions.push(action);
        id
    }

    /// One past the highest id in use, or the smallest free id once the
    /// highest is `ActionId::MAX`.
    fn next_id(&self) -> ActionId {
        let used: HashSet<ActionId> = self.actions.iter().map(|a| a.id()).collect();
        let highest = used.iter().copied().max().unwrap_or(0);
        highest
            .checked_add(1)
            .or_else(|| (1..=ActionId::MAX).find(|id| !used.contains(id)))
            .unwrap_or(highest)
    }

    /// Removes the action with the given id.
    pub fn remove(&mut self, id: ActionId) -> Option<Box<dyn Action<C>>> {
        let index = self.actions.iter().position(|a| a.id() == id)?;
        Some(self.actions.remove(index))
    }

    pub fn actions(&self) -> &[Box<dyn Action<C>>] {
        &self.actions
    }

    pub fn find(&self, id: ActionId) -> Option<&dyn Action<C>> {
        self.actions.iter().find(|a| a.id() == id).map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Checks every action's configuration before anything runs.
    ///
    /// Returns the first blocking reason.
    pub fn check_ready(&self, ctx: &C) -> Result<(), PipelineError> {
        for (index, action) in self.actions.iter().enumerate() {
            if let Err(reason) = action.readiness(ctx) {
                return Err(PipelineError::NotReady {
                    index,
                    action: action.name().to_string(),
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Writes the pipeline in persisted form.
    pub fn serialize(&self) -> Vec<SerializedAction> {
        self.actions
            .iter()
            .map(|a| SerializedAction {
                kind: a.kind().to_string(),
                id: a.id(),
                config: a.serialize(),
            })
            .collect()
    }

    /// Rebuilds a pipeline from persisted form.
    ///
    /// Kinds are looked up in `registry`; entity references are
    /// re-resolved against `ctx` by each action.
    pub fn from_serialized(
        entries: &[SerializedAction],
        registry: &[ActionEntry<C>],
        ctx: &C,
    ) -> Result<Self, PipelineError> {
        let mut pipeline = Self::new();
        let mut seen = HashSet::new();

        for entry in entries {
            let row = find_entry(registry, &entry.kind)
                .ok_or_else(|| PipelineError::UnknownAction(entry.kind.clone()))?;
            if !seen.insert(entry.id) {
                return Err(PipelineError::DuplicateId(entry.id));
            }

            let mut action = (row.create)();
            action.set_id(entry.id);
            action.deserialize(&entry.config, ctx);
            pipeline.actions.push(action);
        }

        debug!(actions = pipeline.actions.len(), "pipeline loaded");
        Ok(pipeline)
    }

    /// Runs every action in order and returns the report.
    ///
    /// Never aborts early: Execute failures and panics are recorded on
    /// their step, CleanUp always runs, and every action yields exactly
    /// one step result.
    pub async fn run(
        &mut self,
        ctx: &mut C,
        initial_success: bool,
        description: &str,
    ) -> TaskReport {
        let events = self.events_tx.clone();
        let mut report = TaskReport::new(description, initial_success);
        let mut current_success = initial_success;

        info!(actions = self.actions.len(), description, "pipeline started");

        for (index, action) in self.actions.iter_mut().enumerate() {
            let id = action.id();
            let name = action.name().to_string();
            let mut step = StepResult::new(&name);

            emit_state(&events, index, id, ActionState::Preparing);
            let prepared = std::panic::catch_unwind(AssertUnwindSafe(|| {
                action.prepare(ctx, current_success, description, &mut step)
            }));

            let executed = match prepared {
                Ok(true) => {
                    emit_state(&events, index, id, ActionState::Ready);
                    emit_state(&events, index, id, ActionState::Executing);
                    debug!(action = %name, "executing");

                    let outcome = AssertUnwindSafe(action.execute(ctx, &mut step))
                        .catch_unwind()
                        .await;
                    let ok = match outcome {
                        Ok(Ok(ok)) => ok,
                        Ok(Err(e)) => {
                            step.add_exception(e.to_string());
                            false
                        }
                        Err(panic) => {
                            step.add_exception(format!("panicked: {}", panic_message(&*panic)));
                            false
                        }
                    };
                    emit_state(&events, index, id, ActionState::Completed);
                    Some(ok)
                }
                Ok(false) => {
                    step.mark_skipped();
                    step.add_log(format!("{name} skipped"));
                    emit_state(&events, index, id, ActionState::Skipped);
                    None
                }
                Err(panic) => {
                    step.add_exception(format!("prepare panicked: {}", panic_message(&*panic)));
                    Some(false)
                }
            };

            if let Some(ok) = executed {
                let ok = ok && step.success() != Some(false);
                if ok {
                    step.set_succeeded();
                } else if step.failure_reason().is_none() {
                    step.set_failed(format!("{name} failed"));
                }
                current_success &= ok;
            }

            let cleaned = std::panic::catch_unwind(AssertUnwindSafe(|| {
                action.clean_up(ctx, &mut step);
            }));
            if let Err(panic) = cleaned {
                warn!(action = %name, "clean up panicked");
                step.add_warning(format!("clean up panicked: {}", panic_message(&*panic)));
            }
            emit_state(&events, index, id, ActionState::CleanedUp);

            collect_advisories(action.as_ref(), ctx, &mut step);

            let success = step.succeeded();
            if step.is_skipped() {
                info!(action = %name, "step skipped");
            } else if success {
                info!(action = %name, "step succeeded");
            } else {
                warn!(action = %name, reason = step.failure_reason().unwrap_or(""), "step failed");
            }

            report.push(step);
            let _ = events.try_send(PipelineEvent::StepFinished {
                index,
                name,
                success,
            });
        }

        info!(success = report.overall_success(), "pipeline finished");
        report
    }
}

/// Pulls advisory warnings and errors not already on the step.
fn collect_advisories<C: Send>(action: &dyn Action<C>, ctx: &C, step: &mut StepResult) {
    let collected = std::panic::catch_unwind(AssertUnwindSafe(|| {
        (action.warnings(ctx), action.errors(ctx))
    }));
    let Ok((warnings, errors)) = collected else {
        step.add_warning("collecting advisories panicked");
        return;
    };

    for w in warnings {
        if !step.contains(Severity::Warning, &w) {
            step.add_warning(w);
        }
    }
    for e in errors {
        if !step.contains(Severity::Error, &e) {
            step.add_error(e);
        }
    }
}

fn emit_state(
    events: &mpsc::Sender<PipelineEvent>,
    index: usize,
    action_id: ActionId,
    state: ActionState,
) {
    let _ = events.try_send(PipelineEvent::StateChanged {
        index,
        action_id,
        state,
    });
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
