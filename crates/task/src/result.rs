//! Per-action execution record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a step log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    /// An uncaught failure captured by the pipeline.
    Exception,
}

/// One line of a step's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Mutable record of one action's execution.
///
/// Created by the pipeline right before Prepare and passed by reference
/// through Prepare, Execute and CleanUp. Success is tri-state: `None`
/// until the step either fails or the pipeline marks it succeeded.
///
/// [`set_failed`](Self::set_failed) is first-wins: once a step has
/// failed it stays failed and keeps its first reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    name: String,
    logs: Vec<LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    skipped: bool,
}

impl StepResult {
    /// Creates an empty record for the named step.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_log(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    pub fn add_exception(&mut self, message: impl Into<String>) {
        self.push(Severity::Exception, message.into());
    }

    /// Marks the step as failed with a human-readable reason.
    ///
    /// Only the first call records a reason; later calls are logged as
    /// additional errors but never replace it.
    pub fn set_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.success = Some(false);
        if self.failure_reason.is_none() {
            self.failure_reason = Some(reason.clone());
        }
        self.push(Severity::Error, reason);
    }

    /// Marks the step as succeeded unless it already failed.
    pub fn set_succeeded(&mut self) {
        if self.success.is_none() {
            self.success = Some(true);
        }
    }

    /// Marks the step as intentionally not run.
    pub fn mark_skipped(&mut self) {
        self.skipped = true;
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Raw tri-state success flag.
    pub fn success(&self) -> Option<bool> {
        self.success
    }

    /// Whether this step counts as successful in the overall result.
    ///
    /// Skipped and unset steps are neutral.
    pub fn succeeded(&self) -> bool {
        self.success != Some(false)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Warning messages in log order.
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.logs
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .map(|e| e.message.as_str())
    }

    /// Error and exception messages in log order.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.logs
            .iter()
            .filter(|e| matches!(e.severity, Severity::Error | Severity::Exception))
            .map(|e| e.message.as_str())
    }

    /// Whether an entry with this severity and exact message exists.
    pub fn contains(&self, severity: Severity, message: &str) -> bool {
        self.logs
            .iter()
            .any(|e| e.severity == severity && e.message == message)
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.logs.push(LogEntry {
            severity,
            message,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_step_is_unset() {
        let step = StepResult::new("zip");
        assert_eq!(step.name(), "zip");
        assert_eq!(step.success(), None);
        assert!(step.succeeded());
        assert!(step.logs().is_empty());
    }

    #[test]
    fn set_failed_keeps_first_reason() {
        let mut step = StepResult::new("upload");
        step.set_failed("first");
        step.set_failed("second");

        assert_eq!(step.success(), Some(false));
        assert_eq!(step.failure_reason(), Some("first"));
        let errors: Vec<&str> = step.errors().collect();
        assert_eq!(errors, vec!["first", "second"]);
    }

    #[test]
    fn set_succeeded_does_not_override_failure() {
        let mut step = StepResult::new("upload");
        step.set_failed("boom");
        step.set_succeeded();
        assert_eq!(step.success(), Some(false));
        assert!(!step.succeeded());
    }

    #[test]
    fn warnings_and_errors_are_filtered_in_order() {
        let mut step = StepResult::new("s");
        step.add_log("info");
        step.add_warning("w1");
        step.add_error("e1");
        step.add_exception("x1");
        step.add_warning("w2");

        assert_eq!(step.warnings().collect::<Vec<_>>(), vec!["w1", "w2"]);
        assert_eq!(step.errors().collect::<Vec<_>>(), vec!["e1", "x1"]);
        assert!(step.contains(Severity::Exception, "x1"));
        assert!(!step.contains(Severity::Warning, "x1"));
    }

    #[test]
    fn skipped_step_is_neutral() {
        let mut step = StepResult::new("notify");
        step.mark_skipped();
        assert!(step.is_skipped());
        assert!(step.succeeded());
    }

    #[test]
    fn step_json_omits_unset_fields() {
        let step = StepResult::new("s");
        let json = serde_json::to_string(&step).unwrap();
        assert!(!json.contains("failure_reason"));
        assert!(!json.contains("skipped"));
        let parsed: StepResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, step);
    }
}
