//! Aggregate result of one pipeline run.

use serde::{Deserialize, Serialize};

use crate::result::StepResult;

/// Ordered step results of a single run.
///
/// Insertion order equals execution order. The overall flag is the
/// conjunction of every step that was not skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    description: String,
    steps: Vec<StepResult>,
    overall_success: bool,
}

impl TaskReport {
    pub(crate) fn new(description: impl Into<String>, initial_success: bool) -> Self {
        Self {
            description: description.into(),
            steps: Vec::new(),
            overall_success: initial_success,
        }
    }

    pub(crate) fn push(&mut self, step: StepResult) {
        self.overall_success &= step.succeeded();
        self.steps.push(step);
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn overall_success(&self) -> bool {
        self.overall_success
    }

    /// All warnings across steps, in step then log order.
    pub fn all_warnings(&self) -> Vec<&str> {
        self.steps.iter().flat_map(|s| s.warnings()).collect()
    }

    /// All errors and exceptions across steps, in step then log order.
    pub fn all_errors(&self) -> Vec<&str> {
        self.steps.iter().flat_map(|s| s.errors()).collect()
    }

    /// Steps that ran and failed.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.succeeded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_is_conjunction_of_steps() {
        let mut report = TaskReport::new("release", true);
        let mut ok = StepResult::new("a");
        ok.set_succeeded();
        report.push(ok);
        assert!(report.overall_success());

        let mut bad = StepResult::new("b");
        bad.set_failed("nope");
        report.push(bad);

        let mut later = StepResult::new("c");
        later.set_succeeded();
        report.push(later);

        assert!(!report.overall_success());
        assert_eq!(report.len(), 3);
        assert_eq!(report.failed_steps().count(), 1);
    }

    #[test]
    fn initial_failure_carries_through() {
        let mut report = TaskReport::new("release", false);
        let mut ok = StepResult::new("a");
        ok.set_succeeded();
        report.push(ok);
        assert!(!report.overall_success());
    }

    #[test]
    fn skipped_steps_do_not_fail_the_report() {
        let mut report = TaskReport::new("release", true);
        let mut skipped = StepResult::new("notify");
        skipped.mark_skipped();
        report.push(skipped);
        assert!(report.overall_success());
    }

    #[test]
    fn warnings_and_errors_concatenate_in_order() {
        let mut report = TaskReport::new("release", true);
        let mut a = StepResult::new("a");
        a.add_warning("wa");
        a.add_error("ea");
        let mut b = StepResult::new("b");
        b.add_warning("wb");
        b.add_exception("xb");
        report.push(a);
        report.push(b);

        assert_eq!(report.all_warnings(), vec!["wa", "wb"]);
        assert_eq!(report.all_errors(), vec!["ea", "xb"]);
    }
}
