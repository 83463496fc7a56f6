//! Report and action list printing.

use std::fmt::Write as _;

use launchpad_actions::{BUILD_ACTIONS, UPLOAD_ACTIONS};
use launchpad_task::{Severity, StepResult, TaskReport};
use serde::Serialize;

#[derive(Serialize)]
struct RunSummary<'a> {
    success: bool,
    build: &'a TaskReport,
    upload: &'a TaskReport,
}

/// Renders both reports as pretty JSON.
pub fn reports_json(build: &TaskReport, upload: &TaskReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&RunSummary {
        success: build.overall_success() && upload.overall_success(),
        build,
        upload,
    })
}

/// Renders a report for the terminal.
pub fn report_text(report: &TaskReport) -> String {
    let mut out = String::new();
    let verdict = if report.overall_success() {
        "succeeded"
    } else {
        "FAILED"
    };
    let _ = writeln!(out, "== {} {verdict}", report.description());

    for step in report.steps() {
        let _ = writeln!(out, "  [{}] {}", step_status(step), step.name());
        for entry in step.logs() {
            let _ = writeln!(out, "      {}: {}", severity_label(entry.severity), entry.message);
        }
    }

    let warnings = report.all_warnings();
    if !warnings.is_empty() {
        let _ = writeln!(out, "  {} warning(s)", warnings.len());
    }
    out
}

/// Renders the action tables.
pub fn actions_text() -> String {
    let mut out = String::from("Build actions:\n");
    for entry in BUILD_ACTIONS {
        let _ = writeln!(out, "  {:<18} {}", entry.descriptor.kind, entry.descriptor.display_name);
    }
    out.push_str("Upload actions:\n");
    for entry in UPLOAD_ACTIONS {
        let _ = writeln!(out, "  {:<18} {}", entry.descriptor.kind, entry.descriptor.display_name);
    }
    out
}

fn step_status(step: &StepResult) -> &'static str {
    if step.is_skipped() {
        "skipped"
    } else if step.succeeded() {
        "ok"
    } else {
        "FAILED"
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Warning => "warn",
        Severity::Error => "error",
        Severity::Exception => "exception",
    }
}
