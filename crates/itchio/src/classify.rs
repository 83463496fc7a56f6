//! Butler output classification.
//!
//! butler reports most failures on its console while still exiting
//! normally, so the merged output is scanned for failure markers.

/// Failure markers, from most general to most specific.
///
/// When several occur, the one listed last wins, so `Error: unauthorized`
/// is reported as `unauthorized`.
pub const FAILURE_MARKERS: [&str; 7] = [
    "missing",
    "error",
    "failed",
    "not found",
    "not recognized",
    "invalid",
    "unauthorized",
];

/// Output hints that make a failure worth another attempt.
///
/// Matched as whole tokens, so `401` inside `14015` does not count.
const RETRY_HINTS: [&str; 4] = ["unauthorized", "401", "timed out", "connection reset"];

/// Reason recorded when butler printed nothing at all.
pub const NO_OUTPUT_REASON: &str =
    "Itchio upload failed: No output from ItchioCMD. Does your username/game_id/channel_id have spaces?";

/// Outcome of scanning butler's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success,
    Failure {
        /// Output from the marker up to the end of its line.
        reason: String,
        retryable: bool,
    },
}

impl Classification {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Classifies butler's merged stdout/stderr.
pub fn classify(output: &str) -> Classification {
    if output.trim().is_empty() {
        return Classification::Failure {
            reason: NO_OUTPUT_REASON.to_string(),
            retryable: false,
        };
    }

    // ASCII lower-casing keeps byte offsets aligned with `output`.
    let lower = output.to_ascii_lowercase();
    let Some(start) = FAILURE_MARKERS.iter().rev().find_map(|m| lower.find(m)) else {
        return Classification::Success;
    };

    let rest = &output[start..];
    let line = rest.split('\n').next().unwrap_or(rest).trim_end();
    let retryable = RETRY_HINTS.iter().any(|h| contains_token(&lower, h));

    Classification::Failure {
        reason: line.to_string(),
        retryable,
    }
}

/// Whether `needle` occurs in `haystack` with no alphanumeric neighbour.
fn contains_token(haystack: &str, needle: &str) -> bool {
    let bytes = haystack.as_bytes();
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = start.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(end).copied();
        !before.is_some_and(|b| b.is_ascii_alphanumeric())
            && !after.is_some_and(|b| b.is_ascii_alphanumeric())
    })
}
