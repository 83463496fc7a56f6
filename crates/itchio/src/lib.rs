//! itch.io uploads through the external `butler` CLI.
//!
//! The CLI refuses concurrent invocations, so every push goes through a
//! [`ButlerSession`] that holds a single-flight lock for the whole
//! upload, retries included. Success is judged from the merged console
//! output by [`classify`].

pub mod classify;
pub mod command;
pub mod error;
pub mod runner;
pub mod session;

pub use classify::{Classification, FAILURE_MARKERS, NO_OUTPUT_REASON, classify};
pub use command::PushRequest;
pub use error::ButlerError;
pub use runner::{ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use session::{ButlerConfig, ButlerSession};
