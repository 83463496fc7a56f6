//! Process invocation seam.
//!
//! The session talks to the executable through [`ProcessRunner`] so the
//! lock and retry logic can be exercised without a real butler install.

use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Captured result of one process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// stdout followed by stderr.
    pub text: String,
    /// Exit code, if the wait succeeded and the process exited normally.
    pub exit_code: Option<i32>,
    /// Set when waiting for exit failed after output was read.
    pub wait_error: Option<String>,
}

/// Runs an external program to completion.
pub trait ProcessRunner: Send + Sync {
    /// Spawns `program` and collects its output.
    ///
    /// `Err` means the process could not be started at all.
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [String],
    ) -> Pin<Box<dyn Future<Output = io::Result<ProcessOutput>> + Send + 'a>>;
}

/// Runs programs with `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    fn run<'a>(
        &'a self,
        program: &'a Path,
        args: &'a [String],
    ) -> Pin<Box<dyn Future<Output = io::Result<ProcessOutput>> + Send + 'a>> {
        Box::pin(async move {
            let mut child = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()?;

            let (stdout, stderr) = tokio::join!(
                read_pipe(child.stdout.take()),
                read_pipe(child.stderr.take())
            );

            let mut text = stdout;
            if !stderr.is_empty() {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&stderr);
            }

            let (exit_code, wait_error) = match child.wait().await {
                Ok(status) => (status.code(), None),
                Err(e) => (None, Some(e.to_string())),
            };

            Ok(ProcessOutput {
                text,
                exit_code,
                wait_error,
            })
        })
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe
        && let Err(e) = pipe.read_to_end(&mut buf).await
    {
        tracing::debug!(error = %e, "pipe read ended early");
    }
    String::from_utf8_lossy(&buf).into_owned()
}
