//! Single-flight butler session.
//!
//! A session is constructed once and shared (behind an `Arc`) by every
//! action that pushes to itch.io. Its lock is held for one whole upload,
//! retries included, so two pushes never run at the same time.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use launchpad_task::StepResult;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::classify::{Classification, classify};
use crate::command::PushRequest;
use crate::error::ButlerError;
use crate::runner::{ProcessRunner, TokioProcessRunner};

/// Default number of spawn/classify cycles per upload.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButlerConfig {
    /// Explicit executable path; `None` searches `PATH`.
    pub executable: Option<PathBuf>,
    pub max_attempts: u32,
}

impl Default for ButlerConfig {
    fn default() -> Self {
        Self {
            executable: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Serializes all butler invocations.
pub struct ButlerSession {
    config: ButlerConfig,
    runner: Arc<dyn ProcessRunner>,
    /// Held for one whole upload.
    upload_lock: Mutex<()>,
    /// Resolved executable, cached after first use. Never held across a push.
    executable: RwLock<Option<PathBuf>>,
}

impl ButlerSession {
    /// Creates a session that spawns real processes.
    pub fn new(config: ButlerConfig) -> Self {
        Self::with_runner(config, Arc::new(TokioProcessRunner))
    }

    /// Creates a session with a custom process runner.
    pub fn with_runner(config: ButlerConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            config,
            runner,
            upload_lock: Mutex::new(()),
            executable: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ButlerConfig {
        &self.config
    }

    /// Whether the executable path has been resolved.
    ///
    /// Does not wait for an in-flight upload.
    pub async fn is_initialized(&self) -> bool {
        self.executable.read().await.is_some()
    }

    /// Resolves and caches the executable path.
    pub async fn initialize(&self) -> Result<PathBuf, ButlerError> {
        self.ensure_executable().await
    }

    /// Waits for any in-flight upload, then resolves the path again.
    pub async fn reinitialize(&self) -> Result<PathBuf, ButlerError> {
        let _upload = self.upload_lock.lock().await;
        *self.executable.write().await = None;
        self.ensure_executable().await
    }

    /// Waits for any in-flight upload and forgets the cached path.
    pub async fn shutdown(&self) {
        let _upload = self.upload_lock.lock().await;
        *self.executable.write().await = None;
        debug!("butler session shut down");
    }

    /// Pushes `request` to itch.io, recording the outcome on `result`.
    ///
    /// Blocks until no other upload is running. Retryable failures are
    /// attempted again while the lock is still held, up to
    /// `max_attempts` times.
    pub async fn upload(&self, request: &PushRequest, result: &mut StepResult) -> bool {
        let _upload = match self.upload_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                info!("another butler upload is running, waiting");
                result.add_log("Waiting for another itch.io upload to finish");
                self.upload_lock.lock().await
            }
        };

        if !request.path.exists() {
            result.set_failed(format!(
                "Itchio upload failed: {} does not exist",
                request.path.display()
            ));
            return false;
        }

        let executable = match self.ensure_executable().await {
            Ok(path) => path,
            Err(e) => {
                result.set_failed(format!("Itchio upload failed: {e}"));
                return false;
            }
        };

        let args = request.args();
        let max_attempts = self.config.max_attempts.max(1);
        result.add_log(format!("butler {}", request.argument_string()));

        for attempt in 1..=max_attempts {
            let started = Instant::now();
            let output = match self.runner.run(&executable, &args).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(error = %e, "failed to start butler");
                    result.set_failed(format!(
                        "Itchio upload failed: could not start {}: {e}",
                        executable.display()
                    ));
                    return false;
                }
            };
            let elapsed = started.elapsed();
            info!(
                attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                target = %request.target(),
                "butler finished"
            );
            result.add_log(format!(
                "butler attempt {attempt} finished in {:.1}s",
                elapsed.as_secs_f64()
            ));

            if let Some(wait_error) = &output.wait_error {
                result.add_warning(format!("Waiting for butler to exit failed: {wait_error}"));
            }

            match classify(&output.text) {
                Classification::Success => {
                    if let Some(code) = output.exit_code
                        && code != 0
                    {
                        result.add_error(output.text.clone());
                        result.set_failed(format!(
                            "Itchio upload failed: butler exited with code {code}"
                        ));
                        return false;
                    }
                    result.add_log(format!("Uploaded to {}", request.target()));
                    return true;
                }
                Classification::Failure { reason, retryable } => {
                    if retryable && attempt < max_attempts {
                        warn!(attempt, reason = %reason, "butler upload failed, retrying");
                        result.add_warning(format!(
                            "itch.io upload attempt {attempt}/{max_attempts} failed: {reason}; retrying"
                        ));
                        continue;
                    }
                    result.add_error(output.text.clone());
                    result.set_failed(reason);
                    return false;
                }
            }
        }

        // max_attempts >= 1 and the last attempt never continues.
        result.set_failed("Itchio upload failed: retries exhausted");
        false
    }

    async fn ensure_executable(&self) -> Result<PathBuf, ButlerError> {
        if let Some(path) = self.executable.read().await.as_ref() {
            return Ok(path.clone());
        }
        let mut cached = self.executable.write().await;
        if let Some(path) = cached.as_ref() {
            return Ok(path.clone());
        }
        let path = resolve_executable(self.config.executable.as_deref())?;
        debug!(path = %path.display(), "butler executable resolved");
        *cached = Some(path.clone());
        Ok(path)
    }
}

/// Finds the executable: the explicit path if given, else `PATH`.
fn resolve_executable(explicit: Option<&Path>) -> Result<PathBuf, ButlerError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ButlerError::NotFound(path.display().to_string()))
        };
    }

    let name = if cfg!(windows) { "butler.exe" } else { "butler" };
    let search = std::env::var_os("PATH").ok_or(ButlerError::NotOnPath)?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or(ButlerError::NotOnPath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::NO_OUTPUT_REASON;
    use crate::runner::ProcessOutput;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted runner that tracks how many runs overlap.
    struct FakeRunner {
        outputs: std::sync::Mutex<VecDeque<io::Result<ProcessOutput>>>,
        fallback: String,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        last_args: std::sync::Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn new(outputs: Vec<io::Result<ProcessOutput>>) -> Arc<Self> {
            Arc::new(Self {
                outputs: std::sync::Mutex::new(outputs.into()),
                fallback: "Done.".into(),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                last_args: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run<'a>(
            &'a self,
            _program: &'a Path,
            args: &'a [String],
        ) -> Pin<Box<dyn Future<Output = io::Result<ProcessOutput>> + Send + 'a>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                *self.last_args.lock().unwrap() = args.to_vec();

                tokio::time::sleep(Duration::from_millis(20)).await;

                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                let next = self.outputs.lock().unwrap().pop_front();
                next.unwrap_or_else(|| Ok(text(&self.fallback)))
            })
        }
    }

    fn text(s: &str) -> ProcessOutput {
        ProcessOutput {
            text: s.into(),
            exit_code: Some(0),
            wait_error: None,
        }
    }

    struct Fixture {
        _exe: tempfile::NamedTempFile,
        build: tempfile::TempDir,
        config: ButlerConfig,
    }

    fn fixture() -> Fixture {
        let exe = tempfile::NamedTempFile::new().unwrap();
        let build = tempfile::tempdir().unwrap();
        let config = ButlerConfig {
            executable: Some(exe.path().to_path_buf()),
            max_attempts: 3,
        };
        Fixture {
            _exe: exe,
            build,
            config,
        }
    }

    fn request(path: &Path) -> PushRequest {
        PushRequest {
            path: path.to_path_buf(),
            user: "alice".into(),
            game: "mygame".into(),
            channels: vec!["Windows".into()],
            version: "1.0.0".into(),
        }
    }

    #[tokio::test]
    async fn clean_output_succeeds() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![Ok(text("Uploaded build"))]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner.clone());
        let mut result = StepResult::new("itch");

        assert!(session.upload(&request(fx.build.path()), &mut result).await);
        assert_eq!(runner.calls(), 1);
        assert_eq!(result.success(), None);
        assert!(session.is_initialized().await);

        let args = runner.last_args.lock().unwrap().clone();
        assert_eq!(args[0], "push");
        assert_eq!(args[2], "alice/mygame:windows");
    }

    #[tokio::test]
    async fn empty_output_fails_with_contract_reason() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![Ok(text(""))]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner.clone());
        let mut result = StepResult::new("itch");

        assert!(!session.upload(&request(fx.build.path()), &mut result).await);
        assert_eq!(result.failure_reason(), Some(NO_OUTPUT_REASON));
        assert_eq!(runner.calls(), 1);
    }

    #[tokio::test]
    async fn spawn_failure_is_not_retried() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![Err(io::Error::new(io::ErrorKind::NotFound, "gone"))]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner.clone());
        let mut result = StepResult::new("itch");

        assert!(!session.upload(&request(fx.build.path()), &mut result).await);
        assert_eq!(runner.calls(), 1);
        assert!(result.failure_reason().unwrap().contains("could not start"));

        // The lock was released.
        assert!(session.upload_lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn retryable_failure_retries_until_exhausted() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![
            Ok(text("Error: unauthorized")),
            Ok(text("Error: unauthorized")),
            Ok(text("Error: unauthorized")),
        ]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner.clone());
        let mut result = StepResult::new("itch");

        assert!(!session.upload(&request(fx.build.path()), &mut result).await);
        assert_eq!(runner.calls(), 3);
        assert_eq!(result.failure_reason(), Some("unauthorized"));
        assert_eq!(result.warnings().count(), 2);
    }

    #[tokio::test]
    async fn retry_then_success() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![
            Ok(text("error: connection reset by peer")),
            Ok(text("Build pushed")),
        ]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner.clone());
        let mut result = StepResult::new("itch");

        assert!(session.upload(&request(fx.build.path()), &mut result).await);
        assert_eq!(runner.calls(), 2);
    }

    #[tokio::test]
    async fn terminal_failure_stops_immediately() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![Ok(text("Error: game not found\n"))]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner.clone());
        let mut result = StepResult::new("itch");

        assert!(!session.upload(&request(fx.build.path()), &mut result).await);
        assert_eq!(runner.calls(), 1);
        assert_eq!(result.failure_reason(), Some("not found"));
    }

    #[tokio::test]
    async fn nonzero_exit_without_marker_fails() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![Ok(ProcessOutput {
            text: "something odd happened".into(),
            exit_code: Some(2),
            wait_error: None,
        })]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner);
        let mut result = StepResult::new("itch");

        assert!(!session.upload(&request(fx.build.path()), &mut result).await);
        assert!(result.failure_reason().unwrap().contains("exited with code 2"));
    }

    #[tokio::test]
    async fn wait_error_is_only_a_warning() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![Ok(ProcessOutput {
            text: "Uploaded".into(),
            exit_code: None,
            wait_error: Some("interrupted".into()),
        })]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner);
        let mut result = StepResult::new("itch");

        assert!(session.upload(&request(fx.build.path()), &mut result).await);
        assert_eq!(result.warnings().count(), 1);
    }

    #[tokio::test]
    async fn missing_executable_fails_without_spawning() {
        let fx = fixture();
        let config = ButlerConfig {
            executable: Some(PathBuf::from("/nonexistent/butler")),
            max_attempts: 3,
        };
        let runner = FakeRunner::new(vec![]);
        let session = ButlerSession::with_runner(config, runner.clone());
        let mut result = StepResult::new("itch");

        assert!(!session.upload(&request(fx.build.path()), &mut result).await);
        assert_eq!(runner.calls(), 0);
        assert!(!session.is_initialized().await);
    }

    #[tokio::test]
    async fn missing_artifact_fails_without_spawning() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner.clone());
        let mut result = StepResult::new("itch");

        let missing = fx.build.path().join("nope.zip");
        assert!(!session.upload(&request(&missing), &mut result).await);
        assert_eq!(runner.calls(), 0);
        assert!(result.failure_reason().unwrap().contains("does not exist"));
    }

    #[tokio::test]
    async fn concurrent_uploads_never_overlap() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner.clone());
        let req = request(fx.build.path());

        let mut a = StepResult::new("a");
        let mut b = StepResult::new("b");
        let mut c = StepResult::new("c");
        let (ra, rb, rc) = tokio::join!(
            session.upload(&req, &mut a),
            session.upload(&req, &mut b),
            session.upload(&req, &mut c)
        );

        assert!(ra && rb && rc);
        assert_eq!(runner.calls(), 3);
        assert_eq!(runner.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_never_overlap() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![]);
        let session = Arc::new(ButlerSession::with_runner(fx.config.clone(), runner.clone()));
        let req = request(fx.build.path());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let session = session.clone();
                let req = req.clone();
                tokio::spawn(async move {
                    let mut result = StepResult::new(format!("upload {i}"));
                    session.upload(&req, &mut result).await
                })
            })
            .collect();

        for h in handles {
            assert!(h.await.unwrap());
        }
        assert_eq!(runner.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reinitialize_resolves_again() {
        let fx = fixture();
        let session = ButlerSession::with_runner(fx.config.clone(), FakeRunner::new(vec![]));
        assert!(!session.is_initialized().await);

        let first = session.initialize().await.unwrap();
        assert_eq!(first, fx.config.executable.clone().unwrap());
        let second = session.reinitialize().await.unwrap();
        assert_eq!(first, second);

        session.shutdown().await;
        assert!(!session.is_initialized().await);
    }

    #[tokio::test]
    async fn status_check_does_not_wait_for_upload() {
        let fx = fixture();
        let runner = FakeRunner::new(vec![]);
        let session = ButlerSession::with_runner(fx.config.clone(), runner.clone());
        let req = request(fx.build.path());
        let mut result = StepResult::new("itch");

        let upload = session.upload(&req, &mut result);
        tokio::pin!(upload);
        let status = async {
            while runner.in_flight.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
            session.is_initialized().await
        };

        tokio::select! {
            _ = &mut upload => panic!("upload finished before the status check"),
            initialized = status => assert!(initialized),
        }
        assert!(upload.await);
    }

    #[test]
    fn explicit_path_must_be_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_executable(Some(dir.path())),
            Err(ButlerError::NotFound(_))
        ));
    }
}
