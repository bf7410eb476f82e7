//! Job orchestrator
//!
//! Owns the lifecycle of every build:
//!
//! ```text
//! ACCEPTED -> RUNNING -> { SUCCEEDED | FAILED | TIMED_OUT | ERRORED }
//! ```
//!
//! `submit` validates and acknowledges synchronously, then spawns one task
//! per run. That task exclusively owns its [`JobRun`], drives the build
//! program through the [`ProcessSupervisor`], turns the result into exactly
//! one [`Outcome`] and hands it to the notifier exactly once. No join handle
//! is returned to the caller.

use sitewright_core::domain::job::{JobId, JobState};
use sitewright_core::domain::outcome::Outcome;
use sitewright_core::domain::request::BuildRequest;
use sitewright_core::dto::site::SubmitResponse;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::service::notifier::OutcomeNotifier;
use crate::service::registry::RunRegistry;
use crate::supervisor::{CommandSpec, ProcessGroup, ProcessOutput, ProcessSupervisor, SupervisorError};

/// Reasons a request is refused before any job exists
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("build program {} not found", path.display())]
    ScriptMissing { path: PathBuf },

    #[error("build program {} exists but is not executable", path.display())]
    ScriptNotExecutable { path: PathBuf },

    #[error("cannot inspect build program {}: {source}", path.display())]
    ScriptUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl SubmitError {
    /// Whether the operator, not the caller, has to fix this
    pub fn is_configuration(&self) -> bool {
        !matches!(self, SubmitError::InvalidRequest(_))
    }
}

/// Synchronous acknowledgment of an accepted request
#[derive(Debug, Clone)]
pub struct Accepted {
    pub run_id: Uuid,
    pub job_id: JobId,
    pub site_url: Option<String>,
}

impl From<Accepted> for SubmitResponse {
    fn from(accepted: Accepted) -> Self {
        SubmitResponse::processing(accepted.job_id, accepted.site_url)
    }
}

/// Live handle of one execution
///
/// Owned by the run's task. If it is dropped while the build's process
/// group may still be alive (a panic mid-run), the group is killed.
struct JobRun {
    run_id: Uuid,
    job_id: JobId,
    started_at: Instant,
    group: Option<ProcessGroup>,
    /// Set once the group has been killed or has been seen to finish
    settled: bool,
    registry: Arc<RunRegistry>,
}

impl JobRun {
    fn new(run_id: Uuid, job_id: JobId, registry: Arc<RunRegistry>) -> Self {
        Self {
            run_id,
            job_id,
            started_at: Instant::now(),
            group: None,
            settled: false,
            registry,
        }
    }

    fn start(&mut self, group: Option<ProcessGroup>) {
        self.group = group;
        self.started_at = Instant::now();
        self.registry.transition(self.run_id, JobState::Running);
    }

    fn settle(&mut self) {
        self.settled = true;
    }

    /// Kills the run's process group; idempotent
    fn cancel(&mut self) {
        if self.settled {
            return;
        }
        self.settled = true;

        let Some(group) = self.group else {
            return;
        };

        match group.kill() {
            Ok(_) => info!("Cleaned up process group {} of job {}", group.id(), self.job_id),
            Err(errno) => warn!(
                "Could not kill process group {} of job {}: {}",
                group.id(),
                self.job_id,
                errno
            ),
        }
    }
}

impl Drop for JobRun {
    fn drop(&mut self) {
        if !self.settled && self.group.is_some() {
            warn!("Run {} ended unexpectedly, killing its process group", self.run_id);
            self.cancel();
        }
    }
}

/// Called once a build program is running, with the job and its process group
pub type StartHook = Arc<dyn Fn(&JobId, Option<ProcessGroup>) + Send + Sync>;

/// Accepts build requests and drives them to a single outcome
pub struct Orchestrator {
    config: Arc<Config>,
    supervisor: ProcessSupervisor,
    notifier: Arc<dyn OutcomeNotifier>,
    registry: Arc<RunRegistry>,
    on_start: Option<StartHook>,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>, notifier: Arc<dyn OutcomeNotifier>) -> Self {
        Self {
            config,
            supervisor: ProcessSupervisor::new(),
            notifier,
            registry: Arc::new(RunRegistry::new()),
            on_start: None,
        }
    }

    /// Runs `hook` inside each build task right after its program starts
    ///
    /// The hook runs on the async runtime and must not block for long. If it
    /// panics, the run ends as an internal error and its process group is
    /// killed.
    pub fn with_start_hook(
        mut self,
        hook: impl Fn(&JobId, Option<ProcessGroup>) + Send + Sync + 'static,
    ) -> Self {
        self.on_start = Some(Arc::new(hook));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    /// Checks that the build program exists and is executable
    pub fn check_build_script(&self) -> Result<(), SubmitError> {
        let path = self.config.script_path();

        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SubmitError::ScriptMissing { path });
            }
            Err(source) => return Err(SubmitError::ScriptUnreadable { path, source }),
        };

        if !metadata.is_file() {
            return Err(SubmitError::ScriptMissing { path });
        }

        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(SubmitError::ScriptNotExecutable { path });
        }

        Ok(())
    }

    /// Accepts a build request and schedules it
    ///
    /// Returns as soon as the run is scheduled; never waits on the build
    /// program. Must be called from within a Tokio runtime.
    pub fn submit(self: &Arc<Self>, request: BuildRequest) -> Result<Accepted, SubmitError> {
        self.check_build_script()?;
        validate_request(&request)?;

        let run_id = Uuid::new_v4();
        let job_id = request.job_id();
        let site_url = self.config.site_url(&job_id);

        self.registry
            .register(run_id, &job_id, &request.business_name);

        info!(
            "Accepted build {} for '{}' (job {}, timeout {}s)",
            run_id,
            request.business_name,
            job_id,
            self.config.build_timeout.as_secs()
        );

        let run = JobRun::new(run_id, job_id.clone(), Arc::clone(&self.registry));
        tokio::spawn(Arc::clone(self).run_job(run, request));

        Ok(Accepted {
            run_id,
            job_id,
            site_url,
        })
    }

    /// Runs one job to its outcome and delivers it
    async fn run_job(self: Arc<Self>, run: JobRun, request: BuildRequest) {
        let run_id = run.run_id;
        let job_id = run.job_id.clone();
        let callback_url = request.webhook_url.clone();

        // A panic inside the build task surfaces here instead of losing the outcome
        let this = Arc::clone(&self);
        let outcome = match tokio::spawn(async move { this.execute(run, &request).await }).await
        {
            Ok(outcome) => outcome,
            Err(join_error) => {
                error!("Build task for job {} failed: {}", job_id, join_error);
                Outcome::InternalError {
                    error: format!("build task failed: {}", join_error),
                }
            }
        };

        self.finish(run_id, &job_id, &callback_url, outcome).await;
    }

    /// Launches the build program and interprets its result
    async fn execute(&self, mut run: JobRun, request: &BuildRequest) -> Outcome {
        let spec = CommandSpec::new(self.config.script_path(), &self.config.work_dir)
            .args(request.build_args());

        let child = match self.supervisor.spawn(&spec) {
            Ok(child) => child,
            Err(e) => {
                error!("Could not start build for job {}: {}", run.job_id, e);
                return Outcome::InternalError {
                    error: e.to_string(),
                };
            }
        };

        run.start(child.group());
        info!(
            "Build for job {} running as process group {:?}",
            run.job_id,
            child.group().map(|g| g.id())
        );

        if let Some(hook) = &self.on_start {
            hook(&run.job_id, child.group());
        }

        let result = child.wait_with_timeout(self.config.build_timeout).await;
        let elapsed = run.started_at.elapsed();

        match result {
            Ok(output) if output.success() => {
                run.settle();
                info!("Build for job {} succeeded in {:?}", run.job_id, elapsed);
                Outcome::Success {
                    subject: request.business_name.clone(),
                    job_id: run.job_id.clone(),
                    site_url: self.config.site_url(&run.job_id),
                }
            }
            Ok(output) => {
                run.settle();
                let error = failure_text(&output);
                warn!(
                    "Build for job {} failed (exit {:?}) after {:?}: {}",
                    run.job_id, output.exit_code, elapsed, error
                );
                Outcome::Failure {
                    error,
                    exit_code: output.exit_code,
                }
            }
            Err(SupervisorError::TimedOut { limit }) => {
                // The supervisor has already killed the group
                run.settle();
                warn!(
                    "Build for job {} hit the {}s timeout and was killed",
                    run.job_id,
                    limit.as_secs()
                );
                Outcome::Timeout {
                    subject: request.business_name.clone(),
                    limit_secs: limit.as_secs(),
                }
            }
            Err(e) => {
                error!("Unexpected error while running job {}: {}", run.job_id, e);
                run.cancel();
                Outcome::InternalError {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Records the terminal state, then delivers the outcome once
    async fn finish(&self, run_id: Uuid, job_id: &JobId, callback_url: &str, outcome: Outcome) {
        self.registry.transition(run_id, outcome.terminal_state());

        match self.notifier.deliver(callback_url, &outcome).await {
            Ok(()) => info!(
                "Delivered '{}' outcome of job {} to {}",
                outcome.status_label(),
                job_id,
                callback_url
            ),
            Err(e) => warn!(
                "Failed to deliver '{}' outcome of job {} to {}: {}",
                outcome.status_label(),
                job_id,
                callback_url,
                e
            ),
        }
    }
}

fn validate_request(request: &BuildRequest) -> Result<(), SubmitError> {
    let job_id = request.job_id();
    if !job_id.as_str().chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(SubmitError::InvalidRequest(format!(
            "business_name '{}' does not yield a usable slug",
            request.business_name
        )));
    }

    let webhook = request.webhook_url.trim();
    if !webhook.starts_with("http://") && !webhook.starts_with("https://") {
        return Err(SubmitError::InvalidRequest(
            "webhook_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

/// Error text reported for a non-zero exit
fn failure_text(output: &ProcessOutput) -> String {
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }

    match (output.exit_code, output.signal) {
        (_, Some(signal)) => format!("build program terminated by signal {}", signal),
        (Some(code), None) => format!("build program exited with code {}", code),
        (None, None) => "build program exited abnormally".to_string(),
    }
}
