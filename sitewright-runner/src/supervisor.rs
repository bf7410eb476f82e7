//! Process supervision
//!
//! Launches external programs for builds:
//! - Each program becomes the leader of a new process group
//! - Output is drained concurrently so a chatty program never blocks on a full pipe
//! - A wall-clock limit is enforced; on expiry the entire group is SIGKILLed
//! - Group kills are idempotent; a group that is already gone counts as killed
//!
//! If the group cannot be signalled, the direct child is killed instead and a
//! degraded-kill warning is logged. Its descendants may survive in that case.

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Errors reported by the supervisor
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The program could not be started
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Waiting on the running program failed; its group has been killed
    #[error("failed waiting for process {pid:?}: {source}")]
    Wait {
        pid: Option<u32>,
        #[source]
        source: io::Error,
    },

    /// The program outlived its limit; its group has been killed
    #[error("process exceeded the {}s limit and was killed", limit.as_secs())]
    TimedOut { limit: Duration },
}

/// A program invocation
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Captured result of a program that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, absent when the program was terminated by a signal
    pub exit_code: Option<i32>,
    /// Terminating signal, if any
    pub signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Result of signalling a process group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// SIGKILL was sent; the group still had members, possibly only zombies
    Signalled,
    /// No member was left to signal
    AlreadyExited,
}

/// Handle to the process group led by a supervised program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGroup {
    pgid: Pid,
}

impl ProcessGroup {
    pub fn from_raw(pgid: i32) -> Self {
        Self {
            pgid: Pid::from_raw(pgid),
        }
    }

    pub fn id(&self) -> i32 {
        self.pgid.as_raw()
    }

    /// Sends SIGKILL to every member of the group
    ///
    /// A group with no remaining members (ESRCH) is reported as
    /// [`KillOutcome::AlreadyExited`], never as an error.
    pub fn kill(&self) -> nix::Result<KillOutcome> {
        match killpg(self.pgid, Signal::SIGKILL) {
            Ok(()) => Ok(KillOutcome::Signalled),
            Err(Errno::ESRCH) => Ok(KillOutcome::AlreadyExited),
            Err(errno) => Err(errno),
        }
    }
}

/// Launches and supervises external programs
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    /// How long to wait for a killed child to be reaped
    kill_grace: Duration,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self {
            kill_grace: Duration::from_secs(5),
        }
    }

    /// Starts a program as the leader of a new process group
    pub fn spawn(&self, spec: &CommandSpec) -> Result<SupervisedChild, SupervisorError> {
        debug!(
            "Spawning {} {:?} in {}",
            spec.program.display(),
            spec.args,
            spec.working_dir.display()
        );

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                program: spec.program.display().to_string(),
                source,
            })?;

        // With process_group(0) the group id equals the leader's pid
        let group = child.id().map(|pid| ProcessGroup::from_raw(pid as i32));
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        if let Some(group) = group {
            debug!("Spawned process group {}", group.id());
        }

        Ok(SupervisedChild {
            child,
            group,
            stdout,
            stderr,
            kill_grace: self.kill_grace,
        })
    }

    /// Runs a program to completion or until `limit` elapses
    pub async fn run(
        &self,
        spec: &CommandSpec,
        limit: Duration,
    ) -> Result<ProcessOutput, SupervisorError> {
        self.spawn(spec)?.wait_with_timeout(limit).await
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// A running supervised program
///
/// Dropping it kills the direct child; the group is only killed by
/// [`SupervisedChild::terminate`] or a timeout.
pub struct SupervisedChild {
    child: Child,
    group: Option<ProcessGroup>,
    stdout: JoinHandle<Vec<u8>>,
    stderr: JoinHandle<Vec<u8>>,
    kill_grace: Duration,
}

impl SupervisedChild {
    pub fn group(&self) -> Option<ProcessGroup> {
        self.group
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Waits for natural completion, killing the whole group if `limit` elapses first
    pub async fn wait_with_timeout(
        mut self,
        limit: Duration,
    ) -> Result<ProcessOutput, SupervisorError> {
        let pid = self.child.id();

        let waited = tokio::time::timeout(limit, async {
            let status = self.child.wait().await?;
            // Pipes close once every holder in the group has exited
            let stdout = (&mut self.stdout).await.unwrap_or_default();
            let stderr = (&mut self.stderr).await.unwrap_or_default();
            Ok::<_, io::Error>((status, stdout, stderr))
        })
        .await;

        match waited {
            Ok(Ok((status, stdout, stderr))) => Ok(ProcessOutput {
                exit_code: status.code(),
                signal: status.signal(),
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            }),
            Ok(Err(source)) => {
                self.terminate().await;
                Err(SupervisorError::Wait { pid, source })
            }
            Err(_) => {
                warn!(
                    "Process {:?} exceeded {}s limit, killing its process group",
                    pid,
                    limit.as_secs()
                );
                self.terminate().await;
                Err(SupervisorError::TimedOut { limit })
            }
        }
    }

    /// Kills the whole process group and reaps the direct child
    ///
    /// Idempotent. Falls back to killing only the direct child when the
    /// group cannot be signalled.
    pub async fn terminate(&mut self) {
        let group_killed = match self.group {
            Some(group) => match group.kill() {
                Ok(KillOutcome::Signalled) => {
                    info!("Sent SIGKILL to process group {}", group.id());
                    true
                }
                Ok(KillOutcome::AlreadyExited) => {
                    debug!("Process group {} already exited", group.id());
                    true
                }
                Err(errno) => {
                    warn!(
                        "Could not kill process group {}: {}; killing direct child only, descendants may survive",
                        group.id(),
                        errno
                    );
                    false
                }
            },
            None => false,
        };

        if !group_killed {
            if let Err(e) = self.child.start_kill() {
                debug!("Direct child kill skipped: {}", e);
            }
        }

        if tokio::time::timeout(self.kill_grace, self.child.wait())
            .await
            .is_err()
        {
            warn!(
                "Process {:?} was not reaped within {:?} after kill",
                self.child.id(),
                self.kill_grace
            );
        }

        self.stdout.abort();
        self.stderr.abort();
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!("Stopped reading child output: {}", e);
            }
        }
        buf
    })
}
