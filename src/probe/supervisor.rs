//! Ownership of the probe child process.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::command::ProbeCommand;
use super::stream::{LinePoll, LineStream, Pipe};
use crate::error::{ConfigError, PingStatsError};

/// One running probe process and its merged output.
///
/// A supervisor exists only once its process has been spawned. Dropping it
/// kills the process, so a panic never leaves a probe behind.
#[derive(Debug)]
pub struct ProbeSupervisor {
    child: Child,
    lines: LineStream,
    program: String,
    pid: Option<u32>,
    grace: Duration,
    exit: Option<ExitStatus>,
    stopped: bool,
}

impl ProbeSupervisor {
    /// Spawn the probe against `address`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        command: &ProbeCommand,
        address: &str,
        extra_args: &[String],
    ) -> Result<Self, PingStatsError> {
        if address.trim().is_empty() {
            return Err(ConfigError::MissingAddress.into());
        }

        let args = command.arguments(address, extra_args);
        let mut child = Command::new(&command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PingStatsError::Launch {
                program: command.program.clone(),
                source,
            })?;

        let mut pipes: Vec<Pipe> = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pipes.push(Box::new(stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            pipes.push(Box::new(stderr));
        }

        let pid = child.id();
        info!(program = %command.program, ?args, ?pid, "probe started");

        Ok(Self {
            child,
            lines: LineStream::merge(pipes),
            program: command.program.clone(),
            pid,
            grace: command.grace(),
            exit: None,
            stopped: false,
        })
    }

    /// OS process id, as reported at spawn.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the next output line. `None` once both pipes have closed.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.next_line().await
    }

    /// Take an already-buffered line without waiting.
    pub fn try_next_line(&mut self) -> LinePoll {
        self.lines.try_next_line()
    }

    /// Exit status, once the process has been reaped.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit
    }

    /// Stop the probe and reap it.
    ///
    /// Asks politely first, waits up to the grace period, then kills. Calling
    /// this again after it has returned does nothing.
    pub async fn stop(&mut self) -> io::Result<Option<ExitStatus>> {
        if self.stopped {
            return Ok(self.exit);
        }
        self.stopped = true;

        if let Some(status) = self.child.try_wait()? {
            debug!(program = %self.program, %status, "probe had already exited");
            self.exit = Some(status);
            return Ok(self.exit);
        }

        if let Err(e) = self.terminate() {
            warn!(program = %self.program, error = %e, "terminate request failed");
        }

        let status = match tokio::time::timeout(self.grace, self.child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    program = %self.program,
                    grace_ms = self.grace.as_millis() as u64,
                    "probe ignored terminate request, killing"
                );
                self.child.kill().await?;
                self.child.wait().await?
            }
        };

        info!(program = %self.program, %status, "probe stopped");
        self.exit = Some(status);
        Ok(self.exit)
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> io::Result<()> {
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        // SAFETY: `pid` is our own child and has not been reaped yet, so the
        // id cannot have been reused.
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}
