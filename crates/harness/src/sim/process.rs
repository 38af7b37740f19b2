//! Typed external process invocation.
//!
//! Every collaborator the harness drives (compiler, simulator runtime, objcopy) is launched
//! through [`ProcessSpec`]: an explicit program, argument list, working directory, and
//! optional timeout. The result is a structured [`ProcessOutcome`] rather than an exit code
//! that each call site must interpret.
//!
//! Output streams are drained on background threads so a chatty child cannot block on a
//! full pipe. On Unix the child leads its own process group. The whole group is killed once
//! the child exits or times out, so grandchildren (shell wrappers, `vvp` helpers) cannot hold
//! the pipes open. Reading is also bounded by [`READ_GRACE`] past that point, so a descendant
//! that escaped the group only costs its unread output.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::common::{HarnessError, HarnessResult};

/// Interval between child status polls while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long captured streams may keep draining after the child has exited or been killed.
pub const READ_GRACE: Duration = Duration::from_millis(500);

/// Description of one external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

/// How an external process finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process exited on its own.
    Exited {
        /// Exit code, `None` if terminated by a signal.
        code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
    /// The timeout elapsed and the process was killed.
    TimedOut {
        /// Output captured before the kill.
        stdout: String,
        /// Diagnostics captured before the kill.
        stderr: String,
    },
}

impl ProcessOutcome {
    /// Returns `true` for a zero exit status.
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited { code: Some(0), .. })
    }

    /// Captured standard output.
    pub fn stdout(&self) -> &str {
        match self {
            Self::Exited { stdout, .. } | Self::TimedOut { stdout, .. } => stdout,
        }
    }

    /// Captured standard error.
    pub fn stderr(&self) -> &str {
        match self {
            Self::Exited { stderr, .. } | Self::TimedOut { stderr, .. } => stderr,
        }
    }
}

impl ProcessSpec {
    /// Starts a spec for `program` with no arguments, inherited working directory, and no timeout.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the process from `dir`.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Kills the process if it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Program to execute.
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Argument list.
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Working directory, if overridden.
    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Space-joined command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Launches the process and waits for it to exit or time out.
    ///
    /// Only a failure to spawn or wait is an error; non-zero exits and timeouts are outcomes.
    pub fn run(&self) -> HarnessResult<ProcessOutcome> {
        debug!(command = %self.command_line(), cwd = ?self.cwd, "spawning process");

        let mut command = Command::new(&self.program);
        let _ = command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            let _ = command.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            let _ = command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|e| HarnessError::io(PathBuf::from(&self.program), e))?;

        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        let waited = wait_with_timeout(&mut child, self.timeout);
        kill_group(&child);

        let deadline = Instant::now() + READ_GRACE;
        let stdout = collect(stdout_reader, deadline);
        let stderr = collect(stderr_reader, deadline);

        match waited.map_err(|e| HarnessError::io(PathBuf::from(&self.program), e))? {
            Some(status) => Ok(ProcessOutcome::Exited {
                code: status.code(),
                stdout,
                stderr,
            }),
            None => {
                warn!(command = %self.command_line(), timeout = ?self.timeout, "process timed out");
                Ok(ProcessOutcome::TimedOut { stdout, stderr })
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(mut stream: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let _ = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stream.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Output of a drain thread, or nothing if it is still blocked at `deadline`.
///
/// A reader left behind is detached and exits once the last writer closes the pipe.
fn collect(reader: Option<Receiver<String>>, deadline: Instant) -> String {
    reader
        .and_then(|rx| {
            rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                .ok()
        })
        .unwrap_or_default()
}

/// Waits for `child`; `Ok(None)` means the timeout elapsed and the child was killed.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(e) => {
                terminate(child);
                return Err(e);
            }
        }
        if started.elapsed() >= timeout {
            terminate(child);
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn terminate(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

/// Kills every process left in the child's group. A no-op once the group is empty.
fn kill_group(child: &Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: `kill` has no memory-safety preconditions. The negated pid targets the
            // process group created for this child via `process_group(0)`.
            let _ = unsafe { libc::kill(-pid, libc::SIGKILL) };
        }
    }
    #[cfg(not(unix))]
    let _ = child;
}
