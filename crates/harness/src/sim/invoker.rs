//! Per-test simulator execution.
//!
//! The testbench loads its program from a fixed file name in the current directory and
//! writes its signature next to it. [`SimulationInvoker::run`] therefore runs the simulator
//! from a caller-chosen work directory, staging the memory image there under the expected
//! name and clearing any stale signature first.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use super::build::SimulatorExecutable;
use super::process::{ProcessOutcome, ProcessSpec};
use super::toolchain::Toolchain;
use crate::common::{HarnessError, HarnessResult};
use crate::config::Config;

/// How one simulation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The simulator exited cleanly. The signature may still be missing.
    Completed {
        /// Where the testbench writes its signature.
        signature: PathBuf,
        /// Simulator console output.
        stdout: String,
        /// Simulator diagnostics.
        stderr: String,
    },
    /// The simulator was killed after exceeding its budget.
    TimedOut {
        /// Budget that was exceeded.
        timeout: Duration,
        /// Output captured before the kill.
        stdout: String,
        /// Diagnostics captured before the kill.
        stderr: String,
    },
    /// The simulator exited with a failure status.
    CrashedWithNonZeroExit {
        /// Exit code, `None` if terminated by a signal.
        code: Option<i32>,
        /// Console output.
        stdout: String,
        /// Diagnostics.
        stderr: String,
    },
}

impl ExecutionOutcome {
    /// Returns the signature path for a completed run, or the matching error otherwise.
    pub fn into_result(self) -> HarnessResult<PathBuf> {
        match self {
            Self::Completed { signature, .. } => Ok(signature),
            Self::TimedOut {
                timeout,
                stdout,
                stderr,
            } => Err(HarnessError::TimedOut {
                timeout,
                stdout,
                stderr,
            }),
            Self::CrashedWithNonZeroExit { code, stderr, .. } => {
                Err(HarnessError::CrashedWithNonZeroExit { code, stderr })
            }
        }
    }

    /// Simulator console output.
    pub fn stdout(&self) -> &str {
        match self {
            Self::Completed { stdout, .. }
            | Self::TimedOut { stdout, .. }
            | Self::CrashedWithNonZeroExit { stdout, .. } => stdout,
        }
    }
}

/// Runs the shared simulator executable against per-test memory images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationInvoker {
    runner: PathBuf,
    runner_args: Vec<String>,
    executable: PathBuf,
    memory_image: String,
    signature_log: String,
}

impl SimulationInvoker {
    /// Creates an invoker for `executable` using the runner and file names from `config`.
    pub fn new(config: &Config, toolchain: &Toolchain, executable: &SimulatorExecutable) -> Self {
        Self {
            runner: toolchain.runner().to_path_buf(),
            runner_args: config.run.runner_args.clone(),
            executable: executable.path().to_path_buf(),
            memory_image: config.run.memory_image.clone(),
            signature_log: config.run.signature_log.clone(),
        }
    }

    /// Path of the memory image the testbench loads from `work_dir`.
    pub fn memory_image_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.memory_image)
    }

    /// Path of the signature the testbench writes into `work_dir`.
    pub fn signature_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.signature_log)
    }

    /// Simulates `memory_image` from `work_dir`, killing the simulator after `timeout`.
    ///
    /// Timeouts and non-zero exits are outcomes, not errors. Errors are reserved for a
    /// missing memory image or a simulator that cannot be spawned at all.
    pub fn run(
        &self,
        memory_image: &Path,
        work_dir: &Path,
        timeout: Duration,
    ) -> HarnessResult<ExecutionOutcome> {
        if !memory_image.is_file() {
            return Err(HarnessError::Conversion {
                path: memory_image.to_path_buf(),
                reason: "memory image not found".into(),
            });
        }
        let staged = self.memory_image_path(work_dir);
        if staged != memory_image {
            let _ = fs::copy(memory_image, &staged).map_err(|e| HarnessError::io(&staged, e))?;
        }

        let signature = self.signature_path(work_dir);
        match fs::remove_file(&signature) {
            Ok(()) => debug!(path = %signature.display(), "removed stale signature"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(HarnessError::io(&signature, e)),
        }

        let spec = ProcessSpec::new(&self.runner)
            .args(&self.runner_args)
            .arg(&self.executable)
            .cwd(work_dir)
            .timeout(timeout);
        info!(work_dir = %work_dir.display(), "running simulation");

        Ok(match spec.run()? {
            ProcessOutcome::Exited {
                code: Some(0),
                stdout,
                stderr,
            } => ExecutionOutcome::Completed {
                signature,
                stdout,
                stderr,
            },
            ProcessOutcome::Exited {
                code,
                stdout,
                stderr,
            } => ExecutionOutcome::CrashedWithNonZeroExit {
                code,
                stdout,
                stderr,
            },
            ProcessOutcome::TimedOut { stdout, stderr } => ExecutionOutcome::TimedOut {
                timeout,
                stdout,
                stderr,
            },
        })
    }
}
