//! External tool discovery.
//!
//! Resolves the compiler and simulator runtime before anything runs, so a missing tool is
//! reported once as [`HarnessError::ToolNotFound`] instead of surfacing as a spawn failure
//! halfway through a regression.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::common::{HarnessError, HarnessResult};
use crate::config::Config;

/// Resolved paths of the external collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    compiler: PathBuf,
    runner: PathBuf,
    objcopy: Option<PathBuf>,
}

impl Toolchain {
    /// Resolves every tool named in `config`.
    ///
    /// The compiler and runner are mandatory. objcopy is optional; without it ELF test
    /// programs are extracted in-process.
    pub fn discover(config: &Config) -> HarnessResult<Self> {
        let compiler = locate(&config.build.compiler)?;
        let runner = locate(&config.run.runner)?;
        let objcopy = match locate(&config.suite.objcopy) {
            Ok(path) => Some(path),
            Err(_) => {
                warn!(
                    tool = %config.suite.objcopy,
                    "objcopy not found; ELF inputs will be extracted natively"
                );
                None
            }
        };
        debug!(compiler = %compiler.display(), runner = %runner.display(), "toolchain resolved");
        Ok(Self {
            compiler,
            runner,
            objcopy,
        })
    }

    /// Builds a toolchain from already-resolved paths.
    pub fn from_paths(compiler: PathBuf, runner: PathBuf, objcopy: Option<PathBuf>) -> Self {
        Self {
            compiler,
            runner,
            objcopy,
        }
    }

    /// Compiler that builds the simulator.
    pub fn compiler(&self) -> &Path {
        &self.compiler
    }

    /// Runtime that executes the compiled simulator.
    pub fn runner(&self) -> &Path {
        &self.runner
    }

    /// ELF to raw binary tool, if available.
    pub fn objcopy(&self) -> Option<&Path> {
        self.objcopy.as_deref()
    }
}

/// Resolves `tool` through `PATH` (or checks it directly when it contains a separator).
pub fn locate(tool: &str) -> HarnessResult<PathBuf> {
    which::which(tool).map_err(|_| HarnessError::ToolNotFound {
        tool: tool.to_string(),
    })
}
