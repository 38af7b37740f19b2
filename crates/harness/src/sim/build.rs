//! One-time simulator compilation.
//!
//! The design sources and testbench are compiled once per regression; the resulting
//! executable is shared read-only by every test. A failed build is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::process::{ProcessOutcome, ProcessSpec};
use super::toolchain::Toolchain;
use crate::common::{HarnessError, HarnessResult};
use crate::config::Config;

/// Compiler invocation that produces the simulator executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorBuild {
    compiler: PathBuf,
    flags: Vec<String>,
    testbench: PathBuf,
    sources: Vec<PathBuf>,
    output: PathBuf,
    cwd: PathBuf,
}

/// Built simulator, ready to be run against any number of memory images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorExecutable {
    path: PathBuf,
}

impl SimulatorExecutable {
    /// Wraps an already-built executable.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the executable.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SimulatorBuild {
    /// Prepares the build described by `config`, collecting design sources from `build.rtl_dir`.
    ///
    /// Sources are sorted so the compiler sees them in a reproducible order.
    pub fn from_config(config: &Config, toolchain: &Toolchain) -> HarnessResult<Self> {
        let rtl_dir = config.resolve(&config.build.rtl_dir);
        let sources = collect_sources(&rtl_dir, &config.build.rtl_extension)?;
        if sources.is_empty() {
            warn!(dir = %rtl_dir.display(), "no design sources found");
        }
        let output = std::path::absolute(config.resolve(&config.build.output))
            .map_err(|e| HarnessError::io(&config.build.output, e))?;

        Ok(Self {
            compiler: toolchain.compiler().to_path_buf(),
            flags: config.build.flags.clone(),
            testbench: config.resolve(&config.build.testbench),
            sources,
            output,
            cwd: config.project.root.clone(),
        })
    }

    /// Replaces the top-level testbench.
    pub fn with_testbench(mut self, testbench: PathBuf) -> Self {
        self.testbench = testbench;
        self
    }

    /// Replaces the output executable path.
    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = output;
        self
    }

    /// Design sources passed to the compiler.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Compiler command: `<compiler> <flags> -o <output> <testbench> <sources...>`.
    pub fn spec(&self) -> ProcessSpec {
        ProcessSpec::new(&self.compiler)
            .args(&self.flags)
            .arg("-o")
            .arg(&self.output)
            .arg(&self.testbench)
            .args(&self.sources)
            .cwd(&self.cwd)
    }

    /// Runs the compiler.
    ///
    /// Returns [`HarnessError::BuildFailure`] if it exits non-zero or leaves no executable behind.
    pub fn run(&self) -> HarnessResult<SimulatorExecutable> {
        let spec = self.spec();
        info!(command = %spec.command_line(), "compiling simulator");

        match spec.run()? {
            ProcessOutcome::Exited {
                code: Some(0),
                stdout,
                ..
            } => {
                if !stdout.trim().is_empty() {
                    debug!(output = %stdout.trim(), "compiler output");
                }
            }
            ProcessOutcome::Exited { code, stdout, stderr } => {
                return Err(HarnessError::BuildFailure {
                    code,
                    stderr: join_streams(&stdout, &stderr),
                });
            }
            ProcessOutcome::TimedOut { stderr, .. } => {
                return Err(HarnessError::BuildFailure { code: None, stderr });
            }
        }

        if !self.output.is_file() {
            return Err(HarnessError::BuildFailure {
                code: Some(0),
                stderr: format!("compiler produced no {}", self.output.display()),
            });
        }
        info!(executable = %self.output.display(), "simulator compiled");
        Ok(SimulatorExecutable::new(self.output.clone()))
    }
}

fn collect_sources(dir: &Path, extension: &str) -> HarnessResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(HarnessError::io(dir, e)),
    };

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| HarnessError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

fn join_streams(stdout: &str, stderr: &str) -> String {
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (true, _) => stderr.to_string(),
        (false, true) => stdout.to_string(),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}
