//! Harness error taxonomy.
//!
//! Every failure the regression pipeline can observe is a variant of [`HarnessError`]. The
//! variants fall into two groups:
//! 1. **Fatal:** missing tools, simulator build failures and bad configuration abort the whole run.
//! 2. **Per-test:** conversion, simulation, and comparison failures are recorded against one
//!    test case and the regression moves on.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors produced by the conversion, simulation, and comparison pipeline.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A required external executable could not be resolved on `PATH`.
    #[error("required tool `{tool}` not found; check the environment setup")]
    ToolNotFound {
        /// Name or path of the missing tool.
        tool: String,
    },

    /// The simulator executable could not be compiled from the design sources.
    #[error("simulator build failed (exit code {code:?})\n{stderr}")]
    BuildFailure {
        /// Compiler exit code, `None` if it was terminated.
        code: Option<i32>,
        /// Captured compiler diagnostics.
        stderr: String,
    },

    /// A binary image could not be read, extracted, or written as a memory image.
    #[error("image conversion failed for {}: {reason}", path.display())]
    Conversion {
        /// File that could not be processed.
        path: PathBuf,
        /// Human-readable cause.
        reason: String,
    },

    /// The simulator exceeded its time budget and was killed.
    #[error("simulation timed out after {}s", timeout.as_secs_f64())]
    TimedOut {
        /// Budget that was exceeded.
        timeout: Duration,
        /// Output captured before the process was killed.
        stdout: String,
        /// Diagnostics captured before the process was killed.
        stderr: String,
    },

    /// The simulator exited with a non-zero status.
    #[error("simulation exited with a non-zero status ({code:?})\n{stderr}")]
    CrashedWithNonZeroExit {
        /// Exit code, `None` if terminated by a signal.
        code: Option<i32>,
        /// Captured diagnostics.
        stderr: String,
    },

    /// The simulator reported success but no signature was written.
    #[error("{} not generated; simulation likely failed to complete", path.display())]
    MissingArtifact {
        /// Expected signature location.
        path: PathBuf,
    },

    /// Generated and reference signatures differ.
    #[error("signature mismatch ({} generated words vs {} reference words)", generated.len(), reference.len())]
    SignatureMismatch {
        /// Words produced by the simulation.
        generated: Vec<String>,
        /// Golden words.
        reference: Vec<String>,
    },

    /// No golden signature exists for the test.
    #[error("reference signature not found: {}", path.display())]
    MissingReference {
        /// Expected golden file location.
        path: PathBuf,
    },

    /// A signature token does not match the declared granularity.
    #[error("malformed signature {}: token `{token}` at position {index} is not a {expected}", path.display())]
    MalformedSignature {
        /// Offending file.
        path: PathBuf,
        /// Zero-based token index.
        index: usize,
        /// The raw token.
        token: String,
        /// What the declared format expected.
        expected: &'static str,
    },

    /// The configuration could not be loaded or is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    /// Wraps an [`io::Error`] together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this error must abort the whole regression.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound { .. } | Self::BuildFailure { .. } | Self::Config(_)
        )
    }

    /// Short category label used in logs and report lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolNotFound { .. } => "ToolNotFound",
            Self::BuildFailure { .. } => "BuildFailure",
            Self::Conversion { .. } => "ConversionError",
            Self::TimedOut { .. } => "TimedOut",
            Self::CrashedWithNonZeroExit { .. } => "CrashedWithNonZeroExit",
            Self::MissingArtifact { .. } => "MissingArtifact",
            Self::SignatureMismatch { .. } => "SignatureMismatch",
            Self::MissingReference { .. } => "MissingReference",
            Self::MalformedSignature { .. } => "MalformedSignature",
            Self::Config(_) => "Config",
            Self::Io { .. } => "Io",
        }
    }
}
