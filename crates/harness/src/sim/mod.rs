//! Simulator build and execution.
//!
//! Provides the typed process layer and everything built on it: toolchain discovery,
//! the one-time simulator build, and per-test simulator invocation.

/// One-time simulator compilation.
pub mod build;
/// Per-test simulator execution.
pub mod invoker;
/// Typed external process invocation.
pub mod process;
/// External tool discovery.
pub mod toolchain;

pub use build::{SimulatorBuild, SimulatorExecutable};
pub use invoker::{ExecutionOutcome, SimulationInvoker};
pub use process::{ProcessOutcome, ProcessSpec};
pub use toolchain::Toolchain;
