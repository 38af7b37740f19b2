//! Signature-based regression harness for RTL CPU designs.
//!
//! This crate feeds compiled test programs to a cycle-accurate simulation of the design
//! under test and checks the signature it leaves behind against a golden reference:
//! 1. **Image:** ELF extraction and binary to `$readmemh` memory image conversion.
//! 2. **Simulation:** Toolchain discovery, one-time simulator build, and timed per-test runs.
//! 3. **Signature:** Normalization of byte- and word-granular dumps and exact comparison.
//! 4. **Regression:** Test selection, the plugin interface, the driver, and reporting.

/// Common types and constants (errors, word geometry, artifact names).
pub mod common;
/// Harness configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Program image preparation (ELF extraction, memory image conversion).
pub mod image;
/// Regression orchestration (suite, plugin, driver, report).
pub mod regress;
/// Signature parsing and comparison.
pub mod signature;
/// Simulator build and execution (process, toolchain, build, invoker).
pub mod sim;

/// Error type for every fallible operation; see [`common::error`].
pub use crate::common::{HarnessError, HarnessResult};
/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// Binary to memory image converter.
pub use crate::image::ImageConverter;
/// Generic regression driver.
pub use crate::regress::RegressionOrchestrator;
/// Signature comparator.
pub use crate::signature::SignatureComparator;
/// Per-test simulator invoker.
pub use crate::sim::SimulationInvoker;
