//! Regression orchestration.
//!
//! This module ties the pipeline together:
//! 1. **Suite:** Test case selection and per-test work areas.
//! 2. **Plugin:** The [`DutPlugin`] capability interface and the Icarus Verilog implementation.
//! 3. **Orchestrator:** The generic build-once, run-all driver and its state machine.
//! 4. **Report:** Per-test outcomes, aggregation, and the summary banner.

/// Generic regression driver.
pub mod orchestrator;
/// Design-under-test capability interface.
pub mod plugin;
/// Outcomes and reporting.
pub mod report;
/// Test cases and work areas.
pub mod suite;

pub use orchestrator::{RegressionOrchestrator, RegressionState};
pub use plugin::{DutPlugin, IverilogPlugin};
pub use report::{RegressionResult, TestOutcome, TestPhase, TestRecord};
pub use suite::{TestCase, WorkArea, discover_tests, select_tests};
