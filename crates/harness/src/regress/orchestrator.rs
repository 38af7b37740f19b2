//! Regression driver.
//!
//! [`RegressionOrchestrator`] sequences a run for any [`DutPlugin`]:
//!
//! ```text
//! Idle -> Building -> Running (per test: Converting -> Simulating -> Comparing) -> Reporting -> Idle
//! ```
//!
//! A failure while building aborts the run. Per-test failures are recorded and the loop
//! continues. Transient artifacts are cleaned up on every exit path once the plugin has
//! been initialized.

use tracing::{debug, error, info, warn};

use super::plugin::DutPlugin;
use super::report::RegressionResult;
use super::suite::TestCase;
use crate::common::HarnessResult;

/// Top-level state of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegressionState {
    /// No run in progress.
    #[default]
    Idle,
    /// Checking tools and compiling the simulator.
    Building,
    /// Iterating over the test list.
    Running,
    /// Aggregating results and cleaning up.
    Reporting,
}

/// Generic regression driver over a design plugin.
#[derive(Debug)]
pub struct RegressionOrchestrator<P: DutPlugin> {
    plugin: P,
    jobs: usize,
    state: RegressionState,
}

impl<P: DutPlugin> RegressionOrchestrator<P> {
    /// Creates a driver that runs up to `jobs` tests concurrently, or fewer if the plugin's
    /// work areas do not allow that many.
    pub fn new(plugin: P, jobs: usize) -> Self {
        Self {
            plugin,
            jobs: jobs.max(1),
            state: RegressionState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> RegressionState {
        self.state
    }

    /// The driven plugin.
    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    /// Consumes the driver, returning the plugin.
    pub fn into_plugin(self) -> P {
        self.plugin
    }

    /// Builds once, runs every test, and aggregates the results.
    ///
    /// Returns an error only for fatal conditions (missing tools, build failure, bad
    /// configuration). Test failures are reported inside the [`RegressionResult`].
    pub fn run(&mut self, tests: &[TestCase]) -> HarnessResult<RegressionResult> {
        self.transition(RegressionState::Building);

        if let Err(e) = self.plugin.initialize() {
            error!(plugin = self.plugin.name(), error = %e, "initialization failed");
            self.transition(RegressionState::Idle);
            return Err(e);
        }
        info!(plugin = self.plugin.name(), "building simulator");
        if let Err(e) = self.plugin.build() {
            error!(plugin = self.plugin.name(), error = %e, "build failed; aborting regression");
            self.cleanup(tests);
            self.transition(RegressionState::Idle);
            return Err(e);
        }

        self.transition(RegressionState::Running);
        let jobs = self.effective_jobs();
        info!(tests = tests.len(), jobs, "starting regression");
        let records = self.plugin.run_tests(tests, jobs);

        self.transition(RegressionState::Reporting);
        self.cleanup(tests);
        let result = RegressionResult::new(records);
        info!(
            total = result.total(),
            passed = result.passed(),
            failed = result.failed(),
            skipped = result.skipped(),
            "regression finished"
        );

        self.transition(RegressionState::Idle);
        Ok(result)
    }

    /// Requested concurrency capped by what the plugin allows.
    pub fn effective_jobs(&self) -> usize {
        let allowed = self.plugin.max_jobs().max(1);
        if self.jobs > allowed {
            warn!(
                plugin = self.plugin.name(),
                requested = self.jobs,
                allowed,
                "work areas are shared; limiting concurrency"
            );
        }
        self.jobs.min(allowed)
    }

    fn cleanup(&self, tests: &[TestCase]) {
        if let Err(e) = self.plugin.cleanup(tests) {
            warn!(error = %e, "transient artifacts could not be removed");
        }
    }

    fn transition(&mut self, next: RegressionState) {
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }
}
