//! Regression outcomes and reporting.
//!
//! Results are derived fresh on every run and never persisted. This module provides:
//! 1. **Records:** One [`TestRecord`] per test with its outcome, duration, and simulator log.
//! 2. **Aggregation:** [`RegressionResult`] counts passes, failures, and skips.
//! 3. **Rendering:** Per-test verdict lines, mismatch dumps, and the summary banner.

use std::fmt::Write as _;
use std::time::Duration;

use crate::common::HarnessError;

const RULE: &str = "=================================================";
const THIN_RULE: &str = "-------------------------------------------------";

/// Stage of the per-test pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    /// Flattening an ELF program to a raw image.
    Extracting,
    /// Packing the raw image into a memory image.
    Converting,
    /// Running the simulator.
    Simulating,
    /// Checking the signature.
    Comparing,
}

/// Verdict for one test.
#[derive(Debug)]
pub enum TestOutcome {
    /// The signature matched the golden reference.
    Passed {
        /// Words compared.
        words: usize,
    },
    /// Some stage failed.
    Failed {
        /// Stage that failed.
        phase: TestPhase,
        /// Cause.
        error: HarnessError,
    },
    /// The test could not be judged (no golden reference).
    Skipped {
        /// Cause.
        reason: HarnessError,
    },
}

/// Outcome of one test together with its diagnostics.
#[derive(Debug)]
pub struct TestRecord {
    /// Test name.
    pub name: String,
    /// Verdict.
    pub outcome: TestOutcome,
    /// Wall-clock time spent on the test.
    pub duration: Duration,
    /// Simulator console output, if any was captured.
    pub log: String,
}

impl TestRecord {
    /// Returns `true` if the test passed.
    pub fn passed(&self) -> bool {
        matches!(self.outcome, TestOutcome::Passed { .. })
    }

    /// Returns `true` if the test failed.
    pub fn failed(&self) -> bool {
        matches!(self.outcome, TestOutcome::Failed { .. })
    }

    /// Returns `true` if the test was skipped.
    pub fn skipped(&self) -> bool {
        matches!(self.outcome, TestOutcome::Skipped { .. })
    }

    /// Renders the verdict block printed for this test.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n--- Running Test: {} ---", self.name);
        match &self.outcome {
            TestOutcome::Passed { .. } => {
                let _ = writeln!(out, "---> PASS: Signature matches for {}", self.name);
            }
            TestOutcome::Skipped { reason } => {
                let _ = writeln!(out, "!!! WARNING: {reason}. Cannot verify result.");
            }
            TestOutcome::Failed { phase, error } => {
                let _ = writeln!(
                    out,
                    "!!! FAIL: {} during {phase:?} for {} !!!",
                    error.kind(),
                    self.name
                );
                match error {
                    HarnessError::SignatureMismatch {
                        generated,
                        reference,
                    } => out.push_str(&render_mismatch(generated, reference)),
                    HarnessError::TimedOut { stdout, stderr, .. } => {
                        out.push_str(&render_streams(stdout, stderr));
                    }
                    HarnessError::CrashedWithNonZeroExit { stderr, .. } => {
                        out.push_str(&render_streams(&self.log, stderr));
                    }
                    HarnessError::MissingArtifact { .. } => {
                        let _ = writeln!(out, "{error}");
                        out.push_str(&render_streams(&self.log, ""));
                    }
                    other => {
                        let _ = writeln!(out, "{other}");
                    }
                }
            }
        }
        out
    }
}

/// Dumps both sequences followed by an index-aligned side-by-side view.
pub fn render_mismatch(generated: &[String], reference: &[String]) -> String {
    let mut out = String::new();
    out.push_str("--- Generated Signature ---\n");
    for word in generated {
        let _ = writeln!(out, "{word}");
    }
    out.push_str("--- Reference Signature ---\n");
    for word in reference {
        let _ = writeln!(out, "{word}");
    }
    out.push_str("--- Side by Side (index  generated  reference) ---\n");
    let rows = generated.len().max(reference.len());
    for i in 0..rows {
        let g = generated.get(i).map_or("--------", String::as_str);
        let r = reference.get(i).map_or("--------", String::as_str);
        let marker = if g == r { "" } else { "  <<" };
        let _ = writeln!(out, "{i:>6}  {g:>10}  {r:>10}{marker}");
    }
    out.push_str("---------------------------\n");
    out
}

fn render_streams(stdout: &str, stderr: &str) -> String {
    let mut out = String::new();
    if !stdout.trim().is_empty() {
        let _ = writeln!(out, "--- Simulation STDOUT ---\n{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        let _ = writeln!(out, "--- Simulation STDERR ---\n{}", stderr.trim_end());
    }
    out
}

/// Aggregated outcome of a regression run.
#[derive(Debug, Default)]
pub struct RegressionResult {
    records: Vec<TestRecord>,
}

impl RegressionResult {
    /// Wraps per-test records, kept in the order given.
    pub fn new(records: Vec<TestRecord>) -> Self {
        Self { records }
    }

    /// Per-test records.
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Number of tests attempted.
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Number of passing tests.
    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.passed()).count()
    }

    /// Number of failing tests.
    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.failed()).count()
    }

    /// Number of tests without a golden reference.
    pub fn skipped(&self) -> usize {
        self.records.iter().filter(|r| r.skipped()).count()
    }

    /// A run succeeds when nothing failed. Skips do not fail a run.
    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    /// Renders the summary banner.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n{RULE}\nREGRESSION SUMMARY\n{RULE}");
        let _ = writeln!(out, "TOTAL TESTS: {}", self.total());
        let _ = writeln!(out, "PASSED: {}", self.passed());
        let _ = writeln!(out, "FAILED: {}", self.failed());
        let _ = writeln!(out, "SKIPPED: {}", self.skipped());
        let _ = writeln!(out, "{THIN_RULE}");
        let status = if self.success() { "PASS" } else { "FAIL" };
        let _ = writeln!(out, "OVERALL STATUS: {status}");
        out
    }

    /// Prints every test verdict followed by the summary.
    pub fn print_report(&self) {
        for record in &self.records {
            print!("{}", record.render());
        }
        print!("{}", self.render_summary());
    }
}
