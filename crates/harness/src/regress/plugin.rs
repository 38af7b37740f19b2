//! Design-under-test capability interface.
//!
//! The orchestrator drives any design through [`DutPlugin`]: initialize once, build once,
//! then run the test list. [`IverilogPlugin`] is the concrete implementation for a Verilog
//! core compiled with `iverilog` and simulated with `vvp`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::report::{TestOutcome, TestPhase, TestRecord};
use super::suite::{TestCase, WorkArea};
use crate::common::{HarnessError, HarnessResult};
use crate::config::{Config, WorkLayout};
use crate::image::{ElfExtractor, ImageConverter, elf};
use crate::signature::{ComparisonResult, SignatureComparator};
use crate::sim::{ExecutionOutcome, SimulationInvoker, SimulatorBuild, Toolchain};

/// Lifecycle hooks a design integration provides to the regression driver.
///
/// Implementors must be `Sync`: `run_tests` may call `run_test` from several worker threads.
pub trait DutPlugin: Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Checks the environment (tools, directories). Fatal on error.
    fn initialize(&mut self) -> HarnessResult<()>;

    /// Builds the simulator. Fatal on error.
    fn build(&mut self) -> HarnessResult<()>;

    /// Runs one test through conversion, simulation, and comparison.
    ///
    /// Never fails: every problem is captured in the returned record.
    fn run_test(&self, test: &TestCase) -> TestRecord;

    /// Removes every transient artifact the given tests may have left behind.
    fn cleanup(&self, tests: &[TestCase]) -> HarnessResult<()>;

    /// Most tests that may run at once without sharing a mutable artifact.
    fn max_jobs(&self) -> usize {
        usize::MAX
    }

    /// Runs all tests, up to `jobs` at a time, returning records in input order.
    ///
    /// `jobs` is capped by [`DutPlugin::max_jobs`].
    fn run_tests(&self, tests: &[TestCase], jobs: usize) -> Vec<TestRecord> {
        let jobs = jobs.min(self.max_jobs());
        if jobs <= 1 || tests.len() <= 1 {
            return tests.iter().map(|test| self.run_test(test)).collect();
        }

        let next = AtomicUsize::new(0);
        let finished = Mutex::new(Vec::with_capacity(tests.len()));
        thread::scope(|scope| {
            for _ in 0..jobs.min(tests.len()) {
                let _ = scope.spawn(|| {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(test) = tests.get(index) else {
                            break;
                        };
                        let record = self.run_test(test);
                        finished
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner)
                            .push((index, record));
                    }
                });
            }
        });

        let mut finished = finished
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        finished.sort_by_key(|(index, _)| *index);
        finished.into_iter().map(|(_, record)| record).collect()
    }
}

/// Verilog core simulated with Icarus Verilog.
#[derive(Debug)]
pub struct IverilogPlugin {
    config: Config,
    converter: ImageConverter,
    comparator: SignatureComparator,
    toolchain: Option<Toolchain>,
    invoker: Option<SimulationInvoker>,
}

impl IverilogPlugin {
    /// Creates a plugin for `config`. Nothing touches the filesystem until [`DutPlugin::initialize`].
    pub fn new(config: Config) -> Self {
        Self {
            converter: ImageConverter::from_config(&config.image),
            comparator: SignatureComparator::from_config(&config),
            config,
            toolchain: None,
            invoker: None,
        }
    }

    /// Configuration in effect.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolved toolchain, once initialized.
    pub fn toolchain(&self) -> Option<&Toolchain> {
        self.toolchain.as_ref()
    }

    fn require_toolchain(&self) -> HarnessResult<&Toolchain> {
        self.toolchain
            .as_ref()
            .ok_or_else(|| HarnessError::Config("plugin used before initialize".into()))
    }

    /// Converts `test` into a memory image inside `area` and simulates it.
    pub fn simulate(
        &self,
        test: &TestCase,
        area: &WorkArea,
    ) -> Result<ExecutionOutcome, (TestPhase, HarnessError)> {
        let invoker = self.invoker.as_ref().ok_or_else(|| {
            (
                TestPhase::Simulating,
                HarnessError::BuildFailure {
                    code: None,
                    stderr: "simulator has not been built".into(),
                },
            )
        })?;
        area.prepare().map_err(|e| (TestPhase::Converting, e))?;

        let binary = if elf::is_elf(test.binary()) {
            let objcopy = self.toolchain.as_ref().and_then(Toolchain::objcopy);
            ElfExtractor::new(objcopy)
                .extract(test.binary(), area.extracted(), self.config.timeout())
                .map_err(|e| (TestPhase::Extracting, e))?;
            area.extracted().to_path_buf()
        } else {
            test.binary().to_path_buf()
        };

        debug!(test = test.name(), phase = ?TestPhase::Converting, "entering phase");
        let _ = self
            .converter
            .convert_file(&binary, area.memory_image())
            .map_err(|e| (TestPhase::Converting, e))?;

        debug!(test = test.name(), phase = ?TestPhase::Simulating, "entering phase");
        invoker
            .run(area.memory_image(), area.dir(), self.config.timeout())
            .map_err(|e| (TestPhase::Simulating, e))
    }

    fn execute(
        &self,
        test: &TestCase,
        log: &mut String,
    ) -> Result<usize, (TestPhase, HarnessError)> {
        let area = WorkArea::for_test(&self.config, test);
        let outcome = self.simulate(test, &area)?;
        log.push_str(outcome.stdout());
        let signature = outcome
            .into_result()
            .map_err(|e| (TestPhase::Simulating, e))?;

        debug!(test = test.name(), phase = ?TestPhase::Comparing, "entering phase");
        self.comparator
            .compare(test.reference(), &signature)
            .and_then(ComparisonResult::into_result)
            .map_err(|e| (TestPhase::Comparing, e))
    }
}

impl DutPlugin for IverilogPlugin {
    fn name(&self) -> &'static str {
        "iverilog"
    }

    fn max_jobs(&self) -> usize {
        match self.config.workspace.layout {
            WorkLayout::Shared => 1,
            WorkLayout::PerTest => usize::MAX,
        }
    }

    fn initialize(&mut self) -> HarnessResult<()> {
        self.config.absolutize_root()?;
        self.config.validate()?;
        let toolchain = Toolchain::discover(&self.config)?;
        let work_dir = self.config.work_dir();
        std::fs::create_dir_all(&work_dir).map_err(|e| HarnessError::io(&work_dir, e))?;
        self.toolchain = Some(toolchain);
        Ok(())
    }

    fn build(&mut self) -> HarnessResult<()> {
        let toolchain = self.require_toolchain()?;
        let executable = SimulatorBuild::from_config(&self.config, toolchain)?.run()?;
        let invoker = SimulationInvoker::new(&self.config, toolchain, &executable);
        self.invoker = Some(invoker);
        Ok(())
    }

    fn run_test(&self, test: &TestCase) -> TestRecord {
        let started = Instant::now();
        let mut log = String::new();

        let outcome = match self.execute(test, &mut log) {
            Ok(words) => {
                info!(test = test.name(), words, "PASS");
                TestOutcome::Passed { words }
            }
            Err((_, reason @ HarnessError::MissingReference { .. })) => {
                warn!(test = test.name(), %reason, "skipped");
                TestOutcome::Skipped { reason }
            }
            Err((phase, error)) => {
                warn!(test = test.name(), ?phase, kind = error.kind(), "FAIL");
                TestOutcome::Failed { phase, error }
            }
        };

        TestRecord {
            name: test.name().to_string(),
            outcome,
            duration: started.elapsed(),
            log,
        }
    }

    fn cleanup(&self, tests: &[TestCase]) -> HarnessResult<()> {
        let mut areas: Vec<WorkArea> = tests
            .iter()
            .map(|test| WorkArea::for_test(&self.config, test))
            .collect();
        areas.dedup();
        let shared = WorkArea::new(&self.config, self.config.work_dir(), false);
        if !areas.contains(&shared) {
            areas.push(shared);
        }

        let mut first_error = None;
        for area in &areas {
            if let Err(e) = area.cleanup() {
                warn!(dir = %area.dir().display(), error = %e, "cleanup failed");
                let _ = first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
