//! RTL regression harness CLI.
//!
//! This binary provides a single entry point for the verification flow. It performs:
//! 1. **Convert:** Turn a raw binary image into a `$readmemh` memory image.
//! 2. **Regress:** Build the simulator once, run every test, compare signatures, and summarize.
//! 3. **Simulate:** Build and run one test without comparison, keeping its artifacts.
//! 4. **Smoke:** Build a minimal testbench and check that the simulator neither crashes nor hangs.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use rtlcheck_core::common::constants::MAX_WORD_SIZE;
use rtlcheck_core::config::{ByteOrder, Config, WorkLayout};
use rtlcheck_core::image::ImageConverter;
use rtlcheck_core::regress::{
    DutPlugin, IverilogPlugin, RegressionOrchestrator, TestCase, WorkArea, discover_tests,
    select_tests,
};
use rtlcheck_core::sim::{
    ExecutionOutcome, ProcessOutcome, ProcessSpec, SimulatorBuild, Toolchain,
};
use rtlcheck_core::{HarnessError, HarnessResult};

#[derive(Parser, Debug)]
#[command(
    name = "rtlcheck",
    author,
    version,
    about = "Signature-based regression harness for RTL CPU designs",
    long_about = "Convert test binaries to memory images, simulate them against the design under test, and compare the resulting signatures with golden references.\n\nExamples:\n  rtlcheck convert test/isa/generated/rv32ui-p-add.bin inst.mem\n  rtlcheck regress\n  rtlcheck regress --all --jobs 8 --per-test-dirs\n  rtlcheck smoke --testbench sim/tb_minimal.v"
)]
struct Cli {
    /// Log debug events (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a raw binary image into a word-per-line hex memory image.
    Convert {
        /// Raw binary program image.
        input: PathBuf,

        /// Memory image to write.
        output: PathBuf,

        /// Bytes per word (1 to 16).
        #[arg(long, default_value_t = rtlcheck_core::common::WORD_SIZE)]
        word_size: usize,

        /// Keep bytes in storage order instead of reversing them (big-endian targets).
        #[arg(long)]
        big_endian: bool,
    },

    /// Build the simulator once and run the regression over the given programs.
    Regress {
        #[command(flatten)]
        project: ProjectArgs,

        /// Test programs (.bin or .elf). Defaults to the configured default suite.
        tests: Vec<PathBuf>,

        /// Run every program found in the configured test directory.
        #[arg(long, conflicts_with = "tests")]
        all: bool,
    },

    /// Build the simulator and run a single program without signature comparison.
    Simulate {
        #[command(flatten)]
        project: ProjectArgs,

        /// Test program (.bin or .elf).
        test: PathBuf,
    },

    /// Compile a testbench and check that the simulation completes without crashing.
    Smoke {
        #[command(flatten)]
        project: ProjectArgs,

        /// Testbench to compile instead of the configured one.
        #[arg(long)]
        testbench: Option<PathBuf>,
    },
}

/// Options shared by every command that touches the project.
#[derive(Args, Debug)]
struct ProjectArgs {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root (overrides the configuration).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Directory for transient artifacts.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Simulation timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Number of tests simulated concurrently (implies --per-test-dirs when > 1).
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Give every test its own work directory.
    #[arg(long)]
    per_test_dirs: bool,
}

impl ProjectArgs {
    /// Loads the configuration file (or defaults) and applies command-line overrides.
    fn load(&self) -> HarnessResult<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        if let Some(root) = &self.root {
            config.project.root.clone_from(root);
        }
        if let Some(dir) = &self.work_dir {
            config.workspace.work_dir = Some(dir.clone());
        }
        if let Some(timeout) = self.timeout {
            config.run.timeout_secs = timeout;
        }
        if let Some(jobs) = self.jobs {
            config.workspace.jobs = jobs;
            if jobs > 1 {
                config.workspace.layout = WorkLayout::PerTest;
            }
        }
        if self.per_test_dirs {
            config.workspace.layout = WorkLayout::PerTest;
        }
        config.validate()?;
        config.absolutize_root()?;
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Convert {
            input,
            output,
            word_size,
            big_endian,
        } => cmd_convert(&input, &output, word_size, big_endian),
        Commands::Regress {
            project,
            tests,
            all,
        } => report_fatal(cmd_regress(&project, &tests, all)),
        Commands::Simulate { project, test } => report_fatal(cmd_simulate(&project, &test)),
        Commands::Smoke { project, testbench } => report_fatal(cmd_smoke(&project, testbench)),
    };
    process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Maps a fatal harness error to exit code 1 after logging it.
fn report_fatal(result: HarnessResult<i32>) -> i32 {
    result.unwrap_or_else(|e| {
        error!("{e}");
        eprintln!("\n[!] FATAL: {e}");
        1
    })
}

/// Converts `input` to `output`. Exit code 0 on success, 1 on missing input or I/O failure.
fn cmd_convert(input: &Path, output: &Path, word_size: usize, big_endian: bool) -> i32 {
    if !(1..=MAX_WORD_SIZE).contains(&word_size) {
        eprintln!("Error: --word-size must be between 1 and {MAX_WORD_SIZE}, got {word_size}");
        return 1;
    }
    if !input.is_file() {
        eprintln!("Error: Input file not found: {}", input.display());
        return 1;
    }
    let byte_order = if big_endian {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    };
    match ImageConverter::new(word_size, byte_order).convert_file(input, output) {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("Error during file conversion: {e}");
            1
        }
    }
}

/// Runs the regression. Exit code 0 iff no test failed.
fn cmd_regress(project: &ProjectArgs, tests: &[PathBuf], all: bool) -> HarnessResult<i32> {
    let config = project.load()?;
    let cases = if all {
        discover_tests(&config)?
    } else {
        select_tests(&config, tests)
    };
    if cases.is_empty() {
        eprintln!("No test programs found. Check the test directory and patterns.");
        return Ok(1);
    }

    println!("=================================================");
    println!("STARTING REGRESSION ({} tests)", cases.len());
    println!("=================================================");

    let jobs = config.workspace.jobs;
    let mut orchestrator = RegressionOrchestrator::new(IverilogPlugin::new(config), jobs);
    let result = orchestrator.run(&cases)?;
    result.print_report();
    Ok(if result.success() { 0 } else { 1 })
}

/// Builds and runs one program, leaving its memory image and signature in place.
fn cmd_simulate(project: &ProjectArgs, test: &Path) -> HarnessResult<i32> {
    let config = project.load()?;
    let case = TestCase::from_binary(test, &config);
    let area = WorkArea::for_test(&config, &case);

    let mut plugin = IverilogPlugin::new(config);
    plugin.initialize()?;
    plugin.build()?;

    println!("--- Running simulation for {} ---", case.name());
    let outcome = match plugin.simulate(&case, &area) {
        Ok(outcome) => outcome,
        Err((phase, e)) => {
            eprintln!("!!! FAIL: {} during {phase:?}: {e}", e.kind());
            return Ok(1);
        }
    };
    print!("{}", outcome.stdout());
    Ok(match outcome {
        ExecutionOutcome::Completed { signature, .. } => {
            println!("--- Simulation Finished ---");
            println!("signature: {}", signature.display());
            0
        }
        other => {
            if let Err(e) = other.into_result() {
                eprintln!("!!! FAIL: {e}");
            }
            1
        }
    })
}

/// Compiles a testbench and runs it once under the configured timeout.
fn cmd_smoke(project: &ProjectArgs, testbench: Option<PathBuf>) -> HarnessResult<i32> {
    let config = project.load()?;
    let toolchain = Toolchain::discover(&config)?;

    let mut build = SimulatorBuild::from_config(&config, &toolchain)?;
    if let Some(tb) = testbench {
        let stem = tb
            .file_stem()
            .map_or_else(|| "smoke".to_string(), |s| s.to_string_lossy().into_owned());
        build = build
            .with_output(config.resolve(format!("{stem}.vvp")))
            .with_testbench(config.resolve(tb));
    }

    println!("--- Compiling testbench ---");
    let executable = build.run()?;
    println!("Compilation successful.");

    println!("\n--- Running smoke simulation ---");
    let outcome = ProcessSpec::new(toolchain.runner())
        .args(&config.run.runner_args)
        .arg(executable.path())
        .cwd(&config.project.root)
        .timeout(config.timeout())
        .run()?;

    println!("--- Simulation Output ---\n{}", outcome.stdout());
    if !outcome.stderr().trim().is_empty() {
        println!("--- Simulation Errors ---\n{}", outcome.stderr());
    }
    if outcome.success() {
        println!("\n---> SUCCESS: Simulation ran without crashing.");
        Ok(0)
    } else {
        let e = match outcome {
            ProcessOutcome::TimedOut { stdout, stderr } => HarnessError::TimedOut {
                timeout: config.timeout(),
                stdout,
                stderr,
            },
            ProcessOutcome::Exited { code, stderr, .. } => {
                HarnessError::CrashedWithNonZeroExit { code, stderr }
            }
        };
        println!("!!! FAIL: {e}");
        Ok(1)
    }
}
