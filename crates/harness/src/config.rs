//! Configuration for the regression harness.
//!
//! This module defines all configuration structures and enums used to parameterize
//! a regression run. It provides:
//! 1. **Defaults:** The conventional project layout (RTL in `rtl/`, testbench in `sim/`,
//!    binaries in `test/isa/generated`, golden dumps in `test/isa/hex`).
//! 2. **Structures:** Hierarchical config for project, build, run, image, suite, and workspace.
//! 3. **Enums:** Byte order, signature granularity, and work-area layout.
//!
//! Configuration is supplied as JSON (see [`Config::from_json_file`]) or use `Config::default()`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::common::constants::MAX_WORD_SIZE;
use crate::common::{HarnessError, HarnessResult};

/// Default configuration constants for the harness.
mod defaults {
    /// Verilog compiler producing the simulator executable.
    pub const COMPILER: &str = "iverilog";

    /// Language standard flag passed to the compiler.
    pub const COMPILER_FLAG: &str = "-g2012";

    /// Top-level testbench, relative to the project root.
    pub const TESTBENCH: &str = "sim/tb_riscv_core_new.v";

    /// Directory holding the design sources.
    pub const RTL_DIR: &str = "rtl";

    /// Extension of design source files.
    pub const RTL_EXTENSION: &str = "v";

    /// Compiled simulator executable.
    pub const SIM_OUTPUT: &str = "tb_riscv_core_new.vvp";

    /// Runtime that executes the compiled simulator.
    pub const RUNNER: &str = "vvp";

    /// Hard wall-clock limit for one simulation, in seconds.
    pub const TIMEOUT_SECS: u64 = 30;

    /// Memory image the testbench loads with `$readmemh`.
    pub const MEMORY_IMAGE: &str = "inst.mem";

    /// Signature the testbench writes on completion.
    pub const SIGNATURE_LOG: &str = "signature.log";

    /// Directory of compiled test binaries.
    pub const TEST_DIR: &str = "test/isa/generated";

    /// Directory of golden signatures.
    pub const REFERENCE_DIR: &str = "test/isa/hex";

    /// Extension of golden signature files.
    pub const REFERENCE_EXTENSION: &str = "hex";

    /// Test run when no binaries are named on the command line.
    pub const DEFAULT_TEST: &str = "rv32ui-p-add.bin";

    /// ELF to raw binary extraction tool.
    pub const OBJCOPY: &str = "riscv32-unknown-elf-objcopy";

    /// Worker count.
    pub const JOBS: usize = 1;
}

/// Order in which bytes of one word are stored in the binary image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ByteOrder {
    /// Least significant byte first; bytes are reversed when rendered (RISC-V).
    #[default]
    #[serde(alias = "little", alias = "LE")]
    Little,
    /// Most significant byte first; bytes are rendered as stored.
    #[serde(alias = "big", alias = "BE")]
    Big,
}

/// Granularity of the tokens in a signature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SignatureFormat {
    /// One byte per token; tokens are regrouped into words with the byte order applied.
    #[default]
    #[serde(alias = "bytes")]
    Bytes,
    /// One full word per token, already in canonical order.
    #[serde(alias = "words")]
    Words,
}

/// Placement of transient per-test artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum WorkLayout {
    /// Every test reuses the same work directory. Only valid for sequential runs.
    #[default]
    #[serde(alias = "shared")]
    Shared,
    /// Every test gets `work_dir/<test-name>/`.
    #[serde(alias = "per_test", alias = "PerTestDirs")]
    PerTest,
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use rtlcheck_core::config::{Config, WorkLayout};
///
/// let json = r#"{
///     "project": { "root": "/work/core" },
///     "run": { "timeout_secs": 5 },
///     "workspace": { "layout": "PerTest", "jobs": 4 }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.run.timeout_secs, 5);
/// assert_eq!(config.run.memory_image, "inst.mem");
/// assert_eq!(config.workspace.layout, WorkLayout::PerTest);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Project root
    #[serde(default)]
    pub project: ProjectConfig,
    /// Simulator compilation
    #[serde(default)]
    pub build: BuildConfig,
    /// Simulator execution
    #[serde(default)]
    pub run: RunConfig,
    /// Binary to memory image conversion
    #[serde(default)]
    pub image: ImageConfig,
    /// Test discovery and golden references
    #[serde(default)]
    pub suite: SuiteConfig,
    /// Work-area placement and parallelism
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Parses a configuration from a JSON string and validates it.
    pub fn from_json_str(json: &str) -> HarnessResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| HarnessError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// A relative `project.root` is resolved against the directory containing the file.
    pub fn from_json_file(path: &Path) -> HarnessResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let mut config = Self::from_json_str(&text)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))?;
        if config.project.root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.project.root = base.join(&config.project.root);
        }
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.image.word_size == 0 || self.image.word_size > MAX_WORD_SIZE {
            return Err(HarnessError::Config(format!(
                "image.word_size must be in 1..={MAX_WORD_SIZE}, got {}",
                self.image.word_size
            )));
        }
        if self.run.timeout_secs == 0 {
            return Err(HarnessError::Config(
                "run.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.workspace.jobs == 0 {
            return Err(HarnessError::Config(
                "workspace.jobs must be at least 1".into(),
            ));
        }
        if self.workspace.jobs > 1 && self.workspace.layout == WorkLayout::Shared {
            return Err(HarnessError::Config(
                "parallel jobs require workspace.layout = \"PerTest\"".into(),
            ));
        }
        Ok(())
    }

    /// Makes `project.root` absolute so paths stay valid when processes change directory.
    pub fn absolutize_root(&mut self) -> HarnessResult<()> {
        self.project.root = std::path::absolute(&self.project.root)
            .map_err(|e| HarnessError::io(&self.project.root, e))?;
        Ok(())
    }

    /// Resolves `path` against the project root unless it is already absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project.root.join(path)
        }
    }

    /// Directory that holds transient artifacts (or per-test subdirectories).
    pub fn work_dir(&self) -> PathBuf {
        match &self.workspace.work_dir {
            Some(dir) => self.resolve(dir),
            None => self.project.root.clone(),
        }
    }

    /// Simulation time budget.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.run.timeout_secs)
    }
}

/// Location of the design project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Directory all relative paths are resolved against
    #[serde(default = "ProjectConfig::default_root")]
    pub root: PathBuf,
}

impl ProjectConfig {
    fn default_root() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
        }
    }
}

/// One-time compilation of the design and testbench into a simulator executable.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Compiler executable
    #[serde(default = "BuildConfig::default_compiler")]
    pub compiler: String,

    /// Flags placed before `-o`
    #[serde(default = "BuildConfig::default_flags")]
    pub flags: Vec<String>,

    /// Top-level testbench source
    #[serde(default = "BuildConfig::default_testbench")]
    pub testbench: PathBuf,

    /// Directory scanned for design sources
    #[serde(default = "BuildConfig::default_rtl_dir")]
    pub rtl_dir: PathBuf,

    /// Extension of design sources (without the dot)
    #[serde(default = "BuildConfig::default_rtl_extension")]
    pub rtl_extension: String,

    /// Compiled simulator executable
    #[serde(default = "BuildConfig::default_output")]
    pub output: PathBuf,
}

impl BuildConfig {
    fn default_compiler() -> String {
        defaults::COMPILER.into()
    }

    fn default_flags() -> Vec<String> {
        vec![defaults::COMPILER_FLAG.into()]
    }

    fn default_testbench() -> PathBuf {
        PathBuf::from(defaults::TESTBENCH)
    }

    fn default_rtl_dir() -> PathBuf {
        PathBuf::from(defaults::RTL_DIR)
    }

    fn default_rtl_extension() -> String {
        defaults::RTL_EXTENSION.into()
    }

    fn default_output() -> PathBuf {
        PathBuf::from(defaults::SIM_OUTPUT)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compiler: Self::default_compiler(),
            flags: Self::default_flags(),
            testbench: Self::default_testbench(),
            rtl_dir: Self::default_rtl_dir(),
            rtl_extension: Self::default_rtl_extension(),
            output: Self::default_output(),
        }
    }
}

/// Execution of the compiled simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Runtime that loads the compiled simulator
    #[serde(default = "RunConfig::default_runner")]
    pub runner: String,

    /// Extra arguments placed before the simulator executable
    #[serde(default)]
    pub runner_args: Vec<String>,

    /// Hard wall-clock limit per simulation
    #[serde(default = "RunConfig::default_timeout_secs")]
    pub timeout_secs: u64,

    /// Memory image file name inside the work area
    #[serde(default = "RunConfig::default_memory_image")]
    pub memory_image: String,

    /// Signature file name inside the work area
    #[serde(default = "RunConfig::default_signature_log")]
    pub signature_log: String,
}

impl RunConfig {
    fn default_runner() -> String {
        defaults::RUNNER.into()
    }

    fn default_timeout_secs() -> u64 {
        defaults::TIMEOUT_SECS
    }

    fn default_memory_image() -> String {
        defaults::MEMORY_IMAGE.into()
    }

    fn default_signature_log() -> String {
        defaults::SIGNATURE_LOG.into()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            runner: Self::default_runner(),
            runner_args: Vec::new(),
            timeout_secs: Self::default_timeout_secs(),
            memory_image: Self::default_memory_image(),
            signature_log: Self::default_signature_log(),
        }
    }
}

/// Word geometry used when packing images and signatures.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Bytes per word
    #[serde(default = "ImageConfig::default_word_size")]
    pub word_size: usize,

    /// Storage order of bytes within a word
    #[serde(default)]
    pub byte_order: ByteOrder,
}

impl ImageConfig {
    fn default_word_size() -> usize {
        crate::common::WORD_SIZE
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            word_size: Self::default_word_size(),
            byte_order: ByteOrder::default(),
        }
    }
}

/// Test discovery and golden reference lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct SuiteConfig {
    /// Directory of compiled test programs
    #[serde(default = "SuiteConfig::default_test_dir")]
    pub test_dir: PathBuf,

    /// Directory of golden signatures
    #[serde(default = "SuiteConfig::default_reference_dir")]
    pub reference_dir: PathBuf,

    /// Extension of golden signature files (without the dot)
    #[serde(default = "SuiteConfig::default_reference_extension")]
    pub reference_extension: String,

    /// Token granularity of golden signature files
    #[serde(default)]
    pub reference_format: SignatureFormat,

    /// Tests run when none are named explicitly
    #[serde(default = "SuiteConfig::default_tests")]
    pub default_tests: Vec<PathBuf>,

    /// ELF to raw binary extraction tool
    #[serde(default = "SuiteConfig::default_objcopy")]
    pub objcopy: String,
}

impl SuiteConfig {
    fn default_test_dir() -> PathBuf {
        PathBuf::from(defaults::TEST_DIR)
    }

    fn default_reference_dir() -> PathBuf {
        PathBuf::from(defaults::REFERENCE_DIR)
    }

    fn default_reference_extension() -> String {
        defaults::REFERENCE_EXTENSION.into()
    }

    fn default_tests() -> Vec<PathBuf> {
        vec![PathBuf::from(defaults::DEFAULT_TEST)]
    }

    fn default_objcopy() -> String {
        defaults::OBJCOPY.into()
    }
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            test_dir: Self::default_test_dir(),
            reference_dir: Self::default_reference_dir(),
            reference_extension: Self::default_reference_extension(),
            reference_format: SignatureFormat::default(),
            default_tests: Self::default_tests(),
            objcopy: Self::default_objcopy(),
        }
    }
}

/// Work-area placement and parallelism.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory for transient artifacts (defaults to the project root)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Shared or per-test work areas
    #[serde(default)]
    pub layout: WorkLayout,

    /// Number of tests simulated concurrently
    #[serde(default = "WorkspaceConfig::default_jobs")]
    pub jobs: usize,
}

impl WorkspaceConfig {
    fn default_jobs() -> usize {
        defaults::JOBS
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            layout: WorkLayout::default(),
            jobs: Self::default_jobs(),
        }
    }
}
