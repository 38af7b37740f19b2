//! Test cases and their work areas.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::common::constants::EXTRACTED_BINARY;
use crate::common::{HarnessError, HarnessResult};
use crate::config::{Config, WorkLayout};

/// One test program and its golden signature.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestCase {
    name: String,
    binary: PathBuf,
    reference: PathBuf,
}

impl TestCase {
    /// Creates a test case from explicit paths.
    pub fn new(name: impl Into<String>, binary: PathBuf, reference: PathBuf) -> Self {
        Self {
            name: name.into(),
            binary,
            reference,
        }
    }

    /// Derives a test case from a program path.
    ///
    /// The name is the file name; the reference is `<reference_dir>/<stem>.<reference_extension>`.
    pub fn from_binary(binary: &Path, config: &Config) -> Self {
        let name = binary
            .file_name()
            .map_or_else(|| binary.display().to_string(), |n| n.to_string_lossy().into_owned());
        let stem = binary
            .file_stem()
            .map_or_else(|| name.clone(), |s| s.to_string_lossy().into_owned());
        let reference = config
            .resolve(&config.suite.reference_dir)
            .join(format!("{stem}.{}", config.suite.reference_extension));
        Self {
            name,
            binary: binary.to_path_buf(),
            reference,
        }
    }

    /// Display name: the program's file name, parent-qualified when two programs share it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program to simulate (raw binary or ELF).
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Golden signature.
    pub fn reference(&self) -> &Path {
        &self.reference
    }
}

/// Builds the test list for a run.
///
/// Named programs are used as given. With none, `suite.default_tests` are looked up in
/// `suite.test_dir`. The result is sorted by name with repeated paths removed, so reports are
/// reproducible regardless of argument order.
pub fn select_tests(config: &Config, programs: &[PathBuf]) -> Vec<TestCase> {
    let paths: Vec<PathBuf> = if programs.is_empty() {
        let test_dir = config.resolve(&config.suite.test_dir);
        config
            .suite
            .default_tests
            .iter()
            .map(|t| if t.is_absolute() { t.clone() } else { test_dir.join(t) })
            .collect()
    } else {
        programs.to_vec()
    };
    sorted_unique(paths.iter().map(|p| TestCase::from_binary(p, config)))
}

/// Finds every `.bin` and `.elf` program in `suite.test_dir`.
pub fn discover_tests(config: &Config) -> HarnessResult<Vec<TestCase>> {
    let dir = config.resolve(&config.suite.test_dir);
    let entries = fs::read_dir(&dir).map_err(|e| HarnessError::io(&dir, e))?;
    let mut tests = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| HarnessError::io(&dir, e))?.path();
        let is_program = path
            .extension()
            .is_some_and(|ext| ext == "bin" || ext == "elf");
        if path.is_file() && is_program {
            tests.push(TestCase::from_binary(&path, config));
        }
    }
    debug!(dir = %dir.display(), count = tests.len(), "discovered tests");
    Ok(sorted_unique(tests))
}

/// Removes programs named more than once (by canonical path) and sorts by name.
///
/// Distinct programs that share a file name are renamed `<parent>/<file>`, or to their full
/// path if that still clashes, so none is dropped and every name stays unique.
fn sorted_unique(tests: impl IntoIterator<Item = TestCase>) -> Vec<TestCase> {
    let mut by_path = BTreeMap::new();
    for test in tests {
        let key = fs::canonicalize(&test.binary)
            .or_else(|_| std::path::absolute(&test.binary))
            .unwrap_or_else(|_| test.binary.clone());
        let _ = by_path.entry(key).or_insert(test);
    }

    let mut tests: Vec<TestCase> = by_path.into_values().collect();
    rename_clashes(&mut tests, qualified_name);
    rename_clashes(&mut tests, |binary| binary.display().to_string());
    tests.sort();
    tests
}

fn rename_clashes(tests: &mut [TestCase], rename: impl Fn(&Path) -> String) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for test in tests.iter() {
        *counts.entry(test.name.clone()).or_default() += 1;
    }
    for test in tests.iter_mut() {
        if counts.get(&test.name).is_some_and(|&n| n > 1) {
            test.name = rename(&test.binary);
        }
    }
}

fn qualified_name(binary: &Path) -> String {
    let file = binary
        .file_name()
        .map_or_else(|| binary.display().to_string(), |n| n.to_string_lossy().into_owned());
    match binary.parent().and_then(Path::file_name) {
        Some(parent) => format!("{}/{file}", parent.to_string_lossy()),
        None => file,
    }
}

/// Directory and artifact paths used while running one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkArea {
    dir: PathBuf,
    memory_image: PathBuf,
    signature: PathBuf,
    extracted: PathBuf,
    isolated: bool,
}

impl WorkArea {
    /// Work area for `test` under the configured layout.
    pub fn for_test(config: &Config, test: &TestCase) -> Self {
        let root = config.work_dir();
        match config.workspace.layout {
            WorkLayout::Shared => Self::new(config, root, false),
            WorkLayout::PerTest => {
                // Names are unique per run; separators from qualified names are flattened.
                let dir = test.name.replace(['/', '\\'], "__");
                Self::new(config, root.join(dir), true)
            }
        }
    }

    /// Work area rooted at `dir`.
    pub fn new(config: &Config, dir: PathBuf, isolated: bool) -> Self {
        Self {
            memory_image: dir.join(&config.run.memory_image),
            signature: dir.join(&config.run.signature_log),
            extracted: dir.join(EXTRACTED_BINARY),
            dir,
            isolated,
        }
    }

    /// Directory the simulator runs from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generated memory image.
    pub fn memory_image(&self) -> &Path {
        &self.memory_image
    }

    /// Generated signature.
    pub fn signature(&self) -> &Path {
        &self.signature
    }

    /// Raw image extracted from an ELF program.
    pub fn extracted(&self) -> &Path {
        &self.extracted
    }

    /// Transient files owned by this area.
    pub fn artifacts(&self) -> [&Path; 3] {
        [&self.memory_image, &self.signature, &self.extracted]
    }

    /// Creates the directory and clears artifacts left by an earlier test or run.
    pub fn prepare(&self) -> HarnessResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| HarnessError::io(&self.dir, e))?;
        self.remove_artifacts()
    }

    /// Deletes every transient artifact. An isolated directory is removed once empty.
    pub fn cleanup(&self) -> HarnessResult<()> {
        self.remove_artifacts()?;
        if self.isolated {
            // Leftover simulator logs keep the directory alive.
            let _ = fs::remove_dir(&self.dir);
        }
        Ok(())
    }

    fn remove_artifacts(&self) -> HarnessResult<()> {
        for path in self.artifacts() {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "removed artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(HarnessError::io(path, e)),
            }
        }
        Ok(())
    }
}
