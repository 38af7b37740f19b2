//! # Simulation Invocation
//!
//! The invoker stages the memory image under the testbench's fixed name, clears any stale
//! signature, and classifies how the simulator ended.

use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;

use rtlcheck_core::sim::{
    ExecutionOutcome, SimulationInvoker, SimulatorBuild, SimulatorExecutable, Toolchain,
};
use rtlcheck_core::HarnessError;

use crate::common::project::FakeProject;

/// Builds the fake simulator and returns an invoker for it.
fn invoker(project: &FakeProject) -> SimulationInvoker {
    let config = project.config();
    let toolchain = Toolchain::discover(&config).unwrap();
    let executable = SimulatorBuild::from_config(&config, &toolchain)
        .unwrap()
        .run()
        .unwrap();
    SimulationInvoker::new(&config, &toolchain, &executable)
}

fn stage(project: &FakeProject, name: &str, text: &str) -> std::path::PathBuf {
    let path = project.root().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn completed_run_leaves_signature_in_work_dir() {
    let project = FakeProject::new();
    let invoker = invoker(&project);
    let image = stage(&project, "prog.mem", "00000513\n");
    let work = tempfile::tempdir().unwrap();

    let outcome = invoker
        .run(&image, work.path(), Duration::from_secs(5))
        .unwrap();

    let signature = outcome.clone().into_result().unwrap();
    assert_eq!(signature, work.path().join("signature.log"));
    assert_eq!(fs::read_to_string(&signature).unwrap(), "00000513\n");
    assert_eq!(outcome.stdout(), "simulation finished\n");
    assert_eq!(
        fs::read_to_string(invoker.memory_image_path(work.path())).unwrap(),
        "00000513\n"
    );
}

#[test]
fn non_zero_exit_is_crashed() {
    let project = FakeProject::new();
    let invoker = invoker(&project);
    let image = stage(&project, "prog.mem", "0badc0de\n");

    let outcome = invoker
        .run(&image, project.root(), Duration::from_secs(5))
        .unwrap();

    match outcome {
        ExecutionOutcome::CrashedWithNonZeroExit { code, stderr, .. } => {
            assert_eq!(code, Some(3));
            assert!(stderr.contains("assertion failed"));
        }
        other => panic!("expected crash, got {other:?}"),
    }
}

#[test]
fn hang_is_timed_out() {
    let project = FakeProject::new();
    let invoker = invoker(&project);
    let image = stage(&project, "prog.mem", "deadbeef\n");

    let outcome = invoker
        .run(&image, project.root(), Duration::from_millis(500))
        .unwrap();

    let err = outcome.into_result().unwrap_err();
    assert!(matches!(err, HarnessError::TimedOut { timeout, .. } if timeout == Duration::from_millis(500)));
}

#[test]
fn stale_signature_is_removed_before_running() {
    let project = FakeProject::new();
    let invoker = invoker(&project);
    let image = stage(&project, "inst.mem", "00000bad\n");
    let stale = invoker.signature_path(project.root());
    fs::write(&stale, "00000001\n").unwrap();

    let outcome = invoker
        .run(&image, project.root(), Duration::from_secs(5))
        .unwrap();

    assert!(matches!(outcome, ExecutionOutcome::Completed { .. }));
    assert!(!stale.exists());
}

#[test]
fn missing_memory_image_is_conversion_error() {
    let project = FakeProject::new();
    let config = project.config();
    let toolchain = Toolchain::discover(&config).unwrap();
    let invoker = SimulationInvoker::new(
        &config,
        &toolchain,
        &SimulatorExecutable::new(project.root().join("never-built.vvp")),
    );

    let err = invoker
        .run(&project.root().join("inst.mem"), project.root(), Duration::from_secs(1))
        .unwrap_err();
    assert!(matches!(err, HarnessError::Conversion { .. }));
}
