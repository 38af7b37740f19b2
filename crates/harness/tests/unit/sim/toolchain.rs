//! # Toolchain Discovery

use rtlcheck_core::config::Config;
use rtlcheck_core::sim::toolchain::locate;
use rtlcheck_core::sim::Toolchain;
use rtlcheck_core::HarnessError;

fn config_with(compiler: &str, runner: &str, objcopy: &str) -> Config {
    let mut config = Config::default();
    config.build.compiler = compiler.into();
    config.run.runner = runner.into();
    config.suite.objcopy = objcopy.into();
    config
}

#[test]
fn present_tools_resolve_to_absolute_paths() {
    let toolchain = Toolchain::discover(&config_with("sh", "sh", "sh")).unwrap();
    assert!(toolchain.compiler().is_absolute());
    assert!(toolchain.runner().is_absolute());
    assert!(toolchain.objcopy().is_some());
}

#[test]
fn missing_compiler_is_fatal() {
    let err = Toolchain::discover(&config_with("rtlcheck-missing-iverilog", "sh", "sh")).unwrap_err();
    match &err {
        HarnessError::ToolNotFound { tool } => assert_eq!(tool, "rtlcheck-missing-iverilog"),
        other => panic!("expected ToolNotFound, got {other:?}"),
    }
    assert!(err.is_fatal());
}

#[test]
fn missing_runner_is_fatal() {
    let err = Toolchain::discover(&config_with("sh", "rtlcheck-missing-vvp", "sh")).unwrap_err();
    assert!(matches!(err, HarnessError::ToolNotFound { .. }));
}

#[test]
fn missing_objcopy_falls_back_to_native_extraction() {
    let toolchain = Toolchain::discover(&config_with("sh", "sh", "rtlcheck-missing-objcopy")).unwrap();
    assert!(toolchain.objcopy().is_none());
}

#[test]
fn locate_accepts_explicit_paths() {
    let sh = locate("sh").unwrap();
    assert_eq!(locate(sh.to_str().unwrap()).unwrap(), sh);
}
