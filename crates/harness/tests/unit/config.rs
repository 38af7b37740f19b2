//! # Configuration
//!
//! Defaults describe the conventional project layout; JSON overrides are partial and
//! validated on load.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rstest::rstest;

use rtlcheck_core::config::{ByteOrder, Config, SignatureFormat, WorkLayout};
use rtlcheck_core::HarnessError;

#[test]
fn defaults_describe_conventional_layout() {
    let config = Config::default();
    assert_eq!(config.build.compiler, "iverilog");
    assert_eq!(config.build.flags, vec!["-g2012".to_string()]);
    assert_eq!(config.build.testbench, PathBuf::from("sim/tb_riscv_core_new.v"));
    assert_eq!(config.build.output, PathBuf::from("tb_riscv_core_new.vvp"));
    assert_eq!(config.run.runner, "vvp");
    assert_eq!(config.timeout(), Duration::from_secs(30));
    assert_eq!(config.run.memory_image, "inst.mem");
    assert_eq!(config.run.signature_log, "signature.log");
    assert_eq!(config.image.word_size, 4);
    assert_eq!(config.image.byte_order, ByteOrder::Little);
    assert_eq!(config.suite.reference_format, SignatureFormat::Bytes);
    assert_eq!(
        config.suite.default_tests,
        vec![PathBuf::from("rv32ui-p-add.bin")]
    );
    assert_eq!(config.workspace.layout, WorkLayout::Shared);
    assert_eq!(config.workspace.jobs, 1);
    config.validate().unwrap();
}

#[test]
fn empty_json_equals_defaults() {
    let config = Config::from_json_str("{}").unwrap();
    assert_eq!(config.run.timeout_secs, Config::default().run.timeout_secs);
    assert_eq!(config.suite.objcopy, "riscv32-unknown-elf-objcopy");
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config = Config::from_json_str(
        r#"{
            "build": { "compiler": "/opt/iverilog/bin/iverilog" },
            "image": { "word_size": 8, "byte_order": "big" },
            "suite": { "reference_format": "words" }
        }"#,
    )
    .unwrap();
    assert_eq!(config.build.compiler, "/opt/iverilog/bin/iverilog");
    assert_eq!(config.build.flags, vec!["-g2012".to_string()]);
    assert_eq!(config.image.word_size, 8);
    assert_eq!(config.image.byte_order, ByteOrder::Big);
    assert_eq!(config.suite.reference_format, SignatureFormat::Words);
}

#[rstest]
#[case::zero_word(r#"{ "image": { "word_size": 0 } }"#, "word_size")]
#[case::huge_word(r#"{ "image": { "word_size": 32 } }"#, "word_size")]
#[case::zero_timeout(r#"{ "run": { "timeout_secs": 0 } }"#, "timeout_secs")]
#[case::zero_jobs(r#"{ "workspace": { "jobs": 0 } }"#, "jobs")]
#[case::shared_parallel(r#"{ "workspace": { "jobs": 4 } }"#, "PerTest")]
#[case::bad_enum(r#"{ "image": { "byte_order": "middle" } }"#, "middle")]
#[case::not_json("timeout = 5", "expected")]
fn invalid_configuration_is_rejected(#[case] json: &str, #[case] needle: &str) {
    match Config::from_json_str(json) {
        Err(HarnessError::Config(message)) => {
            assert!(message.contains(needle), "{message}");
        }
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn relative_root_resolves_against_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rtlcheck.json");
    fs::write(&path, r#"{ "project": { "root": "core" } }"#).unwrap();

    let config = Config::from_json_file(&path).unwrap();

    assert_eq!(config.project.root, dir.path().join("core"));
    assert_eq!(
        config.resolve("rtl"),
        dir.path().join("core").join("rtl")
    );
}

#[test]
fn config_file_errors_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = Config::from_json_file(&path).unwrap_err();
    assert!(err.to_string().contains("broken.json"));
    assert!(err.is_fatal());
}

#[test]
fn work_dir_defaults_to_root_and_resolves_relative_paths() {
    let mut config = Config::default();
    config.project.root = PathBuf::from("/work/core");
    assert_eq!(config.work_dir(), PathBuf::from("/work/core"));

    config.workspace.work_dir = Some(PathBuf::from("build/regress"));
    assert_eq!(config.work_dir(), PathBuf::from("/work/core/build/regress"));

    config.workspace.work_dir = Some(PathBuf::from("/tmp/regress"));
    assert_eq!(config.work_dir(), PathBuf::from("/tmp/regress"));
}

#[test]
fn absolutize_root_makes_relative_root_absolute() {
    let mut config = Config::default();
    config.absolutize_root().unwrap();
    assert!(config.project.root.is_absolute());
}
