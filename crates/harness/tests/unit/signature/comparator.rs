//! # Signature Comparison
//!
//! Equality is exact and order-sensitive. Missing files are reported as distinct verdicts:
//! a missing generated signature means the simulation did not finish, a missing reference
//! means the test cannot be judged.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use rtlcheck_core::config::{ByteOrder, Config, SignatureFormat};
use rtlcheck_core::signature::{ComparisonResult, Signature, SignatureComparator, SignatureParser};
use rtlcheck_core::HarnessError;

/// Writes the reference and generated files into a fresh directory.
fn fixture(reference: Option<&str>, generated: Option<&str>) -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let reference_path = dir.path().join("test.hex");
    let generated_path = dir.path().join("signature.log");
    if let Some(text) = reference {
        fs::write(&reference_path, text).unwrap();
    }
    if let Some(text) = generated {
        fs::write(&generated_path, text).unwrap();
    }
    (dir, reference_path, generated_path)
}

#[test]
fn byte_reference_matches_word_log() {
    let (_dir, reference, generated) =
        fixture(Some("01 00 00 00 02 00 00 00\n"), Some("00000001\n00000002\n"));
    let result = SignatureComparator::default()
        .compare(&reference, &generated)
        .unwrap();
    assert_eq!(result, ComparisonResult::Match { words: 2 });
    assert!(result.is_match());
}

#[test]
fn differing_word_is_a_mismatch_with_both_sequences() {
    let (_dir, reference, generated) =
        fixture(Some("01 00 00 00 02 00 00 00"), Some("00000001\n00000003\n"));
    let result = SignatureComparator::default()
        .compare(&reference, &generated)
        .unwrap();

    let err = result.into_result().unwrap_err();
    match err {
        HarnessError::SignatureMismatch {
            generated,
            reference,
        } => {
            assert_eq!(generated, ["00000001", "00000003"]);
            assert_eq!(reference, ["00000001", "00000002"]);
        }
        other => panic!("expected SignatureMismatch, got {other:?}"),
    }
}

#[test]
fn length_difference_is_a_mismatch() {
    let (_dir, reference, generated) = fixture(Some("01 00 00 00"), Some("00000001\n00000000\n"));
    let result = SignatureComparator::default()
        .compare(&reference, &generated)
        .unwrap();
    assert!(matches!(result, ComparisonResult::Mismatch { .. }));
}

#[test]
fn missing_generated_signature_is_missing_artifact() {
    let (_dir, reference, generated) = fixture(Some("01 00 00 00"), None);
    let result = SignatureComparator::default()
        .compare(&reference, &generated)
        .unwrap();
    assert_eq!(result, ComparisonResult::MissingArtifact { path: generated });
}

#[test]
fn missing_artifact_takes_precedence_over_missing_reference() {
    let (_dir, reference, generated) = fixture(None, None);
    let result = SignatureComparator::default()
        .compare(&reference, &generated)
        .unwrap();
    assert!(matches!(result, ComparisonResult::MissingArtifact { .. }));
}

#[test]
fn missing_reference_is_reported_not_failed() {
    let (_dir, reference, generated) = fixture(None, Some("00000001\n"));
    let result = SignatureComparator::default()
        .compare(&reference, &generated)
        .unwrap();
    assert_eq!(
        result,
        ComparisonResult::MissingReference {
            path: reference.clone()
        }
    );
    let err = result.into_result().unwrap_err();
    assert_eq!(err.kind(), "MissingReference");
}

#[test]
fn word_granular_reference_from_config() {
    let mut config = Config::default();
    config.suite.reference_format = SignatureFormat::Words;
    let (_dir, reference, generated) = fixture(Some("00000001\n"), Some("00000001\n"));

    let result = SignatureComparator::from_config(&config)
        .compare(&reference, &generated)
        .unwrap();
    assert!(result.is_match());
}

#[test]
fn unknown_values_in_generated_log_are_a_mismatch() {
    let (_dir, reference, generated) =
        fixture(Some("01 00 00 00 02 00 00 00"), Some("00000001\nXXXXXXXX\n"));
    let result = SignatureComparator::default()
        .compare(&reference, &generated)
        .unwrap();
    assert!(!result.is_match());

    match result.into_result().unwrap_err() {
        HarnessError::SignatureMismatch {
            generated,
            reference,
        } => {
            assert_eq!(generated, ["00000001", "xxxxxxxx"]);
            assert_eq!(reference, ["00000001", "00000002"]);
        }
        other => panic!("expected SignatureMismatch, got {other:?}"),
    }
}

#[test]
fn malformed_reference_is_an_error() {
    let (_dir, reference, generated) = fixture(Some("00000001 00000002"), Some("00000001\n"));
    let err = SignatureComparator::default()
        .compare(&reference, &generated)
        .unwrap_err();
    assert!(matches!(err, HarnessError::MalformedSignature { ref path, .. } if *path == reference));
}

#[test]
fn big_endian_comparator_regroups_without_reversal() {
    let comparator = SignatureComparator::new(
        SignatureParser::new(4, ByteOrder::Big),
        SignatureFormat::Bytes,
    );
    let (_dir, reference, generated) = fixture(Some("00 00 00 01"), Some("00000001\n"));
    assert!(comparator.compare(&reference, &generated).unwrap().is_match());
}

#[rstest]
#[case(0, 1)]
#[case(0, 3)]
#[case(1, 2)]
#[case(2, 3)]
fn swapping_two_distinct_words_breaks_the_match(#[case] i: usize, #[case] j: usize) {
    let words = ["00000001", "00000002", "00000003", "00000004"];
    let mut swapped = words;
    swapped.swap(i, j);
    let result =
        SignatureComparator::compare_signatures(Signature::new(swapped), Signature::new(words));
    assert!(matches!(result, ComparisonResult::Mismatch { .. }));
}

proptest! {
    #[test]
    fn comparison_is_reflexive(words in proptest::collection::vec("[0-9a-f]{8}", 0..32)) {
        let sig = Signature::new(&words);
        let result = SignatureComparator::compare_signatures(sig.clone(), sig);
        prop_assert_eq!(result, ComparisonResult::Match { words: words.len() });
    }

    #[test]
    fn any_transposition_of_distinct_words_mismatches(
        words in proptest::collection::hash_set("[0-9a-f]{8}", 2..16),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let words: Vec<String> = words.into_iter().collect();
        let (i, j) = (a.index(words.len()), b.index(words.len()));
        prop_assume!(i != j);
        let mut swapped = words.clone();
        swapped.swap(i, j);
        let result = SignatureComparator::compare_signatures(
            Signature::new(&swapped),
            Signature::new(&words),
        );
        prop_assert!(!result.is_match());
    }

    #[test]
    fn case_is_not_significant(words in proptest::collection::vec("[0-9a-f]{8}", 1..8)) {
        let upper: Vec<String> = words.iter().map(|w| w.to_ascii_uppercase()).collect();
        let result = SignatureComparator::compare_signatures(
            Signature::new(&upper),
            Signature::new(&words),
        );
        prop_assert!(result.is_match());
    }
}
