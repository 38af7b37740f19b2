//! # Memory Image Conversion
//!
//! Verifies word packing, zero padding, byte-order handling, purity, and the round-trip
//! law: regrouping the rendered words back into bytes reproduces the input up to padding.

use std::fs;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use rtlcheck_core::config::{ByteOrder, ImageConfig};
use rtlcheck_core::image::ImageConverter;
use rtlcheck_core::HarnessError;

// ──────────────────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────────────────

/// Parses rendered loader text back into storage-order bytes.
fn unrender(text: &str, byte_order: ByteOrder) -> Vec<u8> {
    let mut bytes = Vec::new();
    for line in text.lines() {
        let mut word: Vec<u8> = (0..line.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&line[i..i + 2], 16).unwrap())
            .collect();
        if byte_order == ByteOrder::Little {
            word.reverse();
        }
        bytes.extend(word);
    }
    bytes
}

// ──────────────────────────────────────────────────────────
// Fixed scenarios
// ──────────────────────────────────────────────────────────

#[test]
fn single_aligned_word_is_reversed() {
    let image = ImageConverter::default().convert(&[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(image.render(), "04030201\n");
    assert_eq!(image.len(), 1);
}

#[test]
fn partial_trailing_word_is_zero_padded() {
    let image = ImageConverter::default().convert(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    assert_eq!(
        image.words().collect::<Vec<_>>(),
        vec!["ddccbbaa".to_string(), "0000ffee".to_string()]
    );
}

#[test]
fn empty_binary_yields_empty_image() {
    let image = ImageConverter::default().convert(&[]);
    assert!(image.is_empty());
    assert_eq!(image.render(), "");
}

#[test]
fn zero_word_size_is_clamped() {
    let converter = ImageConverter::new(0, ByteOrder::Little);
    assert_eq!(converter.word_size(), 1);
    assert_eq!(converter.convert(&[0x0f, 0xf0]).render(), "0f\nf0\n");
}

#[test]
fn converter_follows_image_config() {
    let config = ImageConfig {
        word_size: 2,
        byte_order: ByteOrder::Big,
    };
    let image = ImageConverter::from_config(&config).convert(&[0x12, 0x34, 0x56]);
    assert_eq!(image.render(), "1234\n5600\n");
}

#[rstest]
#[case(1, 1)]
#[case(3, 1)]
#[case(4, 1)]
#[case(5, 2)]
#[case(8, 2)]
#[case(9, 3)]
fn word_count_is_ceiling_of_length(#[case] bytes: usize, #[case] words: usize) {
    let image = ImageConverter::new(4, ByteOrder::Little).convert(&vec![0x5a; bytes]);
    assert_eq!(image.len(), words);
}

#[rstest]
#[case(&[0x01], "00000001")]
#[case(&[0x01, 0x02], "00000201")]
#[case(&[0x01, 0x02, 0x03], "00030201")]
fn padding_precedes_partial_bytes_after_reversal(#[case] tail: &[u8], #[case] expected: &str) {
    let mut binary = vec![0u8; 4];
    binary.extend_from_slice(tail);
    let image = ImageConverter::default().convert(&binary);
    assert_eq!(image.words().last().unwrap(), expected);
}

// ──────────────────────────────────────────────────────────
// File conversion
// ──────────────────────────────────────────────────────────

#[test]
fn convert_file_writes_loader_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("prog.bin");
    let output = dir.path().join("inst.mem");
    fs::write(&input, [0x13, 0x05, 0x00, 0x00, 0x93, 0x05, 0x10, 0x00]).unwrap();

    let image = ImageConverter::default().convert_file(&input, &output).unwrap();

    assert_eq!(image.len(), 2);
    assert_eq!(fs::read_to_string(&output).unwrap(), "00000513\n00100593\n");
}

#[test]
fn convert_file_reports_missing_input_as_conversion_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.bin");
    let err = ImageConverter::default()
        .convert_file(&input, &dir.path().join("inst.mem"))
        .unwrap_err();
    assert!(matches!(err, HarnessError::Conversion { ref path, .. } if *path == input));
    assert_eq!(err.kind(), "ConversionError");
    assert!(!err.is_fatal());
}

#[test]
fn convert_file_reports_unwritable_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("prog.bin");
    fs::write(&input, [0u8; 4]).unwrap();
    let output = dir.path().join("missing-dir").join("inst.mem");

    let err = ImageConverter::default()
        .convert_file(&input, &output)
        .unwrap_err();
    assert!(matches!(err, HarnessError::Conversion { ref path, .. } if *path == output));
}

// ──────────────────────────────────────────────────────────
// Properties
// ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn round_trip_reproduces_bytes_up_to_padding(
        binary in proptest::collection::vec(any::<u8>(), 0..256),
        word_size in 1usize..=8,
        big in any::<bool>(),
    ) {
        let order = if big { ByteOrder::Big } else { ByteOrder::Little };
        let image = ImageConverter::new(word_size, order).convert(&binary);

        let mut expected = binary.clone();
        expected.resize(binary.len().div_ceil(word_size) * word_size, 0);

        prop_assert_eq!(unrender(&image.render(), order), expected.clone());
        prop_assert_eq!(image.to_bytes(), expected);
        prop_assert_eq!(image.len(), binary.len().div_ceil(word_size));
    }

    #[test]
    fn conversion_is_pure(binary in proptest::collection::vec(any::<u8>(), 0..128)) {
        let converter = ImageConverter::default();
        prop_assert_eq!(converter.convert(&binary).render(), converter.convert(&binary).render());
    }

    #[test]
    fn every_line_has_full_width(binary in proptest::collection::vec(any::<u8>(), 1..64)) {
        let text = ImageConverter::default().convert(&binary).render();
        prop_assert!(text.ends_with('\n'));
        for line in text.lines() {
            prop_assert_eq!(line.len(), 8);
            prop_assert!(line.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        }
    }
}
