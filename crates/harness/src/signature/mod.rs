//! Signature parsing.
//!
//! A signature is the ordered list of words a test leaves behind for checking. Golden
//! references and generated logs are stored at different granularities, so both are
//! normalized into the same canonical form before comparison:
//! 1. **Bytes:** One byte token per entry; tokens are regrouped `word_size` at a time and
//!    reordered according to the byte order (reversed for little-endian).
//! 2. **Words:** One full word per token, already in canonical order.
//!
//! Canonical words are lowercase hex strings. No numeric interpretation is applied.
//!
//! Golden files are validated against their declared granularity. Simulator logs are read
//! with [`SignatureParser::read_log`] and never rejected: unknown values (`xxxxxxxx`), short
//! or garbled words are kept as text so they show up in the mismatch dump.

use std::fs;
use std::path::Path;

use crate::common::constants::{ADDRESS_MARKER, HEX_DIGITS_PER_BYTE};
use crate::common::{HarnessError, HarnessResult, WORD_SIZE};
use crate::config::{ByteOrder, ImageConfig, SignatureFormat};

/// Exact signature comparison.
pub mod comparator;

pub use comparator::{ComparisonResult, SignatureComparator};

/// Canonical ordered word sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    words: Vec<String>,
}

impl Signature {
    /// Builds a signature from words, lower-casing each one.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Canonical words in order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if the signature holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Consumes the signature, returning its words.
    pub fn into_words(self) -> Vec<String> {
        self.words
    }
}

/// Reads signature files of either granularity into canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureParser {
    word_size: usize,
    byte_order: ByteOrder,
}

impl Default for SignatureParser {
    fn default() -> Self {
        Self::new(WORD_SIZE, ByteOrder::Little)
    }
}

impl SignatureParser {
    /// Creates a parser for the given word geometry.
    pub fn new(word_size: usize, byte_order: ByteOrder) -> Self {
        Self {
            word_size: word_size.max(1),
            byte_order,
        }
    }

    /// Creates a parser matching the `image` configuration section.
    pub fn from_config(config: &ImageConfig) -> Self {
        Self::new(config.word_size, config.byte_order)
    }

    /// Reads and parses `path`.
    pub fn read(&self, path: &Path, format: SignatureFormat) -> HarnessResult<Signature> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        self.parse(&text, format, path)
    }

    /// Reads a simulator log written one word per token.
    pub fn read_log(path: &Path) -> HarnessResult<Signature> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(Self::parse_log(&text))
    }

    /// Splits a simulator log into lowercase words without validating them.
    ///
    /// ```
    /// use rtlcheck_core::signature::SignatureParser;
    ///
    /// let sig = SignatureParser::parse_log("00000001\nXXXXXXXX\n");
    /// assert_eq!(sig.words(), ["00000001", "xxxxxxxx"]);
    /// ```
    pub fn parse_log(text: &str) -> Signature {
        Signature::new(text.split_whitespace())
    }

    /// Parses signature text. `origin` is only used in error reports.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use rtlcheck_core::config::SignatureFormat;
    /// use rtlcheck_core::signature::SignatureParser;
    ///
    /// let parser = SignatureParser::default();
    /// let sig = parser
    ///     .parse("01 00 00 00 02 00 00 00", SignatureFormat::Bytes, Path::new("ref.hex"))
    ///     .unwrap();
    /// assert_eq!(sig.words(), ["00000001", "00000002"]);
    /// ```
    pub fn parse(
        &self,
        text: &str,
        format: SignatureFormat,
        origin: &Path,
    ) -> HarnessResult<Signature> {
        match format {
            SignatureFormat::Words => self.parse_words(text, origin),
            SignatureFormat::Bytes => self.parse_bytes(text, origin),
        }
    }

    fn parse_words(&self, text: &str, origin: &Path) -> HarnessResult<Signature> {
        let width = self.word_size * HEX_DIGITS_PER_BYTE;
        let mut words = Vec::new();
        for (index, token) in text.split_whitespace().enumerate() {
            if token.len() != width || !is_hex(token) {
                return Err(malformed(origin, index, token, "word token"));
            }
            words.push(token.to_ascii_lowercase());
        }
        Ok(Signature { words })
    }

    fn parse_bytes(&self, text: &str, origin: &Path) -> HarnessResult<Signature> {
        let mut bytes = Vec::new();
        for (index, token) in text.split_whitespace().enumerate() {
            if token.starts_with(ADDRESS_MARKER) {
                continue;
            }
            if token.len() > HEX_DIGITS_PER_BYTE || !is_hex(token) {
                return Err(malformed(origin, index, token, "byte token"));
            }
            bytes.push(format!("{:0>2}", token.to_ascii_lowercase()));
        }

        let words = bytes
            .chunks(self.word_size)
            .map(|group| match self.byte_order {
                ByteOrder::Little => group.iter().rev().map(String::as_str).collect(),
                ByteOrder::Big => group.concat(),
            })
            .collect();
        Ok(Signature { words })
    }
}

fn is_hex(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn malformed(origin: &Path, index: usize, token: &str, expected: &'static str) -> HarnessError {
    HarnessError::MalformedSignature {
        path: origin.to_path_buf(),
        index,
        token: token.to_string(),
        expected,
    }
}
