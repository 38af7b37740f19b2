//! Reference vs generated signature comparison.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Signature, SignatureParser};
use crate::common::{HarnessError, HarnessResult};
use crate::config::{Config, SignatureFormat};

/// Verdict of comparing one generated signature with its golden reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonResult {
    /// Both sequences are identical, position for position.
    Match {
        /// Number of words compared.
        words: usize,
    },
    /// The sequences differ in length or in at least one position.
    Mismatch {
        /// Canonical generated words.
        generated: Signature,
        /// Canonical golden words.
        reference: Signature,
    },
    /// The simulation did not leave a signature behind.
    MissingArtifact {
        /// Expected generated signature location.
        path: PathBuf,
    },
    /// No golden reference exists, so the test cannot be judged.
    MissingReference {
        /// Expected golden file location.
        path: PathBuf,
    },
}

impl ComparisonResult {
    /// Returns `true` only for [`ComparisonResult::Match`].
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }

    /// Converts a non-matching verdict into the corresponding error.
    pub fn into_result(self) -> HarnessResult<usize> {
        match self {
            Self::Match { words } => Ok(words),
            Self::Mismatch {
                generated,
                reference,
            } => Err(HarnessError::SignatureMismatch {
                generated: generated.into_words(),
                reference: reference.into_words(),
            }),
            Self::MissingArtifact { path } => Err(HarnessError::MissingArtifact { path }),
            Self::MissingReference { path } => Err(HarnessError::MissingReference { path }),
        }
    }
}

/// Normalizes and compares signature files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureComparator {
    parser: SignatureParser,
    reference_format: SignatureFormat,
}

impl Default for SignatureComparator {
    fn default() -> Self {
        Self::new(SignatureParser::default(), SignatureFormat::Bytes)
    }
}

impl SignatureComparator {
    /// Creates a comparator. Generated signatures are always word-granular logs.
    pub fn new(parser: SignatureParser, reference_format: SignatureFormat) -> Self {
        Self {
            parser,
            reference_format,
        }
    }

    /// Creates a comparator from the `image` and `suite` configuration sections.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SignatureParser::from_config(&config.image),
            config.suite.reference_format,
        )
    }

    /// Compares the golden file at `reference` with the simulator output at `generated`.
    ///
    /// A missing generated file is checked first: a simulation that wrote nothing has failed
    /// regardless of whether a reference exists.
    pub fn compare(&self, reference: &Path, generated: &Path) -> HarnessResult<ComparisonResult> {
        if !generated.is_file() {
            return Ok(ComparisonResult::MissingArtifact {
                path: generated.to_path_buf(),
            });
        }
        if !reference.is_file() {
            return Ok(ComparisonResult::MissingReference {
                path: reference.to_path_buf(),
            });
        }

        let reference_sig = self.parser.read(reference, self.reference_format)?;
        let generated_sig = SignatureParser::read_log(generated)?;
        Ok(Self::compare_signatures(generated_sig, reference_sig))
    }

    /// Compares two already-parsed signatures.
    pub fn compare_signatures(generated: Signature, reference: Signature) -> ComparisonResult {
        if generated == reference {
            debug!(words = generated.len(), "signature match");
            ComparisonResult::Match {
                words: generated.len(),
            }
        } else {
            ComparisonResult::Mismatch {
                generated,
                reference,
            }
        }
    }
}
