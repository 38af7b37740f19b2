//! Binary image to memory image conversion.
//!
//! The simulator's testbench loads program memory with `$readmemh`, which expects one
//! fixed-width hexadecimal word per line. This module performs that packing:
//! 1. **Chunking:** The raw image is split into `word_size` byte chunks.
//! 2. **Padding:** A short trailing chunk is right-padded with zero bytes.
//! 3. **Byte order:** Little-endian chunks are reversed so the most significant byte prints first.
//! 4. **Rendering:** Each word is printed as `2 * word_size` lowercase hex digits.
//!
//! Conversion is a pure function of the input bytes and the word geometry.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::common::{HarnessError, HarnessResult, WORD_SIZE};
use crate::config::{ByteOrder, ImageConfig};

/// Packs raw program bytes into loader words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConverter {
    word_size: usize,
    byte_order: ByteOrder,
}

impl Default for ImageConverter {
    fn default() -> Self {
        Self::new(WORD_SIZE, ByteOrder::Little)
    }
}

impl ImageConverter {
    /// Creates a converter for the given word geometry.
    ///
    /// A `word_size` of zero is treated as one byte per word.
    pub fn new(word_size: usize, byte_order: ByteOrder) -> Self {
        Self {
            word_size: word_size.max(1),
            byte_order,
        }
    }

    /// Creates a converter from the `image` configuration section.
    pub fn from_config(config: &ImageConfig) -> Self {
        Self::new(config.word_size, config.byte_order)
    }

    /// Bytes per word.
    pub fn word_size(&self) -> usize {
        self.word_size
    }

    /// Converts an in-memory binary image.
    ///
    /// # Examples
    ///
    /// ```
    /// use rtlcheck_core::image::ImageConverter;
    ///
    /// let image = ImageConverter::default().convert(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    /// assert_eq!(image.render(), "ddccbbaa\n0000ffee\n");
    /// ```
    pub fn convert(&self, binary: &[u8]) -> MemoryImage {
        let words = binary
            .chunks(self.word_size)
            .map(|chunk| {
                let mut word = chunk.to_vec();
                word.resize(self.word_size, 0);
                if self.byte_order == ByteOrder::Little {
                    word.reverse();
                }
                word
            })
            .collect();

        MemoryImage {
            word_size: self.word_size,
            byte_order: self.byte_order,
            words,
        }
    }

    /// Reads `input`, converts it, and writes the rendered image to `output`.
    ///
    /// Read and write failures are reported as [`HarnessError::Conversion`].
    pub fn convert_file(&self, input: &Path, output: &Path) -> HarnessResult<MemoryImage> {
        let binary = fs::read(input).map_err(|e| HarnessError::Conversion {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })?;
        let image = self.convert(&binary);
        image.write_to(output)?;
        debug!(
            input = %input.display(),
            output = %output.display(),
            bytes = binary.len(),
            words = image.len(),
            "converted binary image"
        );
        Ok(image)
    }
}

/// Word-per-line memory image in loader order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    word_size: usize,
    byte_order: ByteOrder,
    /// Word bytes, most significant first.
    words: Vec<Vec<u8>>,
}

impl MemoryImage {
    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` for an image converted from an empty binary.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Bytes per word.
    pub fn word_size(&self) -> usize {
        self.word_size
    }

    /// Iterates over the rendered hex words.
    pub fn words(&self) -> impl Iterator<Item = String> + '_ {
        self.words.iter().map(|word| hex_word(word))
    }

    /// Renders the loader text: one word per line, each line newline-terminated.
    pub fn render(&self) -> String {
        let mut text = String::with_capacity(self.words.len() * (self.word_size * 2 + 1));
        for word in &self.words {
            text.push_str(&hex_word(word));
            text.push('\n');
        }
        text
    }

    /// Writes the rendered image to `path`.
    pub fn write_to(&self, path: &Path) -> HarnessResult<()> {
        fs::write(path, self.render()).map_err(|e| HarnessError::Conversion {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Recovers the original byte stream in storage order, zero-padded to a word boundary.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.words.len() * self.word_size);
        for word in &self.words {
            match self.byte_order {
                ByteOrder::Little => bytes.extend(word.iter().rev()),
                ByteOrder::Big => bytes.extend_from_slice(word),
            }
        }
        bytes
    }
}

fn hex_word(word: &[u8]) -> String {
    word.iter().map(|b| format!("{b:02x}")).collect()
}
