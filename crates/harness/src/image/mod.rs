//! Program image preparation.
//!
//! Turns test programs into something the testbench can load:
//! 1. **ELF extraction:** Linked ELF programs are flattened into raw binary images.
//! 2. **Conversion:** Raw images are packed into word-per-line hex memory images.

/// Binary to memory image conversion.
pub mod converter;

/// ELF to raw binary extraction.
pub mod elf;

pub use converter::{ImageConverter, MemoryImage};
pub use elf::ElfExtractor;
