//! Constants shared by the conversion and comparison stages.

/// Bytes per machine word for the default (RV32) target.
pub const WORD_SIZE: usize = 4;

/// Largest word width the converter accepts.
pub const MAX_WORD_SIZE: usize = 16;

/// Hex digits per byte token.
pub const HEX_DIGITS_PER_BYTE: usize = 2;

/// ELF identification bytes.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Largest flat image an ELF may expand to (256 MiB). Sparse section layouts beyond this are
/// rejected rather than zero-filled.
pub const MAX_FLAT_IMAGE_BYTES: u64 = 256 * 1024 * 1024;

/// File name of the raw image extracted from an ELF test program.
pub const EXTRACTED_BINARY: &str = "inst.bin";

/// Prefix of address markers in Verilog-style hex dumps (`@80000000`).
pub const ADDRESS_MARKER: char = '@';
