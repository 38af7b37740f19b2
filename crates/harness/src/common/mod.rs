//! Common types shared across the harness.
//!
//! This module provides:
//! 1. **Error Handling:** The [`HarnessError`] taxonomy and the [`HarnessResult`] alias.
//! 2. **Constants:** Word geometry, ELF magic, and well-known artifact names.

/// Common constants used throughout the harness.
pub mod constants;

/// Error types.
pub mod error;

pub use constants::WORD_SIZE;
pub use error::{HarnessError, HarnessResult};
