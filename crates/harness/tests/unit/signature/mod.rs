//! # Signature Tests

/// Reference vs generated comparison.
pub mod comparator;
