//! # Simulation Tests
//!
//! Everything here launches real processes through `sh`, so it is Unix-only.


/// Per-test simulation.
#[cfg(unix)]
pub mod invoker;


/// Tool discovery.
#[cfg(unix)]
pub mod toolchain;
