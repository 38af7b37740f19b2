//! Shared fixtures for harness tests.


/// mockall stand-ins for the plugin interface.
pub mod mocks;


/// Installs a test-writer subscriber once per process so `RUST_LOG` works under `cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Space-separated byte dump of `bytes`, in the golden reference format.
pub fn byte_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
