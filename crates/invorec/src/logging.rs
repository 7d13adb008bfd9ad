//! Tracing setup for embedders that do not install their own subscriber.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber honoring `RUST_LOG`, falling back to the
/// given directive. Safe to call more than once; later calls are no-ops
/// when a global subscriber is already set. `log`-macro records from the
/// persistence layer are bridged into the same pipeline.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing("info");
        init_tracing("debug");
    }
}
