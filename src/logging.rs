//! Subscriber setup for binaries and tests. The library itself only emits
//! `tracing` events and never installs a subscriber.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Install a stdout fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info"` or `"yatas=debug"`).
///
/// Returns `false` when a global subscriber was already set; that is not an error.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_tracing("warn");
        assert!(!init_tracing("debug"));
    }
}
