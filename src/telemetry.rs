//! Subscriber setup for binaries and tests embedding guardian-core.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! the caller's choice. `RUST_LOG` takes precedence over `default_directive`.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber. Returns `false` if one was already set.
pub fn init(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}
