//! Tracing subscriber setup
//!
//! The library only emits `tracing` events. Applications embedding it call
//! `init` once; `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global fmt subscriber. Returns `false` if one was already
/// installed, which is harmless (tests call this repeatedly).
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init(&config);
        assert!(!init(&config));
    }
}
