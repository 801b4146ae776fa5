//! Tracing subscriber setup for binaries and tests embedding meshkv.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is the host's call. This helper covers the common case.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Install a global subscriber filtered by `RUST_LOG` (default `info`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init()?,
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // Whichever call wins, the other must report an error.
        let first = init_logging(LogFormat::Pretty);
        let second = init_logging(LogFormat::Json);
        assert!(first.is_err() || second.is_err());
    }
}
