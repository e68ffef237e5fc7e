//! Structured logging setup.
//!
//! `RUST_LOG` wins when set. Otherwise the filter comes from the `-v` count:
//! warnings only by default, then `info`, `debug`, `trace` for this crate.
//! Other crates stay at `warn`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AppError;

pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "farm_yield=warn,warn",
        1 => "farm_yield=info,warn",
        2 => "farm_yield=debug,warn",
        _ => "farm_yield=trace,warn",
    }
}

/// Install the global stderr subscriber.
pub fn init(verbosity: u8) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| AppError::new(4, format!("Failed to initialize logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_crate_level_only() {
        assert_eq!(default_directive(0), "farm_yield=warn,warn");
        assert_eq!(default_directive(2), "farm_yield=debug,warn");
        assert_eq!(default_directive(9), "farm_yield=trace,warn");
        for v in 0..4 {
            assert!(EnvFilter::try_new(default_directive(v)).is_ok());
        }
    }
}
