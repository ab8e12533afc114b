//! Tracing initialisation for the `kairox` binary.
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default verbosity when neither `RUST_LOG` nor `KAIROX_LOG_LEVEL` is set
pub const DEFAULT_LEVEL: &str = "info";

/// Filter directive: `RUST_LOG` wins, then `KAIROX_LOG_LEVEL`, then [`DEFAULT_LEVEL`]
pub fn filter_directive(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["RUST_LOG", "KAIROX_LOG_LEVEL"]
        .into_iter()
        .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

/// Install the global subscriber. Only the first call takes effect.
pub fn init_tracing() {
    let directive = filter_directive(|name| std::env::var(name).ok());
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins() {
        let directive = filter_directive(|name| match name {
            "RUST_LOG" => Some("kairox_core=trace".to_string()),
            "KAIROX_LOG_LEVEL" => Some("warn".to_string()),
            _ => None,
        });
        assert_eq!(directive, "kairox_core=trace");
    }

    #[test]
    fn test_level_fallbacks() {
        let directive = filter_directive(|name| (name == "KAIROX_LOG_LEVEL").then(|| "debug".to_string()));
        assert_eq!(directive, "debug");
        assert_eq!(filter_directive(|_| None), DEFAULT_LEVEL);
    }
}
