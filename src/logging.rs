//! Logging setup for the bot process.
//!
//! Structured `tracing` output with noise suppression for chatty HTTP
//! internals. `RUST_LOG` overrides everything when set.

use tracing_subscriber::EnvFilter;

/// Noisy library modules that should be filtered to warn level.
///
/// These produce high-volume debug/trace logs (connection pooling, TLS
/// handshakes) without useful business context.
const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Build the default `EnvFilter` with noise suppression.
fn build_filter(log_level: &str) -> EnvFilter {
    // Environment variable takes priority (allows override)
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = String::from(log_level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }

    EnvFilter::new(&directives)
}

/// Initialize logging with the given base level (trace, debug, info, warn, error).
///
/// Noisy modules are pinned to `warn` unless overridden via `RUST_LOG`.
pub fn init_logging(log_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(log_level))
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_noise_suppression() {
        let filter = build_filter("debug");
        let rendered = filter.to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("hyper=warn"));
    }
}
