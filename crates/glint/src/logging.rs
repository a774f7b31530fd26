//! Logging bootstrap for GLINT binaries.
//!
//! Writes to stdout through `tracing-subscriber`. Set `GLINT_DEBUG=1` to
//! enable debug output for the glint crates; `RUST_LOG` replaces the
//! filter entirely when set.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Filter used when `GLINT_DEBUG` is set.
pub const DEBUG_DIRECTIVE: &str = "info,glint=debug,glint_core=debug,glint_effects=debug";

/// Filter used otherwise.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Picks the filter directive for the given debug switch.
#[must_use]
pub const fn filter_directive(debug_logging: bool) -> &'static str {
    if debug_logging {
        DEBUG_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    }
}

/// Installs the global subscriber.
///
/// Returns `false` if one was already installed (e.g. by a test harness);
/// the existing subscriber is left in place.
pub fn init() -> bool {
    let debug_logging = std::env::var("GLINT_DEBUG").is_ok_and(|v| v != "0");

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(debug_logging)));

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let installed = tracing_subscriber::registry()
        .with(stdout_layer)
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(debug_logging, "GLINT logging initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(false), "info");
        assert!(filter_directive(true).contains("glint_core=debug"));
        assert!(EnvFilter::try_new(DEBUG_DIRECTIVE).is_ok());
    }

    #[test]
    fn test_second_init_is_harmless() {
        init();
        assert!(!init());
    }
}
