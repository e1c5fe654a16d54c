//! Opt-in tracing setup for hosts embedding the scroll engine.
//!
//! The engine only emits `tracing` events. Hosts that already run a
//! subscriber need nothing from here.

/// Directive used when `RUST_LOG` is unset: engine events at `debug`,
/// everything else at `warn`.
pub const DEFAULT_DIRECTIVE: &str = "warn,scrolly_rs=debug";

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`, falling back
/// to [`DEFAULT_DIRECTIVE`].
///
/// Returns `false` when the `telemetry` feature is off or a global
/// subscriber is already installed.
#[must_use]
pub fn init_default_tracing() -> bool {
    init_tracing(DEFAULT_DIRECTIVE)
}

/// Same as [`init_default_tracing`] with a caller-chosen fallback directive.
#[must_use]
pub fn init_tracing(fallback_directive: &str) -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(fallback_directive))
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        let _ = fallback_directive;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_reports_existing_subscriber() {
        let first = init_default_tracing();
        assert!(!init_tracing("info"));
        if cfg!(not(feature = "telemetry")) {
            assert!(!first);
        }
    }
}
