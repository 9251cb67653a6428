//! Global tracing subscriber setup for the front doors.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Returns the filter directives used when `RUST_LOG` is unset.
///
/// The `desgen` target covers the library and the `desgen` binary.
#[must_use]
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "desgen=debug"
    } else {
        "desgen=info"
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the default directives. With `json` set, events are
/// written as one JSON object per line; otherwise as compact text.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: bool, json: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let text_layer = (!json).then(|| fmt::layer().with_target(false).compact());
    let json_layer = json.then(|| fmt::layer().json().with_current_span(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CapturedLogs;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "desgen=info");
        assert_eq!(default_directives(true), "desgen=debug");
    }

    #[test]
    fn test_default_directives_cover_binary_targets() {
        let logs = CapturedLogs::new();
        let subscriber = fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_env_filter(EnvFilter::new(default_directives(false)))
            .json()
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "desgen::api", "Design request accepted");
            tracing::debug!(target: "desgen::api", "Verbose detail");
            tracing::info!(target: "hyper::proto", "Foreign event");
        });

        assert_eq!(logs.events_with_message("Design request accepted").len(), 1);
        assert!(logs.events_with_message("Verbose detail").is_empty());
        assert!(logs.events_with_message("Foreign event").is_empty());
    }
}
