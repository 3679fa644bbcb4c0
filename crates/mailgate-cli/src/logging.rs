//! Log sink setup: stdout by default, or an append-only file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber.
///
/// Verbosity comes from `RUST_LOG`. An unset or malformed `RUST_LOG` falls
/// back to `info`; a malformed one is reported as a warning once the
/// subscriber is up.
pub fn init(log_file: Option<&Path>) -> anyhow::Result<()> {
    let raw = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, rejected) = env_filter(raw.as_deref());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stdout).init(),
    }

    if let Some(e) = rejected {
        tracing::warn!(
            error = %e,
            value = raw.as_deref().unwrap_or_default(),
            "ignoring invalid {}, logging at {DEFAULT_FILTER}",
            EnvFilter::DEFAULT_ENV
        );
    }
    Ok(())
}

/// Parse `raw` as a filter directive, falling back to [`DEFAULT_FILTER`].
/// Returns the parse error alongside the fallback when `raw` was rejected.
fn env_filter(raw: Option<&str>) -> (EnvFilter, Option<ParseError>) {
    match raw.filter(|r| !r.trim().is_empty()) {
        None => (EnvFilter::new(DEFAULT_FILTER), None),
        Some(r) => match EnvFilter::try_new(r) {
            Ok(filter) => (filter, None),
            Err(e) => (EnvFilter::new(DEFAULT_FILTER), Some(e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_filter_defaults_to_info() {
        let (_, rejected) = env_filter(None);
        assert!(rejected.is_none());
        let (_, rejected) = env_filter(Some("  "));
        assert!(rejected.is_none());
    }

    #[test]
    fn valid_filter_is_used() {
        let (_, rejected) = env_filter(Some("mailgate_notify=debug,warn"));
        assert!(rejected.is_none());
    }

    #[test]
    fn malformed_filter_is_reported() {
        let (_, rejected) = env_filter(Some("mailgate=notalevel"));
        assert!(rejected.is_some());
    }
}
