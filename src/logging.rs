//! Tracing subscriber setup.
//!
//! The subscriber is a registry with a level filter and one fmt layer,
//! either human-readable or JSON, written to stderr or to the test harness.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, TestWriter, writer::BoxMakeWriter};
use tracing_subscriber::prelude::*;

use crate::config::LoggingConfig;

const FALLBACK_LEVEL: &str = "info";

/// Where formatted events go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stderr,
    /// Captured per test by libtest.
    TestHarness,
}

impl LogOutput {
    fn writer(self) -> BoxMakeWriter {
        match self {
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::TestHarness => BoxMakeWriter::new(TestWriter::new()),
        }
    }
}

/// Level filter for `config`: `RUST_LOG` wins, then the configured level.
///
/// Returns the rejected directive alongside the filter when neither parses,
/// in which case the filter is `info`.
pub fn filter_for(config: &LoggingConfig) -> (EnvFilter, Option<String>) {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return (filter, None);
    }
    match EnvFilter::try_new(&config.level) {
        Ok(filter) => (filter, None),
        Err(_) => (EnvFilter::new(FALLBACK_LEVEL), Some(config.level.clone())),
    }
}

/// Install the process-wide subscriber writing to stderr.
///
/// Returns false if a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    init_logging_to(config, LogOutput::Stderr)
}

/// Install the process-wide subscriber writing to `output`.
pub fn init_logging_to(config: &LoggingConfig, output: LogOutput) -> bool {
    let (filter, rejected) = filter_for(config);
    let human = (!config.json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(output.writer())
    });
    let json = config
        .json
        .then(|| fmt::layer().json().with_writer(output.writer()));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(human)
        .with(json)
        .try_init()
        .is_ok();
    if installed {
        if let Some(level) = rejected {
            tracing::warn!(%level, fallback = FALLBACK_LEVEL, "invalid log level in config");
        }
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_level_falls_back_to_info() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "idcards=loud".to_string(),
            json: false,
        };
        let (filter, rejected) = filter_for(&config);
        assert_eq!(rejected.as_deref(), Some("idcards=loud"));
        assert_eq!(filter.to_string(), FALLBACK_LEVEL);
    }

    #[test]
    fn configured_level_is_used() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "idcards=debug,warn".to_string(),
            json: true,
        };
        let (filter, rejected) = filter_for(&config);
        assert!(rejected.is_none());
        assert!(filter.to_string().contains("idcards=debug"));
    }

    #[test]
    fn second_install_is_refused() {
        let config = LoggingConfig::default();
        init_logging_to(&config, LogOutput::TestHarness);
        assert!(!init_logging_to(&config, LogOutput::TestHarness));
    }
}
