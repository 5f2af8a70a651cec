//! Process configuration.
//!
//! The configuration is read once at startup and then passed down; the
//! annotation mode in particular is fixed for the lifetime of the process.
//!
//! # Environment Variables
//!
//! - `INTERVAL`: `true` selects interval annotations, anything else expiration times
//! - `DEBUG`: any non-empty value enables verbose diagnostics
//! - `KAIROS_ANNOTATION`: `reification`, `singleton`, `quads` or `none` (default: `reification`)
//! - `KAIROS_RETRY_DELAY_MS`: delay before re-running a round whose results are already stale (default: `1000`)

use crate::annotation::{AnnotationMode, AnnotationStrategy, TemporalAnnotator};
use std::time::Duration;
use thiserror::Error;

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KairosConfig {
    pub annotation_mode: AnnotationMode,
    pub annotation_strategy: AnnotationStrategy,
    /// Emit per-round diagnostics (round numbers, durations, wake times).
    pub verbose: bool,
    /// Minimal positive delay between rounds.
    pub min_retry_delay_ms: u64,
}

impl Default for KairosConfig {
    fn default() -> Self {
        Self {
            annotation_mode: AnnotationMode::Expiration,
            annotation_strategy: AnnotationStrategy::Reification,
            verbose: false,
            min_retry_delay_ms: Self::DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl KairosConfig {
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let annotation_mode = match lookup("INTERVAL").as_deref() {
            Some("true") => AnnotationMode::Interval,
            _ => AnnotationMode::Expiration,
        };
        let verbose = lookup("DEBUG").is_some_and(|value| !value.is_empty());

        let annotation_strategy = match lookup("KAIROS_ANNOTATION") {
            Some(value) => value.parse().map_err(|message| ConfigError::InvalidValue {
                name: "KAIROS_ANNOTATION".to_string(),
                message,
            })?,
            None => AnnotationStrategy::default(),
        };

        let min_retry_delay_ms = match lookup("KAIROS_RETRY_DELAY_MS") {
            Some(value) => match value.parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        name: "KAIROS_RETRY_DELAY_MS".to_string(),
                        message: format!("'{}' is not a positive number of milliseconds", value),
                    })
                }
                Ok(ms) => ms,
            },
            None => Self::DEFAULT_RETRY_DELAY_MS,
        };

        Ok(Self { annotation_mode, annotation_strategy, verbose, min_retry_delay_ms })
    }

    pub fn min_retry_delay(&self) -> Duration {
        Duration::from_millis(self.min_retry_delay_ms)
    }

    /// The annotator for this process' annotation mode.
    pub fn annotator(&self) -> TemporalAnnotator {
        TemporalAnnotator::new(self.annotation_mode)
    }

    /// Default `tracing` filter directive for this configuration.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "kairos=debug"
        } else {
            "kairos=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = KairosConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, KairosConfig::default());
        assert_eq!(config.min_retry_delay(), Duration::from_secs(1));
        assert_eq!(config.log_filter(), "kairos=info");
    }

    #[test]
    fn test_interval_and_debug() {
        let config = KairosConfig::from_lookup(lookup(&[
            ("INTERVAL", "true"),
            ("DEBUG", "1"),
            ("KAIROS_ANNOTATION", "quads"),
            ("KAIROS_RETRY_DELAY_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.annotation_mode, AnnotationMode::Interval);
        assert_eq!(config.annotation_strategy, AnnotationStrategy::Quads);
        assert!(config.verbose);
        assert_eq!(config.min_retry_delay_ms, 250);
        assert_eq!(config.annotator().mode(), AnnotationMode::Interval);
    }

    #[test]
    fn test_interval_requires_exact_true() {
        let config = KairosConfig::from_lookup(lookup(&[("INTERVAL", "yes")])).unwrap();
        assert_eq!(config.annotation_mode, AnnotationMode::Expiration);
    }

    #[test]
    fn test_invalid_values() {
        let err = KairosConfig::from_lookup(lookup(&[("KAIROS_RETRY_DELAY_MS", "0")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for KAIROS_RETRY_DELAY_MS: '0' is not a positive number of milliseconds"
        );
        assert!(KairosConfig::from_lookup(lookup(&[("KAIROS_ANNOTATION", "magic")])).is_err());
    }
}
