//! Time utilities
//!
//! Temporal eligibility of a result row is read from the annotation variables
//! the annotation patterns bind: every `?initial<suffix>` must lie at or before
//! the evaluation time and every `?final<suffix>` at or after it. Suffixes are
//! empty or decimal, so `?finalStop` is an ordinary variable. The earliest
//! final time of a row is the moment it goes stale.

use crate::core::{vocab, Row};
use crate::error::{KairosError, Result};
use chrono::{DateTime, NaiveDateTime};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Clock plus the temporal interpretation of result rows.
///
/// Only [`TimeOracle::now`] is required; the row checks have default
/// implementations based on the annotation variables.
pub trait TimeOracle: Send + Sync {
    fn now(&self) -> Timestamp;

    /// True iff every annotation in `row` is valid at `as_of`.
    fn are_all_current(&self, row: &Row, as_of: Timestamp) -> bool {
        for (variable, value) in row {
            let Some(kind) = annotation_kind(variable) else { continue };
            let time = match parse_timestamp(value) {
                Ok(time) => time,
                Err(e) => {
                    tracing::debug!("row rejected, {} is not a time: {}", variable, e);
                    return false;
                }
            };
            let current = match kind {
                AnnotationKind::Initial => time <= as_of,
                AnnotationKind::Final => as_of <= time,
            };
            if !current {
                return false;
            }
        }
        true
    }

    /// Earliest final time in `row`, `None` if it carries none.
    fn minimum_update_time(&self, row: &Row) -> Option<Timestamp> {
        row.iter()
            .filter(|(variable, _)| annotation_kind(variable) == Some(AnnotationKind::Final))
            .filter_map(|(_, value)| parse_timestamp(value).ok())
            .min()
    }

    /// Keep the earlier of two optional update times.
    fn combine_update_time(
        &self,
        current: Option<Timestamp>,
        candidate: Option<Timestamp>,
    ) -> Option<Timestamp> {
        match (current, candidate) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnnotationKind {
    Initial,
    Final,
}

fn annotation_kind(variable: &str) -> Option<AnnotationKind> {
    let (kind, suffix) = if let Some(suffix) = variable.strip_prefix(vocab::INITIAL_VARIABLE) {
        (AnnotationKind::Initial, suffix)
    } else if let Some(suffix) = variable.strip_prefix(vocab::FINAL_VARIABLE) {
        (AnnotationKind::Final, suffix)
    } else {
        return None;
    };
    suffix.bytes().all(|b| b.is_ascii_digit()).then_some(kind)
}

/// Parse an annotation value such as
/// `"2015-01-01T10:00:00Z"^^<http://www.w3.org/2001/XMLSchema#dateTime>`.
///
/// The lexical form may be RFC 3339 or a date-time without offset, which is read as UTC.
pub fn parse_timestamp(value: &str) -> Result<Timestamp> {
    let lexical = lexical_form(value);
    let millis = match DateTime::parse_from_rfc3339(lexical) {
        Ok(time) => time.timestamp_millis(),
        Err(_) => NaiveDateTime::parse_from_str(lexical, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| KairosError::Time(format!("'{}': {}", value, e)))?
            .and_utc()
            .timestamp_millis(),
    };
    Timestamp::try_from(millis)
        .map_err(|_| KairosError::Time(format!("'{}' lies before the epoch", value)))
}

fn lexical_form(value: &str) -> &str {
    let Some(rest) = value.strip_prefix('"') else { return value.trim() };
    match rest.find('"') {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Wall clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeOracle for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as Timestamp
    }
}

/// Clock that only moves when told to. Used for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(at: Timestamp) -> Self {
        Self { now: AtomicU64::new(at) }
    }

    pub fn set(&self, at: Timestamp) {
        self.now.store(at, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeOracle for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: Timestamp = 1_420_106_400_000; // 2015-01-01T10:00:00Z

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let typed = "\"2015-01-01T10:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime>";
        assert_eq!(parse_timestamp(typed).unwrap(), T0);
        let offset = "\"2015-01-01T11:00:00+01:00\"^^xsd:dateTimeStamp";
        assert_eq!(parse_timestamp(offset).unwrap(), T0);
        assert_eq!(parse_timestamp("2015-01-01T10:00:00").unwrap(), T0);
        assert_eq!(parse_timestamp("2015-01-01T10:00:05.5Z").unwrap(), T0 + 5_500);
        assert!(matches!(parse_timestamp("\"tomorrow\""), Err(KairosError::Time(_))));
    }

    #[test]
    fn test_are_all_current() {
        let clock = ManualClock::new(T0);
        let annotated = row(&[
            ("?train", "http://ex.org/t1"),
            ("?initial0", "\"2015-01-01T09:00:00Z\""),
            ("?final0", "\"2015-01-01T10:00:05Z\""),
        ]);
        assert!(clock.are_all_current(&annotated, T0));
        assert!(clock.are_all_current(&annotated, T0 + 5_000));
        assert!(!clock.are_all_current(&annotated, T0 + 5_001));
        assert!(!clock.are_all_current(&annotated, T0 - 3_600_001));
        assert!(clock.are_all_current(&row(&[("?x", "plain")]), T0));
        assert!(!clock.are_all_current(&row(&[("?final", "\"soon\"")]), T0));
    }

    #[test]
    fn test_variables_sharing_an_annotation_stem_are_not_annotations() {
        let clock = ManualClock::new(T0);
        let annotated = row(&[
            ("?x", "http://ex.org/t1"),
            ("?finalStop", "<http://ex.org/station/Gent>"),
            ("?initialCapacity", "\"300\""),
            ("?final0", "\"2015-01-01T10:00:05Z\""),
        ]);
        assert!(clock.are_all_current(&annotated, T0));
        assert_eq!(clock.minimum_update_time(&annotated), Some(T0 + 5_000));
        assert_eq!(annotation_kind("?final"), Some(AnnotationKind::Final));
        assert_eq!(annotation_kind("?initial12"), Some(AnnotationKind::Initial));
        assert_eq!(annotation_kind("?final1b"), None);
    }

    #[test]
    fn test_minimum_update_time() {
        let clock = SystemClock;
        let annotated = row(&[
            ("?final0", "\"2015-01-01T10:00:09Z\""),
            ("?final1", "\"2015-01-01T10:00:05Z\""),
            ("?initial1", "\"2015-01-01T09:00:00Z\""),
        ]);
        assert_eq!(clock.minimum_update_time(&annotated), Some(T0 + 5_000));
        assert_eq!(clock.minimum_update_time(&row(&[("?x", "y")])), None);
    }

    #[test]
    fn test_combine_update_time() {
        let clock = SystemClock;
        assert_eq!(clock.combine_update_time(None, None), None);
        assert_eq!(clock.combine_update_time(None, Some(3)), Some(3));
        assert_eq!(clock.combine_update_time(Some(2), None), Some(2));
        assert_eq!(clock.combine_update_time(Some(5), Some(3)), Some(3));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now(), 15);
        clock.set(1);
        assert_eq!(clock.now(), 1);
    }
}
