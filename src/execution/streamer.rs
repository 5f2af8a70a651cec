//! Streaming executor
//!
//! Runs a split query in rounds. Each round:
//!
//! 1. Streams the dynamic query and drops rows that are not valid at the round's start time
//! 2. Resolves static data for every eligible row, concurrently
//! 3. Emits merged rows, deduplicated per round when the query is DISTINCT
//! 4. Computes when the earliest emitted result goes stale
//!
//! A round finalizes once the dynamic stream has ended and every static lookup
//! has completed. Time-annotated sessions then sleep until the next result goes
//! stale and run another round; sessions without annotations stop after one.

use super::resolver::StaticDataResolver;
use super::session::SessionContext;
use crate::client::{FragmentsClient, FragmentsConnection};
use crate::core::Row;
use crate::error::Result;
use crate::query::{QueryComposer, SparqlComposer};
use crate::time::{SystemClock, TimeOracle, Timestamp};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Called once per completed round with the round duration in milliseconds.
pub type DurationCallback = Box<dyn Fn(u64) + Send + Sync>;

/// Projected values of an output row, used for deduplication.
type OutputKey = Vec<Option<String>>;

/// What happened during one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u64,
    pub emitted: usize,
    pub suppressed: usize,
    /// Dynamic rows dropped because they were not valid at the round start.
    pub ineligible: usize,
    pub static_failures: usize,
    pub dynamic_failed: bool,
    pub duration_ms: u64,
    /// Delay before the next round; `None` when the session is done.
    pub next_wake: Option<Duration>,
}

pub struct Streamer {
    connection: Arc<dyn FragmentsConnection>,
    resolver: StaticDataResolver,
    projected_variables: Vec<String>,
    clock: Arc<dyn TimeOracle>,
    duration_callback: DurationCallback,
    min_retry_delay: Duration,
    max_rounds: Option<u64>,
}

impl Streamer {
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

    /// Connect to `endpoint` and prepare a session projecting `projected_variables`.
    pub fn start(
        client: &dyn FragmentsClient,
        endpoint: &str,
        projected_variables: Vec<String>,
        duration_callback: impl Fn(u64) + Send + Sync + 'static,
    ) -> Result<Self> {
        let connection = client.connect(endpoint)?;
        let composer: Arc<dyn QueryComposer> = Arc::new(SparqlComposer::new());
        Ok(Self {
            resolver: StaticDataResolver::new(Arc::clone(&connection), composer),
            connection,
            projected_variables,
            clock: Arc::new(SystemClock),
            duration_callback: Box::new(duration_callback),
            min_retry_delay: Self::DEFAULT_RETRY_DELAY,
            max_rounds: None,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeOracle>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_composer(mut self, composer: Arc<dyn QueryComposer>) -> Self {
        self.resolver = StaticDataResolver::new(Arc::clone(&self.connection), composer);
        self
    }

    pub fn with_min_retry_delay(mut self, delay: Duration) -> Self {
        if !delay.is_zero() {
            self.min_retry_delay = delay;
        }
        self
    }

    /// Stop [`Streamer::run`] after this many rounds.
    pub fn with_max_rounds(mut self, max_rounds: u64) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    pub fn clock(&self) -> &Arc<dyn TimeOracle> {
        &self.clock
    }

    /// Run rounds until the session is done, `max_rounds` is reached or `stop`
    /// flips to `true` (or its sender is dropped). Returns the number of rounds run.
    pub async fn run<F>(
        &self,
        context: &mut SessionContext,
        mut on_row: F,
        mut stop: watch::Receiver<bool>,
    ) -> u64
    where
        F: FnMut(&Row, u64),
    {
        let mut started_at = self.clock.now();
        let mut rounds = 0;
        loop {
            if *stop.borrow() {
                tracing::info!("stop requested, ending session");
                break;
            }

            let summary = self.run_round(context, &mut on_row, started_at).await;
            rounds += 1;

            let Some(delay) = summary.next_wake else { break };
            if self.max_rounds.is_some_and(|max| rounds >= max) {
                tracing::info!(rounds, "round limit reached, ending session");
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        tracing::info!("stop requested, ending session");
                        break;
                    }
                }
            }
            started_at = self.clock.now();
        }
        rounds
    }

    /// Execute one round of `context`, evaluating temporal validity at `started_at`.
    pub async fn run_round<F>(
        &self,
        context: &mut SessionContext,
        on_row: &mut F,
        started_at: Timestamp,
    ) -> RoundSummary
    where
        F: FnMut(&Row, u64),
    {
        context.round_counter += 1;
        context.update_at = None;
        let round = context.round_counter;
        tracing::debug!(round, "starting round");

        let mut summary = RoundSummary {
            round,
            emitted: 0,
            suppressed: 0,
            ineligible: 0,
            static_failures: 0,
            dynamic_failed: false,
            duration_ms: 0,
            next_wake: None,
        };

        let static_query = context.static_query.clone();
        let cache = Arc::clone(context.cache());
        let resolver = &self.resolver;

        let mut dynamic = self.connection.execute(&context.dynamic_query);
        let mut dynamic_open = true;
        let mut lookups = FuturesUnordered::new();
        let mut updates = RoundUpdates::default();

        loop {
            tokio::select! {
                next = dynamic.next(), if dynamic_open => match next {
                    Some(Ok(row)) => {
                        if self.clock.are_all_current(&row, started_at) {
                            let update_time = self.clock.minimum_update_time(&row);
                            let static_query = static_query.clone();
                            let cache = Arc::clone(&cache);
                            lookups.push(async move {
                                let resolved =
                                    resolver.resolve(row, static_query.as_deref(), &cache).await;
                                (update_time, resolved)
                            });
                        } else {
                            summary.ineligible += 1;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(round, "error while streaming dynamic results: {}", e);
                        summary.dynamic_failed = true;
                        dynamic_open = false;
                        lookups.clear();
                    }
                    None => dynamic_open = false,
                },
                Some((update_time, resolved)) = lookups.next(), if !lookups.is_empty() => {
                    match resolved {
                        Ok(rows) => {
                            for merged in &rows {
                                self.output(
                                    merged,
                                    update_time,
                                    context.distinct,
                                    round,
                                    &mut updates,
                                    &mut summary,
                                    on_row,
                                );
                            }
                        }
                        Err(e) => {
                            tracing::warn!(round, "error while streaming static results: {}", e);
                            summary.static_failures += 1;
                        }
                    }
                }
                else => break,
            }
        }

        context.update_at = updates
            .distinct
            .values()
            .fold(updates.emitted, |acc, time| self.clock.combine_update_time(acc, *time));
        self.finalize(context, started_at, summary)
    }

    #[allow(clippy::too_many_arguments)]
    fn output<F>(
        &self,
        merged: &Row,
        update_time: Option<Timestamp>,
        distinct: bool,
        round: u64,
        updates: &mut RoundUpdates,
        summary: &mut RoundSummary,
        on_row: &mut F,
    ) where
        F: FnMut(&Row, u64),
    {
        let (key, projected) = self.project(merged);
        if !distinct {
            on_row(&projected, round);
            summary.emitted += 1;
            updates.emitted = self.clock.combine_update_time(updates.emitted, update_time);
            return;
        }
        match updates.distinct.entry(key) {
            Entry::Occupied(mut seen) => {
                summary.suppressed += 1;
                let recorded = seen.get_mut();
                *recorded = latest(*recorded, update_time);
            }
            Entry::Vacant(slot) => {
                on_row(&projected, round);
                summary.emitted += 1;
                slot.insert(update_time);
            }
        }
    }

    fn project(&self, merged: &Row) -> (OutputKey, Row) {
        if self.projected_variables.is_empty() {
            let mut pairs: Vec<(&String, &String)> = merged.iter().collect();
            pairs.sort();
            let key = pairs
                .iter()
                .flat_map(|(k, v)| [Some((*k).clone()), Some((*v).clone())])
                .collect();
            return (key, merged.clone());
        }
        let key = self.projected_variables.iter().map(|v| merged.get(v).cloned()).collect();
        let projected = self
            .projected_variables
            .iter()
            .filter_map(|v| merged.get(v).map(|value| (v.clone(), value.clone())))
            .collect();
        (key, projected)
    }

    fn finalize(
        &self,
        context: &mut SessionContext,
        started_at: Timestamp,
        mut summary: RoundSummary,
    ) -> RoundSummary {
        let finished_at = self.clock.now();
        summary.duration_ms = finished_at.saturating_sub(started_at);
        (self.duration_callback)(summary.duration_ms);
        tracing::debug!(
            round = summary.round,
            emitted = summary.emitted,
            "client request time: {:.3} seconds",
            summary.duration_ms as f64 / 1000.0
        );

        if !context.has_time_annotation {
            tracing::info!(round = summary.round, "no valid context time found, stopping");
            return summary;
        }

        let update_at = *context.update_at.get_or_insert(finished_at);
        let timeout = update_at.saturating_sub(finished_at);
        let delay = if timeout == 0 {
            tracing::debug!(round = summary.round, "results already stale, retrying shortly");
            self.min_retry_delay
        } else {
            tracing::debug!(
                round = summary.round,
                "will update in {:.3}s",
                timeout as f64 / 1000.0
            );
            Duration::from_millis(timeout)
        };
        summary.next_wake = Some(delay);
        summary
    }
}

/// Update times collected while a round emits rows.
#[derive(Default)]
struct RoundUpdates {
    /// Earliest update time over rows emitted without deduplication.
    emitted: Option<Timestamp>,
    /// Latest update time per distinct output; `None` means it never goes stale.
    distinct: HashMap<OutputKey, Option<Timestamp>>,
}

/// Later of two update times, where `None` (no expiry) outlasts any time.
fn latest(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        _ => None,
    }
}
