//! Shared helpers for integration tests.

#![allow(dead_code)]

use futures_util::stream::{self, StreamExt};
use kairos::client::{FragmentsClient, FragmentsConnection, RowStream};
use kairos::core::{vocab, Row};
use kairos::query::ComposedQuery;
use kairos::KairosError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 2015-01-01T10:00:00Z
pub const T0: u64 = 1_420_106_400_000;

pub const DYNAMIC_SPARQL: &str = "SELECT * WHERE { ?x <http://ex.org/delay> ?delay }";

pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

pub fn vars(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// `xsd:dateTime` literal for `millis` since the epoch.
pub fn datetime(millis: u64) -> String {
    let time = chrono::DateTime::from_timestamp_millis(millis as i64).unwrap();
    format!("\"{}\"^^<{}dateTime>", time.to_rfc3339(), vocab::XSD)
}

pub fn dynamic_query() -> ComposedQuery {
    ComposedQuery { sparql: DYNAMIC_SPARQL.to_string(), variables: Vec::new() }
}

/// What the scripted endpoint answers.
#[derive(Default)]
pub struct Script {
    pub dynamic: Vec<Row>,
    /// Yield an error after this many dynamic rows.
    pub dynamic_fails_after: Option<usize>,
    /// Static answers, selected by a fragment the static query must contain.
    pub static_rows: Vec<(String, Vec<Row>)>,
    /// Static queries containing one of these fragments fail.
    pub static_failures: Vec<String>,
}

/// In-process endpoint that answers from a [`Script`] and counts requests.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<Script>>,
    dynamic_fetches: Arc<AtomicUsize>,
    static_fetches: Arc<AtomicUsize>,
    static_queries: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClient {
    pub fn new(script: Script) -> Self {
        Self { script: Arc::new(Mutex::new(script)), ..Self::default() }
    }

    pub fn set_dynamic(&self, rows: Vec<Row>) {
        self.script.lock().unwrap().dynamic = rows;
    }

    pub fn dynamic_fetches(&self) -> usize {
        self.dynamic_fetches.load(Ordering::SeqCst)
    }

    pub fn static_fetches(&self) -> usize {
        self.static_fetches.load(Ordering::SeqCst)
    }

    pub fn static_queries(&self) -> Vec<String> {
        self.static_queries.lock().unwrap().clone()
    }
}

impl FragmentsClient for ScriptedClient {
    fn connect(&self, _endpoint: &str) -> kairos::Result<Arc<dyn FragmentsConnection>> {
        Ok(Arc::new(self.clone()))
    }
}

impl FragmentsConnection for ScriptedClient {
    fn endpoint(&self) -> &str {
        "scripted"
    }

    fn execute(&self, query: &ComposedQuery) -> RowStream {
        let script = self.script.lock().unwrap();
        let items: Vec<kairos::Result<Row>> = if query.sparql == DYNAMIC_SPARQL {
            self.dynamic_fetches.fetch_add(1, Ordering::SeqCst);
            let mut items: Vec<_> = script.dynamic.iter().cloned().map(Ok).collect();
            if let Some(after) = script.dynamic_fails_after {
                items.truncate(after);
                items.push(Err(KairosError::Client("connection reset".to_string())));
            }
            items
        } else {
            self.static_fetches.fetch_add(1, Ordering::SeqCst);
            self.static_queries.lock().unwrap().push(query.sparql.clone());
            if script.static_failures.iter().any(|f| query.sparql.contains(f.as_str())) {
                vec![Err(KairosError::Client("fragment unavailable".to_string()))]
            } else {
                script
                    .static_rows
                    .iter()
                    .find(|(fragment, _)| query.sparql.contains(fragment.as_str()))
                    .map(|(_, rows)| rows.iter().cloned().map(Ok).collect())
                    .unwrap_or_default()
            }
        };
        stream::iter(items).boxed()
    }
}

/// Rows received by an `on_row` callback, with their round numbers.
pub type Emitted = Vec<(u64, Row)>;

/// `on_row` callback that records every row into `emitted`.
pub fn collect_into(emitted: &mut Emitted) -> impl FnMut(&Row, u64) + '_ {
    move |row, round| emitted.push((round, row.clone()))
}

pub fn sorted_values(emitted: &Emitted, variable: &str) -> Vec<String> {
    let mut values: Vec<String> =
        emitted.iter().filter_map(|(_, row)| row.get(variable).cloned()).collect();
    values.sort();
    values
}

pub fn keys_of(map: &HashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}
