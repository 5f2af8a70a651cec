//! Session-scoped cache of static query results.
//!
//! Entries are keyed by the values a dynamic row binds to the disjoint
//! variables, so every dynamic row that correlates with the same static data
//! reuses one fetch. Entries live as long as the session; there is no eviction.

use crate::core::Row;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Cache key: the disjoint variables paired with their bound values, in the
/// order the variables were declared. An unbound variable is kept as `None`,
/// so "unbound" and "bound to the empty string" never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<(String, Option<String>)>);

impl CacheKey {
    pub fn from_row(row: &Row, disjoint_variables: &[String]) -> Self {
        CacheKey(
            disjoint_variables
                .iter()
                .map(|variable| (variable.clone(), row.get(variable).cloned()))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[(String, Option<String>)] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (variable, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match value {
                Some(value) => write!(f, "{}={:?}", variable, value)?,
                None => write!(f, "{}=UNBOUND", variable)?,
            }
        }
        Ok(())
    }
}

/// Static result rows per correlation key.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, Arc<Vec<Row>>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, key: &CacheKey) -> bool {
        self.entries.read().map(|entries| entries.contains_key(key)).unwrap_or(false)
    }

    /// Cached rows for `key`, in the order they were stored.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Vec<Row>>> {
        self.entries.read().ok().and_then(|entries| entries.get(key).cloned())
    }

    /// Store `rows` under `key`, replacing a previous entry.
    pub fn put(&self, key: CacheKey, rows: Vec<Row>) -> Arc<Vec<Row>> {
        let rows = Arc::new(rows);
        match self.entries.write() {
            Ok(mut entries) => {
                entries.insert(key, Arc::clone(&rows));
            }
            Err(e) => tracing::warn!("result cache lock poisoned, entry not stored: {}", e),
        }
        rows
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
