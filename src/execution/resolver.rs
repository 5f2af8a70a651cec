//! Static-data resolution for dynamic rows.
//!
//! For every eligible dynamic row the resolver either reuses cached static
//! rows for the row's correlation key, or materializes the static template
//! for the row, fetches it, and caches the full result before merging.

use super::session::StaticQuery;
use crate::cache::{CacheKey, ResultCache};
use crate::client::FragmentsConnection;
use crate::core::{merge_rows, Row};
use crate::error::Result;
use crate::query::{materialize, QueryComposer};
use futures_util::TryStreamExt;
use std::sync::Arc;

pub struct StaticDataResolver {
    connection: Arc<dyn FragmentsConnection>,
    composer: Arc<dyn QueryComposer>,
}

impl StaticDataResolver {
    pub fn new(
        connection: Arc<dyn FragmentsConnection>,
        composer: Arc<dyn QueryComposer>,
    ) -> Self {
        Self { connection, composer }
    }

    /// Merged rows for one dynamic `row`.
    ///
    /// Without a static query the row is returned as is. A failed fetch is
    /// returned as an error and leaves the cache untouched.
    ///
    /// Concurrent misses are not coalesced: two rows of the same round that
    /// share a cache key may both fetch before either result is cached.
    pub async fn resolve(
        &self,
        row: Row,
        static_query: Option<&StaticQuery>,
        cache: &ResultCache,
    ) -> Result<Vec<Row>> {
        let Some(static_query) = static_query else {
            return Ok(vec![row]);
        };

        let key = CacheKey::from_row(&row, &static_query.disjoint_variables);
        if let Some(cached) = cache.get(&key) {
            tracing::trace!(%key, "static cache hit");
            return Ok(merge_all(&row, &cached));
        }

        tracing::debug!(%key, "static cache miss, fetching");
        let bound = materialize(&row, &static_query.disjoint_variables, &static_query.template);
        let composed = self.composer.compose(&bound)?;
        let static_rows: Vec<Row> = self.connection.execute(&composed).try_collect().await?;
        let static_rows = cache.put(key, static_rows);
        Ok(merge_all(&row, &static_rows))
    }
}

/// Cross product of one dynamic row with the static rows; static bindings win.
fn merge_all(row: &Row, static_rows: &[Row]) -> Vec<Row> {
    static_rows.iter().map(|static_row| merge_rows(row, static_row)).collect()
}
