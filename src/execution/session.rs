//! Per-session state of a split query.

use crate::annotation::{AnnotationMode, AnnotationStrategy, TemporalAnnotator};
use crate::cache::ResultCache;
use crate::core::{vocab, Triple};
use crate::error::{KairosError, Result};
use crate::query::{ComposedQuery, GraphPattern, QueryComposer, QueryTemplate};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The cacheable half of a split query.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticQuery {
    pub template: QueryTemplate,
    /// Variables shared with the dynamic half; they correlate rows and key the cache.
    pub disjoint_variables: Vec<String>,
}

/// State owned by one streaming session and carried from round to round.
#[derive(Debug)]
pub struct SessionContext {
    pub dynamic_query: ComposedQuery,
    pub static_query: Option<Arc<StaticQuery>>,
    pub distinct: bool,
    pub has_time_annotation: bool,
    /// Earliest moment an emitted result of the last round goes stale.
    pub update_at: Option<Timestamp>,
    pub round_counter: u64,
    cache: Arc<ResultCache>,
}

impl SessionContext {
    pub fn new(dynamic_query: ComposedQuery) -> Self {
        Self {
            dynamic_query,
            static_query: None,
            distinct: false,
            has_time_annotation: false,
            update_at: None,
            round_counter: 0,
            cache: Arc::new(ResultCache::new()),
        }
    }

    pub fn with_static(mut self, template: QueryTemplate, disjoint_variables: Vec<String>) -> Self {
        self.static_query = Some(Arc::new(StaticQuery { template, disjoint_variables }));
        self
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn time_annotated(mut self, has_time_annotation: bool) -> Self {
        self.has_time_annotation = has_time_annotation;
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }
}

/// JSON description of a split query, as produced by a query rewriter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDescription {
    pub dynamic: QueryTemplate,
    #[serde(rename = "static", default)]
    pub static_part: Option<QueryTemplate>,
    #[serde(default)]
    pub disjoint_variables: Vec<String>,
    /// Final output projection; defaults to the dynamic and static projections combined.
    #[serde(default)]
    pub projected_variables: Vec<String>,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub time_annotated: bool,
    /// Dynamic facts still to be wrapped in temporal annotation patterns.
    #[serde(default)]
    pub annotated: Vec<Triple>,
}

impl SessionDescription {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The output projection of the session.
    pub fn projection(&self) -> Vec<String> {
        if !self.projected_variables.is_empty() {
            return self.projected_variables.clone();
        }
        let mut projection = self.dynamic.variables.clone();
        for variable in self.static_part.iter().flat_map(|s| s.variables.iter()) {
            if !projection.contains(variable) {
                projection.push(variable.clone());
            }
        }
        projection
    }

    /// Add the annotation patterns of every `annotated` fact to the dynamic query.
    ///
    /// Fact `i` binds `?final<i>` (and `?initial<i>` for intervals), which are
    /// added to an explicit dynamic projection. With [`AnnotationStrategy::Noop`]
    /// the facts are added unannotated and the session stays one-shot.
    pub fn apply_annotations(
        &mut self,
        annotator: &TemporalAnnotator,
        strategy: AnnotationStrategy,
    ) {
        if self.annotated.is_empty() {
            return;
        }
        let annotated = std::mem::take(&mut self.annotated);
        let mut triples = Vec::new();
        for (index, fact) in annotated.iter().enumerate() {
            let suffix = index.to_string();
            triples.extend(annotator.annotate(strategy, fact, Some(&suffix)));
            if strategy == AnnotationStrategy::Noop || self.dynamic.variables.is_empty() {
                continue;
            }
            if annotator.mode() == AnnotationMode::Interval {
                self.dynamic.variables.push(format!("{}{}", vocab::INITIAL_VARIABLE, suffix));
            }
            self.dynamic.variables.push(format!("{}{}", vocab::FINAL_VARIABLE, suffix));
        }
        self.dynamic.where_clause.push(GraphPattern::Bgp { triples });
        if strategy != AnnotationStrategy::Noop {
            self.time_annotated = true;
        }
    }

    /// Compose the dynamic query and build the session context.
    pub fn into_context(self, composer: &dyn QueryComposer) -> Result<SessionContext> {
        if self.static_part.is_some() && self.disjoint_variables.is_empty() {
            return Err(KairosError::Config(
                "a static query needs at least one disjoint variable".to_string(),
            ));
        }
        let dynamic_query = composer.compose(&self.dynamic)?;
        let mut context = SessionContext::new(dynamic_query)
            .distinct(self.distinct)
            .time_annotated(self.time_annotated);
        if let Some(static_part) = self.static_part {
            context = context.with_static(static_part, self.disjoint_variables);
        }
        Ok(context)
    }
}
