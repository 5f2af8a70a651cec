//! Query templates
//!
//! A [`QueryTemplate`] is the structured form of a SELECT query that the
//! executor manipulates before it is turned into text:
//!
//! - **variables** - the projection, in order
//! - **where** - a tree of [`GraphPattern`]s (basic graph patterns, unions, groups)
//! - **prefixes** - prefix name to namespace IRI
//!
//! Templates serialize to the same JSON shape as the `sparqljs` query objects
//! (`{"type": "bgp", "triples": [...]}`), so split queries produced by external
//! rewriters can be loaded directly.

use crate::core::Triple;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod composer;
pub mod materializer;

pub use composer::{ComposedQuery, QueryComposer, SparqlComposer};
pub use materializer::materialize;

/// Structured SELECT query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryTemplate {
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(rename = "where", default)]
    pub where_clause: Vec<GraphPattern>,
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
    #[serde(default)]
    pub distinct: bool,
}

/// Node of a WHERE tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphPattern {
    /// Conjunction of triple patterns.
    Bgp { triples: Vec<Triple> },
    /// Alternatives; any of the patterns may match.
    Union { patterns: Vec<GraphPattern> },
    /// A braced sequence of patterns.
    Group { patterns: Vec<GraphPattern> },
}

impl QueryTemplate {
    /// Template with a single basic graph pattern.
    pub fn from_triples(variables: Vec<String>, triples: Vec<Triple>) -> Self {
        Self {
            variables,
            where_clause: vec![GraphPattern::Bgp { triples }],
            ..Self::default()
        }
    }

    /// Every triple of the WHERE tree, depth first.
    pub fn triples(&self) -> Vec<&Triple> {
        let mut out = Vec::new();
        for pattern in &self.where_clause {
            pattern.collect_triples(&mut out);
        }
        out
    }
}

impl GraphPattern {
    fn collect_triples<'a>(&'a self, out: &mut Vec<&'a Triple>) {
        match self {
            GraphPattern::Bgp { triples } => out.extend(triples.iter()),
            GraphPattern::Union { patterns } | GraphPattern::Group { patterns } => {
                for pattern in patterns {
                    pattern.collect_triples(out);
                }
            }
        }
    }
}
