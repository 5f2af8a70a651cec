//! Binds the correlated variables of a dynamic result row into the static
//! query template, producing the sub-query that fetches the matching static data.

use super::{GraphPattern, QueryTemplate};
use crate::core::{is_blank_node, Row, Triple, FIELDS};

/// Instantiate `template` for one dynamic `row`.
///
/// The disjoint variables are removed from the projection and every occurrence
/// of them inside the WHERE tree is replaced by the value bound in `row`.
/// The input template is left untouched; a new tree is returned, so lookups
/// for different rows never share bindings.
pub fn materialize(
    row: &Row,
    disjoint_variables: &[String],
    template: &QueryTemplate,
) -> QueryTemplate {
    QueryTemplate {
        variables: template
            .variables
            .iter()
            .filter(|variable| !disjoint_variables.contains(variable))
            .cloned()
            .collect(),
        where_clause: template
            .where_clause
            .iter()
            .map(|pattern| bind_pattern(row, disjoint_variables, pattern))
            .collect(),
        prefixes: template.prefixes.clone(),
        distinct: template.distinct,
    }
}

fn bind_pattern(row: &Row, disjoint_variables: &[String], pattern: &GraphPattern) -> GraphPattern {
    match pattern {
        GraphPattern::Bgp { triples } => GraphPattern::Bgp {
            triples: triples.iter().map(|t| bind_triple(row, disjoint_variables, t)).collect(),
        },
        GraphPattern::Union { patterns } => GraphPattern::Union {
            patterns: patterns.iter().map(|p| bind_pattern(row, disjoint_variables, p)).collect(),
        },
        GraphPattern::Group { patterns } => GraphPattern::Group {
            patterns: patterns.iter().map(|p| bind_pattern(row, disjoint_variables, p)).collect(),
        },
    }
}

fn bind_triple(row: &Row, disjoint_variables: &[String], triple: &Triple) -> Triple {
    let mut bound = triple.clone();
    for field in FIELDS {
        let Some(value) = bound.field_mut(field) else { continue };
        if !disjoint_variables.contains(value) {
            continue;
        }
        if let Some(binding) = row.get(value.as_str()) {
            *value = as_term(binding);
        }
    }
    bound
}

/// Render a bound value as a query term: IRIs are wrapped in angle brackets,
/// literals, blank nodes and already bracketed IRIs are kept.
fn as_term(value: &str) -> String {
    if value.starts_with('"') || value.starts_with('<') || is_blank_node(value) {
        value.to_string()
    } else {
        format!("<{}>", value)
    }
}
