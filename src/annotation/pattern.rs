//! Triple pattern introspection, binding and small query builders.

use super::TemporalAnnotator;
use crate::core::{is_variable, vocab, Row, Triple, FIELDS};
use crate::query::QueryTemplate;
use std::collections::BTreeMap;

/// The variables of a triple, in field order (subject, predicate, object, context).
pub fn get_variables(triple: &Triple) -> Vec<String> {
    FIELDS
        .iter()
        .filter_map(|field| triple.field(*field))
        .filter(|value| is_variable(value))
        .map(str::to_string)
        .collect()
}

/// Replace every variable of `triple` that has a non-empty binding.
pub fn bind_variables(triple: &mut Triple, bindings: &Row) {
    for field in FIELDS {
        let Some(value) = triple.field_mut(field) else { continue };
        if !is_variable(value) {
            continue;
        }
        if let Some(bound) = bindings.get(value.as_str()).filter(|b| !b.is_empty()) {
            *value = bound.clone();
        }
    }
}

/// IRI identifying a triple pattern on a fragments endpoint, e.g.
/// `<http://host/fragments?subject=..&predicate=..&object=..>`.
pub fn triple_to_iri(prefix: &str, triple: &Triple, with_brackets: bool) -> String {
    let iri = format!(
        "{}?subject={}&predicate={}&object={}",
        prefix,
        urlencoding::encode(&triple.subject),
        urlencoding::encode(&triple.predicate),
        urlencoding::encode(&triple.object)
    );
    if with_brackets {
        format!("<{}>", iri)
    } else {
        iri
    }
}

/// SELECT template over one basic graph pattern, projecting every variable
/// of `triples` once, in order of appearance.
pub fn singular_query(triples: Vec<Triple>, prefixes: &BTreeMap<String, String>) -> QueryTemplate {
    let mut variables: Vec<String> = Vec::new();
    for variable in triples.iter().flat_map(get_variables) {
        if !variables.contains(&variable) {
            variables.push(variable);
        }
    }

    let mut all_prefixes = BTreeMap::new();
    all_prefixes.insert("tmp".to_string(), vocab::TMP.to_string());
    all_prefixes.insert("sp".to_string(), vocab::SP.to_string());
    all_prefixes.extend(prefixes.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut template = QueryTemplate::from_triples(variables, triples);
    template.prefixes = all_prefixes;
    template
}

/// Query fetching the time annotation of a triple that acts as an implicit
/// graph identifier on the endpoint at `target`.
pub fn implicit_graph_query(
    annotator: &TemporalAnnotator,
    triple: &Triple,
    prefixes: &BTreeMap<String, String>,
    target: &str,
    suffix: Option<&str>,
) -> QueryTemplate {
    let subject = triple_to_iri(target, triple, true);
    singular_query(annotator.time_annotate(Vec::new(), Some(&subject), suffix), prefixes)
}

/// Same as [`implicit_graph_query`], with `bindings` applied to a copy of `triple` first.
pub fn materialized_implicit_graph_query(
    annotator: &TemporalAnnotator,
    bindings: &Row,
    triple: &Triple,
    prefixes: &BTreeMap<String, String>,
    target: &str,
    suffix: Option<&str>,
) -> QueryTemplate {
    let mut bound = triple.clone();
    bind_variables(&mut bound, bindings);
    implicit_graph_query(annotator, &bound, prefixes, target, suffix)
}
