//! Turns a [`QueryTemplate`] into an executable SPARQL SELECT query.

use super::{GraphPattern, QueryTemplate};
use crate::core::{vocab, Triple};
use crate::error::{KairosError, Result};
use oxigraph::sparql::SparqlEvaluator;
use std::fmt::Write;

/// Executable form of a query template, handed to a fragments client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedQuery {
    pub sparql: String,
    pub variables: Vec<String>,
}

/// Renders query templates into executable queries.
pub trait QueryComposer: Send + Sync {
    fn compose(&self, template: &QueryTemplate) -> Result<ComposedQuery>;
}

/// Composer producing SPARQL 1.1 text.
///
/// The default prefix table (`rdf`, `xsd`, `tmp`, `sp`, `graphs`) is always
/// declared; template prefixes override it. With validation enabled, the
/// rendered text is parsed once so malformed templates fail here and not at
/// the endpoint.
#[derive(Debug, Clone)]
pub struct SparqlComposer {
    validate: bool,
}

impl Default for SparqlComposer {
    fn default() -> Self {
        Self { validate: true }
    }
}

impl SparqlComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_validation() -> Self {
        Self { validate: false }
    }

    /// Render `template` as SPARQL text.
    pub fn render(&self, template: &QueryTemplate) -> String {
        let mut prefixes = vocab::default_prefixes();
        prefixes.extend(template.prefixes.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut out = String::new();
        for (name, iri) in &prefixes {
            let _ = writeln!(out, "PREFIX {}: <{}>", name, iri);
        }

        out.push_str("SELECT ");
        if template.distinct {
            out.push_str("DISTINCT ");
        }
        if template.variables.is_empty() {
            out.push('*');
        } else {
            out.push_str(&template.variables.join(" "));
        }
        out.push_str(" WHERE {\n");
        for pattern in &template.where_clause {
            render_pattern(pattern, 1, &mut out);
        }
        out.push('}');
        out
    }
}

impl QueryComposer for SparqlComposer {
    fn compose(&self, template: &QueryTemplate) -> Result<ComposedQuery> {
        let sparql = self.render(template);
        if self.validate {
            SparqlEvaluator::new()
                .parse_query(&sparql)
                .map_err(|e| KairosError::Query(format!("{}\n{}", e, sparql)))?;
        }
        Ok(ComposedQuery { sparql, variables: template.variables.clone() })
    }
}

fn render_pattern(pattern: &GraphPattern, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match pattern {
        GraphPattern::Bgp { triples } => {
            for triple in triples {
                render_triple(triple, &indent, out);
            }
        }
        GraphPattern::Union { patterns } => {
            for (i, alternative) in patterns.iter().enumerate() {
                if i > 0 {
                    let _ = writeln!(out, "{}UNION", indent);
                }
                render_group(alternative, depth, out);
            }
        }
        GraphPattern::Group { .. } => render_group(pattern, depth, out),
    }
}

fn render_group(pattern: &GraphPattern, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{}{{", indent);
    match pattern {
        GraphPattern::Group { patterns } => {
            for inner in patterns {
                render_pattern(inner, depth + 1, out);
            }
        }
        other => render_pattern(other, depth + 1, out),
    }
    let _ = writeln!(out, "{}}}", indent);
}

fn render_triple(triple: &Triple, indent: &str, out: &mut String) {
    let body = format!(
        "{} {} {} .",
        render_term(&triple.subject),
        render_term(&triple.predicate),
        render_term(&triple.object)
    );
    match &triple.context {
        Some(context) => {
            let _ = writeln!(out, "{}GRAPH {} {{ {} }}", indent, render_term(context), body);
        }
        None => {
            let _ = writeln!(out, "{}{}", indent, body);
        }
    }
}

/// Full IRIs are bracketed; variables, blank nodes, literals, prefixed names
/// and bracketed IRIs are emitted as written.
fn render_term(term: &str) -> String {
    let is_full_iri = !term.starts_with('<')
        && !term.starts_with('"')
        && (term.contains("://") || term.starts_with("urn:") || term.starts_with("mailto:"));
    if is_full_iri {
        format!("<{}>", term)
    } else {
        term.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocab;

    #[test]
    fn test_render_basic_select() {
        let template = QueryTemplate::from_triples(
            vec!["?s".to_string(), "?o".to_string()],
            vec![Triple::new("?s", &format!("{}subject", vocab::RDF), "?o")],
        );
        let composed = SparqlComposer::new().compose(&template).unwrap();
        assert!(composed.sparql.contains("PREFIX tmp: <http://example.org/temporal#>"));
        assert!(composed.sparql.contains("SELECT ?s ?o WHERE {"));
        assert!(composed
            .sparql
            .contains("?s <http://www.w3.org/1999/02/22-rdf-syntax-ns#subject> ?o ."));
        assert_eq!(composed.variables, template.variables);
    }

    #[test]
    fn test_render_quads_and_union() {
        let template = QueryTemplate {
            variables: vec![],
            where_clause: vec![GraphPattern::Union {
                patterns: vec![
                    GraphPattern::Bgp { triples: vec![Triple::quad("?s", "?p", "?o", "?g")] },
                    GraphPattern::Bgp {
                        triples: vec![Triple::new("?g", vocab::EXPIRATION, "?final")],
                    },
                ],
            }],
            distinct: true,
            ..QueryTemplate::default()
        };
        let composed = SparqlComposer::new().compose(&template).unwrap();
        assert!(composed.sparql.contains("SELECT DISTINCT * WHERE"));
        assert!(composed.sparql.contains("GRAPH ?g { ?s ?p ?o . }"));
        assert!(composed.sparql.contains("UNION"));
    }

    #[test]
    fn test_template_prefix_overrides_default() {
        let mut template =
            QueryTemplate::from_triples(vec![], vec![Triple::new("?s", "tmp:x", "?o")]);
        template.prefixes.insert("tmp".to_string(), "http://other.org/#".to_string());
        let sparql = SparqlComposer::new().render(&template);
        assert!(sparql.contains("PREFIX tmp: <http://other.org/#>"));
        assert!(!sparql.contains("http://example.org/temporal#"));
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let template =
            QueryTemplate::from_triples(vec![], vec![Triple::new("?s", "undeclared:p", "?o")]);
        let result = SparqlComposer::new().compose(&template);
        assert!(matches!(result, Err(KairosError::Query(_))));
        assert!(SparqlComposer::without_validation().compose(&template).is_ok());
    }
}
