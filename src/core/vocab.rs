//! Namespaces used by the temporal annotation patterns.

use std::collections::BTreeMap;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const TMP: &str = "http://example.org/temporal#";
pub const SP: &str = "http://example.org/singletonproperties#";
pub const GRAPHS: &str = "http://example.org/graphs#";

/// Datatype suffix attached to interval bounds.
pub const TIMESTAMP_SUFFIX: &str = "xsd:dateTimeStamp";

/// Prefixed names used inside annotation patterns.
pub const INTERVAL_INITIAL: &str = "tmp:intervalInitial";
pub const INTERVAL_FINAL: &str = "tmp:intervalFinal";
pub const EXPIRATION: &str = "tmp:expiration";

/// Variable name stems bound by annotation patterns; a per-pattern suffix follows.
pub const INITIAL_VARIABLE: &str = "?initial";
pub const FINAL_VARIABLE: &str = "?final";

/// Prefix table every composed query starts from.
pub fn default_prefixes() -> BTreeMap<String, String> {
    [("rdf", RDF), ("xsd", XSD), ("tmp", TMP), ("sp", SP), ("graphs", GRAPHS)]
        .into_iter()
        .map(|(name, iri)| (name.to_string(), iri.to_string()))
        .collect()
}
