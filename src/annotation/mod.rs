//! Temporal annotation patterns
//!
//! Facts on a temporal fragments endpoint carry their validity window as RDF
//! metadata. This module builds the triple patterns that retrieve that
//! metadata next to the fact itself, with four interchangeable strategies:
//!
//! - **Reification** - `_:stmt rdf:subject/predicate/object` plus the annotation on `_:stmt`
//! - **Singleton properties** - a fresh `?spN` property that is `sp:singletonPropertyOf` the predicate
//! - **Quads** - the fact lives in a named graph `?stmtN` which carries the annotation
//! - **Noop** - temporal filtering disabled
//!
//! The annotation itself is either an interval (`tmp:intervalInitial` and
//! `tmp:intervalFinal`) or a single `tmp:expiration`, chosen once per process
//! through [`AnnotationMode`].

use crate::core::{add_suffix, vocab, BlankNodeEntry, BlankObject, Triple};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod pattern;

pub use pattern::{
    bind_variables, get_variables, implicit_graph_query, materialized_implicit_graph_query,
    singular_query, triple_to_iri,
};

/// Shape of the validity metadata attached to a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationMode {
    /// Facts hold between an initial and a final time.
    Interval,
    /// Facts hold until an expiration time.
    #[default]
    Expiration,
}

/// How the annotation is attached to a triple pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationStrategy {
    #[default]
    Reification,
    SingletonProperties,
    Quads,
    Noop,
}

impl FromStr for AnnotationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reification" => Ok(AnnotationStrategy::Reification),
            "singleton" | "singletonproperties" | "singleton-properties" => {
                Ok(AnnotationStrategy::SingletonProperties)
            }
            "quads" | "graphs" => Ok(AnnotationStrategy::Quads),
            "none" | "noop" => Ok(AnnotationStrategy::Noop),
            other => Err(format!("unknown annotation strategy '{}'", other)),
        }
    }
}

/// Source of fresh statement labels (`_:stmtN`) and singleton property
/// variables (`?spN`).
///
/// One generator is owned per query-building session; labels are unique
/// within that generator only.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    statements: AtomicU64,
    singleton_properties: AtomicU64,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_statement(&self) -> String {
        format!("_:stmt{}", self.statements.fetch_add(1, Ordering::Relaxed))
    }

    pub fn next_singleton_property(&self) -> String {
        format!("?sp{}", self.singleton_properties.fetch_add(1, Ordering::Relaxed))
    }
}

/// Create annotation entries for a time interval.
pub fn create_interval(initial: &str, final_time: &str) -> Vec<BlankNodeEntry> {
    vec![
        BlankNodeEntry::new(
            &format!("{}intervalInitial", vocab::TMP),
            &add_suffix(initial, vocab::TIMESTAMP_SUFFIX),
        ),
        BlankNodeEntry::new(
            &format!("{}intervalFinal", vocab::TMP),
            &add_suffix(final_time, vocab::TIMESTAMP_SUFFIX),
        ),
    ]
}

/// Reify the given triple without a subject.
pub fn reify_blank(triple: &Triple) -> Vec<BlankNodeEntry> {
    vec![
        BlankNodeEntry::new(&format!("{}subject", vocab::RDF), &triple.subject),
        BlankNodeEntry::new(&format!("{}predicate", vocab::RDF), &triple.predicate),
        BlankNodeEntry::new(&format!("{}object", vocab::RDF), &triple.object),
    ]
}

/// No operation for time annotation.
pub fn time_annotated_noop(triple: &Triple) -> Vec<Triple> {
    vec![triple.clone()]
}

/// Builds annotated triple patterns for one annotation mode.
#[derive(Debug)]
pub struct TemporalAnnotator {
    mode: AnnotationMode,
    labels: LabelGenerator,
}

impl TemporalAnnotator {
    pub fn new(mode: AnnotationMode) -> Self {
        Self { mode, labels: LabelGenerator::new() }
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode
    }

    pub fn labels(&self) -> &LabelGenerator {
        &self.labels
    }

    /// Append the annotation triples for `subject` to `triples`.
    ///
    /// `subject` defaults to the subject of the first input triple. `suffix`
    /// is appended to the `?initial`/`?final` variable names so several
    /// annotated patterns can coexist in one query; it must be empty or
    /// decimal for the time checks to recognize the variables. Without any subject there
    /// is nothing to annotate and the input is returned unchanged.
    pub fn time_annotate(
        &self,
        mut triples: Vec<Triple>,
        subject: Option<&str>,
        suffix: Option<&str>,
    ) -> Vec<Triple> {
        let subject = subject
            .map(str::to_string)
            .or_else(|| triples.first().map(|t| t.subject.clone()));
        let Some(subject) = subject else {
            tracing::warn!("time annotation requested without a subject, skipping");
            return triples;
        };
        let suffix = suffix.unwrap_or("");

        match self.mode {
            AnnotationMode::Interval => {
                triples.push(Triple::new(
                    &subject,
                    vocab::INTERVAL_INITIAL,
                    &format!("{}{}", vocab::INITIAL_VARIABLE, suffix),
                ));
                triples.push(Triple::new(
                    &subject,
                    vocab::INTERVAL_FINAL,
                    &format!("{}{}", vocab::FINAL_VARIABLE, suffix),
                ));
            }
            AnnotationMode::Expiration => {
                triples.push(Triple::new(
                    &subject,
                    vocab::EXPIRATION,
                    &format!("{}{}", vocab::FINAL_VARIABLE, suffix),
                ));
            }
        }
        triples
    }

    /// Reify the given triple under a fresh statement label.
    pub fn reify(&self, triple: &Triple) -> Vec<Triple> {
        let label = self.labels.next_statement();
        vec![
            Triple::new(&label, &format!("{}subject", vocab::RDF), &triple.subject),
            Triple::new(&label, &format!("{}predicate", vocab::RDF), &triple.predicate),
            Triple::new(&label, &format!("{}object", vocab::RDF), &triple.object),
        ]
    }

    /// Transform the given triple to its singleton property equivalent.
    pub fn make_singleton_property(&self, triple: &Triple) -> Vec<Triple> {
        let property = self.labels.next_singleton_property();
        vec![
            Triple::new(
                &property,
                &format!("{}singletonPropertyOf", vocab::SP),
                &triple.predicate,
            ),
            Triple::new(&triple.subject, &property, &triple.object),
        ]
    }

    pub fn time_annotated_reification(&self, triple: &Triple, suffix: Option<&str>) -> Vec<Triple> {
        self.time_annotate(self.reify(triple), None, suffix)
    }

    pub fn time_annotated_singleton_properties(
        &self,
        triple: &Triple,
        suffix: Option<&str>,
    ) -> Vec<Triple> {
        self.time_annotate(self.make_singleton_property(triple), None, suffix)
    }

    /// Move the triple into a fresh named graph variable and annotate the graph.
    pub fn time_annotated_quads(&self, triple: &Triple, suffix: Option<&str>) -> Vec<Triple> {
        let label = self.labels.next_statement();
        let graph = format!("?{}", label.trim_start_matches("_:"));
        let quad = Triple::quad(&triple.subject, &triple.predicate, &triple.object, &graph);
        self.time_annotate(vec![quad], Some(&graph), suffix)
    }

    /// Annotate `triple` with the given strategy.
    pub fn annotate(
        &self,
        strategy: AnnotationStrategy,
        triple: &Triple,
        suffix: Option<&str>,
    ) -> Vec<Triple> {
        match strategy {
            AnnotationStrategy::Reification => self.time_annotated_reification(triple, suffix),
            AnnotationStrategy::SingletonProperties => {
                self.time_annotated_singleton_properties(triple, suffix)
            }
            AnnotationStrategy::Quads => self.time_annotated_quads(triple, suffix),
            AnnotationStrategy::Noop => time_annotated_noop(triple),
        }
    }

    /// Write a (possibly nested) blank node description to `sink`.
    ///
    /// Returns the label used for the top-level node: `custom_label` when
    /// given, a fresh statement label otherwise.
    pub fn write_blank_node(
        &self,
        sink: &mut Vec<Triple>,
        entries: &[BlankNodeEntry],
        custom_label: Option<&str>,
    ) -> String {
        let label = match custom_label {
            Some(label) => label.to_string(),
            None => self.labels.next_statement(),
        };
        for entry in entries {
            let object = match &entry.object {
                BlankObject::Term(term) => term.clone(),
                BlankObject::Nested(nested) => self.write_blank_node(sink, nested, None),
            };
            sink.push(Triple::new(&label, &entry.predicate, &object));
        }
        label
    }

    /// Reify `triple` and write it to `sink`, followed by the extra annotation entries.
    pub fn write_reification(
        &self,
        sink: &mut Vec<Triple>,
        triple: &Triple,
        annotations: &[BlankNodeEntry],
    ) -> String {
        let mut entries = reify_blank(triple);
        entries.extend_from_slice(annotations);
        self.write_blank_node(sink, &entries, None)
    }
}
