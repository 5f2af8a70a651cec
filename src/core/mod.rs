//! Core data structures and types for the Kairos continuous query engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod vocab;

/// Marker that starts a query variable, e.g. `?station`.
pub const VARIABLE_MARKER: char = '?';

/// Marker that starts a blank node label, e.g. `_:stmt0`.
pub const BLANK_NODE_MARKER: char = '_';

/// One result row produced by a fragments client: variable name (including the
/// `?` marker) to the bound lexical value.
pub type Row = HashMap<String, String>;

/// A triple pattern, or a quad pattern when `context` is set.
///
/// Every field is a plain string: an IRI, a prefixed name, a literal, a
/// variable (`?x`) or a blank node (`_:b0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    #[serde(default, alias = "graph", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Triple {
    pub fn new(subject: &str, predicate: &str, object: &str) -> Self {
        Self {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: object.to_string(),
            context: None,
        }
    }

    pub fn quad(subject: &str, predicate: &str, object: &str, context: &str) -> Self {
        Self {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: object.to_string(),
            context: Some(context.to_string()),
        }
    }

    /// Returns the value stored in `field`, `None` for an absent context.
    pub fn field(&self, field: TripleField) -> Option<&str> {
        match field {
            TripleField::Subject => Some(&self.subject),
            TripleField::Predicate => Some(&self.predicate),
            TripleField::Object => Some(&self.object),
            TripleField::Context => self.context.as_deref(),
        }
    }

    /// Mutable access to `field`, `None` for an absent context.
    pub fn field_mut(&mut self, field: TripleField) -> Option<&mut String> {
        match field {
            TripleField::Subject => Some(&mut self.subject),
            TripleField::Predicate => Some(&mut self.predicate),
            TripleField::Object => Some(&mut self.object),
            TripleField::Context => self.context.as_mut(),
        }
    }
}

/// The positions of a quad, in their canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripleField {
    Subject,
    Predicate,
    Object,
    Context,
}

/// Canonical field order used by every walk over a triple.
pub const FIELDS: [TripleField; 4] =
    [TripleField::Subject, TripleField::Predicate, TripleField::Object, TripleField::Context];

/// Predicate/object pair hanging off an unnamed subject.
///
/// Objects can be a nested description, which is written as its own blank node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlankNodeEntry {
    pub predicate: String,
    pub object: BlankObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlankObject {
    Term(String),
    Nested(Vec<BlankNodeEntry>),
}

impl BlankNodeEntry {
    pub fn new(predicate: &str, object: &str) -> Self {
        Self { predicate: predicate.to_string(), object: BlankObject::Term(object.to_string()) }
    }

    pub fn nested(predicate: &str, entries: Vec<BlankNodeEntry>) -> Self {
        Self { predicate: predicate.to_string(), object: BlankObject::Nested(entries) }
    }
}

/// Check if the given field is a variable.
pub fn is_variable(field: &str) -> bool {
    field.starts_with(VARIABLE_MARKER)
}

/// Check if the given field is a blank node.
pub fn is_blank_node(field: &str) -> bool {
    field.starts_with(BLANK_NODE_MARKER)
}

/// Wrap a lexical value into a typed literal, e.g. `"2015-01-01T00:00:00Z"^^xsd:dateTimeStamp`.
pub fn add_suffix(object: &str, suffix: &str) -> String {
    format!("\"{}\"^^{}", object, suffix)
}

/// Merge two rows into a new one; bindings of `overlay` win on shared keys.
pub fn merge_rows(base: &Row, overlay: &Row) -> Row {
    let mut merged = base.clone();
    merged.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Elements present in both `left` and `right`, in the order of `left`.
/// Both inputs are treated as sets.
pub fn intersection(left: &[String], right: &[String]) -> Vec<String> {
    left.iter().filter(|item| right.contains(item)).cloned().collect()
}

/// Elements of `from` that are not in `remove`, in the order of `from`.
pub fn reduction(from: &[String], remove: &[String]) -> Vec<String> {
    from.iter().filter(|item| !remove.contains(item)).cloned().collect()
}
