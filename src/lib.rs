//! # Kairos
//!
//! Kairos is a continuous query engine for temporal RDF fragments.
//!
//! The name "Kairos" is taken from the Greek notion of the opportune moment:
//! rather than polling an endpoint blindly, Kairos re-evaluates a query exactly
//! when its earliest result stops being valid. Queries are split into a dynamic
//! half that is re-executed every round and a static half whose results are
//! fetched once per binding and cached for the rest of the session.
//!
//! ## Features
//!
//! - Temporal annotation patterns (reification, singleton properties, quads)
//! - Interval and expiration validity semantics
//! - Split-query streaming with a per-session static result cache
//! - Pluggable fragments clients (in-memory Oxigraph store, SPARQL over HTTP)
//!
//! ## Example
//!
//! ```rust
//! use kairos::annotation::{AnnotationMode, TemporalAnnotator};
//! use kairos::core::Triple;
//!
//! let annotator = TemporalAnnotator::new(AnnotationMode::Expiration);
//! let patterns = annotator.time_annotate(
//!     vec![Triple::new("?train", "http://ex.org/delay", "?delay")],
//!     None,
//!     Some("0"),
//! );
//! assert!(!patterns.is_empty());
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::new_without_default)]
#![allow(clippy::return_self_not_must_use)]

/// Core data structures and vocabulary
pub mod core;

/// Temporal annotation of triple patterns
pub mod annotation;

/// Query templates, materialization and SPARQL composition
pub mod query;

/// Per-session static result cache
pub mod cache;

/// Clocks and temporal validity of rows
pub mod time;

/// Fragments clients
pub mod client;

/// Round-based streaming execution
pub mod execution;

pub mod config;

pub mod error;

pub use error::{KairosError, Result};
