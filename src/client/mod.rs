//! Fragments client interfaces
//!
//! The executor never performs network I/O itself. It connects to an endpoint
//! through a [`FragmentsClient`] and receives every query result as an
//! asynchronous [`RowStream`]: zero or more rows, then the end of the stream,
//! or an error item.
//!
//! # Implementations
//!
//! - **OxigraphClient** - in-memory `oxigraph` store, used for local data and tests
//! - **HttpSparqlClient** - remote endpoint speaking the SPARQL protocol

use crate::core::Row;
use crate::error::Result;
use crate::query::ComposedQuery;
use futures_util::stream::BoxStream;
use std::sync::Arc;

pub mod http;
pub mod store;

pub use self::http::HttpSparqlClient;
pub use self::store::OxigraphClient;

/// Asynchronous sequence of result rows.
pub type RowStream = BoxStream<'static, Result<Row>>;

/// Factory for endpoint connections.
pub trait FragmentsClient: Send + Sync {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn FragmentsConnection>>;
}

/// Connection to one endpoint; shared by every query of a session.
pub trait FragmentsConnection: Send + Sync {
    fn endpoint(&self) -> &str;

    fn execute(&self, query: &ComposedQuery) -> RowStream;
}
