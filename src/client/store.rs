//! Oxigraph-backed fragments client.
//!
//! Serves queries from an in-memory `oxigraph` store. Rows follow the
//! conventions of a fragments client: keys carry the `?` marker, IRIs are
//! unbracketed, literals keep their N-Triples form.
//!
//! # Example
//!
//! ```ignore
//! use kairos::client::{FragmentsClient, OxigraphClient};
//! use oxigraph::io::RdfFormat;
//!
//! let client = OxigraphClient::new()?;
//! client.load(RdfFormat::Turtle, data.as_bytes())?;
//! let connection = client.connect("memory://trains")?;
//! ```

use super::{FragmentsClient, FragmentsConnection, RowStream};
use crate::core::Row;
use crate::error::{KairosError, Result};
use crate::query::ComposedQuery;
use futures_util::stream::{self, StreamExt};
use oxigraph::io::RdfFormat;
use oxigraph::model::Term;
use oxigraph::sparql::{QueryResults, SparqlEvaluator};
use oxigraph::store::Store;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Client over an in-memory store. Cloning shares the store.
#[derive(Clone)]
pub struct OxigraphClient {
    store: Store,
}

impl OxigraphClient {
    pub fn new() -> Result<Self> {
        Ok(Self { store: Store::new()? })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Load an RDF document into the store.
    pub fn load(&self, format: RdfFormat, reader: impl Read) -> Result<()> {
        self.store.load_from_reader(format, reader)?;
        Ok(())
    }

    /// Load an RDF file, picking the syntax from its extension.
    pub fn load_file(&self, path: &Path) -> Result<()> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(RdfFormat::from_extension)
            .ok_or_else(|| {
                KairosError::Config(format!("unknown RDF syntax for '{}'", path.display()))
            })?;
        let file = std::fs::File::open(path)?;
        self.load(format, std::io::BufReader::new(file))
    }

    /// Execute a SPARQL query and return its solutions as rows.
    pub fn execute_query_bindings(&self, sparql: &str) -> Result<Vec<Row>> {
        let evaluator = SparqlEvaluator::new();
        let parsed_query =
            evaluator.parse_query(sparql).map_err(|e| KairosError::Query(e.to_string()))?;
        let results = parsed_query
            .on_store(&self.store)
            .execute()
            .map_err(|e| KairosError::Client(e.to_string()))?;

        let mut rows = Vec::new();
        // ASK and CONSTRUCT queries yield no rows
        if let QueryResults::Solutions(solutions) = results {
            for solution in solutions {
                let solution = solution.map_err(|e| KairosError::Client(e.to_string()))?;
                let mut row = Row::new();
                for (variable, term) in solution.iter() {
                    row.insert(format!("?{}", variable.as_str()), term_value(term));
                }
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

impl FragmentsClient for OxigraphClient {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn FragmentsConnection>> {
        Ok(Arc::new(OxigraphConnection { client: self.clone(), endpoint: endpoint.to_string() }))
    }
}

struct OxigraphConnection {
    client: OxigraphClient,
    endpoint: String,
}

impl FragmentsConnection for OxigraphConnection {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn execute(&self, query: &ComposedQuery) -> RowStream {
        tracing::trace!(endpoint = %self.endpoint, "executing query:\n{}", query.sparql);
        let items: Vec<Result<Row>> = match self.client.execute_query_bindings(&query.sparql) {
            Ok(rows) => rows.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(items).boxed()
    }
}

fn term_value(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    const DATA: &str = r#"
        @prefix ex: <http://example.org/> .
        ex:alice ex:knows ex:bob .
        ex:alice ex:name "Alice" .
    "#;

    #[tokio::test]
    async fn test_rows_use_fragment_conventions() {
        let client = OxigraphClient::new().unwrap();
        client.load(RdfFormat::Turtle, DATA.as_bytes()).unwrap();
        let connection = client.connect("memory://test").unwrap();

        let query = ComposedQuery {
            sparql: "SELECT ?o ?n WHERE { <http://example.org/alice> <http://example.org/knows> ?o ; <http://example.org/name> ?n }".to_string(),
            variables: vec!["?o".to_string(), "?n".to_string()],
        };
        let rows: Vec<Row> = connection.execute(&query).try_collect().await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["?o"], "http://example.org/bob");
        assert_eq!(rows[0]["?n"], "\"Alice\"");
        assert_eq!(connection.endpoint(), "memory://test");
    }

    #[tokio::test]
    async fn test_invalid_query_yields_error_item() {
        let client = OxigraphClient::new().unwrap();
        let connection = client.connect("memory://test").unwrap();
        let query = ComposedQuery { sparql: "SELECT WHERE".to_string(), variables: vec![] };
        let items: Vec<Result<Row>> = connection.execute(&query).collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(KairosError::Query(_))));
    }
}
