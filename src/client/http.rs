//! SPARQL protocol client for remote endpoints.
//!
//! Queries are POSTed as form data and answered in the SPARQL 1.1 JSON
//! results format, which is converted to rows with the same conventions as
//! [`super::OxigraphClient`].

use super::{FragmentsClient, FragmentsConnection, RowStream};
use crate::core::Row;
use crate::error::{KairosError, Result};
use crate::query::ComposedQuery;
use futures_util::stream::{self, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Client for endpoints implementing the SPARQL 1.1 protocol.
#[derive(Clone, Default)]
pub struct HttpSparqlClient {
    http: reqwest::Client,
}

impl HttpSparqlClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl FragmentsClient for HttpSparqlClient {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn FragmentsConnection>> {
        let url = Url::parse(endpoint)
            .map_err(|e| KairosError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        Ok(Arc::new(HttpSparqlConnection {
            http: self.http.clone(),
            endpoint: endpoint.to_string(),
            url,
        }))
    }
}

struct HttpSparqlConnection {
    http: reqwest::Client,
    endpoint: String,
    url: Url,
}

impl FragmentsConnection for HttpSparqlConnection {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn execute(&self, query: &ComposedQuery) -> RowStream {
        let request = self
            .http
            .post(self.url.clone())
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", query.sparql.clone())]);

        stream::once(async move {
            let response = request.send().await?.error_for_status()?;
            let results: SparqlJsonResults = response.json().await?;
            Ok::<_, KairosError>(results.into_rows())
        })
        .flat_map(|fetched: Result<Vec<Row>>| {
            let items: Vec<Result<Row>> = match fetched {
                Ok(rows) => rows.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        })
        .boxed()
    }
}

#[derive(Debug, Deserialize)]
struct SparqlJsonResults {
    #[serde(default)]
    results: Option<SparqlJsonBindings>,
}

#[derive(Debug, Deserialize)]
struct SparqlJsonBindings {
    bindings: Vec<HashMap<String, SparqlJsonTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlJsonTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(rename = "xml:lang")]
    lang: Option<String>,
    datatype: Option<String>,
}

impl SparqlJsonResults {
    fn into_rows(self) -> Vec<Row> {
        let Some(results) = self.results else { return Vec::new() };
        results
            .bindings
            .into_iter()
            .map(|binding| {
                binding
                    .into_iter()
                    .map(|(variable, term)| (format!("?{}", variable), term.into_value()))
                    .collect()
            })
            .collect()
    }
}

impl SparqlJsonTerm {
    fn into_value(self) -> String {
        match self.kind.as_str() {
            "uri" => self.value,
            "bnode" => format!("_:{}", self.value),
            _ => {
                let quoted = format!("\"{}\"", escape_literal(&self.value));
                match (self.lang, self.datatype) {
                    (Some(lang), _) => format!("{}@{}", quoted, lang),
                    (None, Some(datatype)) => format!("{}^^<{}>", quoted, datatype),
                    (None, None) => quoted,
                }
            }
        }
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n").replace('\r', "\\r")
}
