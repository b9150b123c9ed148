//! Wikidata SPARQL client.
//!
//! Submits one query string and returns its result bindings. There is no
//! batching across queries: callers put every value they care about into a
//! single `VALUES` block.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::WikidataConfig;
use crate::error::{Error, Result};

pub const ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

/// One bound value in a result row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoundValue {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
}

/// A result row: variable name → bound value. Unbound variables are absent.
pub type Binding = BTreeMap<String, BoundValue>;

#[derive(Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Deserialize)]
struct SparqlResults {
    bindings: Vec<Binding>,
}

/// A graph-query service.
#[async_trait]
pub trait GraphQuery: Send + Sync {
    async fn query(&self, sparql: &str) -> Result<Vec<Binding>>;
}

pub struct WikidataClient {
    http: reqwest::Client,
    endpoint: String,
}

impl WikidataClient {
    pub fn from_config(config: &WikidataConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl GraphQuery for WikidataClient {
    async fn query(&self, sparql: &str) -> Result<Vec<Binding>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("query", sparql), ("format", "json")])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transport(
                &self.endpoint,
                format!("SPARQL endpoint error {}: {}", status, body.trim()),
            ));
        }

        let text = response.text().await?;
        parse_bindings(&text).map_err(|e| Error::transport(&self.endpoint, e))
    }
}

/// Decode a `{"results": {"bindings": [...]}}` document.
pub fn parse_bindings(text: &str) -> std::result::Result<Vec<Binding>, String> {
    serde_json::from_str::<SparqlResponse>(text)
        .map(|r| r.results.bindings)
        .map_err(|e| format!("invalid SPARQL JSON response: {}", e))
}

/// Strip the Wikidata entity namespace from a URI, leaving the QID.
pub fn entity_id(uri: &str) -> &str {
    uri.strip_prefix(ENTITY_PREFIX).unwrap_or(uri)
}

/// Bound string value of `var`, if any.
pub fn value<'a>(binding: &'a Binding, var: &str) -> Option<&'a str> {
    binding.get(var).map(|v| v.value.as_str())
}

/// Render values as a space-separated list of quoted SPARQL string literals.
pub fn string_literals<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values
        .into_iter()
        .map(quote)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote a value as a SPARQL string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
