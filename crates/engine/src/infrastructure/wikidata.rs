//! Wikidata SPARQL client
//!
//! Implements DatasetSourcePort by querying German municipalities and
//! administrative units that have a coat of arms image (P94), together with
//! the optional blazon text (P237) and German Wikipedia article.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;

use crate::infrastructure::ports::{DatasetFetchError, DatasetSourcePort, SourceRecord};

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Municipality query. Variable names are what [`parse_bindings`] reads.
pub const MUNICIPALITY_QUERY: &str = r#"
SELECT DISTINCT ?municipality ?municipalityLabel ?coatOfArms ?coatOfArmsText ?article
WHERE {
    VALUES ?type {
        wd:Q56061 wd:Q262166 wd:Q200250 wd:Q17715806 wd:Q160091 wd:Q2054788
        wd:Q484170 wd:Q1799794 wd:Q15893266 wd:Q1895745 wd:Q6501447 wd:Q82794
        wd:Q14952619 wd:Q1802976 wd:Q2792234 wd:Q15903294 wd:Q2381679 wd:Q2067852
        wd:Q671 wd:Q224936 wd:Q1663803 wd:Q42744322
    }

    ?municipality wdt:P31 ?type ;
                  wdt:P94 ?coatOfArms ;
                  wdt:P17 wd:Q183 ;
                  rdfs:label ?municipalityLabel .

    OPTIONAL { ?municipality wdt:P237 ?coatOfArmsText . }

    OPTIONAL {
        ?article schema:about ?municipality ;
                 schema:isPartOf <https://de.wikipedia.org/> ;
                 schema:name ?articleName .
    }

    FILTER(LANG(?municipalityLabel) = "de")
}
ORDER BY ?municipalityLabel
"#;

/// Client for a SPARQL endpoint speaking the W3C JSON results format.
#[derive(Clone)]
pub struct WikidataClient {
    client: Client,
    endpoint: String,
}

impl WikidataClient {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Self {
        // Wikidata throttles or blocks requests without a descriptive agent.
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DatasetSourcePort for WikidataClient {
    async fn fetch_dataset(&self) -> Result<Vec<SourceRecord>, DatasetFetchError> {
        tracing::info!(endpoint = %self.endpoint, "Executing SPARQL query");

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", MUNICIPALITY_QUERY)])
            .send()
            .await
            .map_err(|e| DatasetFetchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DatasetFetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| DatasetFetchError::RequestFailed(e.to_string()))?;

        let records = parse_bindings(&body)?;
        tracing::info!(count = records.len(), "SPARQL query executed successfully");
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Turn a SPARQL JSON result document into source records.
///
/// Rows without a label or image are skipped; a document that is not a
/// SPARQL result set is an error.
pub fn parse_bindings(body: &str) -> Result<Vec<SourceRecord>, DatasetFetchError> {
    let parsed: SparqlResponse =
        serde_json::from_str(body).map_err(|e| DatasetFetchError::Malformed(e.to_string()))?;

    let mut skipped = 0usize;
    let records: Vec<SourceRecord> = parsed
        .results
        .bindings
        .into_iter()
        .filter_map(|mut row| {
            let name = row.remove("municipalityLabel").map(|t| t.value);
            let image = row.remove("coatOfArms").map(|t| t.value);
            let (Some(name), Some(image)) = (name, image) else {
                skipped += 1;
                return None;
            };

            let mut record = SourceRecord::new(name, image);
            if let Some(text) = row.remove("coatOfArmsText") {
                record = record.with_description(text.value);
            }
            if let Some(article) = row.remove("article") {
                record = record.with_article_url(article.value);
            }
            Some(record)
        })
        .collect();

    if skipped > 0 {
        tracing::warn!(skipped, "Skipped SPARQL rows without label or coat of arms");
    }
    Ok(records)
}
