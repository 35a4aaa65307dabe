//! # Simple SPARQL Client
//!
//! Thin data-access adapter over a SPARQL endpoint speaking the standard
//! `application/sparql-results+json` envelope:
//!
//! ```json
//! {
//!   "head": { "vars": ["station", "period", "csvUrl"] },
//!   "results": {
//!     "bindings": [
//!       {
//!         "station": { "type": "literal", "value": "Bari tide gauge (RMN 2009)" },
//!         "period":  { "type": "literal", "value": "2019-05" },
//!         "csvUrl":  { "type": "uri", "value": "http://.../hydrometric.201905.csv" }
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Transport and decode failures are kept apart so callers can distinguish
//! "the endpoint was unreachable" from "the endpoint answered nonsense".

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from executing a SPARQL request.
#[derive(Error, Debug)]
pub enum SparqlError {
    /// HTTP transport failed (connection, timeout, non-success status)
    #[error("SPARQL transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not decode as a SPARQL JSON results envelope
    #[error("SPARQL decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Standard SPARQL JSON results envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct SparqlResponse {
    pub head: Head,
    pub results: Results,
}

/// `head` section: the projected variable names.
#[derive(Clone, Debug, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

/// `results` section: one binding map per solution row.
#[derive(Clone, Debug, Deserialize)]
pub struct Results {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, Term>>,
}

/// A single bound RDF term (`uri`, `literal`, ...).
#[derive(Clone, Debug, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// Posts the request to a SPARQL service, and returns the decoded response.
///
/// The request goes out as an HTTP GET with the query string in the `query`
/// parameter, asking for JSON results via the `Accept` header.
pub async fn query(
    client: &reqwest::Client,
    service: &str,
    request: &str,
) -> Result<SparqlResponse, SparqlError> {
    log::debug!("querying SPARQL service {service}");
    let body = client
        .get(service)
        .query(&[("query", request)])
        .header(reqwest::header::ACCEPT, "application/sparql-results+json")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let response = serde_json::from_str::<SparqlResponse>(&body)?;
    Ok(response)
}
