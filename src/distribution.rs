//! # Hydrometric Level Distribution Fetching
//!
//! This module resolves a tide-gauge station reference and a time window
//! into one concatenated [`Series`] of hydrometric readings.
//!
//! ## Data Source
//!
//! The ISPRA linked-data portal exposes the National Tidegauge Network
//! ("Dataset RMN") through a SPARQL endpoint. Each station publishes one
//! measurement collection per calendar month, and each collection carries a
//! `downloadURL` pointing at a semicolon-delimited CSV of
//! `timestamp;level` rows at 10-minute cadence:
//!
//! ```text
//! time;value
//! 2019-05-01 00:00:00;25.0
//! 2019-05-01 00:10:00;22.4
//! ...
//! ```
//!
//! ## Pipeline
//!
//! 1. Query the endpoint for every monthly collection of the station whose
//!    measurement period is `>= since`, ordered by period ascending.
//! 2. Download each collection's CSV in the order returned.
//! 3. Concatenate the monthly fragments, as delivered — no deduplication,
//!    no re-sorting.
//!
//! Every call performs network I/O; nothing is cached across calls. A
//! failed monthly download fails the whole fetch: a silently skipped month
//! would skew the quantile base the ingestion loop builds on top of this,
//! and the loop retries the entire cycle a few minutes later anyway.

use crate::sparql::{self, SparqlError, SparqlResponse};
use crate::{Sample, Series};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that can occur while fetching a level distribution.
///
/// All variants are non-fatal to the process: the ingestion loop logs them
/// and retries on its next cycle.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The endpoint or a monthly CSV resource could not be reached
    #[error("data source unavailable: {0}")]
    SourceUnavailable(#[from] reqwest::Error),

    /// The response decoded, but its shape was not the expected one
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The query matched zero monthly collections for the station/window
    #[error("no monthly measurement collections for station and window")]
    EmptySeries,
}

impl From<SparqlError> for FetchError {
    fn from(err: SparqlError) -> Self {
        match err {
            SparqlError::Transport(e) => FetchError::SourceUnavailable(e),
            SparqlError::Decode(e) => FetchError::MalformedResponse(e.to_string()),
        }
    }
}

/// Timestamp layout of the monthly CSV rows
const CSV_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fetch the hydrometric level distribution of a station since a month.
///
/// `nearby` is the free-text geographical reference the dataset labels its
/// gauges with (e.g. `"Bari"`); `since` is the month-granularity lower
/// bound of the window, formatted `%Y-%m`. Matching is entirely up to the
/// data source — no validation happens here.
pub async fn fetch_distribution(
    client: &reqwest::Client,
    endpoint: &str,
    nearby: &str,
    since: &str,
) -> Result<Series, FetchError> {
    // Resolve the station/window into one CSV locator per month
    let response = sparql::query(client, endpoint, &distribution_query(nearby, since)).await?;
    let urls = monthly_locators(&response)?;
    log::debug!("{} monthly distributions for {nearby} since {since}", urls.len());

    // Download and concatenate the monthly fragments, in received order
    let mut samples = Vec::new();
    for url in &urls {
        log::debug!("downloading monthly distribution {url}");
        let body = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        samples.extend(parse_fragment(&body)?);
    }

    Ok(Series { samples })
}

/// Build the SPARQL request selecting every monthly measurement collection
/// of the gauge near `nearby` with period `>= since`, period-ascending.
///
/// Mirrors the ISPRA core ontology: a `HydrometricLevel` parameter near the
/// labelled place, measured into monthly `MeasurementCollection`s that are
/// part of "Dataset RMN" and expose a `downloadURL`.
fn distribution_query(nearby: &str, since: &str) -> String {
    format!(
        "PREFIX : <http://dati.isprambiente.it/ontology/core#>\n\
         PREFIX gn: <http://www.geonames.org/ontology#>\n\
         PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
         PREFIX dcat: <http://www.w3.org/ns/dcat#>\n\
         PREFIX purl: <http://purl.org/dc/terms/>\n\
         select distinct ?station ?period ?csvUrl where {{\n\
         ?parameter a :HydrometricLevel.\n\
         ?place rdfs:label \"{nearby}\".\n\
         ?dataset rdfs:label \"Dataset RMN\"@it.\n\
         FILTER ( str(?period) >= \"{since}\").\n\
         ?parameter gn:nearbyFeature ?place.\n\
         ?collection a :MeasurementCollection;\n\
         :measurementPeriod ?period;\n\
         :isDataOf ?parameter;\n\
         :generatedBy ?instrument;\n\
         purl:isPartOf ?dataset;\n\
         dcat:downloadURL ?csvUrl.\n\
         ?instrument :placedOn ?stat.\n\
         ?stat rdfs:label ?station.\n\
         }} ORDER BY ?period"
    )
}

/// Extract the per-month CSV locators from the query response, in order.
fn monthly_locators(response: &SparqlResponse) -> Result<Vec<String>, FetchError> {
    if response.results.bindings.is_empty() {
        return Err(FetchError::EmptySeries);
    }

    response
        .results
        .bindings
        .iter()
        .map(|binding| {
            binding
                .get("csvUrl")
                .map(|term| term.value.clone())
                .ok_or_else(|| {
                    FetchError::MalformedResponse("binding without csvUrl".to_string())
                })
        })
        .collect()
}

/// Parse one monthly CSV fragment into samples.
///
/// Two semicolon-separated columns, first line is a header and is skipped,
/// blank lines are ignored. Any other malformed row fails the fragment.
fn parse_fragment(body: &str) -> Result<Vec<Sample>, FetchError> {
    let mut samples = Vec::new();

    for line in body.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (utc, level) = line
            .split_once(';')
            .ok_or_else(|| FetchError::MalformedResponse(format!("csv row without ';': {line}")))?;

        let utc = NaiveDateTime::parse_from_str(utc.trim(), CSV_TIME_FORMAT)
            .map_err(|e| FetchError::MalformedResponse(format!("csv timestamp: {e}")))?
            .and_utc();

        let level: f64 = level
            .trim()
            .parse()
            .map_err(|e| FetchError::MalformedResponse(format!("csv level: {e}")))?;

        samples.push(Sample { utc, level });
    }

    Ok(samples)
}
