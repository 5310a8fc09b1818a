//! Sheet ingestion: fetch the delimited export, turn it into rows, and fall
//! back to synthetic data whenever the result would be unusable.
//!
//! ## Failure policy
//!
//! `Ingestor::ingest` never returns an error. Transport failures (network,
//! non-2xx) and content-shape failures (HTML page, no data lines, zero rows)
//! are logged and answered with the synthetic dataset, tagged
//! `Provenance::Fallback` so consumers can tell. Short lines are skipped and
//! bad numbers become `0`; neither stops a batch.

pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::SourceConfig;
use crate::models::{Provenance, Row, Snapshot};
use crate::synthetic;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use self::cleaner::{Coercion, fields_to_row};
use self::http_client::{FetchError, HttpClient};
use self::parsers::{detect_separator, looks_like_html, parse_line, split_lines};

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("received HTML instead of delimited text (auth required or sheet not public)")]
    HtmlPayload,

    #[error("payload has {0} line(s); need a header and at least one data line")]
    TooFewLines(usize),

    #[error("no usable rows ({dropped} line(s) had too few fields)")]
    NoRows { dropped: usize },
}

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable fetch collaborator: returns the whole payload as text.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_payload(&self) -> Result<String, FetchError>;

    fn describe(&self) -> String;
}

/// Published Google Sheet CSV export.
pub struct GoogleSheetSource {
    client: HttpClient,
    base_url: Url,
    cache_param: String,
}

impl GoogleSheetSource {
    pub fn new(config: &SourceConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| anyhow::anyhow!("invalid source url {:?}: {}", config.url, e))?;
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url,
            cache_param: config.cache_param.clone(),
        })
    }

    /// Export URL with a cache-busting timestamp appended.
    fn export_url(&self, stamp_ms: i64) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.cache_param, &stamp_ms.to_string());
        url
    }
}

#[async_trait]
impl SheetSource for GoogleSheetSource {
    async fn fetch_payload(&self) -> Result<String, FetchError> {
        let url = self.export_url(Utc::now().timestamp_millis());
        info!("Fetching sheet from {}", url);
        self.client.get_text(&url).await
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}

// ── Payload → rows ────────────────────────────────────────────────────────────

/// Rows from one payload plus what was noticed along the way.
#[derive(Debug, Default)]
pub struct ParsedSheet {
    pub rows: Vec<Row>,
    pub separator: char,
    pub dropped_lines: usize,
    pub regrouped_values: usize,
    pub truncated_values: usize,
    pub defaulted_values: usize,
}

/// Parse a raw export. Pure: no I/O, no fallback.
pub fn parse_payload(body: &str) -> Result<ParsedSheet, IngestError> {
    if looks_like_html(body) {
        return Err(IngestError::HtmlPayload);
    }

    let lines = split_lines(body);
    if lines.len() < 2 {
        return Err(IngestError::TooFewLines(lines.len()));
    }

    let separator = detect_separator(lines[0]);
    info!("Detected separator: {:?}", separator);

    let mut sheet = ParsedSheet {
        separator,
        ..Default::default()
    };

    for (i, line) in lines.iter().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }

        let fields = parse_line(line, separator);
        let Some((row, outcome)) = fields_to_row(&fields) else {
            debug!("Line {}: {} field(s), skipped", i + 1, fields.len());
            sheet.dropped_lines += 1;
            continue;
        };

        match outcome {
            Coercion::Plain => {}
            Coercion::Regrouped => sheet.regrouped_values += 1,
            Coercion::Truncated => {
                debug!("Line {}: value {:?} truncated to {}", i + 1, fields[4], row.value);
                sheet.truncated_values += 1;
            }
            Coercion::Empty | Coercion::Invalid => {
                debug!("Line {}: value {:?} defaulted to 0", i + 1, fields[4]);
                sheet.defaulted_values += 1;
            }
        }

        if i < 5 {
            debug!("Row {}: {:?}", i, row);
        }
        sheet.rows.push(row);
    }

    if sheet.dropped_lines > 0 {
        info!("Skipped {} line(s) with fewer than {} fields", sheet.dropped_lines, cleaner::MIN_FIELDS);
    }
    if sheet.regrouped_values > 0 {
        debug!("{} value(s) read with the separator heuristic", sheet.regrouped_values);
    }
    if sheet.defaulted_values > 0 || sheet.truncated_values > 0 {
        warn!(
            "{} value(s) defaulted to 0, {} truncated",
            sheet.defaulted_values, sheet.truncated_values
        );
    }

    let concepts: BTreeSet<&str> = sheet.rows.iter().map(|r| r.concept.as_str()).collect();
    debug!("Concepts found: {:?}", concepts);

    if sheet.rows.is_empty() {
        return Err(IngestError::NoRows { dropped: sheet.dropped_lines });
    }
    Ok(sheet)
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

pub struct Ingestor {
    source: Arc<dyn SheetSource>,
}

impl Ingestor {
    pub fn new(source: Arc<dyn SheetSource>) -> Self {
        Self { source }
    }

    pub fn from_config(config: &SourceConfig) -> anyhow::Result<Self> {
        Ok(Self::new(Arc::new(GoogleSheetSource::new(config)?)))
    }

    /// Run one cycle. Always yields a non-empty snapshot.
    pub async fn ingest(&self, sequence: u64) -> Snapshot {
        match self.try_ingest().await {
            Ok(sheet) => {
                info!("Successfully parsed {} rows (separator {:?})", sheet.rows.len(), sheet.separator);
                Snapshot::new(sequence, Provenance::Live, sheet.rows)
            }
            Err(e) => {
                match &e {
                    IngestError::Fetch(_) | IngestError::HtmlPayload => {
                        error!("Failed to load sheet from {}: {}", self.source.describe(), e)
                    }
                    _ => warn!("Sheet unusable: {}", e),
                }
                warn!("Using synthetic data");
                Snapshot::new(
                    sequence,
                    Provenance::Fallback { reason: e.to_string() },
                    synthetic::generate_random(),
                )
            }
        }
    }

    async fn try_ingest(&self) -> Result<ParsedSheet, IngestError> {
        let body = self.source.fetch_payload().await?;
        parse_payload(&body)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
