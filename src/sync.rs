//! Best-effort forwarding of aggregation results to Airtable.
//!
//! Delivery is at most once: one request per aggregation, no retry. The
//! outcome is reported as a [`SyncStatus`] and never as an error.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{AirtableConfig, DEFAULT_AIRTABLE_TIMEOUT_SECS};
use crate::error::Result;
use crate::model::Aggregation;

/// `Variant` label of the record carrying the overall MTE.
pub const OVERALL_RECORD_LABEL: &str = "Overall MTE";

const USER_AGENT_VALUE: &str = concat!("mte-service/", env!("CARGO_PKG_VERSION"));

/// Advisory outcome of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Failed,
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    Error,
}

/// Result of a connectivity check against the configured table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub status: ProbeStatus,
    pub message: String,
    /// HTTP status the API should answer with.
    #[serde(skip)]
    pub http_status: u16,
}

impl ProbeReport {
    fn error(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Error,
            message: message.into(),
            http_status,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecordBatch<'a> {
    records: Vec<Record<'a>>,
}

#[derive(Debug, Serialize)]
struct Record<'a> {
    fields: Fields<'a>,
}

#[derive(Debug, Serialize)]
struct Fields<'a> {
    #[serde(rename = "Variant")]
    variant: &'a str,
    #[serde(rename = "MTE")]
    mte: f64,
}

impl<'a> Record<'a> {
    fn new(variant: &'a str, mte: f64) -> Self {
        Self {
            fields: Fields { variant, mte },
        }
    }
}

fn record_batch(aggregation: &Aggregation) -> RecordBatch<'_> {
    let mut records: Vec<Record<'_>> = aggregation
        .variants
        .iter()
        .map(|variant| Record::new(&variant.name, variant.mte))
        .collect();
    records.push(Record::new(OVERALL_RECORD_LABEL, aggregation.overall_mte));
    RecordBatch { records }
}

/// HTTP client for the Airtable table receiving results. Without a
/// configuration every call is skipped.
#[derive(Debug, Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    target: Option<AirtableConfig>,
}

impl AirtableClient {
    pub fn new(target: Option<AirtableConfig>) -> Result<Self> {
        let timeout_secs = target
            .as_ref()
            .map(|target| target.timeout_secs)
            .unwrap_or(DEFAULT_AIRTABLE_TIMEOUT_SECS);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT_VALUE)
            .build()?;
        Ok(Self { http, target })
    }

    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    /// Sends one record per variant plus one for the overall MTE, as a single
    /// batched write. 200 and 201 count as success.
    #[instrument(level = "info", skip_all, fields(variants = aggregation.variants.len()))]
    pub async fn push(&self, aggregation: &Aggregation) -> SyncStatus {
        let Some(target) = &self.target else {
            warn!("Airtable API key or URL not set, skipping sync");
            return SyncStatus::NotConfigured;
        };

        let batch = record_batch(aggregation);
        debug!(url = %target.api_url, records = batch.records.len(), "sending records to Airtable");

        let response = self
            .http
            .post(&target.api_url)
            .bearer_auth(&target.api_key)
            .json(&batch)
            .send()
            .await;

        match response {
            Ok(response) if matches!(response.status().as_u16(), 200 | 201) => {
                info!(status = %response.status(), "Airtable sync succeeded");
                SyncStatus::Success
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(%status, %body, "Airtable rejected records");
                SyncStatus::Failed
            }
            Err(error) => {
                warn!(%error, "Airtable sync error");
                SyncStatus::Failed
            }
        }
    }

    /// Issues an authenticated `GET` against the configured URL.
    #[instrument(level = "info", skip_all)]
    pub async fn probe(&self) -> ProbeReport {
        let Some(target) = &self.target else {
            return ProbeReport::error(500, "Missing API key or URL");
        };

        let response = self
            .http
            .get(&target.api_url)
            .bearer_auth(&target.api_key)
            .send()
            .await;

        match response {
            Ok(response) if response.status().as_u16() == 200 => ProbeReport {
                status: ProbeStatus::Success,
                message: "Connected to Airtable!".to_string(),
                http_status: 200,
            },
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(%status, "Airtable probe failed");
                ProbeReport::error(
                    status.as_u16(),
                    format!("Airtable returned {}: {body}", status.as_u16()),
                )
            }
            Err(error) => {
                warn!(%error, "Airtable probe error");
                ProbeReport::error(500, error.to_string())
            }
        }
    }
}
