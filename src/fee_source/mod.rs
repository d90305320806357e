//! Remote fee-table source
//!
//! Fetches one row of fee constants (usually a published spreadsheet) and
//! merges it over a base table. Fetch or parse failures never reach the
//! engine: [`resolve_fee_table`] falls back to the base table.

mod parse;

pub use parse::{parse_csv_row, parse_fee_row, parse_json_row, RowFormat};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::FeeSourceConfig;
use crate::error::PricingError;
use crate::pricing::{FeeTable, FeeTableOverride};

/// Anything that can supply a (possibly partial) fee row
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeeTableSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Fetch the current fee row
    async fn fetch(&self) -> Result<FeeTableOverride>;
}

/// Where the table handed to the engine came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeTableOrigin {
    Default,
    Remote,
}

/// Fee table ready for the engine, with provenance
#[derive(Debug, Clone, Serialize)]
pub struct FeeSnapshot {
    pub table: FeeTable,
    pub origin: FeeTableOrigin,
    pub fetched_at: DateTime<Utc>,
}

impl FeeSnapshot {
    pub fn fallback(table: FeeTable) -> Self {
        Self {
            table,
            origin: FeeTableOrigin::Default,
            fetched_at: Utc::now(),
        }
    }
}

/// Fetch from `source` and merge over `base`. Never fails.
pub async fn resolve_fee_table(source: &dyn FeeTableSource, base: &FeeTable) -> FeeSnapshot {
    match source.fetch().await {
        Ok(row) if row.is_empty() => {
            warn!(source = source.name(), "Fee row had no usable columns, using defaults");
            FeeSnapshot::fallback(*base)
        }
        Ok(row) => {
            let table = base.merged_with(&row);
            info!(
                source = source.name(),
                fields = row.populated(),
                "Fee table loaded from remote source"
            );
            FeeSnapshot {
                table,
                origin: FeeTableOrigin::Remote,
                fetched_at: Utc::now(),
            }
        }
        Err(e) => {
            warn!(source = source.name(), error = %e, "Fee table fetch failed, using defaults");
            FeeSnapshot::fallback(*base)
        }
    }
}

/// HTTP source returning either JSON or a CSV export
pub struct HttpFeeTableSource {
    client: reqwest::Client,
    url: String,
    format: RowFormat,
}

impl HttpFeeTableSource {
    pub fn new(url: &str, timeout: Duration, format: RowFormat) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.trim().to_string(),
            format,
        })
    }

    pub fn from_config(config: &FeeSourceConfig) -> Result<Self> {
        let format = RowFormat::from_str(&config.format).unwrap_or_else(|| {
            warn!(format = %config.format, "Unknown fee row format, detecting from response");
            RowFormat::Auto
        });
        Self::new(
            &config.url,
            Duration::from_millis(config.timeout_ms),
            format,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeeTableSource for HttpFeeTableSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self) -> Result<FeeTableOverride> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(PricingError::from)
            .with_context(|| format!("Fee table request to {} failed", self.url))?;

        let format = match self.format {
            RowFormat::Auto => response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(RowFormat::from_content_type)
                .unwrap_or(RowFormat::Auto),
            explicit => explicit,
        };

        let body = response
            .text()
            .await
            .context("Failed to read fee table body")?;

        let row = parse_fee_row(&body, format)?;
        Ok(row)
    }
}
