//! Configuration sections

use serde::Deserialize;

use crate::pricing::FeeTable;
use crate::types::OptionalServicePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub optional_service_policy: OptionalServicePolicy,
}

/// Base fee table; remote rows are merged over it
#[derive(Debug, Clone, Deserialize)]
pub struct FeesConfig {
    pub payment_fee_percent: f64,
    pub content_service_fee_percent: f64,
    pub content_service_fee_cap: f64,
    pub voucher_service_fee_percent: f64,
    pub freeship_service_fee_percent: f64,
    pub freeship_service_fee_cap: f64,
    pub shipping_subsidy_flat: f64,
    pub infrastructure_fee_flat: f64,
    pub vat_percent: f64,
}

impl FeesConfig {
    pub fn to_fee_table(&self) -> FeeTable {
        FeeTable {
            payment_fee_percent: self.payment_fee_percent,
            content_service_fee_percent: self.content_service_fee_percent,
            content_service_fee_cap: self.content_service_fee_cap,
            voucher_service_fee_percent: self.voucher_service_fee_percent,
            freeship_service_fee_percent: self.freeship_service_fee_percent,
            freeship_service_fee_cap: self.freeship_service_fee_cap,
            shipping_subsidy_flat: self.shipping_subsidy_flat,
            infrastructure_fee_flat: self.infrastructure_fee_flat,
            vat_percent: self.vat_percent,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeSourceConfig {
    /// Fetch fee overrides at startup
    pub enabled: bool,
    /// Published sheet / API endpoint
    pub url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// "auto", "json" or "csv"
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// JSON category tree; no catalog when unset
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}
