//! Configuration management for the pricing calculator
//!
//! Built-in defaults, then optional YAML/TOML files, then environment
//! variables (`PRICECALC__SECTION__KEY`), with `.env` loaded first.

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::pricing::{FeeTable, PricingEngine};
use crate::types::OptionalServicePolicy;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub fees: FeesConfig,
    pub fee_source: FeeSourceConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Builder holding only the built-in defaults
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let fees = FeeTable::default();
        let builder = Config::builder()
            // Engine defaults
            .set_default(
                "engine.optional_service_policy",
                OptionalServicePolicy::default().to_string(),
            )?
            // Fee table defaults
            .set_default("fees.payment_fee_percent", fees.payment_fee_percent)?
            .set_default(
                "fees.content_service_fee_percent",
                fees.content_service_fee_percent,
            )?
            .set_default("fees.content_service_fee_cap", fees.content_service_fee_cap)?
            .set_default(
                "fees.voucher_service_fee_percent",
                fees.voucher_service_fee_percent,
            )?
            .set_default(
                "fees.freeship_service_fee_percent",
                fees.freeship_service_fee_percent,
            )?
            .set_default(
                "fees.freeship_service_fee_cap",
                fees.freeship_service_fee_cap,
            )?
            .set_default("fees.shipping_subsidy_flat", fees.shipping_subsidy_flat)?
            .set_default("fees.infrastructure_fee_flat", fees.infrastructure_fee_flat)?
            .set_default("fees.vat_percent", fees.vat_percent)?
            // Fee source defaults
            .set_default("fee_source.enabled", false)?
            .set_default("fee_source.url", "")?
            .set_default("fee_source.timeout_ms", 15_000)?
            .set_default("fee_source.format", "auto")?
            // Logging defaults
            .set_default("logging.json", false)?
            .set_default("logging.level", "info")?;
        Ok(builder)
    }

    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PRICECALC__*)
            .add_source(Environment::with_prefix("PRICECALC").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings the calculator cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.fee_table().is_well_formed() {
            bail!("fees contain a negative, non-finite or >100% value");
        }
        if self.fee_source.enabled && self.fee_source.url.trim().is_empty() {
            bail!("fee_source.enabled is set but fee_source.url is empty");
        }
        Ok(())
    }

    pub fn policy(&self) -> OptionalServicePolicy {
        self.engine.optional_service_policy
    }

    /// Base fee table from configuration
    pub fn fee_table(&self) -> FeeTable {
        self.fees.to_fee_table()
    }

    /// Engine wired with the configured policy and base fee table
    pub fn engine(&self) -> PricingEngine {
        PricingEngine::new(self.policy()).with_fee_table(self.fee_table())
    }

    /// Digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "policy={} fee_source={} catalog={} payment={:.2}% vat={:.2}%",
            self.engine.optional_service_policy,
            if self.fee_source.enabled {
                self.fee_source.url.as_str()
            } else {
                "off"
            },
            self.catalog.path.as_deref().unwrap_or("none"),
            self.fees.payment_fee_percent,
            self.fees.vat_percent,
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_yaml(yaml: &str) -> Result<AppConfig> {
        let config = AppConfig::defaults()?
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;
        AppConfig::from_config(config)
    }

    #[test]
    fn defaults_mirror_default_fee_table() {
        let cfg = from_yaml("{}").unwrap();
        assert_eq!(cfg.fee_table(), FeeTable::default());
        assert_eq!(cfg.policy(), OptionalServicePolicy::HighestOnly);
        assert!(!cfg.fee_source.enabled);
        assert!(cfg.catalog.path.is_none());
    }

    #[test]
    fn yaml_overrides_apply() {
        let cfg = from_yaml(
            r#"
engine:
  optional_service_policy: sum
fees:
  payment_fee_percent: 4.91
catalog:
  path: data/categories.json
"#,
        )
        .unwrap();
        assert_eq!(cfg.policy(), OptionalServicePolicy::Sum);
        assert_eq!(cfg.fee_table().payment_fee_percent, 4.91);
        assert_eq!(cfg.engine().policy(), OptionalServicePolicy::Sum);
        assert_eq!(cfg.catalog.path.as_deref(), Some("data/categories.json"));
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = from_yaml("engine:\n  optional_service_policy: average\n").unwrap_err();
        assert!(format!("{:#}", err).contains("average"));
    }

    #[test]
    fn policy_accepts_hyphenated_spelling() {
        let cfg = from_yaml("engine:\n  optional_service_policy: highest-only\n").unwrap();
        assert_eq!(cfg.policy(), OptionalServicePolicy::HighestOnly);
    }

    #[test]
    fn rejects_enabled_source_without_url() {
        assert!(from_yaml("fee_source:\n  enabled: true\n").is_err());
    }

    #[test]
    fn rejects_percent_above_hundred() {
        assert!(from_yaml("fees:\n  vat_percent: 120\n").is_err());
    }

    #[test]
    fn digest_mentions_policy() {
        let cfg = from_yaml("{}").unwrap();
        assert!(cfg.to_string().contains("policy=highest_only"));
        assert!(cfg.digest().contains("fee_source=off"));
    }
}
