//! Selling-price calculator
//!
//! Usage: pricecalc <request.yaml|request.json> [--category "Fashion > Bags"]
//!
//! Loads configuration, resolves the fee table (remote source when enabled,
//! configured defaults otherwise), prices the request and prints the
//! breakdown.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use marketplace_pricing::catalog::CategoryTree;
use marketplace_pricing::config::{AppConfig, LoggingConfig};
use marketplace_pricing::fee_source::{resolve_fee_table, FeeSnapshot, HttpFeeTableSource};
use marketplace_pricing::pricing::{format_currency, format_percentage, CalculationRequest};

struct Args {
    request_path: String,
    category: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut request_path = None;
    let mut category = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--category" || arg == "-c" {
            category = Some(args.next().context("--category needs a value")?);
        } else if request_path.is_none() {
            request_path = Some(arg);
        } else {
            bail!("Unexpected argument: {}", arg);
        }
    }
    let request_path =
        request_path.context("Usage: pricecalc <request file> [--category \"A > B\"]")?;
    Ok(Args {
        request_path,
        category,
    })
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_request(path: &str) -> Result<CalculationRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path))?;
    // YAML is a superset of JSON, so one parser covers both
    let request: CalculationRequest =
        serde_yaml::from_str(&text).context("Failed to parse calculation request")?;
    Ok(request)
}

fn apply_category(
    config: &AppConfig,
    request: &mut CalculationRequest,
    category: &str,
) -> Result<()> {
    let catalog_path = config
        .catalog
        .path
        .as_deref()
        .context("--category given but catalog.path is not configured")?;
    let tree = CategoryTree::load(catalog_path)?;
    let segments: Vec<&str> = category.split('>').map(str::trim).collect();
    let hit = tree.lookup_for_tier(&segments, request.store_tier)?;
    info!(
        category = %hit.path.join(" > "),
        label = %hit.fee_label,
        fee_percent = hit.fee_percent,
        "Category commission resolved"
    );
    request.product_fee_percent = hit.fee_percent;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging);
    info!(config = %config, "Configuration loaded");

    let args = parse_args()?;
    let mut request = load_request(&args.request_path)?;
    if let Some(category) = &args.category {
        apply_category(&config, &mut request, category)?;
    }

    let base = config.fee_table();
    let snapshot = if config.fee_source.enabled {
        match HttpFeeTableSource::from_config(&config.fee_source) {
            Ok(source) => resolve_fee_table(&source, &base).await,
            Err(e) => {
                warn!(error = %e, "Fee source unavailable, using configured fees");
                FeeSnapshot::fallback(base)
            }
        }
    } else {
        FeeSnapshot::fallback(base)
    };
    info!(origin = ?snapshot.origin, "Fee table ready");

    let engine = config.engine().with_fee_table(snapshot.table);
    let result = engine.calculate(&request);

    if !result.is_valid {
        bail!(
            "Cannot price request: {}",
            result.error_message.as_deref().unwrap_or("unknown error")
        );
    }

    println!("Selling price: {}", format_currency(result.final_price));
    for (name, amount) in result.fee_lines() {
        println!("  {:<22} {:>18}", name, format_currency(amount));
    }
    println!("  {:<22} {:>18}", "total_cost", format_currency(result.total_cost));
    println!(
        "  {:<22} {:>18}",
        "profit_margin",
        format_percentage(result.profit_margin_percent)
    );

    Ok(())
}
