//! Marketplace Pricing Library
//!
//! Selling-price solver and fee breakdown for marketplace sellers

pub mod catalog;
pub mod config;
pub mod error;
pub mod fee_source;
pub mod pricing;
pub mod types;

pub use pricing::{calculate_price, CalculationRequest, CalculationResult, FeeTable, PricingEngine};
pub use types::{OptionalService, OptionalServicePolicy, StoreTier};
