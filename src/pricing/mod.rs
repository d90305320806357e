//! Pricing engine
//!
//! Pure, synchronous selling-price solver plus its fee table and
//! formatting/parsing helpers. No I/O happens below this module.

pub mod engine;
pub mod fee_table;
pub mod format;

pub use engine::{
    calculate_price, CalculationRequest, CalculationResult, PricingEngine, ValidationError,
};
pub use fee_table::{FeeField, FeeTable, FeeTableOverride};
pub use format::{
    format_currency, format_percentage, parse_fee_label, validate_currency_input,
    validate_percentage_input,
};
