//! Selling-price solver
//!
//! Every percentage fee is defined as a fraction of the unknown final price,
//! so `price = cost + fixed + price * total_percent` is linear and solved in
//! one step:
//!
//! ```text
//! final_price = (cost + fixed_costs) / (1 - total_percent)
//! ```
//!
//! The individual fee amounts are then derived from `final_price`. Invalid
//! input never panics or returns `Err`; it yields a zeroed result with
//! `is_valid = false` and an `error_message`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fee_table::FeeTable;
use crate::types::{OptionalService, OptionalServicePolicy, StoreTier};

/// One product configuration to price
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// Cost of goods (currency), must be > 0
    pub cost: f64,
    /// Category commission, % of final price
    #[serde(default)]
    pub product_fee_percent: f64,
    #[serde(default)]
    pub store_tier: StoreTier,
    /// Marketing spend, % of final price
    #[serde(default)]
    pub marketing_cost_percent: Option<f64>,
    /// Target profit, % of final price
    #[serde(default)]
    pub desired_profit_percent: f64,
    #[serde(default)]
    pub use_shipping_subsidy: bool,
    #[serde(default)]
    pub use_content_service: bool,
    #[serde(default)]
    pub use_voucher_service: bool,
    /// Only charged for premium stores
    #[serde(default)]
    pub use_freeship_service: bool,
    /// Replaces the engine's fee table wholesale when present
    #[serde(default)]
    pub fee_table: Option<FeeTable>,
}

impl CalculationRequest {
    /// Whether the seller ticked this service
    pub fn wants(&self, service: OptionalService) -> bool {
        match service {
            OptionalService::Content => self.use_content_service,
            OptionalService::Voucher => self.use_voucher_service,
            OptionalService::Freeship => self.use_freeship_service,
        }
    }

    /// Services that are both ticked and chargeable for the store tier,
    /// in tie-break order
    pub fn selected_services(&self) -> Vec<OptionalService> {
        OptionalService::ALL
            .iter()
            .copied()
            .filter(|s| self.wants(*s) && s.available_for(self.store_tier))
            .collect()
    }
}

/// Reasons a request cannot be priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("cost must be positive")]
    NonPositiveCost,
    #[error("invalid product fee")]
    InvalidProductFee,
    #[error("invalid desired profit")]
    InvalidDesiredProfit,
    #[error("invalid marketing cost")]
    InvalidMarketingCost,
    #[error("total fees exceed 100%")]
    FeesExceedPrice,
}

/// Itemized outcome of one calculation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub product_fee: f64,
    pub payment_fee: f64,
    pub shipping_cost: f64,
    pub content_service_fee: f64,
    pub voucher_service_fee: f64,
    pub freeship_service_fee: f64,
    pub infrastructure_fee: f64,
    pub vat_fee: f64,
    pub marketing_cost: f64,
    /// Realized profit, `final_price - total_cost`
    pub profit: f64,

    pub cost: f64,
    /// Cost of goods plus every fee, excluding profit
    pub total_cost: f64,
    pub final_price: f64,
    pub profit_margin_percent: f64,

    pub is_valid: bool,
    pub error: Option<ValidationError>,
    pub error_message: Option<String>,
}

impl CalculationResult {
    /// All-zero result carrying the failure reason
    pub fn invalid(error: ValidationError) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
            error_message: Some(error.to_string()),
            ..Default::default()
        }
    }

    /// `total_cost + profit`; equals `final_price` for valid results
    pub fn covered_total(&self) -> f64 {
        self.total_cost + self.profit
    }

    /// Sum of the three optional-service fees
    pub fn optional_service_fees(&self) -> f64 {
        self.content_service_fee + self.voucher_service_fee + self.freeship_service_fee
    }

    /// Labelled breakdown lines for display, in charge order
    pub fn fee_lines(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("cost", self.cost),
            ("product_fee", self.product_fee),
            ("payment_fee", self.payment_fee),
            ("shipping_cost", self.shipping_cost),
            ("content_service_fee", self.content_service_fee),
            ("voucher_service_fee", self.voucher_service_fee),
            ("freeship_service_fee", self.freeship_service_fee),
            ("infrastructure_fee", self.infrastructure_fee),
            ("vat_fee", self.vat_fee),
            ("marketing_cost", self.marketing_cost),
            ("profit", self.profit),
        ]
    }
}

/// Stateless pricing engine configured with a composition policy and the
/// fee table used when a request carries none
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine {
    policy: OptionalServicePolicy,
    fee_table: FeeTable,
}

impl PricingEngine {
    pub fn new(policy: OptionalServicePolicy) -> Self {
        Self {
            policy,
            fee_table: FeeTable::default(),
        }
    }

    /// Replace the fallback fee table
    pub fn with_fee_table(mut self, fee_table: FeeTable) -> Self {
        self.fee_table = fee_table;
        self
    }

    pub fn policy(&self) -> OptionalServicePolicy {
        self.policy
    }

    pub fn fee_table(&self) -> &FeeTable {
        &self.fee_table
    }

    /// Price one product configuration
    pub fn calculate(&self, request: &CalculationRequest) -> CalculationResult {
        match self.solve(request) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(error = %err, cost = request.cost, "Pricing request rejected");
                CalculationResult::invalid(err)
            }
        }
    }

    /// Sum of every percentage charged against the final price, including
    /// the desired profit
    pub fn total_fee_percent(&self, request: &CalculationRequest) -> f64 {
        let fees = request.fee_table.as_ref().unwrap_or(&self.fee_table);
        total_fee_percent(request, fees, self.policy)
    }

    fn solve(&self, request: &CalculationRequest) -> Result<CalculationResult, ValidationError> {
        validate(request)?;

        let fees = request.fee_table.as_ref().unwrap_or(&self.fee_table);

        let total_percent = total_fee_percent(request, fees, self.policy) / 100.0;
        // Also catches NaN rates from a malformed table
        if !(total_percent < 1.0) {
            return Err(ValidationError::FeesExceedPrice);
        }

        let shipping_cost = if request.use_shipping_subsidy {
            fees.shipping_subsidy_flat
        } else {
            0.0
        };
        let fixed_costs = fees.infrastructure_fee_flat + shipping_cost;
        let final_price = (request.cost + fixed_costs) / (1.0 - total_percent);

        let product_fee = final_price * (request.product_fee_percent / 100.0);
        let payment_fee = final_price * (fees.payment_fee_percent / 100.0);
        let services = service_fees(request, fees, self.policy, final_price);
        let infrastructure_fee = fees.infrastructure_fee_flat;
        let vat_fee = final_price * (fees.vat_percent / 100.0);
        let marketing_cost = request
            .marketing_cost_percent
            .map(|pct| final_price * (pct / 100.0))
            .unwrap_or(0.0);

        let total_cost = request.cost
            + product_fee
            + payment_fee
            + shipping_cost
            + services.content
            + services.voucher
            + services.freeship
            + infrastructure_fee
            + vat_fee
            + marketing_cost;

        let profit = final_price - total_cost;
        let profit_margin_percent = profit / final_price * 100.0;

        Ok(CalculationResult {
            product_fee,
            payment_fee,
            shipping_cost,
            content_service_fee: services.content,
            voucher_service_fee: services.voucher,
            freeship_service_fee: services.freeship,
            infrastructure_fee,
            vat_fee,
            marketing_cost,
            profit,
            cost: request.cost,
            total_cost,
            final_price,
            profit_margin_percent,
            is_valid: true,
            error: None,
            error_message: None,
        })
    }
}

/// Price a request with the default engine (highest-only policy, default
/// fee table)
pub fn calculate_price(request: &CalculationRequest) -> CalculationResult {
    PricingEngine::default().calculate(request)
}

/// Input checks in priority order; the first failure wins
fn validate(request: &CalculationRequest) -> Result<(), ValidationError> {
    if !request.cost.is_finite() || request.cost <= 0.0 {
        return Err(ValidationError::NonPositiveCost);
    }
    if !is_non_negative(request.product_fee_percent) {
        return Err(ValidationError::InvalidProductFee);
    }
    if !is_non_negative(request.desired_profit_percent) {
        return Err(ValidationError::InvalidDesiredProfit);
    }
    if let Some(marketing) = request.marketing_cost_percent {
        if !is_non_negative(marketing) {
            return Err(ValidationError::InvalidMarketingCost);
        }
    }
    Ok(())
}

/// Finite and >= 0; NaN and infinities fail
fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn service_rate(service: OptionalService, fees: &FeeTable) -> f64 {
    match service {
        OptionalService::Content => fees.content_service_fee_percent,
        OptionalService::Voucher => fees.voucher_service_fee_percent,
        OptionalService::Freeship => fees.freeship_service_fee_percent,
    }
}

/// Total percentage composition used by the solve
pub fn total_fee_percent(
    request: &CalculationRequest,
    fees: &FeeTable,
    policy: OptionalServicePolicy,
) -> f64 {
    let mut total = request.product_fee_percent
        + fees.payment_fee_percent
        + fees.vat_percent
        + request.desired_profit_percent;

    if let Some(marketing) = request.marketing_cost_percent {
        total += marketing;
    }

    let selected = request.selected_services();
    let rates = selected.iter().map(|s| service_rate(*s, fees));
    if policy == OptionalServicePolicy::HighestOnly && selected.len() > 1 {
        total += rates.fold(f64::NEG_INFINITY, f64::max);
    } else {
        total += rates.sum::<f64>();
    }

    total
}

#[derive(Debug, Default, Clone, Copy)]
struct ServiceFees {
    content: f64,
    voucher: f64,
    freeship: f64,
}

impl ServiceFees {
    fn slot_mut(&mut self, service: OptionalService) -> &mut f64 {
        match service {
            OptionalService::Content => &mut self.content,
            OptionalService::Voucher => &mut self.voucher,
            OptionalService::Freeship => &mut self.freeship,
        }
    }
}

/// Fee a selected service would cost at `final_price`, after tier caps
fn candidate_fee(
    service: OptionalService,
    fees: &FeeTable,
    tier: StoreTier,
    final_price: f64,
) -> f64 {
    let raw = final_price * (service_rate(service, fees) / 100.0);
    match service {
        OptionalService::Content if tier.has_fee_caps() => raw.min(fees.content_service_fee_cap),
        OptionalService::Content => raw,
        OptionalService::Voucher => raw,
        OptionalService::Freeship => raw.min(fees.freeship_service_fee_cap),
    }
}

fn service_fees(
    request: &CalculationRequest,
    fees: &FeeTable,
    policy: OptionalServicePolicy,
    final_price: f64,
) -> ServiceFees {
    let selected = request.selected_services();
    let candidates: Vec<(OptionalService, f64)> = selected
        .iter()
        .map(|s| (*s, candidate_fee(*s, fees, request.store_tier, final_price)))
        .collect();

    let mut out = ServiceFees::default();
    if policy == OptionalServicePolicy::HighestOnly && candidates.len() > 1 {
        // Strict comparison keeps the earliest service on ties
        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        *out.slot_mut(best.0) = best.1;
    } else {
        for (service, amount) in candidates {
            *out.slot_mut(service) = amount;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CalculationRequest {
        CalculationRequest {
            cost: 100_000.0,
            product_fee_percent: 5.0,
            desired_profit_percent: 20.0,
            ..Default::default()
        }
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn worked_example_matches_breakdown() {
        let result = calculate_price(&base_request());
        assert!(result.is_valid);
        assert!(close(result.final_price, 103_000.0 / 0.685, 1e-6));
        assert!(close(result.product_fee, 7_518.25, 0.01));
        assert!(close(result.payment_fee, 7_518.25, 0.01));
        assert!(close(result.vat_fee, 2_255.47, 0.01));
        assert!(close(result.profit, 30_072.99, 0.01));
        assert_eq!(result.infrastructure_fee, 3_000.0);
        assert_eq!(result.shipping_cost, 0.0);
        assert!(close(result.covered_total(), result.final_price, 1e-6));
        assert!(close(result.profit_margin_percent, 20.0, 1e-9));
    }

    #[test]
    fn total_fee_percent_for_worked_example() {
        let engine = PricingEngine::default();
        assert!(close(engine.total_fee_percent(&base_request()), 31.5, 1e-12));
    }

    #[test]
    fn validation_order_first_failure_wins() {
        let req = CalculationRequest {
            cost: 0.0,
            product_fee_percent: -1.0,
            desired_profit_percent: -1.0,
            ..Default::default()
        };
        let result = calculate_price(&req);
        assert!(!result.is_valid);
        assert_eq!(result.error, Some(ValidationError::NonPositiveCost));
        assert_eq!(result.error_message.as_deref(), Some("cost must be positive"));

        let req = CalculationRequest {
            product_fee_percent: -1.0,
            desired_profit_percent: -1.0,
            ..base_request()
        };
        assert_eq!(
            calculate_price(&req).error,
            Some(ValidationError::InvalidProductFee)
        );

        let req = CalculationRequest {
            desired_profit_percent: -1.0,
            marketing_cost_percent: Some(-1.0),
            ..base_request()
        };
        assert_eq!(
            calculate_price(&req).error,
            Some(ValidationError::InvalidDesiredProfit)
        );

        let req = CalculationRequest {
            marketing_cost_percent: Some(-0.5),
            ..base_request()
        };
        assert_eq!(
            calculate_price(&req).error,
            Some(ValidationError::InvalidMarketingCost)
        );
    }

    #[test]
    fn nan_inputs_are_rejected() {
        let req = CalculationRequest {
            cost: f64::NAN,
            ..base_request()
        };
        assert_eq!(
            calculate_price(&req).error,
            Some(ValidationError::NonPositiveCost)
        );

        let req = CalculationRequest {
            product_fee_percent: f64::NAN,
            ..base_request()
        };
        assert_eq!(
            calculate_price(&req).error,
            Some(ValidationError::InvalidProductFee)
        );
    }

    #[test]
    fn infinite_inputs_are_rejected() {
        let req = CalculationRequest {
            cost: f64::INFINITY,
            ..base_request()
        };
        let result = calculate_price(&req);
        assert!(!result.is_valid);
        assert_eq!(result.error, Some(ValidationError::NonPositiveCost));

        let req = CalculationRequest {
            desired_profit_percent: f64::INFINITY,
            ..base_request()
        };
        assert_eq!(
            calculate_price(&req).error,
            Some(ValidationError::InvalidDesiredProfit)
        );

        let req = CalculationRequest {
            marketing_cost_percent: Some(f64::INFINITY),
            ..base_request()
        };
        assert_eq!(
            calculate_price(&req).error,
            Some(ValidationError::InvalidMarketingCost)
        );
    }

    #[test]
    fn infinite_cost_from_yaml_is_rejected() {
        let req: CalculationRequest = serde_yaml::from_str("cost: .inf\n").unwrap();
        assert!(req.cost.is_infinite());
        assert!(!calculate_price(&req).is_valid);
    }

    #[test]
    fn invalid_result_is_zeroed() {
        let result = calculate_price(&CalculationRequest {
            cost: -100.0,
            ..base_request()
        });
        assert_eq!(result.final_price, 0.0);
        assert_eq!(result.total_cost, 0.0);
        assert_eq!(result.profit, 0.0);
        assert_eq!(result.cost, 0.0);
        assert!(result.fee_lines().iter().all(|(_, v)| *v == 0.0));
    }

    #[test]
    fn shipping_subsidy_is_a_fixed_cost() {
        let with = calculate_price(&CalculationRequest {
            use_shipping_subsidy: true,
            ..base_request()
        });
        let without = calculate_price(&base_request());
        assert_eq!(with.shipping_cost, FeeTable::default().shipping_subsidy_flat);
        assert!(close(
            with.final_price,
            (100_000.0 + 3_000.0 + 1_620.0) / 0.685,
            1e-6
        ));
        assert!(with.final_price > without.final_price);
    }

    #[test]
    fn marketing_cost_is_charged_on_price() {
        let result = calculate_price(&CalculationRequest {
            marketing_cost_percent: Some(3.0),
            ..base_request()
        });
        assert!(close(result.marketing_cost, result.final_price * 0.03, 1e-9));
        assert!(close(result.covered_total(), result.final_price, 1e-6));
    }

    #[test]
    fn sum_policy_charges_every_selected_service() {
        let engine = PricingEngine::new(OptionalServicePolicy::Sum);
        let req = CalculationRequest {
            use_content_service: true,
            use_voucher_service: true,
            ..base_request()
        };
        let result = engine.calculate(&req);
        assert!(result.content_service_fee > 0.0);
        assert!(result.voucher_service_fee > 0.0);
        assert!(close(engine.total_fee_percent(&req), 31.5 + 2.59 + 1.96, 1e-9));
    }

    #[test]
    fn highest_only_policy_keeps_one_service() {
        let engine = PricingEngine::default();
        let req = CalculationRequest {
            use_content_service: true,
            use_voucher_service: true,
            ..base_request()
        };
        let result = engine.calculate(&req);
        assert!(result.content_service_fee > 0.0);
        assert_eq!(result.voucher_service_fee, 0.0);
        assert!(close(engine.total_fee_percent(&req), 31.5 + 2.59, 1e-9));
    }

    #[test]
    fn single_service_is_identical_under_both_policies() {
        let req = CalculationRequest {
            use_voucher_service: true,
            ..base_request()
        };
        let sum = PricingEngine::new(OptionalServicePolicy::Sum).calculate(&req);
        let highest = PricingEngine::new(OptionalServicePolicy::HighestOnly).calculate(&req);
        assert_eq!(sum, highest);
    }

    #[test]
    fn freeship_ignored_for_standard_store() {
        let req = CalculationRequest {
            use_freeship_service: true,
            use_content_service: true,
            use_voucher_service: true,
            store_tier: StoreTier::Standard,
            ..base_request()
        };
        assert_eq!(
            req.selected_services(),
            vec![OptionalService::Content, OptionalService::Voucher]
        );
        let result = PricingEngine::new(OptionalServicePolicy::Sum).calculate(&req);
        assert_eq!(result.freeship_service_fee, 0.0);
    }

    #[test]
    fn freeship_capped_for_premium_store() {
        let req = CalculationRequest {
            cost: 10_000_000.0,
            use_freeship_service: true,
            store_tier: StoreTier::Premium,
            ..base_request()
        };
        let result = calculate_price(&req);
        assert_eq!(
            result.freeship_service_fee,
            FeeTable::default().freeship_service_fee_cap
        );
    }

    #[test]
    fn ties_go_to_the_earliest_service() {
        let table = FeeTable {
            content_service_fee_percent: 2.0,
            voucher_service_fee_percent: 2.0,
            ..FeeTable::default()
        };
        let req = CalculationRequest {
            use_content_service: true,
            use_voucher_service: true,
            fee_table: Some(table),
            ..base_request()
        };
        let result = calculate_price(&req);
        assert!(result.content_service_fee > 0.0);
        assert_eq!(result.voucher_service_fee, 0.0);
    }

    #[test]
    fn request_table_replaces_engine_table() {
        let table = FeeTable {
            payment_fee_percent: 0.0,
            vat_percent: 0.0,
            infrastructure_fee_flat: 0.0,
            ..FeeTable::default()
        };
        let engine = PricingEngine::default().with_fee_table(FeeTable {
            payment_fee_percent: 10.0,
            ..FeeTable::default()
        });
        let result = engine.calculate(&CalculationRequest {
            fee_table: Some(table),
            ..base_request()
        });
        assert!(close(result.final_price, 100_000.0 / 0.75, 1e-6));
        assert_eq!(result.payment_fee, 0.0);
    }

    #[test]
    fn nan_fee_table_is_rejected_not_propagated() {
        let table = FeeTable {
            vat_percent: f64::NAN,
            ..FeeTable::default()
        };
        let result = calculate_price(&CalculationRequest {
            fee_table: Some(table),
            ..base_request()
        });
        assert_eq!(result.error, Some(ValidationError::FeesExceedPrice));
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let json = r#"{ "cost": 50000, "desired_profit_percent": 10, "store_tier": "premium" }"#;
        let req: CalculationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.cost, 50_000.0);
        assert_eq!(req.store_tier, StoreTier::Premium);
        assert!(!req.use_content_service);
        assert!(req.fee_table.is_none());
    }
}
