//! Marketplace fee table
//!
//! Percentage and flat-fee constants used by one calculation. The engine
//! always receives a complete table; partial rows coming from a remote
//! source are merged into a base table first via [`FeeTable::merged_with`].

use serde::{Deserialize, Serialize};

/// Complete set of marketplace fee constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeTable {
    /// Payment processing fee, % of final price
    pub payment_fee_percent: f64,
    /// Content service fee, % of final price
    pub content_service_fee_percent: f64,
    /// Content service cap (currency), premium tier only
    pub content_service_fee_cap: f64,
    /// Voucher service fee, % of final price, never capped
    pub voucher_service_fee_percent: f64,
    /// Freeship service fee, % of final price, premium tier only
    pub freeship_service_fee_percent: f64,
    /// Freeship service cap (currency)
    pub freeship_service_fee_cap: f64,
    /// Flat shipping subsidy charged when the seller opts in
    pub shipping_subsidy_flat: f64,
    /// Flat infrastructure fee, always charged
    pub infrastructure_fee_flat: f64,
    /// VAT, % of final price
    pub vat_percent: f64,
}

impl Default for FeeTable {
    fn default() -> Self {
        Self {
            payment_fee_percent: 5.0,
            content_service_fee_percent: 2.59,
            content_service_fee_cap: 50_000.0,
            voucher_service_fee_percent: 1.96,
            freeship_service_fee_percent: 6.0,
            freeship_service_fee_cap: 50_000.0,
            shipping_subsidy_flat: 1_620.0,
            infrastructure_fee_flat: 3_000.0,
            vat_percent: 1.5,
        }
    }
}

/// Partially populated fee row, e.g. one spreadsheet row with missing columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeTableOverride {
    #[serde(default)]
    pub payment_fee_percent: Option<f64>,
    #[serde(default)]
    pub content_service_fee_percent: Option<f64>,
    #[serde(default)]
    pub content_service_fee_cap: Option<f64>,
    #[serde(default)]
    pub voucher_service_fee_percent: Option<f64>,
    #[serde(default)]
    pub freeship_service_fee_percent: Option<f64>,
    #[serde(default)]
    pub freeship_service_fee_cap: Option<f64>,
    #[serde(default)]
    pub shipping_subsidy_flat: Option<f64>,
    #[serde(default)]
    pub infrastructure_fee_flat: Option<f64>,
    #[serde(default)]
    pub vat_percent: Option<f64>,
}

/// Named field of a fee table, used when mapping external column names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeField {
    PaymentFeePercent,
    ContentServiceFeePercent,
    ContentServiceFeeCap,
    VoucherServiceFeePercent,
    FreeshipServiceFeePercent,
    FreeshipServiceFeeCap,
    ShippingSubsidyFlat,
    InfrastructureFeeFlat,
    VatPercent,
}

impl FeeField {
    pub const ALL: [FeeField; 9] = [
        FeeField::PaymentFeePercent,
        FeeField::ContentServiceFeePercent,
        FeeField::ContentServiceFeeCap,
        FeeField::VoucherServiceFeePercent,
        FeeField::FreeshipServiceFeePercent,
        FeeField::FreeshipServiceFeeCap,
        FeeField::ShippingSubsidyFlat,
        FeeField::InfrastructureFeeFlat,
        FeeField::VatPercent,
    ];

    /// Percent fields are bounded to [0, 100], flat fields only to >= 0
    pub fn is_percent(&self) -> bool {
        matches!(
            self,
            FeeField::PaymentFeePercent
                | FeeField::ContentServiceFeePercent
                | FeeField::VoucherServiceFeePercent
                | FeeField::FreeshipServiceFeePercent
                | FeeField::VatPercent
        )
    }

    /// Column aliases accepted from external sources, normalized
    /// (lowercase, no separators)
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            FeeField::PaymentFeePercent => &["paymentfeepercent", "paymentfee", "payment"],
            FeeField::ContentServiceFeePercent => &[
                "contentservicefeepercent",
                "contentxtrafeepercent",
                "contentfeepercent",
                "contentxtra",
            ],
            FeeField::ContentServiceFeeCap => &[
                "contentservicefeecap",
                "contentxtrafeemax",
                "contentfeecap",
                "contentfeemax",
            ],
            FeeField::VoucherServiceFeePercent => &[
                "voucherservicefeepercent",
                "voucherxtrafeepercent",
                "voucherfeepercent",
                "voucherxtra",
            ],
            FeeField::FreeshipServiceFeePercent => &[
                "freeshipservicefeepercent",
                "freeshipxtrafeepercent",
                "freeshipfeepercent",
                "freeshipxtra",
            ],
            FeeField::FreeshipServiceFeeCap => &[
                "freeshipservicefeecap",
                "freeshipxtrafeemax",
                "freeshipfeecap",
                "freeshipfeemax",
            ],
            FeeField::ShippingSubsidyFlat => &[
                "shippingsubsidyflat",
                "shippingcostpiship",
                "shippingsubsidy",
                "piship",
            ],
            FeeField::InfrastructureFeeFlat => &[
                "infrastructurefeeflat",
                "infrastructurefee",
                "infrastructure",
            ],
            FeeField::VatPercent => &["vatpercent", "vat"],
        }
    }

    /// Resolve an external column name to a field
    pub fn from_column(name: &str) -> Option<Self> {
        let key = normalize_column(name);
        if key.is_empty() {
            return None;
        }
        FeeField::ALL
            .iter()
            .copied()
            .find(|field| field.aliases().iter().any(|alias| *alias == key))
    }
}

fn normalize_column(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

impl FeeTableOverride {
    /// Set one field
    pub fn set(&mut self, field: FeeField, value: f64) {
        let slot = match field {
            FeeField::PaymentFeePercent => &mut self.payment_fee_percent,
            FeeField::ContentServiceFeePercent => &mut self.content_service_fee_percent,
            FeeField::ContentServiceFeeCap => &mut self.content_service_fee_cap,
            FeeField::VoucherServiceFeePercent => &mut self.voucher_service_fee_percent,
            FeeField::FreeshipServiceFeePercent => &mut self.freeship_service_fee_percent,
            FeeField::FreeshipServiceFeeCap => &mut self.freeship_service_fee_cap,
            FeeField::ShippingSubsidyFlat => &mut self.shipping_subsidy_flat,
            FeeField::InfrastructureFeeFlat => &mut self.infrastructure_fee_flat,
            FeeField::VatPercent => &mut self.vat_percent,
        };
        *slot = Some(value);
    }

    /// Read one field
    pub fn get(&self, field: FeeField) -> Option<f64> {
        match field {
            FeeField::PaymentFeePercent => self.payment_fee_percent,
            FeeField::ContentServiceFeePercent => self.content_service_fee_percent,
            FeeField::ContentServiceFeeCap => self.content_service_fee_cap,
            FeeField::VoucherServiceFeePercent => self.voucher_service_fee_percent,
            FeeField::FreeshipServiceFeePercent => self.freeship_service_fee_percent,
            FeeField::FreeshipServiceFeeCap => self.freeship_service_fee_cap,
            FeeField::ShippingSubsidyFlat => self.shipping_subsidy_flat,
            FeeField::InfrastructureFeeFlat => self.infrastructure_fee_flat,
            FeeField::VatPercent => self.vat_percent,
        }
    }

    /// Number of populated fields
    pub fn populated(&self) -> usize {
        FeeField::ALL
            .iter()
            .filter(|f| self.get(**f).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }
}

impl FeeTable {
    /// Read one field
    pub fn get(&self, field: FeeField) -> f64 {
        match field {
            FeeField::PaymentFeePercent => self.payment_fee_percent,
            FeeField::ContentServiceFeePercent => self.content_service_fee_percent,
            FeeField::ContentServiceFeeCap => self.content_service_fee_cap,
            FeeField::VoucherServiceFeePercent => self.voucher_service_fee_percent,
            FeeField::FreeshipServiceFeePercent => self.freeship_service_fee_percent,
            FeeField::FreeshipServiceFeeCap => self.freeship_service_fee_cap,
            FeeField::ShippingSubsidyFlat => self.shipping_subsidy_flat,
            FeeField::InfrastructureFeeFlat => self.infrastructure_fee_flat,
            FeeField::VatPercent => self.vat_percent,
        }
    }

    fn slot_mut(&mut self, field: FeeField) -> &mut f64 {
        match field {
            FeeField::PaymentFeePercent => &mut self.payment_fee_percent,
            FeeField::ContentServiceFeePercent => &mut self.content_service_fee_percent,
            FeeField::ContentServiceFeeCap => &mut self.content_service_fee_cap,
            FeeField::VoucherServiceFeePercent => &mut self.voucher_service_fee_percent,
            FeeField::FreeshipServiceFeePercent => &mut self.freeship_service_fee_percent,
            FeeField::FreeshipServiceFeeCap => &mut self.freeship_service_fee_cap,
            FeeField::ShippingSubsidyFlat => &mut self.shipping_subsidy_flat,
            FeeField::InfrastructureFeeFlat => &mut self.infrastructure_fee_flat,
            FeeField::VatPercent => &mut self.vat_percent,
        }
    }

    /// Merge a partial row field by field. Missing, non-finite, negative or
    /// (for percentages) > 100 values keep the value from `self`.
    pub fn merged_with(&self, row: &FeeTableOverride) -> FeeTable {
        let mut merged = *self;
        for field in FeeField::ALL {
            if let Some(value) = row.get(field) {
                if is_acceptable(field, value) {
                    *merged.slot_mut(field) = value;
                } else {
                    tracing::warn!(
                        field = ?field,
                        value,
                        "Rejected fee-table value, keeping base"
                    );
                }
            }
        }
        merged
    }

    /// Whether every field holds a usable value
    pub fn is_well_formed(&self) -> bool {
        FeeField::ALL
            .iter()
            .all(|f| is_acceptable(*f, self.get(*f)))
    }
}

fn is_acceptable(field: FeeField, value: f64) -> bool {
    if !value.is_finite() || value < 0.0 {
        return false;
    }
    !(field.is_percent() && value > 100.0)
}
