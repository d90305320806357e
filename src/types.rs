//! Core types shared by the pricing engine, catalog and fee source
//!
//! Store tiers, optional marketplace services and the policy that decides
//! how several selected services are charged together.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seller store tier. Gates the cap-based fee behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTier {
    /// Mall-type store: capped service fees, freeship service available
    Premium,
    /// Regular store: uncapped service fees
    Standard,
}

impl Default for StoreTier {
    fn default() -> Self {
        StoreTier::Standard
    }
}

impl StoreTier {
    /// Whether service-fee caps apply to this tier
    pub fn has_fee_caps(&self) -> bool {
        matches!(self, StoreTier::Premium)
    }

    /// Number of category levels a seller of this tier can browse
    pub fn category_depth(&self) -> usize {
        match self {
            StoreTier::Premium => 4,
            StoreTier::Standard => 2,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "premium" | "mall" => Some(StoreTier::Premium),
            "standard" | "regular" => Some(StoreTier::Standard),
            _ => None,
        }
    }
}

impl fmt::Display for StoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreTier::Premium => write!(f, "premium"),
            StoreTier::Standard => write!(f, "standard"),
        }
    }
}

/// Optional add-on services a seller can opt into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalService {
    Content,
    Voucher,
    Freeship,
}

impl OptionalService {
    /// All services in tie-break order
    pub const ALL: [OptionalService; 3] = [
        OptionalService::Content,
        OptionalService::Voucher,
        OptionalService::Freeship,
    ];

    /// Whether the service can be charged for a store of this tier
    pub fn available_for(&self, tier: StoreTier) -> bool {
        match self {
            OptionalService::Freeship => tier == StoreTier::Premium,
            OptionalService::Content | OptionalService::Voucher => true,
        }
    }
}

impl fmt::Display for OptionalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionalService::Content => write!(f, "content"),
            OptionalService::Voucher => write!(f, "voucher"),
            OptionalService::Freeship => write!(f, "freeship"),
        }
    }
}

/// How fees are composed when more than one optional service is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalServicePolicy {
    /// Every selected service is charged independently
    Sum,
    /// Only the single most expensive selected service is charged
    #[serde(alias = "highest-only", alias = "highest")]
    HighestOnly,
}

impl Default for OptionalServicePolicy {
    fn default() -> Self {
        OptionalServicePolicy::HighestOnly
    }
}

impl OptionalServicePolicy {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sum" => Some(OptionalServicePolicy::Sum),
            "highest_only" | "highest" => Some(OptionalServicePolicy::HighestOnly),
            _ => None,
        }
    }
}

impl fmt::Display for OptionalServicePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionalServicePolicy::Sum => write!(f, "sum"),
            OptionalServicePolicy::HighestOnly => write!(f, "highest_only"),
        }
    }
}
