use thiserror::Error;

/// Failures of the I/O-facing collaborators (fee source and catalog).
/// The pricing engine itself reports problems as data, never through this type.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("fee source returned no usable row: {0}")]
    EmptyFeeRow(String),

    #[error("unknown category path: {0}")]
    UnknownCategory(String),
}

pub type PricingResult<T> = Result<T, PricingError>;
