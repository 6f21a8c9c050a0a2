//! Error Types for Crypto Sentinel

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SentinelError>;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Insufficient data: need {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("No usable samples: {0}")]
    EmptyData(String),

    #[error("Malformed sample: {0}")]
    MalformedSample(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SentinelError {
    /// Whether this is one of the data-quality failures an estimator can raise
    pub const fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. } | Self::EmptyData(_) | Self::MalformedSample(_)
        )
    }
}
