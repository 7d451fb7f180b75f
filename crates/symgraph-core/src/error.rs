use crate::SymbolId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("symbol not found: {0}")]
    SymbolNotFound(SymbolId),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("analysis depth {0} exceeded")]
    AnalysisDepthExceeded(usize),

    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("background processing failure: {0}")]
    Processing(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
