// src/error.rs
use std::io;
use thiserror::Error;
use warp::reject::Reject;

/// Failures raised while serving a request. Carried through warp as a
/// rejection and turned into a JSON body by `api::handle_rejection`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Symbol not found")]
    SymbolNotFound { symbol: Option<String> },
    #[error("Fund not found")]
    FundNotFound { fund: Option<String> },
    #[error("{0}")]
    Internal(String),
}

impl Reject for ApiError {}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<warp::http::Error> for ApiError {
    fn from(e: warp::http::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Failures while loading configuration or reference data at start-up.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },
    #[error("cannot read reference data: {0}")]
    Io(#[from] io::Error),
    #[error("malformed reference data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid reference data: {0}")]
    InvalidReference(String),
}
