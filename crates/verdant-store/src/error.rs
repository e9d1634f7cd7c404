//! Error types for store operations

use thiserror::Error;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    // ============ Configuration Errors ============
    #[error("{variable} missing in environment")]
    MissingEnv { variable: String },

    #[error("Invalid store address: {address} - {reason}")]
    InvalidAddress { address: String, reason: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} reading {path}")]
    HttpStatus { status: u16, path: String },

    #[error("Network error: {message}")]
    Network { message: String },

    // ============ Data Errors ============
    #[error("No data at store path: {path}")]
    NoData { path: String },

    #[error("Malformed store payload at {path}: {message}")]
    MalformedPayload { path: String, message: String },

    // ============ Resolution Errors ============
    #[error("Cloud not found: {name}")]
    CloudNotFound { name: String },

    #[error("Cluster not found: {name}")]
    ClusterNotFound { name: String },

    #[error(transparent)]
    Entity(#[from] verdant_core::CoreError),

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            StoreError::HttpStatus {
                status: status.as_u16(),
                path: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
            }
        } else {
            StoreError::Network {
                message: e.to_string(),
            }
        }
    }
}

impl From<url::ParseError> for StoreError {
    fn from(e: url::ParseError) -> Self {
        StoreError::InvalidAddress {
            address: String::new(),
            reason: e.to_string(),
        }
    }
}
