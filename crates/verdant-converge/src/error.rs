//! Error types for convergence operations

use thiserror::Error;

/// Result type for convergence operations
pub type Result<T> = std::result::Result<T, ConvergeError>;

/// Errors that abort a convergence run
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvergeError {
    /// Two charts in one namespace contributed the same secret key
    #[error(
        "secret key {key:?} in namespace {namespace:?} already set by chart \
         {previous_chart:?}, refusing overwrite by chart {chart:?}"
    )]
    SecretConflict {
        key: String,
        namespace: String,
        chart: String,
        previous_chart: String,
    },

    /// Declared secrets absent after aggregation; every missing key listed
    #[error("missing secrets for namespace {namespace:?}: {}", keys.join(", "))]
    MissingSecrets { namespace: String, keys: Vec<String> },

    /// A shelled-out tool exited non-zero
    #[error("command {program:?} failed with exit status {status}")]
    CommandFailed { program: String, status: i32 },

    /// The charts checkout is on a different branch than the cluster's
    /// subscription; deploying it would apply the wrong tree
    #[error("charts directory is on branch {actual:?}, cluster subscribes to {expected:?}")]
    ChartsBranchMismatch { expected: String, actual: String },

    /// A credentials blob could not be interpreted
    #[error("malformed credentials for cloud {cloud:?}: {message}")]
    MalformedCredentials { cloud: String, message: String },

    #[error(transparent)]
    Entity(#[from] verdant_core::CoreError),

    #[error(transparent)]
    Store(#[from] verdant_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvergeError {
    /// The external tool's exit status, when the failure came from one.
    pub fn external_status(&self) -> Option<i32> {
        match self {
            ConvergeError::CommandFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
