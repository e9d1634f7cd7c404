//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unknown provisioner: {value:?}")]
    UnknownProvisioner { value: String },

    #[error("{entity}: missing required attribute {attribute:?}")]
    MissingAttribute { entity: String, attribute: String },

    #[error("malformed chart definition {path}: {message}")]
    MalformedChart { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
