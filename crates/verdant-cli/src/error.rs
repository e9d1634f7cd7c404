//! CLI error type with exit code handling
//!
//! Every engine error funnels into one CLI error whose variant decides the
//! process exit code.

use miette::Diagnostic;
use thiserror::Error;
use verdant_converge::ConvergeError;
use verdant_core::CoreError;
use verdant_store::StoreError;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Store records or entity attributes are unusable
    #[error("Configuration error: {message}")]
    #[diagnostic(code(verdant::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Secret aggregation refused to continue
    #[error("Secrets error: {message}")]
    #[diagnostic(code(verdant::cli::secrets))]
    Secrets { message: String },

    /// A shelled-out tool exited non-zero
    #[error("Command failed: {message}")]
    #[diagnostic(code(verdant::cli::command))]
    Command { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(verdant::cli::io))]
    Io { message: String },

    /// Invalid arguments or option combinations
    #[error("Usage error: {message}")]
    #[diagnostic(code(verdant::cli::usage))]
    Usage { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Secrets { .. } => exit_codes::SECRETS_ERROR,
            CliError::Command { .. } => exit_codes::COMMAND_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
        }
    }

    fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            other => CliError::config(other.to_string()),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            StoreError::MissingEnv { .. } => CliError::config_with_help(
                err.to_string(),
                "set VAULT_ADDR and VAULT_TOKEN (and VAULT_CACERT for https)",
            ),
            StoreError::Entity(inner) => inner.into(),
            other => CliError::config(other.to_string()),
        }
    }
}

impl From<ConvergeError> for CliError {
    fn from(err: ConvergeError) -> Self {
        match err {
            ConvergeError::SecretConflict { .. } | ConvergeError::MissingSecrets { .. } => {
                CliError::Secrets {
                    message: err.to_string(),
                }
            }
            ConvergeError::CommandFailed { .. } => CliError::Command {
                message: err.to_string(),
            },
            ConvergeError::Io(e) => CliError::Io {
                message: e.to_string(),
            },
            ConvergeError::Entity(inner) => inner.into(),
            ConvergeError::Store(inner) => inner.into(),
            other => CliError::config(other.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
