//! Error types for the logging manifest provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Summary used for every YAML marshalling failure.
pub const MARSHAL_ERROR_SUMMARY: &str = "Failed to marshal resource";

/// Errors that can occur while serving data sources.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested data source type is not registered.
    #[error("Unknown data source type: {0}")]
    UnknownDataSource(String),

    /// The configuration failed schema validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The configuration could not be decoded into the manifest tree.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The manifest could not be rendered as YAML.
    #[error("Marshal error: {0}")]
    Marshal(#[from] serde_yaml::Error),

    /// A JSON serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// An internal provider error occurred.
    #[error("SDK error: {0}")]
    Sdk(String),
}

impl ProviderError {
    /// Convert the error into the diagnostic reported to the caller.
    ///
    /// Marshalling failures always carry [`MARSHAL_ERROR_SUMMARY`], with the
    /// underlying error in the detail.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Marshal(err) => Diagnostic::error(MARSHAL_ERROR_SUMMARY).with_detail(format!(
                "An unexpected error occurred while marshalling the resource. \
                 Please report this issue to the provider developers.\n\nMarshal Error: {}",
                err
            )),
            other => Diagnostic::error(other.to_string()),
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UnknownDataSource(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::InvalidConfig(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Marshal(err) => {
                tonic::Status::internal(format!("{}: {}", MARSHAL_ERROR_SUMMARY, err))
            },
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            },
            ProviderError::Sdk(msg) => tonic::Status::internal(msg),
        }
    }
}
