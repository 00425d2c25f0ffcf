//! Error types for the Bitwarden connector.

use thiserror::Error;

use vigil_connector::error::ConnectorError;

/// Result type alias using `BitwardenError`.
pub type BitwardenResult<T> = Result<T, BitwardenError>;

/// Errors that can occur when interacting with the Bitwarden public API.
#[derive(Debug, Error)]
pub enum BitwardenError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// `OAuth2` authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Token refresh failed.
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bitwarden API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored data does not have the shape the connector expects, e.g. an
    /// entitlement with an unknown resource type.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// The identity has no linked Bitwarden member id.
    #[error("No service identifier linked for identity {0}")]
    MissingServiceIdentifier(String),

    /// Error from a platform collaborator.
    #[error(transparent)]
    Platform(#[from] ConnectorError),
}

impl From<BitwardenError> for ConnectorError {
    fn from(err: BitwardenError) -> Self {
        match err {
            BitwardenError::Config(message) => ConnectorError::invalid_configuration(message),
            BitwardenError::Auth(message) | BitwardenError::TokenRefresh(message) => {
                ConnectorError::authentication_failed(message)
            }
            BitwardenError::Http(source) => ConnectorError::ConnectionFailed {
                message: source.to_string(),
                source: Some(Box::new(source)),
            },
            BitwardenError::Api { status: 404, message } => {
                ConnectorError::object_not_found(message)
            }
            BitwardenError::Api { status, message } => {
                ConnectorError::operation_failed(format!("{status} - {message}"))
            }
            BitwardenError::Json(source) => ConnectorError::invalid_data(source.to_string()),
            BitwardenError::DataIntegrity(message) => ConnectorError::invalid_data(message),
            BitwardenError::MissingServiceIdentifier(identity) => {
                ConnectorError::object_not_found(identity)
            }
            BitwardenError::Platform(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seam_conversion_classification() {
        let err: ConnectorError = BitwardenError::Config("bad url".to_string()).into();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let err: ConnectorError = BitwardenError::Auth("rejected".to_string()).into();
        assert_eq!(err.error_code(), "AUTH_FAILED");

        let err: ConnectorError = BitwardenError::Api {
            status: 404,
            message: "no such member".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "OBJECT_NOT_FOUND");

        let err: ConnectorError = BitwardenError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "OPERATION_FAILED");

        let err: ConnectorError =
            BitwardenError::DataIntegrity("unexpected resource type".to_string()).into();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }
}
