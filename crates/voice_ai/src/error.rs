//! Voice AI node errors

use thiserror::Error;

/// Errors that can occur while executing the Voice AI node
#[derive(Debug, Error)]
pub enum VoiceAiError {
    /// Failed to connect to the Voice AI API
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to the Voice AI API failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The API rejected the credential (HTTP 401/403)
    #[error("Authorization failed: {0}")]
    Unauthorized(String),

    /// Non-success response from the API
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A required node parameter was not supplied
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// A node parameter has the wrong type or is out of range
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter path, e.g. `additionalOptions.temperature`
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The item has no binary data under the requested property
    #[error("No binary data found for property '{0}'")]
    MissingBinaryData(String),

    /// No route exists for the resource/operation pair
    #[error("Unknown operation '{operation}' for resource '{resource}'")]
    UnknownOperation {
        /// Requested resource
        resource: String,
        /// Requested operation
        operation: String,
    },

    /// The host asked for a list-search method this node does not provide
    #[error("Unknown search method: {0}")]
    UnknownSearchMethod(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl VoiceAiError {
    /// Shorthand for [`VoiceAiError::InvalidParameter`]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for VoiceAiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VoiceAiError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
