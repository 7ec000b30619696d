//! Error types for the auditor-dashboard library.
//!
//! Every repository call is fallible. Page models catch these errors at the
//! call site and turn them into short inline messages, so the variants are
//! grouped into three kinds through [`DashboardError::kind`].

use thiserror::Error;

/// Errors that can occur in the auditor dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// An operation referenced an id that does not exist
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Kind of record that was looked up ("Message", "Knowledge item")
        entity: &'static str,
        /// The id that was requested
        id: String,
    },

    /// Transport or HTTP-level failure reported by a backend
    #[error("Network error: {0}")]
    Network(String),

    /// Client-side validation failure; never reaches the API layer
    #[error("Validation failed: {0}")]
    Validation(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Coarse classification used when reporting failures to the auditor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The referenced record does not exist
    NotFound,
    /// The call failed in transit
    NetworkFailure,
    /// The input was rejected before any call was made
    ValidationFailure,
}

impl ErrorKind {
    /// Label used for metrics and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NetworkFailure => "network",
            Self::ValidationFailure => "validation",
        }
    }
}

impl DashboardError {
    /// Build a [`DashboardError::NotFound`] for a message id
    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { entity: "Message", id: id.into() }
    }

    /// Build a [`DashboardError::NotFound`] for a knowledge item id
    pub fn knowledge_item_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { entity: "Knowledge item", id: id.into() }
    }

    /// Classify the error. Anything that is neither a missing record nor a
    /// client-side rejection counts as a network failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) | Self::InvalidConfig(_) => ErrorKind::ValidationFailure,
            _ => ErrorKind::NetworkFailure,
        }
    }

    /// Text suitable for an inline form error. Validation failures show
    /// their bare message; everything else its full description.
    #[must_use]
    pub fn inline_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Convenience type alias for Result with DashboardError
pub type Result<T> = std::result::Result<T, DashboardError>;

impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DashboardError::message_not_found("42");
        assert_eq!(err.to_string(), "Message with id 42 not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(DashboardError::Network("timeout".into()).kind(), ErrorKind::NetworkFailure);
        assert_eq!(DashboardError::Validation("empty".into()).kind(), ErrorKind::ValidationFailure);
        assert_eq!(DashboardError::Other("boom".into()).kind(), ErrorKind::NetworkFailure);
    }

    #[test]
    fn test_inline_message_strips_prefix() {
        let err = DashboardError::Validation("Please provide guidance for regeneration".into());
        assert_eq!(err.inline_message(), "Please provide guidance for regeneration");
        assert_eq!(err.to_string(), "Validation failed: Please provide guidance for regeneration");
    }
}
