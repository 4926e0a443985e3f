//! Error types for the mutation core
//!
//! [`RestyleError`] carries one variant per failure class of the taxonomy;
//! [`ErrorType`] is the taxonomy itself, used by the classifier, the
//! recovery dispatcher and the retry predicates.

use restyle_dom::{DomError, SelectorError};
use restyle_schema::SchemaError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main error type of the mutation core
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RestyleError {
    /// Selector resolved to nothing
    #[error("target not found: {selector}")]
    TargetNotFound { selector: String },

    /// Selector could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Requested mutation failed schema validation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Transport-level failure talking to a collaborator
    #[error("network error: {0}")]
    Network(String),

    /// Host refused the operation
    #[error("permission denied: {0}")]
    Permission(String),

    /// Mutation could not be carried out on the live tree
    #[error("execution failed: {0}")]
    Execution(String),

    /// The interpreter or image service reported a failure
    #[error("generative service error: {0}")]
    Generative(String),

    /// An attempt did not finish in time
    #[error("{operation} timed out after {elapsed_ms}ms")]
    Timeout { operation: String, elapsed_ms: u64 },

    /// Payload could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl RestyleError {
    /// Taxonomy member implied by the variant alone
    #[must_use]
    pub fn kind(&self) -> ErrorType {
        match self {
            Self::TargetNotFound { .. } => ErrorType::TargetNotFound,
            Self::InvalidSelector { .. } => ErrorType::InvalidSelector,
            Self::Validation(_) => ErrorType::ValidationError,
            Self::Network(_) => ErrorType::NetworkError,
            Self::Permission(_) => ErrorType::PermissionError,
            Self::Execution(_) => ErrorType::ExecutionError,
            Self::Generative(_) => ErrorType::GenerativeServiceError,
            Self::Timeout { .. } => ErrorType::TimeoutError,
            Self::Serialization(_) => ErrorType::SerializationError,
            Self::Other(_) => ErrorType::Unknown,
        }
    }

    /// Check if error is worth retrying as-is
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Generative(_) | Self::Timeout { .. }
        )
    }

    /// Create target not found error
    pub fn target_not_found(selector: impl Into<String>) -> Self {
        Self::TargetNotFound {
            selector: selector.into(),
        }
    }

    /// Create timeout error
    pub fn timeout(operation: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_ms,
        }
    }
}

impl From<DomError> for RestyleError {
    fn from(err: DomError) -> Self {
        Self::Execution(err.to_string())
    }
}

impl From<SelectorError> for RestyleError {
    fn from(err: SelectorError) -> Self {
        let selector = match &err {
            SelectorError::Invalid { selector, .. }
            | SelectorError::UnsupportedPseudo { selector, .. } => selector.clone(),
            SelectorError::Empty => String::new(),
        };
        Self::InvalidSelector {
            selector,
            reason: err.to_string(),
        }
    }
}

impl From<SchemaError> for RestyleError {
    fn from(err: SchemaError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for RestyleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    TargetNotFound,
    InvalidSelector,
    ValidationError,
    NetworkError,
    PermissionError,
    ExecutionError,
    GenerativeServiceError,
    TimeoutError,
    SerializationError,
    Unknown,
}

impl ErrorType {
    /// Stable upper-case name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TargetNotFound => "TARGET_NOT_FOUND",
            Self::InvalidSelector => "INVALID_SELECTOR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::PermissionError => "PERMISSION_ERROR",
            Self::ExecutionError => "EXECUTION_ERROR",
            Self::GenerativeServiceError => "GENERATIVE_SERVICE_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Never auto-recovered
    #[inline]
    #[must_use]
    pub fn is_non_recoverable(&self) -> bool {
        matches!(self, Self::PermissionError)
    }

    /// Transient classes a caller may simply try again
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError
                | Self::GenerativeServiceError
                | Self::TimeoutError
                | Self::ExecutionError
        )
    }

    /// Default user-facing message
    #[must_use]
    pub fn default_user_message(&self) -> &'static str {
        match self {
            Self::TargetNotFound => "I couldn't find that element on the page anymore.",
            Self::InvalidSelector => "I couldn't work out which element you meant.",
            Self::ValidationError => "Some of the requested style values aren't valid.",
            Self::NetworkError => "I couldn't reach the style assistant. Check your connection.",
            Self::PermissionError => "This page doesn't allow that change.",
            Self::ExecutionError => "The change couldn't be applied to the page.",
            Self::GenerativeServiceError => "The style assistant is having trouble right now.",
            Self::TimeoutError => "That took too long to complete.",
            Self::SerializationError => "I couldn't understand the style assistant's reply.",
            Self::Unknown => "Something went wrong.",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Semantically invalid value
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}
