//! Error types for the live tree

use crate::tree::NodeHandle;

/// Errors raised by live tree operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Handle does not name any node of this tree
    #[error("unknown node handle: {0}")]
    UnknownNode(NodeHandle),

    /// Operation requires an element node
    #[error("{0} is not an element")]
    NotAnElement(NodeHandle),

    /// Node is no longer attached to the document
    #[error("{0} is detached from the document")]
    Detached(NodeHandle),
}

/// Errors raised while parsing a selector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// Selector was empty or whitespace
    #[error("empty selector")]
    Empty,

    /// Selector is syntactically invalid
    #[error("invalid selector '{selector}' at {position}: {reason}")]
    Invalid {
        selector: String,
        position: usize,
        reason: String,
    },

    /// Pseudo-class the engine does not understand
    #[error("unsupported pseudo-class ':{pseudo}' in '{selector}'")]
    UnsupportedPseudo { selector: String, pseudo: String },
}

impl SelectorError {
    pub(crate) fn invalid(selector: &str, position: usize, reason: impl Into<String>) -> Self {
        Self::Invalid {
            selector: selector.to_string(),
            position,
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading a document fixture
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// JSON could not be decoded
    #[error("malformed document fixture: {0}")]
    Json(#[from] serde_json::Error),

    /// Fixture root has an empty tag name
    #[error("fixture element at depth {depth} has an empty tag name")]
    EmptyTag { depth: usize },
}
