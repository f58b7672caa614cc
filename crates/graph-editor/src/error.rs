//! Error types for the graph editor core

use thiserror::Error;

/// Result type alias using EditorError
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors that can surface from the graph editor core
///
/// Interactive commands never return these: an invalid user action is a
/// no-op. Errors only come back from loading, configuration and payload
/// patching helpers.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The textual codec could not parse the workflow text
    #[error("Parse error: {0}")]
    Parse(String),

    /// A node id did not resolve to a node in the graph
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A type tag is not part of the node type registry
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A payload patch could not be applied to the node's data
    #[error("Invalid patch for node '{node_id}': {reason}")]
    InvalidPatch { node_id: String, reason: String },

    /// The textual codec could not render the graph
    #[error("Codec error: {0}")]
    Codec(String),

    /// Editor configuration could not be read
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EditorError {
    /// Create an invalid patch error
    pub fn invalid_patch(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPatch {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }
}
