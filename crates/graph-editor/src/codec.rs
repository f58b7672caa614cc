//! Seam to the textual workflow codec
//!
//! The editor never interprets workflow text itself. A host supplies a
//! [`WorkflowCodec`]; the store calls `parse` when loading and hands its
//! committed graph to `serialize` on request.

use crate::types::GraphSnapshot;

/// Converts between workflow text and graphs
pub trait WorkflowCodec {
    /// Parse text into a graph, or describe why it could not be parsed
    fn parse(&self, text: &str) -> Result<GraphSnapshot, String>;

    /// Render a graph as text
    fn serialize(&self, graph: &GraphSnapshot) -> Result<String, String>;
}

/// Codec storing the graph as pretty-printed JSON
///
/// Used by hosts without a workflow DSL, and handy in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl WorkflowCodec for JsonCodec {
    fn parse(&self, text: &str) -> Result<GraphSnapshot, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    fn serialize(&self, graph: &GraphSnapshot) -> Result<String, String> {
        serde_json::to_string_pretty(graph).map_err(|e| e.to_string())
    }
}
