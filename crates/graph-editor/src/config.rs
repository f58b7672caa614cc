//! Configuration types for the graph editor

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::{EditorError, Result};
use crate::types::Position;

/// Tunables for a [`crate::store::GraphStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo steps kept (at least 1)
    pub history_limit: usize,
    /// Offset used by keyboard paste
    pub paste_offset: Position,
    /// Where a synthesized start node is placed
    pub start_node_position: Position,
    /// Display name of a synthesized start node
    pub start_node_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: defaults::HISTORY_LIMIT,
            paste_offset: defaults::PASTE_OFFSET.into(),
            start_node_position: defaults::START_NODE_POSITION.into(),
            start_node_name: defaults::START_NODE_NAME.to_string(),
        }
    }
}

impl EditorConfig {
    /// Read a config from JSON, filling missing fields with defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that positions are finite
    pub fn validate(&self) -> Result<()> {
        let finite = |p: &Position| p.x.is_finite() && p.y.is_finite();
        if !finite(&self.paste_offset) {
            return Err(EditorError::Config("pasteOffset must be finite".to_string()));
        }
        if !finite(&self.start_node_position) {
            return Err(EditorError::Config(
                "startNodePosition must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.paste_offset, Position::new(50.0, 50.0));
        assert_eq!(config.start_node_name, "Start");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json_str(r#"{"historyLimit": 5}"#).unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.paste_offset, Position::new(50.0, 50.0));
    }

    #[test]
    fn test_malformed_json() {
        let err = EditorConfig::from_json_str("{historyLimit").unwrap_err();
        assert!(matches!(err, EditorError::Serialization(_)));
    }

    #[test]
    fn test_non_finite_offset_rejected() {
        let mut config = EditorConfig::default();
        config.paste_offset.x = f64::NAN;
        assert!(matches!(config.validate(), Err(EditorError::Config(_))));
    }
}
