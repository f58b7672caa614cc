//! Shared constants for the graph editor core

/// Fixed id of the synthesized start node
pub const START_NODE_ID: &str = "start-node";

/// Source handle names used by compound and branching nodes
pub mod handles {
    /// "then" branch of a compound condition
    pub const THEN: &str = "then";
    /// "else" branch of a compound condition
    pub const ELSE: &str = "else";
    /// Loop body return path of a compound loop
    pub const LOOP_BACK: &str = "loop-back";
}

/// Default values for [`crate::config::EditorConfig`]
pub mod defaults {
    /// Maximum number of undo snapshots kept
    pub const HISTORY_LIMIT: usize = 100;
    /// Offset applied per paste (x, y)
    pub const PASTE_OFFSET: (f64, f64) = (50.0, 50.0);
    /// Canvas position of a synthesized start node (x, y)
    pub const START_NODE_POSITION: (f64, f64) = (0.0, 0.0);
    /// Display name of a synthesized start node
    pub const START_NODE_NAME: &str = "Start";
    /// Suffix appended to the display name of pasted nodes
    pub const COPY_SUFFIX: &str = "_copy";
}
