//! Graph Editor - Editing core for visual workflow graphs
//!
//! This crate holds the state behind a node-and-edge workflow canvas. It
//! renders nothing and executes nothing; a host draws the graph and forwards
//! user intents as store commands. It supports:
//!
//! - A typed node registry (triggers, actions, logic, compound nodes)
//! - Connection validation (no cycles, no inputs on triggers, one edge per
//!   condition branch, container-scoped edges)
//! - Snapshot-based undo/redo with identical-state coalescing
//! - Copy/paste with fresh ids and stacking offsets
//! - Two-phase "candidate" node placement
//!
//! # Architecture
//!
//! - `GraphStore`: Single owner of nodes, edges, selection and history
//! - `HistoryManager`: Bounded undo/redo over `(nodes, edges)` snapshots
//! - `WorkflowCodec`: Seam to the textual workflow language
//! - `EventSink`: Change notifications for the renderer
//!
//! # Example
//!
//! ```
//! use graph_editor::{Connection, EditorConfig, GraphSnapshot, GraphStore, Node, NodeKind};
//!
//! let mut store = GraphStore::new(EditorConfig::default());
//! store.load_graph(GraphSnapshot::new(
//!     vec![Node::new("fetch", NodeKind::ActionHttpRequest.default_data(), (200.0, 0.0))],
//!     Vec::new(),
//! ));
//!
//! assert!(store.connect(Connection::new("start-node", "fetch")).is_some());
//! assert!(store.connect(Connection::new("fetch", "start-node")).is_none());
//! assert!(store.undo());
//! ```

pub mod candidate;
pub mod clipboard;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod history;
pub mod ids;
pub mod payload;
pub mod registry;
pub mod shortcuts;
pub mod store;
pub mod types;
pub mod validation;

// Re-export key types
pub use candidate::{Candidate, ScreenToCanvas, Viewport};
pub use codec::{JsonCodec, WorkflowCodec};
pub use config::EditorConfig;
pub use error::{EditorError, Result};
pub use events::{EditorEvent, EventSink};
pub use history::HistoryManager;
pub use payload::NodeData;
pub use registry::{NodeCategory, NodeKind};
pub use shortcuts::{EditorCommand, Key, KeyChord};
pub use store::GraphStore;
pub use types::{
    Connection, Edge, EdgeKind, EditorMode, GraphSnapshot, Node, NodeId, Position,
};
pub use validation::{check_connection, is_valid_connection, ConnectionRejection, ValidationError};
