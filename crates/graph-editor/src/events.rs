//! Change notifications from the graph store
//!
//! Events are sent from the store to the renderer (or any consumer) after a
//! command has committed, so a consumer always observes settled state.

use serde::{Deserialize, Serialize};

use crate::types::{EditorMode, NodeId};

/// Trait for receiving editor events
///
/// This abstracts over the transport mechanism (UI callback, channel, etc.)
/// allowing the store to be used in different hosts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be delivered (e.g., channel closed)
    fn send(&self, event: EditorEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

/// Events emitted by the graph store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// Nodes or edges changed
    #[serde(rename_all = "camelCase")]
    GraphChanged { node_count: usize, edge_count: usize },

    /// A new graph replaced the previous one
    #[serde(rename_all = "camelCase")]
    GraphLoaded { node_count: usize, edge_count: usize },

    /// The selected node set changed
    #[serde(rename_all = "camelCase")]
    SelectionChanged { selected: Vec<NodeId> },

    /// The unsaved-changes flag flipped
    #[serde(rename_all = "camelCase")]
    DirtyChanged { dirty: bool },

    /// Switched between visual and textual editing
    #[serde(rename_all = "camelCase")]
    ModeChanged { mode: EditorMode },

    /// A candidate node was staged or cleared
    #[serde(rename_all = "camelCase")]
    CandidateChanged { staged: bool },

    /// Workflow text could not be parsed; the graph was left untouched
    #[serde(rename_all = "camelCase")]
    ParseFailed { message: String },
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EditorEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<EditorEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<EditorEvent> {
        self.lock().clone()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EditorEvent>> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EditorEvent) -> Result<(), EventError> {
        self.lock().push(event);
        Ok(())
    }
}

// Lets a test keep a handle on the sink it gave to the store.
impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn send(&self, event: EditorEvent) -> Result<(), EventError> {
        (**self).send(event)
    }
}
