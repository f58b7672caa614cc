//! Core types for workflow graphs
//!
//! These types define the structure of the editable workflow graph:
//! nodes, edges, connections and the snapshots kept by history.

use std::ops::{Add, AddAssign, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::constants::{handles, START_NODE_ID};
use crate::payload::{NodeData, StartData};
use crate::registry::NodeKind;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Name of a node output port (e.g. "then", "else")
pub type HandleId = String;

/// A point in canvas or page coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Coordinate-wise equality where NaN matches NaN
    pub fn same_as(&self, other: &Position) -> bool {
        let same = |a: f64, b: f64| a == b || (a.is_nan() && b.is_nan());
        same(self.x, other.x) && same(self.y, other.y)
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Position {
    type Output = Position;

    fn mul(self, rhs: f64) -> Position {
        Position::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Position {
    type Output = Position;

    fn div(self, rhs: f64) -> Position {
        Position::new(self.x / rhs, self.y / rhs)
    }
}

fn default_deletable() -> bool {
    true
}

/// A node instance in a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Type tag and typed payload
    #[serde(flatten)]
    pub data: NodeData,
    /// Position on the canvas
    pub position: Position,
    /// Enclosing compound node, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Whether user commands may delete this node
    #[serde(default = "default_deletable")]
    pub deletable: bool,
    /// Transient selection flag, mirrored from the store's selection set
    #[serde(skip)]
    pub selected: bool,
}

impl Node {
    /// Create a deletable, unparented node
    pub fn new(id: impl Into<String>, data: NodeData, position: impl Into<Position>) -> Self {
        Self {
            id: id.into(),
            data,
            position: position.into(),
            parent_id: None,
            deletable: true,
            selected: false,
        }
    }

    /// Create the reserved start node
    pub fn start(config: &EditorConfig) -> Self {
        Self {
            id: START_NODE_ID.to_string(),
            data: NodeData::Start(StartData {
                name: config.start_node_name.clone(),
            }),
            position: config.start_node_position,
            parent_id: None,
            deletable: false,
            selected: false,
        }
    }

    /// Place this node inside a compound node
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn name(&self) -> &str {
        self.data.name()
    }

    /// Whether this is the graph's entry node
    pub fn is_start(&self) -> bool {
        self.kind() == NodeKind::Start
    }

    /// Whether delete commands may remove this node
    pub fn is_removable(&self) -> bool {
        self.deletable && !self.is_start()
    }
}

// `selected` is view state and does not take part in equality, so selection
// changes never look like graph changes to history. Positions compare with
// `Position::same_as` so a NaN coordinate still equals itself.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.data == other.data
            && self.position.same_as(&other.position)
            && self.parent_id == other.parent_id
            && self.deletable == other.deletable
    }
}

/// Display/semantic variant of an edge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Default,
    /// Leaves a "then"/"else" branch port
    Branch,
    /// Leaves a loop's "loop-back" port
    LoopBack,
}

impl EdgeKind {
    /// Edge kind implied by a source handle
    pub fn for_handle(handle: Option<&str>) -> Self {
        match handle {
            Some(handles::THEN) | Some(handles::ELSE) => EdgeKind::Branch,
            Some(handles::LOOP_BACK) => EdgeKind::LoopBack,
            _ => EdgeKind::Default,
        }
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Output port on the source node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<HandleId>,
    #[serde(default)]
    pub kind: EdgeKind,
}

impl Edge {
    /// Create an edge whose kind follows from its handle
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        source_handle: Option<HandleId>,
    ) -> Self {
        let kind = EdgeKind::for_handle(source_handle.as_deref());
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle,
            kind,
        }
    }

    /// Whether this edge starts or ends at the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A proposed edge, checked before it becomes an [`Edge`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub source_handle: Option<HandleId>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
        }
    }

    /// Leave the source through a named port
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Whether `edge` already realises this connection
    pub fn matches(&self, edge: &Edge) -> bool {
        edge.source == self.source
            && edge.target == self.target
            && edge.source_handle == self.source_handle
    }
}

/// Editing surface currently shown to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorMode {
    /// Canvas editing
    #[default]
    Visual,
    /// Text (DSL) editing
    Textual,
}

/// The `(nodes, edges)` pair of a graph
///
/// This is what the codec parses into and serializes from, and what
/// history stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Structural equality against borrowed node and edge slices
    pub fn matches(&self, nodes: &[Node], edges: &[Edge]) -> bool {
        self.nodes == nodes && self.edges == edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_json_shape() {
        let node = Node::new("a", NodeKind::LogicDelay.default_data(), (10.0, 20.0)).with_parent("loop-1");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a",
                "type": "logic_delay",
                "data": {"name": "Delay", "seconds": 60},
                "position": {"x": 10.0, "y": 20.0},
                "parentId": "loop-1",
                "deletable": true
            })
        );

        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_node_deletable_defaults_to_true() {
        let node: Node = serde_json::from_value(json!({
            "id": "a",
            "type": "merge",
            "data": {"name": "Join"},
            "position": {"x": 0.0, "y": 0.0}
        }))
        .unwrap();
        assert!(node.deletable);
        assert_eq!(node.kind(), NodeKind::Merge);
        assert!(node.parent_id.is_none());
    }

    #[test]
    fn test_selection_flag_ignored_by_equality() {
        let a = Node::new("a", NodeKind::Merge.default_data(), (0.0, 0.0));
        let mut b = a.clone();
        b.selected = true;
        assert_eq!(a, b);
        b.position.x = 1.0;
        assert_ne!(a, b);
    }

    #[test]
    fn test_start_node() {
        let start = Node::start(&EditorConfig::default());
        assert_eq!(start.id, START_NODE_ID);
        assert!(start.is_start());
        assert!(!start.is_removable());
    }

    #[test]
    fn test_edge_kind_for_handle() {
        assert_eq!(EdgeKind::for_handle(Some("then")), EdgeKind::Branch);
        assert_eq!(EdgeKind::for_handle(Some("else")), EdgeKind::Branch);
        assert_eq!(EdgeKind::for_handle(Some("loop-back")), EdgeKind::LoopBack);
        assert_eq!(EdgeKind::for_handle(Some("output")), EdgeKind::Default);
        assert_eq!(EdgeKind::for_handle(None), EdgeKind::Default);
    }

    #[test]
    fn test_position_arithmetic() {
        let mut p = Position::new(1.0, 2.0) + Position::new(3.0, 4.0);
        assert_eq!(p, Position::new(4.0, 6.0));
        p += Position::new(50.0, 50.0) * 2.0;
        assert_eq!(p, Position::new(104.0, 106.0));
        assert_eq!((p - Position::new(4.0, 6.0)) / 2.0, Position::new(50.0, 50.0));
    }

    #[test]
    fn test_snapshot_with_nan_position_equals_itself() {
        let node = Node::new("a", NodeKind::LogicDelay.default_data(), (f64::NAN, 3.0));
        assert_eq!(node, node.clone());

        let snapshot = GraphSnapshot::new(vec![node.clone()], Vec::new());
        assert!(snapshot.matches(&[node.clone()], &[]));

        let moved = Node::new("a", NodeKind::LogicDelay.default_data(), (f64::NAN, 4.0));
        assert_ne!(node, moved);
        assert!(Position::new(0.0, 0.0).same_as(&Position::new(-0.0, 0.0)));
    }
}
