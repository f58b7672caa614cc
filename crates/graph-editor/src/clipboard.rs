//! Clipboard snapshots and id-safe paste
//!
//! Copy captures an immutable sub-graph. Each paste clones it under fresh
//! ids, rewrites edge endpoints through an old-id -> new-id map, and
//! offsets positions by an amount that grows with every paste until the
//! next copy, so repeated pastes stack instead of landing on top of each
//! other.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::constants::defaults::COPY_SUFFIX;
use crate::ids::IdGenerator;
use crate::types::{Edge, Node, NodeId, Position};

/// Immutable sub-graph captured by a copy
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardSnapshot {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl ClipboardSnapshot {
    /// Capture the selected nodes and the edges between them
    ///
    /// The start node is never captured. Edges crossing the selection
    /// boundary are dropped. Returns None when nothing copyable is selected.
    pub fn capture(nodes: &[Node], edges: &[Edge], selected: &BTreeSet<NodeId>) -> Option<Self> {
        let captured: Vec<Node> = nodes
            .iter()
            .filter(|n| selected.contains(&n.id) && !n.is_start())
            .cloned()
            .collect();
        if captured.is_empty() {
            return None;
        }

        let ids: HashSet<&str> = captured.iter().map(|n| n.id.as_str()).collect();
        let edges = edges
            .iter()
            .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
            .cloned()
            .collect();

        Some(Self {
            nodes: captured,
            edges,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// Nodes and edges produced by one paste, ready to append to the graph
#[derive(Debug, Clone)]
pub struct PastedFragment {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl PastedFragment {
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }
}

/// Clipboard slot plus the paste offset accumulated since the last copy
#[derive(Debug, Default)]
pub struct Clipboard {
    snapshot: Option<ClipboardSnapshot>,
    accumulated_offset: Position,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clipboard contents and reset paste stacking
    pub fn copy(&mut self, snapshot: ClipboardSnapshot) {
        self.snapshot = Some(snapshot);
        self.accumulated_offset = Position::ORIGIN;
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none()
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
        self.accumulated_offset = Position::ORIGIN;
    }

    /// Clone the clipboard contents under fresh ids
    ///
    /// `graph_nodes`/`graph_edges` are the current graph, used to avoid id
    /// collisions and to resolve parents of pasted children. Returns None
    /// when the clipboard is empty.
    pub fn paste(
        &mut self,
        offset: Position,
        ids: &mut IdGenerator,
        graph_nodes: &[Node],
        graph_edges: &[Edge],
    ) -> Option<PastedFragment> {
        let snapshot = self.snapshot.as_ref()?;
        self.accumulated_offset += offset;
        let shift = self.accumulated_offset;

        let node_taken: HashSet<&str> = graph_nodes.iter().map(|n| n.id.as_str()).collect();
        let edge_taken: HashSet<&str> = graph_edges.iter().map(|e| e.id.as_str()).collect();

        ids.begin_batch();
        let id_map: HashMap<&str, NodeId> = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let new_id = ids.node_id(node.kind(), index, |id| node_taken.contains(id));
                (node.id.as_str(), new_id)
            })
            .collect();

        let nodes = snapshot
            .nodes
            .iter()
            .map(|node| {
                let mut copy = node.clone();
                copy.id = id_map[node.id.as_str()].clone();
                copy.position = node.position + shift;
                copy.selected = true;
                copy.parent_id = node.parent_id.as_ref().and_then(|parent| {
                    match id_map.get(parent.as_str()) {
                        Some(new_parent) => Some(new_parent.clone()),
                        None if node_taken.contains(parent.as_str()) => Some(parent.clone()),
                        None => None,
                    }
                });
                let name = copy.data.name_mut();
                if !name.is_empty() {
                    name.push_str(COPY_SUFFIX);
                }
                copy
            })
            .collect();

        let edges = snapshot
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| {
                let mut copy = edge.clone();
                copy.id = ids.edge_id(index, |id| edge_taken.contains(id));
                copy.source = id_map[edge.source.as_str()].clone();
                copy.target = id_map[edge.target.as_str()].clone();
                copy
            })
            .collect();

        Some(PastedFragment { nodes, edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::registry::NodeKind;

    fn graph() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            Node::start(&EditorConfig::default()),
            Node::new("a", NodeKind::ActionHttpRequest.default_data(), (10.0, 10.0)),
            Node::new("b", NodeKind::ActionSendEmail.default_data(), (10.0, 110.0)),
            Node::new("c", NodeKind::LogicDelay.default_data(), (10.0, 210.0)),
        ];
        let edges = vec![
            Edge::new("e1", "start-node", "a", None),
            Edge::new("e2", "a", "b", None),
            Edge::new("e3", "b", "c", None),
        ];
        (nodes, edges)
    }

    fn select(ids: &[&str]) -> BTreeSet<NodeId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_capture_keeps_internal_edges_only() {
        let (nodes, edges) = graph();
        let snapshot = ClipboardSnapshot::capture(&nodes, &edges, &select(&["start-node", "a", "b"])).unwrap();

        let ids: Vec<&str> = snapshot.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        let edge_ids: Vec<&str> = snapshot.edges().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(edge_ids, vec!["e2"]);
    }

    #[test]
    fn test_capture_of_start_only_is_none() {
        let (nodes, edges) = graph();
        assert!(ClipboardSnapshot::capture(&nodes, &edges, &select(&["start-node"])).is_none());
        assert!(ClipboardSnapshot::capture(&nodes, &edges, &select(&[])).is_none());
    }

    #[test]
    fn test_paste_remaps_ids_and_edges() {
        let (nodes, edges) = graph();
        let mut clipboard = Clipboard::new();
        clipboard.copy(ClipboardSnapshot::capture(&nodes, &edges, &select(&["a", "b"])).unwrap());

        let mut ids = IdGenerator::new();
        let pasted = clipboard
            .paste(Position::new(50.0, 50.0), &mut ids, &nodes, &edges)
            .unwrap();

        assert_eq!(pasted.nodes.len(), 2);
        assert_eq!(pasted.edges.len(), 1);
        let new_a = &pasted.nodes[0];
        let new_b = &pasted.nodes[1];
        assert_ne!(new_a.id, "a");
        assert_eq!(new_a.position, Position::new(60.0, 60.0));
        assert!(new_a.selected);
        assert_eq!(new_a.name(), "HTTP Request_copy");
        assert_eq!(pasted.edges[0].source, new_a.id);
        assert_eq!(pasted.edges[0].target, new_b.id);
        assert_ne!(pasted.edges[0].id, "e2");
    }

    #[test]
    fn test_repeated_pastes_stack_and_reset_on_copy() {
        let (nodes, edges) = graph();
        let mut clipboard = Clipboard::new();
        let snapshot = ClipboardSnapshot::capture(&nodes, &edges, &select(&["a"])).unwrap();
        clipboard.copy(snapshot.clone());
        let mut ids = IdGenerator::new();
        let offset = Position::new(50.0, 50.0);

        let first = clipboard.paste(offset, &mut ids, &nodes, &edges).unwrap();
        let second = clipboard.paste(offset, &mut ids, &nodes, &edges).unwrap();
        assert_eq!(first.nodes[0].position, Position::new(60.0, 60.0));
        assert_eq!(second.nodes[0].position, Position::new(110.0, 110.0));
        assert_ne!(first.nodes[0].id, second.nodes[0].id);

        clipboard.copy(snapshot);
        let third = clipboard.paste(offset, &mut ids, &nodes, &edges).unwrap();
        assert_eq!(third.nodes[0].position, Position::new(60.0, 60.0));
    }

    #[test]
    fn test_paste_reparents_children() {
        let config = EditorConfig::default();
        let nodes = vec![
            Node::start(&config),
            Node::new("loop", NodeKind::CompoundLoop.default_data(), (0.0, 0.0)),
            Node::new("inner", NodeKind::LogicDelay.default_data(), (5.0, 5.0)).with_parent("loop"),
            Node::new("lost", NodeKind::LogicDelay.default_data(), (5.0, 5.0)).with_parent("gone"),
        ];
        let mut clipboard = Clipboard::new();
        let mut ids = IdGenerator::new();

        // Parent copied along: child follows the copy
        clipboard.copy(ClipboardSnapshot::capture(&nodes, &[], &select(&["loop", "inner"])).unwrap());
        let pasted = clipboard.paste(Position::ORIGIN, &mut ids, &nodes, &[]).unwrap();
        assert_eq!(pasted.nodes[1].parent_id.as_ref(), Some(&pasted.nodes[0].id));

        // Child alone: stays in the original container
        clipboard.copy(ClipboardSnapshot::capture(&nodes, &[], &select(&["inner"])).unwrap());
        let pasted = clipboard.paste(Position::ORIGIN, &mut ids, &nodes, &[]).unwrap();
        assert_eq!(pasted.nodes[0].parent_id.as_deref(), Some("loop"));

        // Container no longer exists: parent cleared
        clipboard.copy(ClipboardSnapshot::capture(&nodes, &[], &select(&["lost"])).unwrap());
        let pasted = clipboard.paste(Position::ORIGIN, &mut ids, &nodes, &[]).unwrap();
        assert!(pasted.nodes[0].parent_id.is_none());
    }

    #[test]
    fn test_empty_clipboard_paste_is_none() {
        let (nodes, edges) = graph();
        let mut clipboard = Clipboard::new();
        let mut ids = IdGenerator::new();
        assert!(clipboard.paste(Position::new(1.0, 1.0), &mut ids, &nodes, &edges).is_none());
        assert!(clipboard.is_empty());
    }
}
