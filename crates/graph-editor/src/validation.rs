//! Connection and graph validation
//!
//! [`check_connection`] decides whether a proposed edge may be added and is
//! run before every connect. [`validate_graph`] audits a whole graph against
//! the same structural rules and reports every violation it finds.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::constants::handles;
use crate::registry::NodeKind;
use crate::types::{Connection, Edge, Node, NodeId};

/// Why a proposed connection was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionRejection {
    #[error("node '{0}' cannot connect to itself")]
    SelfLoop(NodeId),

    #[error("node '{0}' does not exist")]
    UnknownNode(NodeId),

    #[error("node '{0}' accepts no incoming edges")]
    TargetAcceptsNoInput(NodeId),

    #[error("port '{handle}' on node '{node_id}' already has an outgoing edge")]
    BranchSaturated { node_id: NodeId, handle: String },

    #[error("node '{target}' only accepts edges from its container '{parent}'")]
    ForeignParent { target: NodeId, parent: NodeId },

    #[error("edge would create a cycle")]
    Cycle,
}

/// Structural problem found by [`validate_graph`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Duplicate node id '{0}'")]
    DuplicateNodeId(NodeId),

    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    UnknownNode { edge_id: String, node_id: NodeId },

    #[error("Node '{node_id}' has unknown parent '{parent_id}'")]
    UnknownParent { node_id: NodeId, parent_id: NodeId },

    #[error("Graph has no start node")]
    MissingStartNode,

    #[error("Graph has multiple start nodes")]
    MultipleStartNodes,

    #[error("Node '{node_id}' is inside '{parent_id}', which is not a compound node")]
    ParentNotContainer { node_id: NodeId, parent_id: NodeId },

    #[error("Start node '{0}' is deletable")]
    DeletableStartNode(NodeId),

    #[error("Edge '{edge_id}' targets node '{node_id}', which accepts no input")]
    InputOnTrigger { edge_id: String, node_id: NodeId },

    #[error("Port '{handle}' on node '{node_id}' has more than one outgoing edge")]
    BranchOverloaded { node_id: NodeId, handle: String },

    #[error("Edge '{edge_id}' enters node '{target}' from outside its container '{parent}'")]
    ForeignParentEdge {
        edge_id: String,
        target: NodeId,
        parent: NodeId,
    },

    #[error("Cycle detected in graph")]
    CycleDetected,
}

/// Check a proposed connection against the current graph
///
/// Rules are evaluated in order and the first failure is returned.
pub fn check_connection(
    connection: &Connection,
    nodes: &[Node],
    edges: &[Edge],
) -> Result<(), ConnectionRejection> {
    if connection.source == connection.target {
        return Err(ConnectionRejection::SelfLoop(connection.source.clone()));
    }

    let find = |id: &str| nodes.iter().find(|n| n.id == id);
    let source = find(&connection.source)
        .ok_or_else(|| ConnectionRejection::UnknownNode(connection.source.clone()))?;
    let target = find(&connection.target)
        .ok_or_else(|| ConnectionRejection::UnknownNode(connection.target.clone()))?;

    if !target.kind().accepts_input() {
        return Err(ConnectionRejection::TargetAcceptsNoInput(target.id.clone()));
    }

    if source.kind() == NodeKind::CompoundCondition {
        if let Some(handle) = connection.source_handle.as_deref() {
            let is_branch = handle == handles::THEN || handle == handles::ELSE;
            let saturated = edges
                .iter()
                .any(|e| e.source == source.id && e.source_handle.as_deref() == Some(handle));
            if is_branch && saturated {
                return Err(ConnectionRejection::BranchSaturated {
                    node_id: source.id.clone(),
                    handle: handle.to_string(),
                });
            }
        }
    }

    if let Some(parent) = &target.parent_id {
        if *parent != source.id {
            return Err(ConnectionRejection::ForeignParent {
                target: target.id.clone(),
                parent: parent.clone(),
            });
        }
    }

    let mut adjacency = adjacency(edges);
    adjacency
        .entry(connection.source.as_str())
        .or_default()
        .push(connection.target.as_str());
    if contains_cycle(nodes.iter().map(|n| n.id.as_str()), &adjacency) {
        return Err(ConnectionRejection::Cycle);
    }

    Ok(())
}

/// Boolean form of [`check_connection`]
///
/// Logs the rejection reason at debug level.
pub fn is_valid_connection(connection: &Connection, nodes: &[Node], edges: &[Edge]) -> bool {
    match check_connection(connection, nodes, edges) {
        Ok(()) => true,
        Err(reason) => {
            log::debug!(
                "Rejected connection {} -> {}: {}",
                connection.source,
                connection.target,
                reason
            );
            false
        }
    }
}

/// Audit a whole graph
///
/// Returns all validation errors found (not just the first).
pub fn validate_graph(nodes: &[Node], edges: &[Edge]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_node_ids(nodes, &mut errors);
    validate_start_node(nodes, &mut errors);
    validate_edge_references(nodes, edges, &mut errors);
    validate_edge_rules(nodes, edges, &mut errors);

    let adjacency = adjacency(edges);
    if contains_cycle(nodes.iter().map(|n| n.id.as_str()), &adjacency) {
        errors.push(ValidationError::CycleDetected);
    }

    errors
}

fn validate_node_ids(nodes: &[Node], errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in nodes {
        if !seen.insert(&node.id) {
            errors.push(ValidationError::DuplicateNodeId(node.id.clone()));
        }
    }
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    for node in nodes {
        let Some(parent_id) = &node.parent_id else {
            continue;
        };
        match by_id.get(parent_id.as_str()) {
            None => errors.push(ValidationError::UnknownParent {
                node_id: node.id.clone(),
                parent_id: parent_id.clone(),
            }),
            Some(parent) if !parent.kind().is_compound() => {
                errors.push(ValidationError::ParentNotContainer {
                    node_id: node.id.clone(),
                    parent_id: parent_id.clone(),
                })
            }
            Some(_) => {}
        }
    }
}

fn validate_start_node(nodes: &[Node], errors: &mut Vec<ValidationError>) {
    let starts: Vec<&Node> = nodes.iter().filter(|n| n.is_start()).collect();
    match starts.as_slice() {
        [] => errors.push(ValidationError::MissingStartNode),
        [start] => {
            if start.deletable {
                errors.push(ValidationError::DeletableStartNode(start.id.clone()));
            }
        }
        _ => errors.push(ValidationError::MultipleStartNodes),
    }
}

/// Check that all edge source/target nodes exist
fn validate_edge_references(nodes: &[Node], edges: &[Edge], errors: &mut Vec<ValidationError>) {
    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in edges {
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                errors.push(ValidationError::UnknownNode {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
    }
}

/// Trigger inputs, branch port capacity and container boundaries
fn validate_edge_rules(nodes: &[Node], edges: &[Edge], errors: &mut Vec<ValidationError>) {
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut branch_counts: HashMap<(&str, &str), usize> = HashMap::new();

    for edge in edges {
        if let Some(target) = by_id.get(edge.target.as_str()) {
            if !target.kind().accepts_input() {
                errors.push(ValidationError::InputOnTrigger {
                    edge_id: edge.id.clone(),
                    node_id: target.id.clone(),
                });
            }
            if let Some(parent) = &target.parent_id {
                if *parent != edge.source {
                    errors.push(ValidationError::ForeignParentEdge {
                        edge_id: edge.id.clone(),
                        target: target.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let is_condition = by_id
            .get(edge.source.as_str())
            .is_some_and(|n| n.kind() == NodeKind::CompoundCondition);
        if let (true, Some(handle)) = (is_condition, edge.source_handle.as_deref()) {
            if handle == handles::THEN || handle == handles::ELSE {
                *branch_counts.entry((edge.source.as_str(), handle)).or_insert(0) += 1;
            }
        }
    }

    let mut overloaded: Vec<(&str, &str)> = branch_counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key)
        .collect();
    overloaded.sort_unstable();
    for (node_id, handle) in overloaded {
        errors.push(ValidationError::BranchOverloaded {
            node_id: node_id.to_string(),
            handle: handle.to_string(),
        });
    }
}

fn adjacency(edges: &[Edge]) -> HashMap<&str, Vec<&str>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }
    adjacency
}

/// Depth-first search from every root, tracking the nodes on the current path
///
/// Edge sources are used as extra roots so dangling edges are still
/// covered. Runs in O(V + E).
fn contains_cycle<'a>(
    roots: impl Iterator<Item = &'a str>,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
) -> bool {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        OnPath,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack: Vec<(&str, usize)> = Vec::new();

    for root in roots.chain(adjacency.keys().copied()) {
        if marks.contains_key(root) {
            continue;
        }
        marks.insert(root, Mark::OnPath);
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let children = adjacency.get(node).map(Vec::as_slice).unwrap_or(&[]);
            if frame.1 < children.len() {
                let next = children[frame.1];
                frame.1 += 1;
                match marks.get(next) {
                    Some(Mark::OnPath) => return true,
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(next, Mark::OnPath);
                        stack.push((next, 0));
                    }
                }
            } else {
                marks.insert(node, Mark::Done);
                stack.pop();
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::registry::NodeKind;
    use proptest::prelude::*;

    fn node(id: &str, kind: NodeKind) -> Node {
        Node::new(id, kind.default_data(), (0.0, 0.0))
    }

    fn edge(id: &str, source: &str, target: &str) -> Edge {
        Edge::new(id, source, target, None)
    }

    fn base_nodes() -> Vec<Node> {
        vec![
            Node::start(&EditorConfig::default()),
            node("a", NodeKind::ActionHttpRequest),
            node("b", NodeKind::ActionSendEmail),
        ]
    }

    #[test]
    fn test_example_scenario() {
        let nodes = base_nodes();
        let mut edges = vec![edge("e1", "start-node", "a")];

        assert_eq!(
            check_connection(&Connection::new("b", "start-node"), &nodes, &edges),
            Err(ConnectionRejection::TargetAcceptsNoInput("start-node".to_string()))
        );

        assert!(is_valid_connection(&Connection::new("a", "b"), &nodes, &edges));
        edges.push(edge("e2", "a", "b"));

        assert_eq!(
            check_connection(&Connection::new("b", "a"), &nodes, &edges),
            Err(ConnectionRejection::Cycle)
        );
    }

    #[test]
    fn test_self_loop_rejected_first() {
        let nodes = base_nodes();
        // The start node would also fail the input rule; self-loop wins.
        assert_eq!(
            check_connection(&Connection::new("start-node", "start-node"), &nodes, &[]),
            Err(ConnectionRejection::SelfLoop("start-node".to_string()))
        );
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let nodes = base_nodes();
        assert_eq!(
            check_connection(&Connection::new("a", "ghost"), &nodes, &[]),
            Err(ConnectionRejection::UnknownNode("ghost".to_string()))
        );
    }

    #[test]
    fn test_trigger_target_rejected() {
        let mut nodes = base_nodes();
        nodes.push(node("hook", NodeKind::TriggerWebhook));
        assert!(!is_valid_connection(&Connection::new("a", "hook"), &nodes, &[]));
        assert!(is_valid_connection(&Connection::new("hook", "a"), &nodes, &[]));
    }

    #[test]
    fn test_branch_port_saturates() {
        let mut nodes = base_nodes();
        nodes.push(node("if", NodeKind::CompoundCondition));
        let edges = vec![Edge::new("e1", "if", "a", Some("then".to_string()))];

        let then_again = Connection::new("if", "b").with_handle("then");
        assert_eq!(
            check_connection(&then_again, &nodes, &edges),
            Err(ConnectionRejection::BranchSaturated {
                node_id: "if".to_string(),
                handle: "then".to_string(),
            })
        );

        let else_branch = Connection::new("if", "b").with_handle("else");
        assert!(is_valid_connection(&else_branch, &nodes, &edges));

        // Unnamed ports are not capacity limited
        let plain = Connection::new("if", "b");
        assert!(is_valid_connection(&plain, &nodes, &edges));
    }

    #[test]
    fn test_child_only_accepts_from_parent() {
        let mut nodes = base_nodes();
        nodes.push(node("loop", NodeKind::CompoundLoop));
        nodes.push(node("child", NodeKind::LogicDelay).with_parent("loop"));

        assert_eq!(
            check_connection(&Connection::new("a", "child"), &nodes, &[]),
            Err(ConnectionRejection::ForeignParent {
                target: "child".to_string(),
                parent: "loop".to_string(),
            })
        );
        assert!(is_valid_connection(&Connection::new("loop", "child"), &nodes, &[]));
    }

    #[test]
    fn test_long_cycle_detected() {
        let nodes = vec![
            node("a", NodeKind::LogicDelay),
            node("b", NodeKind::LogicDelay),
            node("c", NodeKind::LogicDelay),
            node("d", NodeKind::LogicDelay),
        ];
        let edges = vec![edge("e1", "a", "b"), edge("e2", "b", "c"), edge("e3", "c", "d")];
        assert!(!is_valid_connection(&Connection::new("d", "a"), &nodes, &edges));
        assert!(is_valid_connection(&Connection::new("a", "d"), &nodes, &edges));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let nodes = vec![
            node("a", NodeKind::LogicDelay),
            node("b", NodeKind::LogicDelay),
            node("c", NodeKind::LogicDelay),
            node("d", NodeKind::Merge),
        ];
        let edges = vec![edge("e1", "a", "b"), edge("e2", "a", "c"), edge("e3", "b", "d")];
        assert!(is_valid_connection(&Connection::new("c", "d"), &nodes, &edges));
    }

    #[test]
    fn test_valid_graph_has_no_errors() {
        let nodes = base_nodes();
        let edges = vec![edge("e1", "start-node", "a"), edge("e2", "a", "b")];
        let errors = validate_graph(&nodes, &edges);
        assert!(errors.is_empty(), "Expected no errors, got: {:?}", errors);
    }

    #[test]
    fn test_validate_collects_multiple_errors() {
        let mut nodes = vec![node("a", NodeKind::LogicDelay), node("b", NodeKind::LogicDelay)];
        nodes.push(node("hook", NodeKind::TriggerWebhook));
        let edges = vec![
            edge("e1", "a", "b"),
            edge("e2", "b", "a"),
            edge("e3", "a", "hook"),
            edge("e4", "a", "missing"),
        ];

        let errors = validate_graph(&nodes, &edges);
        assert!(errors.contains(&ValidationError::MissingStartNode));
        assert!(errors.contains(&ValidationError::CycleDetected));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InputOnTrigger { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownNode { .. })));
    }

    #[test]
    fn test_validate_branch_and_parent_rules() {
        let mut nodes = base_nodes();
        nodes.push(node("if", NodeKind::CompoundCondition));
        nodes.push(node("inner", NodeKind::LogicDelay).with_parent("if"));
        nodes.push(node("orphan", NodeKind::LogicDelay).with_parent("gone"));
        nodes.push(node("nested", NodeKind::LogicDelay).with_parent("a"));
        let edges = vec![
            Edge::new("e1", "if", "a", Some("then".to_string())),
            Edge::new("e2", "if", "b", Some("then".to_string())),
            edge("e3", "a", "inner"),
        ];

        let errors = validate_graph(&nodes, &edges);
        assert!(errors.contains(&ValidationError::BranchOverloaded {
            node_id: "if".to_string(),
            handle: "then".to_string(),
        }));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ForeignParentEdge { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownParent { .. })));
        assert!(errors.contains(&ValidationError::ParentNotContainer {
            node_id: "nested".to_string(),
            parent_id: "a".to_string(),
        }));
    }

    #[test]
    fn test_validate_start_node_rules() {
        let mut start = Node::start(&EditorConfig::default());
        start.deletable = true;
        let errors = validate_graph(&[start.clone()], &[]);
        assert_eq!(errors, vec![ValidationError::DeletableStartNode("start-node".to_string())]);

        let mut second = Node::start(&EditorConfig::default());
        second.id = "start-2".to_string();
        let errors = validate_graph(&[Node::start(&EditorConfig::default()), second], &[]);
        assert_eq!(errors, vec![ValidationError::MultipleStartNodes]);
    }

    proptest! {
        #[test]
        fn prop_accepted_connections_never_form_cycles(
            attempts in proptest::collection::vec((0usize..6, 0usize..6, 0usize..3), 0..40)
        ) {
            let kinds = [
                NodeKind::TriggerManual,
                NodeKind::CompoundCondition,
                NodeKind::LogicDelay,
                NodeKind::ActionRunScript,
                NodeKind::Merge,
                NodeKind::ActionSendEmail,
            ];
            let mut nodes: Vec<Node> = kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| node(&format!("n{}", i), *kind))
                .collect();
            nodes.push(Node::start(&EditorConfig::default()));
            let handle_for = |h: usize| match h {
                0 => None,
                1 => Some("then".to_string()),
                _ => Some("else".to_string()),
            };

            let mut edges: Vec<Edge> = Vec::new();
            for (i, (s, t, h)) in attempts.into_iter().enumerate() {
                let connection = Connection {
                    source: format!("n{}", s),
                    target: format!("n{}", t),
                    source_handle: handle_for(h),
                };
                if is_valid_connection(&connection, &nodes, &edges) {
                    edges.push(Edge::new(
                        format!("e{}", i),
                        connection.source,
                        connection.target,
                        connection.source_handle,
                    ));
                }
                let errors = validate_graph(&nodes, &edges);
                prop_assert!(errors.is_empty(), "invariant broken: {:?}", errors);
            }
        }
    }
}
