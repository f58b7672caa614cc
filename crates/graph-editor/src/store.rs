//! The graph store: single owner of editor state
//!
//! All edits go through [`GraphStore`] commands. Every command runs to
//! completion synchronously, so two commands issued in sequence always see
//! each other's effects. Invalid user actions (deleting with nothing
//! selected, pasting an empty clipboard, a rejected connection, undo at the
//! start of history) are silent no-ops that leave the graph unchanged.
//!
//! # Committing
//!
//! Commands that change nodes or edges build the new collections and hand
//! them to `commit`, which:
//! 1. swaps them in and re-applies the selection flags
//! 2. records the previous `(nodes, edges)` pair in history, unless the new
//!    state is structurally identical
//! 3. sets the dirty flag and notifies the event sink
//!
//! Connections are validated before they reach `commit`, so an invariant
//! violation is never observable in committed state.

use std::collections::{BTreeSet, HashSet};

use serde_json::Value;

use crate::candidate::{Candidate, CandidatePlacement, ScreenToCanvas};
use crate::clipboard::{Clipboard, ClipboardSnapshot};
use crate::codec::WorkflowCodec;
use crate::config::EditorConfig;
use crate::constants::START_NODE_ID;
use crate::error::{EditorError, Result};
use crate::events::{EditorEvent, EventSink, NullEventSink};
use crate::history::HistoryManager;
use crate::ids::IdGenerator;
use crate::payload::NodeData;
use crate::registry::NodeKind;
use crate::shortcuts::{command_for, EditorCommand, KeyChord};
use crate::types::{
    Connection, Edge, EdgeId, EdgeKind, EditorMode, GraphSnapshot, Node, NodeId, Position,
};
use crate::validation::{check_connection, validate_graph, ValidationError};

/// Editable workflow graph with selection, clipboard, candidate and history
pub struct GraphStore {
    config: EditorConfig,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    selection: BTreeSet<NodeId>,
    clipboard: Clipboard,
    candidate: CandidatePlacement,
    mode: EditorMode,
    /// Unsaved changes since the last load or save
    dirty: bool,
    history: HistoryManager,
    ids: IdGenerator,
    last_parse_error: Option<String>,
    sink: Box<dyn EventSink>,
}

impl GraphStore {
    /// Create an empty store that discards events
    pub fn new(config: EditorConfig) -> Self {
        Self::with_sink(config, Box::new(NullEventSink))
    }

    /// Create an empty store reporting changes to `sink`
    pub fn with_sink(config: EditorConfig, sink: Box<dyn EventSink>) -> Self {
        Self {
            history: HistoryManager::new(config.history_limit),
            config,
            nodes: Vec::new(),
            edges: Vec::new(),
            selection: BTreeSet::new(),
            clipboard: Clipboard::new(),
            candidate: CandidatePlacement::new(),
            mode: EditorMode::default(),
            dirty: false,
            ids: IdGenerator::new(),
            last_parse_error: None,
            sink,
        }
    }

    // =========================================================================
    // Read model
    // =========================================================================

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Find a node by ID
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The graph's entry node, once a graph is loaded
    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.is_start())
    }

    /// Clone of the committed `(nodes, edges)` pair
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::new(self.nodes.clone(), self.edges.clone())
    }

    pub fn selected_node_ids(&self) -> &BTreeSet<NodeId> {
        &self.selection
    }

    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.current()
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Whether the graph changed since the last load or save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Message of the most recent failed `load_text`, cleared by a successful load
    pub fn last_parse_error(&self) -> Option<&str> {
        self.last_parse_error.as_deref()
    }

    /// Check the committed graph against all structural rules
    pub fn audit(&self) -> Vec<ValidationError> {
        validate_graph(&self.nodes, &self.edges)
    }

    // =========================================================================
    // Loading and serialization
    // =========================================================================

    /// Replace the whole graph
    ///
    /// Synthesizes the start node if absent and resets selection,
    /// clipboard, candidate and history. Clears the dirty flag.
    pub fn load_graph(&mut self, graph: GraphSnapshot) {
        let graph = sanitize_loaded(graph, &self.config);
        self.nodes = graph.nodes;
        self.edges = graph.edges;

        let had_selection = !self.selection.is_empty();
        self.selection.clear();
        self.clipboard.clear();
        let had_candidate = self.candidate.cancel();
        self.history.clear();
        self.last_parse_error = None;
        self.set_dirty(false);

        log::info!(
            "Loaded graph with {} nodes and {} edges",
            self.nodes.len(),
            self.edges.len()
        );
        self.emit(EditorEvent::GraphLoaded {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
        });
        if had_selection {
            self.emit_selection();
        }
        if had_candidate {
            self.emit(EditorEvent::CandidateChanged { staged: false });
        }
    }

    /// Parse workflow text with `codec` and load the result
    ///
    /// On a parse failure the current graph is left untouched and the
    /// message is returned, kept in [`GraphStore::last_parse_error`] and
    /// reported to the event sink.
    pub fn load_text(&mut self, text: &str, codec: &dyn WorkflowCodec) -> Result<()> {
        match codec.parse(text) {
            Ok(graph) => {
                self.load_graph(graph);
                Ok(())
            }
            Err(message) => {
                log::warn!("Failed to parse workflow text: {}", message);
                self.last_parse_error = Some(message.clone());
                self.emit(EditorEvent::ParseFailed {
                    message: message.clone(),
                });
                Err(EditorError::Parse(message))
            }
        }
    }

    /// Render the committed graph with `codec`
    pub fn serialize_with(&self, codec: &dyn WorkflowCodec) -> Result<String> {
        codec.serialize(&self.snapshot()).map_err(EditorError::Codec)
    }

    /// Clear the dirty flag after the caller persisted the graph
    pub fn mark_saved(&mut self) {
        self.set_dirty(false);
    }

    // =========================================================================
    // Bulk updates
    // =========================================================================

    /// Replace all nodes (drag commit, auto-layout)
    ///
    /// The caller is trusted to keep the graph valid.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> bool {
        self.commit(nodes, self.edges.clone())
    }

    /// Replace all edges
    ///
    /// The caller is trusted to keep the graph valid.
    pub fn set_edges(&mut self, edges: Vec<Edge>) -> bool {
        self.commit(self.nodes.clone(), edges)
    }

    /// Merge a JSON object into a node's payload
    ///
    /// Unknown ids and patches that do not fit the node's payload are
    /// no-ops. Returns whether the graph changed.
    pub fn update_node_data(&mut self, id: &str, patch: &Value) -> bool {
        match self.try_update_node_data(id, patch) {
            Ok(changed) => changed,
            Err(EditorError::UnknownNode(id)) => {
                log::debug!("Ignoring data update for unknown node '{}'", id);
                false
            }
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    /// Like [`GraphStore::update_node_data`], reporting why a patch was refused
    pub fn try_update_node_data(&mut self, id: &str, patch: &Value) -> Result<bool> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))?;
        let data = self.nodes[index]
            .data
            .merge_patch(patch)
            .map_err(|reason| EditorError::invalid_patch(id, reason))?;

        let mut nodes = self.nodes.clone();
        nodes[index].data = data;
        Ok(self.commit(nodes, self.edges.clone()))
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Add an edge if the connection passes validation
    ///
    /// Returns the new edge id, or None if the connection was rejected or
    /// already exists.
    pub fn connect(&mut self, connection: Connection) -> Option<EdgeId> {
        if let Err(reason) = check_connection(&connection, &self.nodes, &self.edges) {
            log::debug!(
                "Rejected connection {} -> {}: {}",
                connection.source,
                connection.target,
                reason
            );
            return None;
        }
        if self.edges.iter().any(|e| connection.matches(e)) {
            log::debug!(
                "Connection {} -> {} already exists",
                connection.source,
                connection.target
            );
            return None;
        }

        self.ids.begin_batch();
        let existing = &self.edges;
        let id = self.ids.edge_id(0, |id| existing.iter().any(|e| e.id == id));

        let mut edges = self.edges.clone();
        edges.push(Edge::new(
            id.clone(),
            connection.source,
            connection.target,
            connection.source_handle,
        ));
        self.commit(self.nodes.clone(), edges);
        Some(id)
    }

    /// Remove a single edge; no-op if unknown
    pub fn delete_edge(&mut self, id: &str) -> bool {
        if !self.edges.iter().any(|e| e.id == id) {
            log::debug!("Ignoring delete of unknown edge '{}'", id);
            return false;
        }
        let edges = self.edges.iter().filter(|e| e.id != id).cloned().collect();
        self.commit(self.nodes.clone(), edges)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Replace the selection; ids not in the graph are ignored
    pub fn set_selected_node_ids<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        let existing: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let selection: BTreeSet<NodeId> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &NodeId| existing.contains(id.as_str()))
            .collect();
        self.replace_selection(selection);
    }

    /// Select every node; no-op on an empty graph
    pub fn select_all(&mut self) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let all = self.nodes.iter().map(|n| n.id.clone()).collect();
        self.replace_selection(all)
    }

    pub fn deselect_all(&mut self) -> bool {
        self.replace_selection(BTreeSet::new())
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Delete every selected node except the start node, with their edges
    ///
    /// No-op if nothing deletable is selected.
    pub fn delete_selected(&mut self) -> bool {
        let doomed: HashSet<NodeId> = self
            .nodes
            .iter()
            .filter(|n| self.selection.contains(&n.id) && n.is_removable())
            .map(|n| n.id.clone())
            .collect();
        if doomed.is_empty() {
            log::debug!("Nothing deletable selected");
            return false;
        }

        self.replace_selection(BTreeSet::new());
        self.remove_nodes(&doomed)
    }

    /// Delete one node and its edges; the start node is never deleted
    pub fn delete_node(&mut self, id: &str) -> bool {
        match self.node(id) {
            Some(node) if node.is_removable() => {}
            Some(_) => {
                log::debug!("Node '{}' cannot be deleted", id);
                return false;
            }
            None => {
                log::debug!("Ignoring delete of unknown node '{}'", id);
                return false;
            }
        }

        let doomed = HashSet::from([id.to_string()]);
        self.remove_nodes(&doomed)
    }

    // Children of a removed container survive, detached from it.
    fn remove_nodes(&mut self, doomed: &HashSet<NodeId>) -> bool {
        let nodes = self
            .nodes
            .iter()
            .filter(|n| !doomed.contains(&n.id))
            .cloned()
            .map(|mut n| {
                if n.parent_id.as_ref().is_some_and(|p| doomed.contains(p)) {
                    n.parent_id = None;
                }
                n
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .filter(|e| !doomed.contains(&e.source) && !doomed.contains(&e.target))
            .cloned()
            .collect();

        log::debug!("Deleting {} node(s)", doomed.len());
        self.commit(nodes, edges)
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    /// Copy the selected nodes (minus the start node) and the edges between them
    ///
    /// No-op, keeping the previous clipboard, if nothing copyable is selected.
    pub fn copy_selected(&mut self) -> bool {
        match ClipboardSnapshot::capture(&self.nodes, &self.edges, &self.selection) {
            Some(snapshot) => {
                log::debug!(
                    "Copied {} node(s) and {} edge(s)",
                    snapshot.nodes().len(),
                    snapshot.edges().len()
                );
                self.clipboard.copy(snapshot);
                true
            }
            None => {
                log::debug!("Nothing copyable selected");
                false
            }
        }
    }

    /// Paste the clipboard, selecting exactly the pasted nodes
    ///
    /// Each paste since the last copy lands `offset` further away. Returns
    /// the ids of the pasted nodes (empty if the clipboard is empty).
    pub fn paste(&mut self, offset: Position) -> Vec<NodeId> {
        let Some(fragment) =
            self.clipboard
                .paste(offset, &mut self.ids, &self.nodes, &self.edges)
        else {
            log::debug!("Clipboard is empty");
            return Vec::new();
        };

        let pasted: Vec<NodeId> = fragment.node_ids().cloned().collect();
        let mut nodes = self.nodes.clone();
        nodes.extend(fragment.nodes);
        let mut edges = self.edges.clone();
        edges.extend(fragment.edges);

        self.selection = pasted.iter().cloned().collect();
        self.commit(nodes, edges);
        self.emit_selection();
        pasted
    }

    /// Paste with the configured offset
    pub fn paste_default(&mut self) -> Vec<NodeId> {
        self.paste(self.config.paste_offset)
    }

    // =========================================================================
    // Candidate placement
    // =========================================================================

    /// Stage a node for placement, replacing any staged candidate
    ///
    /// Start nodes cannot be staged.
    pub fn place_candidate(&mut self, data: NodeData) -> bool {
        if data.kind() == NodeKind::Start {
            log::debug!("Start node cannot be placed");
            return false;
        }
        if self.candidate.stage(data) {
            log::debug!("Replaced staged candidate");
        }
        self.emit(EditorEvent::CandidateChanged { staged: true });
        true
    }

    /// Track the pointer while a candidate is staged
    pub fn track_pointer(&mut self, page: Position, canvas: Position) -> bool {
        self.candidate.track(page, canvas)
    }

    /// Drop the staged candidate without touching the graph
    pub fn cancel_candidate(&mut self) -> bool {
        let cancelled = self.candidate.cancel();
        if cancelled {
            self.emit(EditorEvent::CandidateChanged { staged: false });
        }
        cancelled
    }

    /// Insert the candidate at the last pointer position
    ///
    /// The last page position is converted with `transform`. Returns the new
    /// node id; no-op without a candidate or pointer position.
    pub fn commit_candidate(&mut self, transform: &dyn ScreenToCanvas) -> Option<NodeId> {
        let Some((data, position)) = self.candidate.take_for_commit(transform) else {
            log::debug!("No candidate ready to commit");
            return None;
        };

        self.ids.begin_batch();
        let existing = &self.nodes;
        let id = self
            .ids
            .node_id(data.kind(), 0, |id| existing.iter().any(|n| n.id == id));

        let mut nodes = self.nodes.clone();
        nodes.push(Node::new(id.clone(), data, position));
        self.commit(nodes, self.edges.clone());
        self.emit(EditorEvent::CandidateChanged { staged: false });
        Some(id)
    }

    /// Confirm placement with a click at `page`
    pub fn commit_candidate_at(
        &mut self,
        page: Position,
        transform: &dyn ScreenToCanvas,
    ) -> Option<NodeId> {
        if !self.candidate.is_staged() {
            log::debug!("No candidate staged");
            return None;
        }
        self.candidate.track(page, transform.screen_to_canvas(page));
        self.commit_candidate(transform)
    }

    // =========================================================================
    // Mode and history
    // =========================================================================

    /// Switch between visual and textual editing; never touches the graph
    pub fn set_mode(&mut self, mode: EditorMode) {
        if self.mode != mode {
            self.mode = mode;
            self.emit(EditorEvent::ModeChanged { mode });
        }
    }

    /// Restore the previous `(nodes, edges)` pair
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            log::debug!("Nothing to undo");
            return false;
        }
        match self.history.undo(self.snapshot()) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone `(nodes, edges)` pair
    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            log::debug!("Nothing to redo");
            return false;
        }
        match self.history.redo(self.snapshot()) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Keyboard
    // =========================================================================

    /// Run a keyboard command; returns whether it had an effect
    pub fn dispatch(&mut self, command: EditorCommand) -> bool {
        match command {
            EditorCommand::Copy => self.copy_selected(),
            EditorCommand::Paste => !self.paste_default().is_empty(),
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
            EditorCommand::SelectAll => self.select_all(),
            EditorCommand::DeleteSelected => self.delete_selected(),
            EditorCommand::Escape => {
                if self.candidate.is_staged() {
                    self.cancel_candidate()
                } else {
                    self.deselect_all()
                }
            }
        }
    }

    /// Handle a key chord from the canvas
    ///
    /// Shortcuts only apply in visual mode. Returns whether the chord is
    /// bound to a command.
    pub fn handle_key(&mut self, chord: KeyChord) -> bool {
        if self.mode != EditorMode::Visual {
            return false;
        }
        match command_for(&chord) {
            Some(command) => {
                self.dispatch(command);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn commit(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> bool {
        let previous = GraphSnapshot::new(
            std::mem::replace(&mut self.nodes, nodes),
            std::mem::replace(&mut self.edges, edges),
        );
        self.sync_selection();

        if !self.history.record(previous, &self.nodes, &self.edges) {
            log::trace!("Commit left the graph unchanged");
            return false;
        }
        self.graph_changed();
        true
    }

    fn restore(&mut self, graph: GraphSnapshot) {
        self.nodes = graph.nodes;
        self.edges = graph.edges;
        self.sync_selection();
        self.graph_changed();
    }

    fn graph_changed(&mut self) {
        self.set_dirty(true);
        self.emit(EditorEvent::GraphChanged {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
        });
    }

    /// Drop selected ids that no longer exist and mirror the selection onto nodes
    fn sync_selection(&mut self) {
        let existing: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let before = self.selection.len();
        self.selection.retain(|id| existing.contains(id.as_str()));
        let pruned = self.selection.len() != before;

        self.apply_selection_flags();
        if pruned {
            self.emit_selection();
        }
    }

    fn replace_selection(&mut self, selection: BTreeSet<NodeId>) -> bool {
        if selection == self.selection {
            return false;
        }
        self.selection = selection;
        self.apply_selection_flags();
        self.emit_selection();
        true
    }

    fn apply_selection_flags(&mut self) {
        for node in &mut self.nodes {
            node.selected = self.selection.contains(&node.id);
        }
    }

    fn set_dirty(&mut self, dirty: bool) {
        if self.dirty != dirty {
            self.dirty = dirty;
            self.emit(EditorEvent::DirtyChanged { dirty });
        }
    }

    fn emit_selection(&self) {
        self.emit(EditorEvent::SelectionChanged {
            selected: self.selection.iter().cloned().collect(),
        });
    }

    fn emit(&self, event: EditorEvent) {
        if let Err(e) = self.sink.send(event) {
            log::warn!("Failed to deliver editor event: {}", e);
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

/// Make a parsed graph satisfy the store's baseline invariants
///
/// Keeps exactly one start node (synthesizing it if needed) and drops
/// duplicate node ids. Children whose container is missing or not a
/// compound node are detached. Edges that the connection rules would
/// reject are dropped, so the result holds every graph invariant.
fn sanitize_loaded(graph: GraphSnapshot, config: &EditorConfig) -> GraphSnapshot {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut has_start = false;
    let mut nodes: Vec<Node> = Vec::with_capacity(graph.nodes.len() + 1);

    for mut node in graph.nodes {
        node.selected = false;
        if node.is_start() && has_start {
            log::warn!("Dropping extra start node '{}'", node.id);
            continue;
        }
        if !seen.insert(node.id.clone()) {
            log::warn!("Dropping node with duplicate id '{}'", node.id);
            continue;
        }
        if node.is_start() {
            has_start = true;
            node.deletable = false;
            node.parent_id = None;
        }
        nodes.push(node);
    }

    // A non-start node squatting on the reserved id is replaced, edges and all.
    let mut squatter = false;
    if !has_start {
        if seen.contains(START_NODE_ID) {
            log::warn!("Node '{}' uses the reserved start node id; dropping it", START_NODE_ID);
            nodes.retain(|n| n.id != START_NODE_ID);
            squatter = true;
        }
        nodes.insert(0, Node::start(config));
    }

    // Only compound nodes contain children.
    let containers: HashSet<NodeId> = nodes
        .iter()
        .filter(|n| n.kind().is_compound())
        .map(|n| n.id.clone())
        .collect();
    for node in &mut nodes {
        let orphaned = node
            .parent_id
            .as_ref()
            .is_some_and(|p| !containers.contains(p) || *p == node.id);
        if orphaned {
            log::warn!("Detaching node '{}' from its container", node.id);
            node.parent_id = None;
        }
    }

    // Edges are replayed through the connection rules in file order; the
    // first edge to break a rule is the one dropped.
    let mut edges: Vec<Edge> = Vec::with_capacity(graph.edges.len());
    for mut edge in graph.edges {
        if squatter && edge.touches(START_NODE_ID) {
            log::warn!("Dropping edge '{}' of the replaced start node squatter", edge.id);
            continue;
        }
        let connection = Connection {
            source: edge.source.clone(),
            target: edge.target.clone(),
            source_handle: edge.source_handle.clone(),
        };
        if let Err(reason) = check_connection(&connection, &nodes, &edges) {
            log::warn!(
                "Dropping edge '{}' ({} -> {}): {}",
                edge.id,
                edge.source,
                edge.target,
                reason
            );
            continue;
        }
        if edges
            .iter()
            .any(|e| e.id == edge.id || connection.matches(e))
        {
            log::warn!("Dropping duplicate edge '{}'", edge.id);
            continue;
        }
        edge.kind = EdgeKind::for_handle(edge.source_handle.as_deref());
        edges.push(edge);
    }

    GraphSnapshot::new(nodes, edges)
}
