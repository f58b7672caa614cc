//! Collision-safe id generation for nodes and edges
//!
//! Ids combine a per-store monotonic batch counter, the node type and an
//! index within the batch, so two pastes issued in the same instant still
//! get disjoint ids. Ids already present in the graph are skipped.

use crate::registry::NodeKind;
use crate::types::{EdgeId, NodeId};

/// Monotonic id source owned by a graph store
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new batch; ids generated afterwards use the new counter
    pub fn begin_batch(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    /// Node id `"{type_tag}-{counter}-{index}"` not rejected by `is_taken`
    pub fn node_id(&mut self, kind: NodeKind, index: usize, is_taken: impl Fn(&str) -> bool) -> NodeId {
        self.unique(|counter| format!("{}-{}-{}", kind.type_tag(), counter, index), is_taken)
    }

    /// Edge id `"edge-{counter}-{index}"` not rejected by `is_taken`
    pub fn edge_id(&mut self, index: usize, is_taken: impl Fn(&str) -> bool) -> EdgeId {
        self.unique(|counter| format!("edge-{}-{}", counter, index), is_taken)
    }

    // Bumping the counter on a clash keeps earlier ids of the batch unique:
    // they were formed with a smaller counter.
    fn unique(&mut self, format: impl Fn(u64) -> String, is_taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = format(self.counter);
            if !is_taken(&id) {
                return id;
            }
            self.counter += 1;
        }
    }
}
