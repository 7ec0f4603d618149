//! Memoized forward reachability.
//!
//! `reachable(from, to)` is queried combinatorially by the solver, so the
//! full forward-reachable set of each queried source node is computed once
//! by BFS and cached as a [`BitSet`]. Cached sets are tagged with the edge
//! epoch they were computed at; inserting an edge bumps the epoch and stale
//! sets are recomputed lazily on the next query. Creating a node without
//! predecessors adds no paths between existing nodes, so it does not
//! invalidate anything.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::bitset::BitSet;
use crate::node::Node;
use crate::reference::NodeId;

#[derive(Debug, Default)]
pub(crate) struct ReachCache {
    sets: HashMap<NodeId, (u64, BitSet)>,
    hits: usize,
    misses: usize,
}

impl ReachCache {
    /// True iff a directed path `from` ->* `to` exists, or `from == to`.
    pub(crate) fn reachable(
        &mut self,
        nodes: &[Node],
        edge_epoch: u64,
        from: NodeId,
        to: NodeId,
    ) -> bool {
        if from == to {
            return true;
        }
        match self.sets.get(&from) {
            Some((epoch, set)) if *epoch == edge_epoch => {
                self.hits += 1;
                set.contains(to.index())
            }
            _ => {
                self.misses += 1;
                let set = bfs(nodes, from);
                let result = set.contains(to.index());
                self.sets.insert(from, (edge_epoch, set));
                result
            }
        }
    }

    #[allow(dead_code)]
    pub(crate) fn hits(&self) -> usize {
        self.hits
    }

    #[allow(dead_code)]
    pub(crate) fn misses(&self) -> usize {
        self.misses
    }
}

/// Forward BFS from `source` over outgoing edges. The result contains
/// `source` itself. Terminates on cyclic graphs because visited nodes are
/// never re-enqueued.
fn bfs(nodes: &[Node], source: NodeId) -> BitSet {
    debug!("reach: recomputing forward set of {}", source);

    let mut set = BitSet::new(nodes.len());
    let mut queue = VecDeque::new();
    set.insert(source.index());
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        for &next in &nodes[current.index()].outgoing {
            if set.insert(next.index()) {
                queue.push_back(next);
            }
        }
    }

    set
}
