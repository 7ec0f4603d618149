use std::collections::HashMap;

use crate::reference::{BindingId, NodeId};

/// Per-variable record in the graph arena.
///
/// `bindings` holds every binding ever created for this variable, in creation
/// order; merging control paths shows up as multiple entries, never as an
/// overwrite. `by_node` indexes them by creation node so that rebinding the
/// same payload at the same node during fixpoint iteration dedups instead of
/// growing without bound.
#[derive(Debug, Default, Clone)]
pub(crate) struct Variable {
    pub(crate) name: Option<String>,
    pub(crate) bindings: Vec<BindingId>,
    pub(crate) by_node: HashMap<NodeId, Vec<BindingId>>,
}

impl Variable {
    pub(crate) fn new(name: Option<String>) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, node: NodeId, binding: BindingId) {
        self.bindings.push(binding);
        self.by_node.entry(node).or_default().push(binding);
    }
}
