use crate::reference::{BindingId, NodeId};

/// Per-node record in the graph arena.
///
/// Edges and the binding list only ever grow; cycles are allowed.
#[derive(Debug, Default, Clone)]
pub(crate) struct Node {
    pub(crate) name: Option<String>,
    pub(crate) outgoing: Vec<NodeId>,
    pub(crate) incoming: Vec<NodeId>,
    pub(crate) bindings: Vec<BindingId>,
}

impl Node {
    pub(crate) fn new(name: Option<String>) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }
}
