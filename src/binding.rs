use crate::reference::{BindingId, NodeId, VarId};

/// Per-binding record in the graph arena.
///
/// The payload is an uninterpreted token: the engine compares it for equality
/// (deduplication) and never looks inside. `origins` is a disjunction of
/// conjunctions: the binding is justified if any one origin set is jointly
/// live. A binding with no origin sets is unconditional.
///
/// Immutable after creation, except that alternative origin sets may
/// accumulate as the interpreter discovers more ways the value can arise.
#[derive(Debug, Clone)]
pub(crate) struct Binding<T> {
    pub(crate) variable: VarId,
    pub(crate) node: NodeId,
    pub(crate) payload: T,
    pub(crate) origins: Vec<Box<[BindingId]>>,
}

impl<T> Binding<T> {
    pub(crate) fn new(variable: VarId, node: NodeId, payload: T) -> Self {
        Self {
            variable,
            node,
            payload,
            origins: Vec::new(),
        }
    }

    /// Record one more alternative origin set, canonicalized (sorted, deduped).
    /// Recording a set that is already present is a no-op.
    ///
    /// Returns `true` if the set was new.
    pub(crate) fn add_origin(&mut self, origin: &[BindingId]) -> bool {
        let mut set: Vec<BindingId> = origin.to_vec();
        set.sort();
        set.dedup();
        let set = set.into_boxed_slice();
        if self.origins.contains(&set) {
            return false;
        }
        self.origins.push(set);
        true
    }

    /// Does any origin set of this binding contain `other`?
    pub(crate) fn origin_mentions(&self, other: BindingId) -> bool {
        self.origins
            .iter()
            .any(|set| set.binary_search(&other).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_dedup() {
        let mut b = Binding::new(VarId::new(0), NodeId::new(0), 'a');
        let x = BindingId::new(1);
        let y = BindingId::new(2);
        assert!(b.add_origin(&[y, x, x]));
        assert!(!b.add_origin(&[x, y]));
        assert_eq!(b.origins.len(), 1);
        assert_eq!(&*b.origins[0], &[x, y]);
    }

    #[test]
    fn test_origin_mentions() {
        let mut b = Binding::new(VarId::new(0), NodeId::new(0), 'a');
        let x = BindingId::new(1);
        b.add_origin(&[x]);
        assert!(b.origin_mentions(x));
        assert!(!b.origin_mentions(BindingId::new(2)));
    }
}
