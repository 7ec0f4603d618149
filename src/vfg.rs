//! The value-flow-graph manager.
//!
//! [`Vfg`] owns every node, variable and binding of one analysis unit in
//! append-only arenas and is the only way to create or inspect them. All
//! methods take `&self`; interior mutability covers both the arenas and the
//! caches that fill in on query. One `Vfg` per analysis unit, single
//! threaded; dropping it is the only cleanup.
//!
//! Growth is monotonic: nodes and variables are never removed, bindings are
//! never rewritten, and the only post-creation mutations are edge insertion
//! and origin-set accumulation. Two epoch counters record those mutations so
//! the reachability cache and the solver memo can revalidate lazily.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;

use log::debug;

use crate::binding::Binding;
use crate::node::Node;
use crate::reach::ReachCache;
use crate::reference::{BindingId, NodeId, VarId};
use crate::solver::{Solver, SolverStats};
use crate::variable::Variable;

pub struct Vfg<T> {
    nodes: RefCell<Vec<Node>>,
    variables: RefCell<Vec<Variable>>,
    bindings: RefCell<Vec<Binding<T>>>,
    /// Bumped when an edge is inserted.
    edge_epoch: Cell<u64>,
    /// Bumped when an origin set lands on a pre-existing binding.
    origin_epoch: Cell<u64>,
    reach: RefCell<ReachCache>,
    solver: RefCell<Solver>,
}

impl<T> Default for Vfg<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Vfg<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vfg")
            .field("nodes", &self.num_nodes())
            .field("variables", &self.num_variables())
            .field("bindings", &self.num_bindings())
            .finish()
    }
}

impl<T> Vfg<T> {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            variables: RefCell::new(Vec::new()),
            bindings: RefCell::new(Vec::new()),
            edge_epoch: Cell::new(0),
            origin_epoch: Cell::new(0),
            reach: RefCell::new(ReachCache::default()),
            solver: RefCell::new(Solver::default()),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len()
    }
    pub fn num_variables(&self) -> usize {
        self.variables.borrow().len()
    }
    pub fn num_bindings(&self) -> usize {
        self.bindings.borrow().len()
    }

    fn check_node(&self, node: NodeId) {
        assert!(
            node.index() < self.num_nodes(),
            "node {} is not in this graph",
            node
        );
    }
    fn check_variable(&self, var: VarId) {
        assert!(
            var.index() < self.num_variables(),
            "variable {} is not in this graph",
            var
        );
    }
    fn check_binding(&self, binding: BindingId) {
        assert!(
            binding.index() < self.num_bindings(),
            "binding {} is not in this graph",
            binding
        );
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a new program point wired to each of `preds`.
    pub fn new_node(&self, preds: &[NodeId]) -> NodeId {
        self.mk_node(None, preds)
    }

    /// Create a new program point with a debug name, wired to each of
    /// `preds`. The name shows up only in logs.
    pub fn new_node_named(&self, name: impl Into<String>, preds: &[NodeId]) -> NodeId {
        self.mk_node(Some(name.into()), preds)
    }

    fn mk_node(&self, name: Option<String>, preds: &[NodeId]) -> NodeId {
        for &p in preds {
            self.check_node(p);
        }
        let id = {
            let mut nodes = self.nodes.borrow_mut();
            let id = NodeId::new(nodes.len() as u32);
            nodes.push(Node::new(name));
            id
        };
        debug!("mk_node() -> {} ({} predecessor(s))", id, preds.len());
        for &p in preds {
            self.add_edge(p, id);
        }
        id
    }

    /// Wire an edge after the fact (loop back-edges). Duplicate edges are
    /// stored once and do not invalidate caches.
    pub fn add_edge(&self, from: NodeId, to: NodeId) {
        self.check_node(from);
        self.check_node(to);
        let mut nodes = self.nodes.borrow_mut();
        if nodes[from.index()].outgoing.contains(&to) {
            return;
        }
        debug!("add_edge({} -> {})", from, to);
        nodes[from.index()].outgoing.push(to);
        nodes[to.index()].incoming.push(from);
        self.edge_epoch.set(self.edge_epoch.get() + 1);
    }

    /// Create a fresh, empty variable.
    pub fn new_variable(&self) -> VarId {
        self.mk_variable(None)
    }

    /// Create a fresh variable with a human-facing name. The engine itself
    /// only logs the name; rendering layers may read it back.
    pub fn new_variable_named(&self, name: impl Into<String>) -> VarId {
        self.mk_variable(Some(name.into()))
    }

    fn mk_variable(&self, name: Option<String>) -> VarId {
        let mut variables = self.variables.borrow_mut();
        let id = VarId::new(variables.len() as u32);
        variables.push(Variable::new(name));
        debug!("mk_variable() -> {}", id);
        id
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Bind `value` to `var` at `node`, justified by `origins` (one origin
    /// set; empty records no origin set, i.e. the binding is unconditional).
    ///
    /// Binding an equal payload to the same variable at the same node
    /// returns the existing binding, accumulating `origins` as one more
    /// alternative; repeated fixpoint sweeps over a loop therefore converge
    /// instead of growing the arena.
    pub fn bind(&self, var: VarId, node: NodeId, value: T, origins: &[BindingId]) -> BindingId
    where
        T: Eq,
    {
        self.check_variable(var);
        self.check_node(node);
        for &o in origins {
            self.check_binding(o);
        }

        let existing = {
            let variables = self.variables.borrow();
            let bindings = self.bindings.borrow();
            variables[var.index()]
                .by_node
                .get(&node)
                .and_then(|candidates| {
                    candidates
                        .iter()
                        .copied()
                        .find(|b| bindings[b.index()].payload == value)
                })
        };

        match existing {
            Some(id) => {
                if !origins.is_empty() {
                    let added = self.bindings.borrow_mut()[id.index()].add_origin(origins);
                    if added {
                        debug!("bind: {} gains an origin set at {}", id, node);
                        self.origin_epoch.set(self.origin_epoch.get() + 1);
                    }
                }
                id
            }
            None => {
                let mut bindings = self.bindings.borrow_mut();
                let id = BindingId::new(bindings.len() as u32);
                let mut binding = Binding::new(var, node, value);
                if !origins.is_empty() {
                    binding.add_origin(origins);
                }
                bindings.push(binding);
                drop(bindings);

                self.variables.borrow_mut()[var.index()].record(node, id);
                self.nodes.borrow_mut()[node.index()].bindings.push(id);
                debug!("bind({}, {}) -> {}", var, node, id);
                id
            }
        }
    }

    /// Record one additional alternative origin set on an existing binding.
    pub fn add_origin(&self, binding: BindingId, origin: &[BindingId]) {
        self.check_binding(binding);
        for &o in origin {
            self.check_binding(o);
        }
        let added = self.bindings.borrow_mut()[binding.index()].add_origin(origin);
        if added {
            debug!("add_origin({}, {:?})", binding, origin);
            self.origin_epoch.set(self.origin_epoch.get() + 1);
        }
    }

    /// Copy one binding into `dst` at `node`, justified by the source
    /// binding.
    pub fn paste_binding(&self, dst: VarId, binding: BindingId, node: NodeId) -> BindingId
    where
        T: Eq + Clone,
    {
        let value = self.payload(binding).clone();
        self.bind(dst, node, value, &[binding])
    }

    /// Copy every binding of `src` into `dst` at `node`, each justified by
    /// the binding it copies.
    pub fn paste_variable(&self, dst: VarId, src: VarId, node: NodeId)
    where
        T: Eq + Clone,
    {
        for binding in self.bindings_of(src) {
            self.paste_binding(dst, binding, node);
        }
    }

    /// Fresh variable holding a copy of every binding of `var` at `node`.
    pub fn assign_to_new(&self, var: VarId, node: NodeId) -> VarId
    where
        T: Eq + Clone,
    {
        let dst = self.new_variable();
        self.paste_variable(dst, var, node);
        dst
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// True iff a directed path `from` ->* `to` exists, or `from == to`.
    pub fn reachable(&self, from: NodeId, to: NodeId) -> bool {
        self.check_node(from);
        self.check_node(to);
        let nodes = self.nodes.borrow();
        self.reach
            .borrow_mut()
            .reachable(&nodes, self.edge_epoch.get(), from, to)
    }

    /// Can all of `goals` be simultaneously live when execution reaches
    /// `node`? Sound: a `true` for a combination impossible on every path
    /// can only come from an exhausted step budget (see
    /// [`set_solver_limit`](Self::set_solver_limit)).
    pub fn has_combination(&self, node: NodeId, goals: &[BindingId]) -> bool {
        self.check_node(node);
        for &g in goals {
            self.check_binding(g);
        }
        self.solver.borrow_mut().has_combination(self, node, goals)
    }

    /// The cheap pre-filter of [`has_combination`](Self::has_combination):
    /// reachability and same-variable conflicts only, no origin solving.
    /// `false` is definite; `true` is not a full consistency proof.
    pub fn can_have_combination(&self, node: NodeId, goals: &[BindingId]) -> bool {
        self.check_node(node);
        for &g in goals {
            self.check_binding(g);
        }
        self.solver
            .borrow_mut()
            .can_have_combination(self, node, goals)
    }

    /// Bindings of `var` whose creation node reaches `node`, in creation
    /// order. Reachability-filtered only; callers that care about joint
    /// consistency with other variables run
    /// [`has_combination`](Self::has_combination) themselves.
    pub fn visible_bindings(&self, var: VarId, node: NodeId) -> Vec<BindingId> {
        self.check_variable(var);
        self.check_node(node);
        self.bindings_of(var)
            .into_iter()
            .filter(|&b| self.reachable(self.binding_node(b), node))
            .collect()
    }

    /// Step budget for a single `has_combination` query; `None` (the
    /// default) means unbounded. Exhaustion resolves the query to the
    /// conservative `true` and is counted in [`SolverStats::limit_hits`].
    pub fn set_solver_limit(&self, limit: Option<usize>) {
        self.solver.borrow_mut().set_limit(limit);
    }

    pub fn solver_stats(&self) -> SolverStats {
        self.solver.borrow().stats()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The opaque abstract value stored in a binding.
    ///
    /// The returned guard borrows the binding arena; release it before
    /// calling any mutating method.
    pub fn payload(&self, binding: BindingId) -> std::cell::Ref<'_, T> {
        self.check_binding(binding);
        std::cell::Ref::map(self.bindings.borrow(), |bs| &bs[binding.index()].payload)
    }

    pub fn binding_node(&self, binding: BindingId) -> NodeId {
        self.check_binding(binding);
        self.bindings.borrow()[binding.index()].node
    }

    pub fn binding_variable(&self, binding: BindingId) -> VarId {
        self.check_binding(binding);
        self.bindings.borrow()[binding.index()].variable
    }

    /// All alternative origin sets of a binding, in the order recorded.
    pub fn origins(&self, binding: BindingId) -> Vec<Vec<BindingId>> {
        self.check_binding(binding);
        self.bindings.borrow()[binding.index()]
            .origins
            .iter()
            .map(|set| set.to_vec())
            .collect()
    }

    /// All bindings ever created for `var`, in creation order.
    pub fn bindings_of(&self, var: VarId) -> Vec<BindingId> {
        self.check_variable(var);
        self.variables.borrow()[var.index()].bindings.clone()
    }

    /// All bindings created at `node`, in creation order.
    pub fn bindings_at(&self, node: NodeId) -> Vec<BindingId> {
        self.check_node(node);
        self.nodes.borrow()[node.index()].bindings.clone()
    }

    pub fn successors(&self, node: NodeId) -> Vec<NodeId> {
        self.check_node(node);
        self.nodes.borrow()[node.index()].outgoing.clone()
    }

    pub fn predecessors(&self, node: NodeId) -> Vec<NodeId> {
        self.check_node(node);
        self.nodes.borrow()[node.index()].incoming.clone()
    }

    pub fn node_name(&self, node: NodeId) -> Option<String> {
        self.check_node(node);
        self.nodes.borrow()[node.index()].name.clone()
    }

    pub fn variable_name(&self, var: VarId) -> Option<String> {
        self.check_variable(var);
        self.variables.borrow()[var.index()].name.clone()
    }

    // ------------------------------------------------------------------
    // Solver plumbing
    // ------------------------------------------------------------------

    pub(crate) fn epochs(&self) -> (u64, u64) {
        (self.edge_epoch.get(), self.origin_epoch.get())
    }

    pub(crate) fn has_origins(&self, binding: BindingId) -> bool {
        !self.bindings.borrow()[binding.index()].origins.is_empty()
    }

    pub(crate) fn num_origins(&self, binding: BindingId) -> usize {
        self.bindings.borrow()[binding.index()].origins.len()
    }

    pub(crate) fn origin_set(&self, binding: BindingId, index: usize) -> Box<[BindingId]> {
        self.bindings.borrow()[binding.index()].origins[index].clone()
    }

    pub(crate) fn origin_mentions(&self, binding: BindingId, other: BindingId) -> bool {
        self.bindings.borrow()[binding.index()].origin_mentions(other)
    }
}
