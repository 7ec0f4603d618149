//! Joint-liveness solver.
//!
//! Decides whether a set of bindings can all be live at once when execution
//! reaches a given node. The search is goal-directed: it filters goals by
//! reachability and same-variable conflicts, then picks one goal that still
//! needs justification and branches over its origin sets, keeping the rest of
//! the goal set in play so every alternative is validated against the whole
//! combination (not each goal in isolation).
//!
//! Three mechanisms keep the search tractable and terminating:
//!
//! - a memo table keyed by (node, canonical goal set), cleared whenever the
//!   graph grows in a way that could flip an answer (new edges, new origin
//!   sets on existing bindings);
//! - an in-progress set of memo keys: re-entering a key that is still being
//!   solved means the justification chain is circular, which answers false
//!   for that chain only while other alternatives keep being explored;
//! - an optional step budget: when exhausted, the query resolves to the
//!   conservative `true` ("cannot prove the combination impossible"), which
//!   is never memoized and is counted in [`SolverStats::limit_hits`].
//!
//! Results computed below a cycle cut are memoized; they can only
//! under-approve, so the solver stays sound and is conservatively incomplete
//! on mutually-recursive origin cycles.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::reference::{BindingId, NodeId};
use crate::vfg::Vfg;

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SolverStats {
    /// Top-level queries answered.
    pub queries: usize,
    /// Memo-table hits across all recursion.
    pub memo_hits: usize,
    /// Origin-set alternatives explored.
    pub expansions: usize,
    /// Circular justification chains cut.
    pub cycle_cuts: usize,
    /// Times the step budget was exhausted (each resolves to `true`).
    pub limit_hits: usize,
}

/// One entry of a canonical goal set.
///
/// `pending` marks a goal whose origin sets still have to be justified in the
/// current chain. A goal stays in the set after expansion (so same-variable
/// conflicts with later-introduced goals are still caught), flipping to
/// committed; if another origin set reintroduces it, the justification demand
/// wins again during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Goal {
    binding: BindingId,
    pending: bool,
}

type QueryKey = (NodeId, Box<[Goal]>);

#[derive(Debug, Default)]
pub(crate) struct Solver {
    memo: HashMap<QueryKey, bool>,
    in_progress: HashSet<QueryKey>,
    limit: Option<usize>,
    steps: usize,
    seen_epochs: (u64, u64),
    stats: SolverStats,
}

impl Solver {
    pub(crate) fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    pub(crate) fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Full joint-liveness query. See the module docs for the algorithm.
    pub(crate) fn has_combination<T>(
        &mut self,
        vfg: &Vfg<T>,
        node: NodeId,
        goals: &[BindingId],
    ) -> bool {
        self.revalidate(vfg);
        self.stats.queries += 1;
        self.steps = 0;

        let goals = normalize(
            goals
                .iter()
                .map(|&b| Goal {
                    binding: b,
                    pending: vfg.has_origins(b),
                })
                .collect(),
        );
        debug!("has_combination(node = {}, goals = {:?})", node, goals);

        let result = match self.solve(vfg, node, goals) {
            Some(result) => result,
            // Budget exhausted: assume consistent rather than hang.
            None => true,
        };
        debug!("has_combination(node = {}) -> {}", node, result);
        result
    }

    /// Cheap pre-filter: reachability and same-variable conflicts only, no
    /// origin solving. A `false` here is definite; a `true` only means the
    /// combination survives the cheap checks.
    pub(crate) fn can_have_combination<T>(
        &mut self,
        vfg: &Vfg<T>,
        node: NodeId,
        goals: &[BindingId],
    ) -> bool {
        all_reach(vfg, node, goals.iter().copied())
            && conflict_free(vfg, goals.iter().copied())
    }

    /// Clear the memo table if the graph grew since the last query in a way
    /// that could turn a cached `false` into `true`.
    fn revalidate<T>(&mut self, vfg: &Vfg<T>) {
        let epochs = vfg.epochs();
        if self.seen_epochs != epochs {
            self.memo.clear();
            self.seen_epochs = epochs;
        }
    }

    /// Returns `None` when the step budget ran out somewhere below: the
    /// caller cannot conclude `false`, because unexplored alternatives
    /// remain.
    fn solve<T>(&mut self, vfg: &Vfg<T>, node: NodeId, goals: Box<[Goal]>) -> Option<bool> {
        if goals.is_empty() {
            return Some(true);
        }

        let key = (node, goals);
        if let Some(&cached) = self.memo.get(&key) {
            self.stats.memo_hits += 1;
            return Some(cached);
        }

        if let Some(limit) = self.limit {
            if self.steps >= limit {
                self.stats.limit_hits += 1;
                return None;
            }
        }
        self.steps += 1;

        let (node, goals) = key;

        // A binding can only be live where its creation node reaches.
        if !all_reach(vfg, node, goals.iter().map(|g| g.binding)) {
            self.memo.insert((node, goals), false);
            return Some(false);
        }

        // A variable holds one value at a time along any single path.
        if !conflict_free(vfg, goals.iter().map(|g| g.binding)) {
            self.memo.insert((node, goals), false);
            return Some(false);
        }

        // Everything reachable, conflict-free, and justified: satisfiable.
        let Some(chosen) = goals.iter().find(|g| g.pending).map(|g| g.binding) else {
            self.memo.insert((node, goals), true);
            return Some(true);
        };

        let key = (node, goals);
        if !self.in_progress.insert(key.clone()) {
            // Circular justification: unsatisfiable along this chain only.
            trace!("cycle cut at node {} on {}", key.0, chosen);
            self.stats.cycle_cuts += 1;
            return Some(false);
        }

        // Branch over the chosen goal's alternative origin sets, first
        // satisfiable alternative wins.
        let mut result = false;
        let mut exhausted = false;
        for i in 0..vfg.num_origins(chosen) {
            self.stats.expansions += 1;
            let origin = vfg.origin_set(chosen, i);
            trace!("expanding {} via origin set {:?}", chosen, origin);

            let mut next: Vec<Goal> = key
                .1
                .iter()
                .map(|&g| Goal {
                    binding: g.binding,
                    pending: g.pending && g.binding != chosen,
                })
                .collect();
            for &o in origin.iter() {
                next.push(Goal {
                    binding: o,
                    pending: vfg.has_origins(o),
                });
            }

            match self.solve(vfg, key.0, normalize(next)) {
                Some(true) => {
                    result = true;
                    break;
                }
                Some(false) => {}
                None => exhausted = true,
            }
        }

        self.in_progress.remove(&key);

        if exhausted && !result {
            return None;
        }
        self.memo.insert(key, result);
        Some(result)
    }
}

/// Canonicalize a goal set: sort by binding id, one entry per binding.
/// When a binding occurs both pending and committed, the justification
/// demand (pending) wins.
fn normalize(mut goals: Vec<Goal>) -> Box<[Goal]> {
    goals.sort_by_key(|g| (g.binding, !g.pending));
    goals.dedup_by_key(|g| g.binding);
    goals.into_boxed_slice()
}

fn all_reach<T>(vfg: &Vfg<T>, node: NodeId, goals: impl Iterator<Item = BindingId>) -> bool {
    for b in goals {
        if !vfg.reachable(vfg.binding_node(b), node) {
            trace!("{} cannot reach {}", b, node);
            return false;
        }
    }
    true
}

/// Two distinct bindings of one variable are mutually exclusive, unless one
/// of them names the other in an origin set (the derived binding's
/// justification passes through the other assignment, so both lie on one
/// path).
fn conflict_free<T>(vfg: &Vfg<T>, goals: impl Iterator<Item = BindingId>) -> bool {
    let goals: Vec<BindingId> = goals.collect();
    for (i, &a) in goals.iter().enumerate() {
        for &b in &goals[i + 1..] {
            if a == b || vfg.binding_variable(a) != vfg.binding_variable(b) {
                continue;
            }
            if vfg.origin_mentions(a, b) || vfg.origin_mentions(b, a) {
                continue;
            }
            trace!("conflict: {} vs {} on {}", a, b, vfg.binding_variable(a));
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn goal(raw: u32, pending: bool) -> Goal {
        Goal {
            binding: BindingId::new(raw),
            pending,
        }
    }

    #[test]
    fn test_normalize_sorts_and_dedups() {
        let set = normalize(vec![goal(2, false), goal(1, true), goal(2, false)]);
        assert_eq!(&*set, &[goal(1, true), goal(2, false)]);
    }

    #[test]
    fn test_normalize_pending_wins() {
        let set = normalize(vec![goal(1, false), goal(1, true)]);
        assert_eq!(&*set, &[goal(1, true)]);
        let set = normalize(vec![goal(1, true), goal(1, false)]);
        assert_eq!(&*set, &[goal(1, true)]);
    }

    #[test]
    fn test_unreachable_binding_is_dead() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let n1 = vfg.new_node(&[n0]);
        let n2 = vfg.new_node(&[n0]);
        let x = vfg.new_variable();
        let b = vfg.bind(x, n1, 'a', &[]);
        assert!(vfg.has_combination(n1, &[b]));
        assert!(!vfg.has_combination(n2, &[b]));
        assert!(!vfg.can_have_combination(n2, &[b]));
    }

    #[test]
    fn test_origin_chain_resolves() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let n1 = vfg.new_node(&[n0]);
        let c = vfg.new_variable();
        let x = vfg.new_variable();
        let cond = vfg.bind(c, n0, 'T', &[]);
        let narrowed = vfg.bind(x, n1, 'i', &[cond]);
        assert!(vfg.has_combination(n1, &[narrowed]));
        assert!(vfg.has_combination(n1, &[narrowed, cond]));
    }

    #[test]
    fn test_origin_with_dead_justification_is_dead() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let side = vfg.new_node(&[n0]);
        let main = vfg.new_node(&[n0]);
        let c = vfg.new_variable();
        let x = vfg.new_variable();
        // The only justification lives on a branch that does not reach `main`.
        let cond = vfg.bind(c, side, 'T', &[]);
        let b = vfg.bind(x, n0, 'i', &[cond]);
        assert!(!vfg.has_combination(main, &[b]));
        // The cheap filter alone cannot see this.
        assert!(vfg.can_have_combination(main, &[b]));
    }

    #[test]
    fn test_joint_consistency_rejects_incompatible_origin_choices() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let n1 = vfg.new_node(&[n0]);
        let c = vfg.new_variable();
        let x = vfg.new_variable();
        let y = vfg.new_variable();
        let c_true = vfg.bind(c, n0, 'T', &[]);
        let c_false = vfg.bind(c, n0, 'F', &[]);
        let x1 = vfg.bind(x, n1, 'x', &[c_true]);
        let y1 = vfg.bind(y, n1, 'y', &[c_false]);
        // Individually fine, jointly impossible: their justifications
        // require opposite values of the same condition.
        assert!(vfg.has_combination(n1, &[x1]));
        assert!(vfg.has_combination(n1, &[y1]));
        assert!(!vfg.has_combination(n1, &[x1, y1]));
    }

    #[test]
    fn test_second_origin_alternative_wins() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let n1 = vfg.new_node(&[n0]);
        let c = vfg.new_variable();
        let x = vfg.new_variable();
        let c_true = vfg.bind(c, n0, 'T', &[]);
        let c_false = vfg.bind(c, n0, 'F', &[]);
        let b = vfg.bind(x, n1, 'x', &[c_true]);
        vfg.add_origin(b, &[c_false]);
        // The first alternative conflicts with the goal set; the second
        // does not.
        assert!(vfg.has_combination(n1, &[b, c_false]));
    }

    #[test]
    fn test_self_referential_origin_terminates() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let n1 = vfg.new_node(&[n0]);
        let n2 = vfg.new_node(&[n1]);
        vfg.add_edge(n2, n1);
        let x = vfg.new_variable();
        let b = vfg.bind(x, n1, 'L', &[]);
        vfg.add_origin(b, &[b]);
        // Purely circular justification is rejected, deterministically.
        assert!(!vfg.has_combination(n2, &[b]));
        assert!(!vfg.has_combination(n2, &[b]));
        assert!(vfg.solver_stats().cycle_cuts > 0);
    }

    #[test]
    fn test_loop_carried_value_with_base_case() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let n1 = vfg.new_node(&[n0]);
        let n2 = vfg.new_node(&[n1]);
        vfg.add_edge(n2, n1);
        let x = vfg.new_variable();
        let y = vfg.new_variable();
        let init = vfg.bind(y, n0, '0', &[]);
        let b = vfg.bind(x, n1, 'L', &[]);
        // Fixpoint iteration over the loop body discovers two ways the
        // value arises: carried around the back edge, or seeded from
        // before the loop. The circular alternative is cut; the seeded
        // one justifies the binding.
        vfg.add_origin(b, &[b]);
        vfg.add_origin(b, &[init]);
        assert!(vfg.has_combination(n2, &[b]));
    }

    #[test]
    fn test_mutually_recursive_origins_terminate() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let x = vfg.new_variable();
        let y = vfg.new_variable();
        let a = vfg.bind(x, n0, 'a', &[]);
        let b = vfg.bind(y, n0, 'b', &[a]);
        vfg.add_origin(a, &[b]);
        // a needs b needs a: no well-founded justification exists.
        assert!(!vfg.has_combination(n0, &[a]));
        assert!(!vfg.has_combination(n0, &[b]));
    }

    #[test]
    fn test_memo_hit_on_repeated_query() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let x = vfg.new_variable();
        let b = vfg.bind(x, n0, 'a', &[]);
        assert!(vfg.has_combination(n0, &[b]));
        let before = vfg.solver_stats().memo_hits;
        assert!(vfg.has_combination(n0, &[b]));
        let stats = vfg.solver_stats();
        assert_eq!(stats.queries, 2);
        assert!(stats.memo_hits > before);
    }

    #[test]
    fn test_step_budget_is_conservative() {
        let vfg: Vfg<u32> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        let dead_end = vfg.new_node(&[n0]);
        let query_at = vfg.new_node(&[n0]);
        // A chain of justifications whose base lives on the dead branch:
        // exact solving proves the head impossible at `query_at`.
        let base_var = vfg.new_variable();
        let mut prev = vfg.bind(base_var, dead_end, 0, &[]);
        for i in 1..6 {
            let v = vfg.new_variable();
            prev = vfg.bind(v, n0, i, &[prev]);
        }

        // With a tiny budget the solver gives up and assumes consistency.
        vfg.set_solver_limit(Some(2));
        assert!(vfg.has_combination(query_at, &[prev]));
        assert!(vfg.solver_stats().limit_hits > 0);

        // Exhausted results are never memoized: lifting the budget gets
        // the exact answer, which then stays available even under the
        // small budget again (memo entries are always exact).
        vfg.set_solver_limit(None);
        assert!(!vfg.has_combination(query_at, &[prev]));
        vfg.set_solver_limit(Some(2));
        assert!(!vfg.has_combination(query_at, &[prev]));
    }

    #[test]
    fn test_empty_combination_is_trivially_live() {
        let vfg: Vfg<char> = Vfg::new();
        let n0 = vfg.new_node(&[]);
        assert!(vfg.has_combination(n0, &[]));
    }
}
