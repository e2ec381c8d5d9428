//! Bidirectional search engines
//!
//! `FrontToEnd` is the shared core: both sides' bucket queues, the best
//! solution found so far, the proved lower bound and the collision-aware
//! expansion step. `dbbs` and `two_level` drive it (or their own store) with
//! different termination machinery; `astar` is the unidirectional reference.

pub mod astar;
pub mod dbbs;
pub mod two_level;

pub use astar::{astar, AStarResult};
pub use dbbs::{Dbbs, DbbsConfig};
pub use two_level::TwoLevelBae;

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::bucket::{BestBucketList, MinCriterion, NodeId};
use crate::domains::{Heuristic, SearchDomain};
use crate::fp::{fgreatereq, fless, CostKey};

/// Which frontier an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Forward,
    Backward,
}

/// Shared state of a front-to-end bidirectional search.
///
/// Owns both sides' open lists, the query endpoints, the best solution cost
/// found so far (`current_cost`), the meeting state that realized it and the
/// monotonically non-decreasing lower bound `C`.
pub struct FrontToEnd<S> {
    pub(crate) forward: BestBucketList<S>,
    pub(crate) backward: BestBucketList<S>,
    start: Option<S>,
    goal: Option<S>,
    middle: Option<S>,
    current_cost: f64,
    c: f64,
    epsilon: f64,
    nodes_expanded: u64,
    nodes_touched: u64,
    counts: BTreeMap<CostKey, u64>,
    scratch: Vec<S>,
}

impl<S: Clone + Eq + Hash + Debug> FrontToEnd<S> {
    pub fn new(epsilon: f64, criterion: MinCriterion, use_b: bool, use_rc: bool) -> Self {
        Self {
            forward: BestBucketList::new(criterion, use_b, use_rc),
            backward: BestBucketList::new(criterion, use_b, use_rc),
            start: None,
            goal: None,
            middle: None,
            current_cost: f64::MAX,
            c: 0.0,
            epsilon,
            nodes_expanded: 0,
            nodes_touched: 0,
            counts: BTreeMap::new(),
            scratch: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.forward.reset();
        self.backward.reset();
        self.middle = None;
        self.current_cost = f64::MAX;
        self.c = 0.0;
        self.nodes_expanded = 0;
        self.nodes_touched = 0;
        self.counts.clear();
    }

    /// Seed both frontiers and the initial lower bound. Returns false when
    /// `from == to` and no search is needed; `current_cost` is then 0.
    pub fn initialize(
        &mut self,
        from: S,
        to: S,
        forward_h: &dyn Heuristic<S>,
        backward_h: &dyn Heuristic<S>,
    ) -> bool {
        self.reset();
        if from == to {
            self.current_cost = 0.0;
            self.start = Some(from);
            self.goal = Some(to);
            return false;
        }

        let fh = forward_h.h_cost(&from, &to).max(self.epsilon);
        let bh = backward_h.h_cost(&to, &from).max(self.epsilon);

        self.forward.add(from.clone(), 0.0, fh, 0.0, None);
        self.backward.add(to.clone(), 0.0, bh, 0.0, None);
        self.start = Some(from);
        self.goal = Some(to);
        self.c = fh.max(bh).max(self.epsilon);
        true
    }

    /// True once the lower bound has met the best known solution.
    pub fn solution_proven(&self) -> bool {
        fgreatereq(self.c, self.current_cost)
    }

    pub fn solution_cost(&self) -> f64 {
        self.current_cost
    }

    pub fn solution_found(&self) -> bool {
        self.current_cost < f64::MAX
    }

    pub fn lower_bound(&self) -> f64 {
        self.c
    }

    pub(crate) fn raise_lower_bound(&mut self, c: f64) {
        debug_assert!(c >= self.c);
        self.c = c;
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn nodes_expanded(&self) -> u64 {
        self.nodes_expanded
    }

    pub fn nodes_touched(&self) -> u64 {
        self.nodes_touched
    }

    /// Expansions performed while the lower bound was below the final cost.
    pub fn necessary_expansions(&self) -> u64 {
        self.counts
            .iter()
            .filter(|(key, _)| fless(key.get(), self.current_cost))
            .map(|(_, count)| *count)
            .sum()
    }

    /// Expand one node of `side`: generate its successors, prune against the
    /// best solution, detect collisions with the opposite frontier and insert
    /// the survivors into this side's open list.
    pub fn expand<D: SearchDomain<State = S>>(
        &mut self,
        env: &D,
        side: Side,
        id: NodeId,
        g: f64,
        forward_h: &dyn Heuristic<S>,
        backward_h: &dyn Heuristic<S>,
    ) {
        self.nodes_expanded += 1;
        *self.counts.entry(CostKey(self.c)).or_default() += 1;

        let Self {
            forward,
            backward,
            start,
            goal,
            middle,
            current_cost,
            c,
            epsilon,
            nodes_touched,
            scratch,
            ..
        } = self;

        let (current, opposite, heuristic, reverse_h, target, source) = match side {
            Side::Forward => (forward, backward, forward_h, backward_h, goal, start),
            Side::Backward => (backward, forward, backward_h, forward_h, start, goal),
        };
        let target = target.as_ref().expect("search not initialized");
        let source = source.as_ref().expect("search not initialized");

        let state = current.node(id).state.clone();
        env.successors(&state, scratch);

        for succ in scratch.iter() {
            *nodes_touched += 1;

            let succ_g = g + env.edge_cost(&state, succ);
            let h = heuristic.h_cost(succ, target).max(*epsilon);

            // bounded by the best solution found so far
            if fgreatereq(succ_g + h, *current_cost) {
                continue;
            }

            let h_reverse = reverse_h.h_cost(succ, source);

            if let Some((optimal, opposite_g)) = opposite.lookup_g(succ) {
                let collision_cost = succ_g + opposite_g;
                if fless(collision_cost, *current_cost) {
                    *current_cost = collision_cost;
                    *middle = Some(succ.clone());

                    if fgreatereq(*c, *current_cost) {
                        // record the parent link so the path can be spliced,
                        // then stop: optimality is proven
                        current.add(succ.clone(), succ_g, h, h_reverse, Some(id));
                        break;
                    }
                } else if optimal {
                    // the opposite g is side-optimal and the meeting is no
                    // better than what we have
                    continue;
                }
            }

            current.add(succ.clone(), succ_g, h, h_reverse, Some(id));
        }
    }

    /// Splice the two parent chains through the meeting state.
    pub fn reconstruct_solution(&self) -> Vec<S> {
        let middle = self.middle.as_ref().expect("no solution to reconstruct");

        let mut path = Self::extract_path(&self.forward, middle);
        path.reverse();
        let backward_half = Self::extract_path(&self.backward, middle);
        path.extend(backward_half.into_iter().skip(1));
        path
    }

    fn extract_path(side: &BestBucketList<S>, meeting: &S) -> Vec<S> {
        let mut path = vec![meeting.clone()];
        let mut node = side.lookup(meeting).expect("meeting state not in table");
        while let Some(parent) = node.parent {
            node = side.node(parent);
            path.push(node.state.clone());
        }
        path
    }
}
