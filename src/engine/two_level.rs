//! Two-level BAE
//!
//! Each side keeps a *waiting* heap ordered by `f = g + h` and a *ready* heap
//! ordered by `B = 2g + h - rh`. A B bound computed from the two ready tops
//! gates the promotion of whole f layers from waiting into ready; expansion
//! only ever takes the ready top of the active side.

use std::fmt::Debug;
use std::hash::Hash;

use crate::domains::{Heuristic, SearchDomain};
use crate::engine::Side;
use crate::fp::{fequal, fgreater, fgreatereq, flesseq, fless, round_up_to};
use crate::open_closed::{Location, OpenQueue, TwoQueueOpenClosed};

pub struct TwoLevelBae<S> {
    forward: TwoQueueOpenClosed<S>,
    backward: TwoQueueOpenClosed<S>,
    gcd: f64,
    c_lower_bound: f64,
    current_cost: f64,
    middle: Option<S>,
    start: Option<S>,
    goal: Option<S>,
    expand_forward: bool,
    nodes_expanded: u64,
    nodes_touched: u64,
    unique_expanded: u64,
    scratch: Vec<S>,
}

impl<S: Clone + Eq + Hash + Debug> TwoLevelBae<S> {
    /// `gcd` is the cost quantum used to round the averaged B bound.
    pub fn new(gcd: f64) -> Self {
        Self {
            forward: TwoQueueOpenClosed::new(),
            backward: TwoQueueOpenClosed::new(),
            gcd,
            c_lower_bound: 0.0,
            current_cost: f64::MAX,
            middle: None,
            start: None,
            goal: None,
            expand_forward: true,
            nodes_expanded: 0,
            nodes_touched: 0,
            unique_expanded: 0,
            scratch: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.forward.reset();
        self.backward.reset();
        self.c_lower_bound = 0.0;
        self.current_cost = f64::MAX;
        self.middle = None;
        self.start = None;
        self.goal = None;
        self.expand_forward = true;
        self.nodes_expanded = 0;
        self.nodes_touched = 0;
        self.unique_expanded = 0;
    }

    pub fn solution_cost(&self) -> f64 {
        self.current_cost
    }

    pub fn nodes_expanded(&self) -> u64 {
        self.nodes_expanded
    }

    pub fn nodes_touched(&self) -> u64 {
        self.nodes_touched
    }

    pub fn unique_nodes_expanded(&self) -> u64 {
        self.unique_expanded
    }

    pub fn lower_bound(&self) -> f64 {
        self.c_lower_bound
    }

    /// Closed states of one side with their g values.
    pub fn closed_entries(&self, side: Side) -> impl Iterator<Item = (&S, f64)> {
        let store = match side {
            Side::Forward => &self.forward,
            Side::Backward => &self.backward,
        };
        store
            .iter()
            .filter(|e| e.location == Location::Closed)
            .map(|e| (&e.state, e.g))
    }

    /// Closed nodes on either side whose f value exceeds `cost`.
    pub fn expanded_above(
        &self,
        forward_h: &dyn Heuristic<S>,
        backward_h: &dyn Heuristic<S>,
        cost: f64,
    ) -> usize {
        let (Some(start), Some(goal)) = (self.start.as_ref(), self.goal.as_ref()) else {
            return 0;
        };
        let count = |store: &TwoQueueOpenClosed<S>, h: &dyn Heuristic<S>, to: &S| {
            store
                .iter()
                .filter(|e| {
                    e.location == Location::Closed && fgreater(e.g + h.h_cost(&e.state, to), cost)
                })
                .count()
        };
        count(&self.forward, forward_h, goal) + count(&self.backward, backward_h, start)
    }

    /// Run the search and return the solution path, or `None` when the two
    /// states are disconnected.
    pub fn get_path<D: SearchDomain<State = S>>(
        &mut self,
        env: &D,
        from: &S,
        to: &S,
        forward_h: &dyn Heuristic<S>,
        backward_h: &dyn Heuristic<S>,
    ) -> Option<Vec<S>> {
        self.reset();
        self.start = Some(from.clone());
        self.goal = Some(to.clone());
        if from == to {
            self.current_cost = 0.0;
            return Some(vec![from.clone()]);
        }

        let fh = forward_h.h_cost(from, to);
        let bh = backward_h.h_cost(to, from);
        self.forward.add_open(
            from.clone(),
            env.state_hash(from),
            0.0,
            fh,
            0.0,
            None,
            OpenQueue::Ready,
        );
        self.backward.add_open(
            to.clone(),
            env.state_hash(to),
            0.0,
            bh,
            0.0,
            None,
            OpenQueue::Ready,
        );
        self.c_lower_bound = fh.max(bh);

        loop {
            if self.forward.open_size() == 0 || self.backward.open_size() == 0 {
                // a side ran dry: with a solution in hand we are done,
                // without one the instance is disconnected
                break;
            }

            self.update_ready_queue();

            if flesseq(self.current_cost, self.c_lower_bound) {
                break;
            }

            let side = if self.expand_forward {
                Side::Forward
            } else {
                Side::Backward
            };
            self.expand_forward = !self.expand_forward;
            self.expand(env, side, forward_h, backward_h);

            if self.current_cost < f64::MAX
                && (self.forward.open_size() == 0 || self.backward.open_size() == 0)
            {
                break;
            }
        }

        if self.current_cost == f64::MAX {
            return None;
        }
        Some(self.reconstruct_solution(env))
    }

    /// Lower bound implied by the two ready tops, rounded up to the quantum.
    fn current_b_bound(&self) -> f64 {
        if self.forward.open_ready_size() == 0 || self.backward.open_ready_size() == 0 {
            return f64::MAX;
        }
        let n1 = self.forward.entry(self.forward.peek(OpenQueue::Ready));
        let n2 = self.backward.entry(self.backward.peek(OpenQueue::Ready));
        let lb = ((2.0 * n1.g + n1.h - n1.rh) + (2.0 * n2.g + n2.h - n2.rh)) / 2.0;
        round_up_to(lb, self.gcd)
    }

    fn waiting_top_f(store: &TwoQueueOpenClosed<S>) -> f64 {
        if store.open_waiting_size() == 0 {
            return f64::MAX;
        }
        let top = store.entry(store.peek(OpenQueue::Waiting));
        top.g + top.h
    }

    /// Pump waiting nodes into ready while the cheapest waiting f value is
    /// within the B bound, advancing the working lower bound layer by layer.
    fn update_ready_queue(&mut self) {
        let mut min_f = Self::waiting_top_f(&self.forward).min(Self::waiting_top_f(&self.backward));

        while min_f < f64::MAX && flesseq(min_f, self.current_b_bound()) {
            self.c_lower_bound = min_f;

            while self.forward.open_waiting_size() > 0
                && fequal(Self::waiting_top_f(&self.forward), self.c_lower_bound)
            {
                self.forward.put_to_ready();
            }
            while self.backward.open_waiting_size() > 0
                && fequal(Self::waiting_top_f(&self.backward), self.c_lower_bound)
            {
                self.backward.put_to_ready();
            }

            min_f = Self::waiting_top_f(&self.forward).min(Self::waiting_top_f(&self.backward));
        }

        // with both waitings empty the loop above cannot raise the bound, so
        // raise it straight to the B bound
        if min_f == f64::MAX {
            self.c_lower_bound = self.c_lower_bound.max(self.current_b_bound());
        }
    }

    fn expand<D: SearchDomain<State = S>>(
        &mut self,
        env: &D,
        side: Side,
        forward_h: &dyn Heuristic<S>,
        backward_h: &dyn Heuristic<S>,
    ) {
        let Self {
            forward,
            backward,
            c_lower_bound,
            current_cost,
            middle,
            start,
            goal,
            nodes_expanded,
            nodes_touched,
            unique_expanded,
            scratch,
            ..
        } = self;

        let (current, opposite, heuristic, reverse_h, target, source) = match side {
            Side::Forward => (forward, backward, forward_h, backward_h, goal, start),
            Side::Backward => (backward, forward, backward_h, forward_h, start, goal),
        };
        let target = target.as_ref().expect("search not initialized");
        let source = source.as_ref().expect("search not initialized");

        let expanded_id = current.close();
        *nodes_expanded += 1;
        if !current.entry(expanded_id).reopened {
            *unique_expanded += 1;
        }

        let parent_state = current.entry(expanded_id).state.clone();
        let parent_g = current.entry(expanded_id).g;
        env.successors(&parent_state, scratch);

        for succ in scratch.iter() {
            *nodes_touched += 1;

            let succ_g = parent_g + env.edge_cost(&parent_state, succ);

            // bounded by the best solution found so far
            if fgreatereq(succ_g + heuristic.h_cost(succ, target), *current_cost) {
                continue;
            }

            let hash = env.state_hash(succ);
            let (location, child_id) = current.lookup(hash);

            match location {
                Location::Closed => {
                    let (opposite_loc, _) = opposite.lookup(hash);
                    if fless(succ_g, current.entry(child_id).g)
                        && opposite_loc != Location::Closed
                    {
                        // cannot happen with a consistent heuristic; keep the
                        // better path but flag the anomaly
                        tracing::warn!(
                            state = ?succ,
                            old_g = current.entry(child_id).g,
                            new_g = succ_g,
                            "reopening a closed node with a better g"
                        );
                        let entry = current.entry_mut(child_id);
                        entry.parent = expanded_id;
                        entry.g = succ_g;
                        let child_f = succ_g + current.entry(child_id).h;
                        let queue = if flesseq(child_f, *c_lower_bound) {
                            OpenQueue::Ready
                        } else {
                            OpenQueue::Waiting
                        };
                        current.reopen(child_id, queue);
                    }
                }
                Location::OpenReady | Location::OpenWaiting => {
                    if fless(succ_g, current.entry(child_id).g) {
                        {
                            let entry = current.entry_mut(child_id);
                            entry.parent = expanded_id;
                            entry.g = succ_g;
                        }
                        current.key_changed(child_id);

                        if location == Location::OpenWaiting {
                            // the improvement may have pulled the waiting top
                            // under the bound
                            if flesseq(Self::waiting_top_f(current), *c_lower_bound) {
                                current.put_to_ready();
                            }
                        }

                        let (opposite_loc, opposite_id) = opposite.lookup(hash);
                        if matches!(
                            opposite_loc,
                            Location::OpenReady | Location::OpenWaiting
                        ) && fless(
                            succ_g + opposite.entry(opposite_id).g,
                            *current_cost,
                        ) {
                            *current_cost = succ_g + opposite.entry(opposite_id).g;
                            *middle = Some(succ.clone());
                        } else if opposite_loc == Location::Closed {
                            // already proven from the other side
                            current.remove(child_id);
                        }
                    }
                }
                Location::Unseen => {
                    let (opposite_loc, opposite_id) = opposite.lookup(hash);
                    if opposite_loc == Location::Closed {
                        continue;
                    }

                    let h = heuristic.h_cost(succ, target);
                    let queue = if flesseq(succ_g + h, *c_lower_bound) {
                        OpenQueue::Ready
                    } else {
                        OpenQueue::Waiting
                    };
                    current.add_open(
                        succ.clone(),
                        hash,
                        succ_g,
                        h,
                        reverse_h.h_cost(succ, source),
                        Some(expanded_id),
                        queue,
                    );

                    if matches!(opposite_loc, Location::OpenReady | Location::OpenWaiting)
                        && fless(succ_g + opposite.entry(opposite_id).g, *current_cost)
                    {
                        *current_cost = succ_g + opposite.entry(opposite_id).g;
                        *middle = Some(succ.clone());
                    }
                }
            }
        }
    }

    fn reconstruct_solution<D: SearchDomain<State = S>>(&self, env: &D) -> Vec<S> {
        let middle = self.middle.as_ref().expect("no solution to reconstruct");
        let hash = env.state_hash(middle);

        let extract = |store: &TwoQueueOpenClosed<S>| {
            let (location, mut id) = store.lookup(hash);
            assert_ne!(location, Location::Unseen, "meeting state not in table");
            let mut path = vec![store.entry(id).state.clone()];
            while store.entry(id).parent != id {
                id = store.entry(id).parent;
                path.push(store.entry(id).state.clone());
            }
            path
        };

        let mut path = extract(&self.forward);
        path.reverse();
        path.extend(extract(&self.backward).into_iter().skip(1));
        path
    }
}
