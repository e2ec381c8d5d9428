//! DBBS: dynamic bidirectional bucket search
//!
//! Repeatedly tightens six per-frontier limits to a fixed point to find the
//! smallest expandable bucket on each side, raising the lower bound `C` to
//! the cheapest admissible bound candidate whenever the fixed point leaves a
//! side without one.

use std::fmt::Debug;
use std::hash::Hash;

use crate::bucket::{MinCriterion, Minima, NodeValues};
use crate::domains::{Heuristic, SearchDomain};
use crate::engine::{FrontToEnd, Side};
use crate::fp::{fgreater, fless, round_up_to};

/// Minima assumed for a side whose loose query found no bucket, so the
/// opposite side can still be probed under the limits C implies.
fn bootstrap_minima(c: f64) -> Minima {
    Minima {
        g: c,
        f: c,
        d: c,
        b: 2.0 * c,
        rf: c,
        rd: c,
    }
}

/// Engine configuration. The b and reverse-consistency bound families can be
/// switched off independently; `gcd` is the cost quantum used to round the
/// averaged b bound.
#[derive(Debug, Clone, Copy)]
pub struct DbbsConfig {
    /// Strict side alternation instead of the fewest-expandable-nodes policy.
    pub alternating: bool,
    pub use_b: bool,
    pub use_rc: bool,
    pub criterion: MinCriterion,
    /// Minimum positive edge weight; also floors heuristic values.
    pub epsilon: f64,
    /// Cost quantum (0.5 on grids with 1.5 diagonals).
    pub gcd: f64,
}

impl Default for DbbsConfig {
    fn default() -> Self {
        Self {
            alternating: true,
            use_b: true,
            use_rc: true,
            criterion: MinCriterion::MinB,
            epsilon: 1.0,
            gcd: 1.0,
        }
    }
}

pub struct Dbbs<S> {
    core: FrontToEnd<S>,
    config: DbbsConfig,
    expand_forward: bool,
}

impl<S: Clone + Eq + Hash + Debug> Dbbs<S> {
    pub fn new(config: DbbsConfig) -> Self {
        Self {
            core: FrontToEnd::new(
                config.epsilon,
                config.criterion,
                config.use_b,
                config.use_rc,
            ),
            config,
            expand_forward: true,
        }
    }

    /// Run the search and return the solution path, or `None` when the two
    /// states are disconnected. `solution_cost` reports the cost afterwards.
    pub fn get_path<D: SearchDomain<State = S>>(
        &mut self,
        env: &D,
        from: &S,
        to: &S,
        forward_h: &dyn Heuristic<S>,
        backward_h: &dyn Heuristic<S>,
    ) -> Option<Vec<S>> {
        self.expand_forward = true;
        if !self
            .core
            .initialize(from.clone(), to.clone(), forward_h, backward_h)
        {
            return Some(vec![from.clone()]);
        }

        self.run(env, forward_h, backward_h);

        if !self.core.solution_found() {
            return None;
        }
        if fgreater(self.core.lower_bound(), self.core.solution_cost()) {
            // impossible with admissible heuristics
            panic!(
                "lower bound {} above best solution {} at termination",
                self.core.lower_bound(),
                self.core.solution_cost()
            );
        }
        Some(self.core.reconstruct_solution())
    }

    pub fn solution_cost(&self) -> f64 {
        self.core.solution_cost()
    }

    pub fn nodes_expanded(&self) -> u64 {
        self.core.nodes_expanded()
    }

    pub fn nodes_touched(&self) -> u64 {
        self.core.nodes_touched()
    }

    pub fn necessary_expansions(&self) -> u64 {
        self.core.necessary_expansions()
    }

    pub fn lower_bound(&self) -> f64 {
        self.core.lower_bound()
    }

    fn run<D: SearchDomain<State = S>>(
        &mut self,
        env: &D,
        forward_h: &dyn Heuristic<S>,
        backward_h: &dyn Heuristic<S>,
    ) {
        while !self.core.forward.is_empty() && !self.core.backward.is_empty() {
            if self.update_c() && self.core.solution_proven() {
                break;
            }

            let side = if self.config.alternating {
                let side = if self.expand_forward {
                    Side::Forward
                } else {
                    Side::Backward
                };
                self.expand_forward = !self.expand_forward;
                side
            } else {
                // forward wins ties
                if self.core.forward.expandable_nodes() <= self.core.backward.expandable_nodes() {
                    Side::Forward
                } else {
                    Side::Backward
                }
            };

            let popped = match side {
                Side::Forward => self.core.forward.pop(),
                Side::Backward => self.core.backward.pop(),
            };
            // a best bucket can still yield nothing when its tail was all
            // tombstones; the next update_c finds fresh work or raises C
            if let Some((id, g)) = popped {
                self.core.expand(env, side, id, g, forward_h, backward_h);
            }

            if self.core.solution_proven() {
                break;
            }
        }
    }

    /// Tighten the six limits across both frontiers until the forward minima
    /// stabilize; raise `C` whenever a side ends up without an expandable
    /// bucket. Returns whether `C` increased.
    fn update_c(&mut self) -> bool {
        if self.core.forward.is_best_computed() && self.core.backward.is_best_computed() {
            return false;
        }

        let epsilon = self.core.epsilon();
        let mut incremented = false;

        while fless(self.core.lower_bound(), self.core.solution_cost())
            && (!self.core.forward.is_best_computed() || !self.core.backward.is_best_computed())
        {
            let c = self.core.lower_bound();

            // bootstrap the forward side with the loose limits implied by C
            self.core
                .forward
                .compute_best_bucket(c, c, c, 2.0 * c, f64::MAX, f64::MAX);
            let mut fwd = self
                .core
                .forward
                .minima()
                .unwrap_or_else(|| bootstrap_minima(c));

            loop {
                self.core.backward.compute_best_bucket(
                    c - (fwd.g + epsilon),
                    c - fwd.d,
                    c - fwd.f,
                    2.0 * c - fwd.b,
                    c - fwd.rd,
                    c - fwd.rf,
                );
                let Some(bwd) = self.core.backward.minima() else {
                    break;
                };

                self.core.forward.compute_best_bucket(
                    c - (bwd.g + epsilon),
                    c - bwd.d,
                    c - bwd.f,
                    2.0 * c - bwd.b,
                    c - bwd.rd,
                    c - bwd.rf,
                );
                let Some(next) = self.core.forward.minima() else {
                    break;
                };

                let stable = next.g == fwd.g
                    && next.f == fwd.f
                    && next.d == fwd.d
                    && next.b == fwd.b
                    && next.rf == fwd.rf
                    && next.rd == fwd.rd;
                fwd = next;
                if stable {
                    break;
                }
            }

            if !self.core.forward.is_best_computed() || !self.core.backward.is_best_computed() {
                let next = self.next_lower_bound();
                tracing::debug!(from = c, to = next, "raising lower bound");
                self.core.raise_lower_bound(next);
                incremented = true;
            }
        }

        if !self.config.alternating
            && self.core.forward.is_best_computed()
            && self.core.backward.is_best_computed()
        {
            self.core.forward.count_expandable_nodes();
            self.core.backward.count_expandable_nodes();
        }

        incremented
    }

    /// Smallest bound candidate above the current `C`, drawn from every
    /// admissible lower-bound formula over the two frontiers' value sets.
    fn next_lower_bound(&self) -> f64 {
        let c = self.core.lower_bound();
        let epsilon = self.core.epsilon();
        let forward: NodeValues = self.core.forward.node_values();
        let backward: NodeValues = self.core.backward.node_values();

        let mut result = f64::MAX;
        let mut consider = |candidate: f64| {
            if fgreater(candidate, c) && fless(candidate, result) {
                result = candidate;
            }
        };

        // g bound: a crossing edge costs at least epsilon
        for &fw_g in &forward.g {
            for &bw_g in &backward.g {
                consider(fw_g + bw_g + epsilon);
            }
        }

        // forward and backward KK bounds
        for &fw_f in &forward.f {
            for &bw_d in &backward.d {
                consider(fw_f + bw_d);
            }
        }
        for &bw_f in &backward.f {
            for &fw_d in &forward.d {
                consider(bw_f + fw_d);
            }
        }

        // averaged b bound, rounded up to the cost quantum
        if self.config.use_b {
            for &fw_b in &forward.b {
                for &bw_b in &backward.b {
                    consider(round_up_to((fw_b + bw_b) / 2.0, self.config.gcd));
                }
            }
        }

        // reverse-consistency bounds
        if self.config.use_rc {
            for &fw_rf in &forward.rf {
                for &bw_rd in &backward.rd {
                    consider(fw_rf + bw_rd);
                }
            }
            for &bw_rf in &backward.rf {
                for &fw_rd in &forward.rd {
                    consider(bw_rf + fw_rd);
                }
            }
        }

        result
    }
}
