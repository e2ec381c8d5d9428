//! Cross-algorithm validation
//!
//! Runs the bidirectional engines and the unidirectional reference on the
//! same instance and compares costs. Used by the randomized agreement tests;
//! also handy from a debugger when an engine change is suspect.

use std::fmt::Debug;
use std::hash::Hash;

use crate::domains::{Heuristic, SearchDomain};
use crate::engine::{astar, Dbbs, DbbsConfig, TwoLevelBae};
use crate::fp::fequal;

/// Heuristic that knows nothing; turns the reference A* into uniform-cost
/// search for brute-force ground truth.
pub struct ZeroHeuristic;

impl<S> Heuristic<S> for ZeroHeuristic {
    fn h_cost(&self, _from: &S, _to: &S) -> f64 {
        0.0
    }
}

/// Solution costs reported by every engine on one instance. `None` means the
/// engine found no path.
#[derive(Debug)]
pub struct AlgorithmCosts {
    pub astar: Option<f64>,
    pub dbbs_alternating: Option<f64>,
    pub dbbs_policy: Option<f64>,
    pub two_level: Option<f64>,
}

impl AlgorithmCosts {
    /// All engines agree: either every cost is absent, or all are equal up to
    /// the comparison tolerance.
    pub fn agree(&self) -> bool {
        let costs = [
            self.astar,
            self.dbbs_alternating,
            self.dbbs_policy,
            self.two_level,
        ];
        match self.astar {
            None => costs.iter().all(|c| c.is_none()),
            Some(reference) => costs
                .iter()
                .all(|c| c.map(|v| fequal(v, reference)).unwrap_or(false)),
        }
    }
}

/// Run every engine on one instance.
pub fn run_all<D>(
    env: &D,
    from: &D::State,
    to: &D::State,
    forward_h: &dyn Heuristic<D::State>,
    backward_h: &dyn Heuristic<D::State>,
    epsilon: f64,
    gcd: f64,
) -> AlgorithmCosts
where
    D: SearchDomain,
    D::State: Clone + Eq + Hash + Debug,
{
    let reference = astar(env, from, to, forward_h);

    let mut dbbs_alternating = Dbbs::new(DbbsConfig {
        alternating: true,
        epsilon,
        gcd,
        ..Default::default()
    });
    let alternating_path = dbbs_alternating.get_path(env, from, to, forward_h, backward_h);

    let mut dbbs_policy = Dbbs::new(DbbsConfig {
        alternating: false,
        epsilon,
        gcd,
        ..Default::default()
    });
    let policy_path = dbbs_policy.get_path(env, from, to, forward_h, backward_h);

    let mut two_level = TwoLevelBae::new(gcd);
    let two_level_path = two_level.get_path(env, from, to, forward_h, backward_h);

    AlgorithmCosts {
        astar: reference.path.map(|_| reference.cost),
        dbbs_alternating: alternating_path.map(|_| dbbs_alternating.solution_cost()),
        dbbs_policy: policy_path.map(|_| dbbs_policy.solution_cost()),
        two_level: two_level_path.map(|_| two_level.solution_cost()),
    }
}
