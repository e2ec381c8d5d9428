//! Pluggable search domains
//!
//! A domain supplies successor enumeration, edge costs, a stable state hash
//! and heuristic evaluation. The engines see nothing else of it.

pub mod grid;
pub mod pancake;
pub mod stp;

pub use grid::{GridEnv, GridMap, GridPos, Scenario};
pub use pancake::{Pancake, PancakeState};
pub use stp::{korf_instance, SlidingTile, StpState};

use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// Capability set every search domain provides.
pub trait SearchDomain {
    type State: Clone + Eq + Hash + Debug;

    /// Enumerate the successors of `state` into `out` (cleared first).
    fn successors(&self, state: &Self::State, out: &mut Vec<Self::State>);

    /// Cost of the edge between two adjacent states. Non-negative.
    fn edge_cost(&self, from: &Self::State, to: &Self::State) -> f64;

    /// Stable 64-bit hash of a state.
    fn state_hash(&self, state: &Self::State) -> u64;
}

/// Admissible estimate of the cost from one state to another.
///
/// Engines hold one instance per direction; a domain typically implements
/// this on itself and is passed for both.
pub trait Heuristic<S> {
    fn h_cost(&self, from: &S, to: &S) -> f64;
}

/// Total cost of a path under a domain's edge costs.
pub fn path_cost<D: SearchDomain>(env: &D, path: &[D::State]) -> f64 {
    path.windows(2)
        .map(|pair| env.edge_cost(&pair[0], &pair[1]))
        .sum()
}

/// Errors raised while loading maps, scenarios or instance tables.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed map file: {0}")]
    BadMap(String),

    #[error("malformed scenario file: {0}")]
    BadScenario(String),

    #[error("unknown instance: {0}")]
    UnknownInstance(usize),
}
