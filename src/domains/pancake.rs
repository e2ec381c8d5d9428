//! Pancake puzzle domain
//!
//! States are permutations of `1..=n` with index 0 at the top of the stack.
//! The only operation is flipping a prefix, at unit cost. The heuristic is
//! GAP-k: adjacencies broken relative to the target, ignoring the k smallest
//! pancakes.

use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHasher;

use super::{Heuristic, SearchDomain};

/// A pancake stack. `stack[0]` is the topmost pancake.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PancakeState {
    stack: Vec<u8>,
}

impl PancakeState {
    pub fn new(stack: Vec<u8>) -> Self {
        Self { stack }
    }

    /// The sorted stack `1..=n`.
    pub fn sorted(n: usize) -> Self {
        Self {
            stack: (1..=n as u8).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn stack(&self) -> &[u8] {
        &self.stack
    }

    /// Reverse the top `k` pancakes.
    pub fn flip(&self, k: usize) -> Self {
        let mut stack = self.stack.clone();
        stack[..k].reverse();
        Self { stack }
    }
}

/// Pancake puzzle environment with a GAP-k heuristic.
pub struct Pancake {
    n: usize,
    gap: usize,
}

impl Pancake {
    /// `gap` is the number of smallest pancakes the heuristic ignores;
    /// 0 gives the full GAP heuristic.
    pub fn new(n: usize, gap: usize) -> Self {
        Self { n, gap }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Deterministic scrambled instance for an index.
    pub fn instance(&self, id: usize) -> PancakeState {
        let mut rng = rand::rngs::StdRng::seed_from_u64(id as u64);
        let mut stack: Vec<u8> = (1..=self.n as u8).collect();
        stack.shuffle(&mut rng);
        PancakeState::new(stack)
    }
}

impl SearchDomain for Pancake {
    type State = PancakeState;

    fn successors(&self, state: &PancakeState, out: &mut Vec<PancakeState>) {
        out.clear();
        for k in 2..=self.n {
            out.push(state.flip(k));
        }
    }

    fn edge_cost(&self, _from: &PancakeState, _to: &PancakeState) -> f64 {
        1.0
    }

    fn state_hash(&self, state: &PancakeState) -> u64 {
        let mut hasher = FxHasher::default();
        state.stack.hash(&mut hasher);
        hasher.finish()
    }
}

impl Heuristic<PancakeState> for Pancake {
    /// GAP-k relative to an arbitrary target: count the stack adjacencies
    /// (including bottom-vs-plate) that are not adjacencies in the target,
    /// skipping pairs that involve one of the k smallest pancakes.
    fn h_cost(&self, from: &PancakeState, to: &PancakeState) -> f64 {
        let n = self.n;
        // position of each pancake in the target; the plate sits below the
        // stack at position n
        let mut pos = vec![0usize; n + 2];
        for (i, &p) in to.stack().iter().enumerate() {
            pos[p as usize] = i;
        }
        let plate = n as u8 + 1;
        pos[plate as usize] = n;

        let mut gaps = 0u32;
        for i in 0..n {
            let a = from.stack()[i];
            let b = if i + 1 < n { from.stack()[i + 1] } else { plate };
            if (a as usize) <= self.gap || (b as usize) <= self.gap {
                continue;
            }
            let pa = pos[a as usize] as i64;
            let pb = pos[b as usize] as i64;
            if (pa - pb).abs() != 1 {
                gaps += 1;
            }
        }
        gaps as f64
    }
}
