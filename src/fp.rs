//! Epsilon-tolerant floating point ordering
//!
//! Bucket keys and bound arithmetic accumulate sums of edge costs such as the
//! 1.5 diagonal, so every comparison the engines make goes through a tolerant
//! order instead of raw `<`/`>`.

use std::cmp::Ordering;

/// Absolute tolerance for cost comparisons.
pub const TOLERANCE: f64 = 1e-6;

/// `a == b` up to tolerance.
#[inline]
pub fn fequal(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

/// `a < b` by more than the tolerance.
#[inline]
pub fn fless(a: f64, b: f64) -> bool {
    a < b - TOLERANCE
}

/// `a > b` by more than the tolerance.
#[inline]
pub fn fgreater(a: f64, b: f64) -> bool {
    a > b + TOLERANCE
}

/// `a >= b` up to tolerance.
#[inline]
pub fn fgreatereq(a: f64, b: f64) -> bool {
    !fless(a, b)
}

/// `a <= b` up to tolerance.
#[inline]
pub fn flesseq(a: f64, b: f64) -> bool {
    !fgreater(a, b)
}

/// Round `value` up to the next multiple of `quantum`, tolerating drift just
/// below a multiple so that e.g. `3.0000000004 / 0.5` still rounds to `3.0`.
#[inline]
pub fn round_up_to(value: f64, quantum: f64) -> f64 {
    quantum * (value / quantum - TOLERANCE).ceil()
}

/// Total-ordered `f64` wrapper usable as a `BTreeMap` key.
///
/// Bucket keys are exact sums of domain edge costs, so `total_cmp` keying is
/// stable; tolerant comparisons happen at the engine level, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostKey(pub f64);

impl CostKey {
    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Eq for CostKey {}

impl PartialOrd for CostKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CostKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
