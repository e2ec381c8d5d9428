//! Best-bucket cache over the bucket list
//!
//! `compute_best_bucket` walks the nested layers under six upper-bound
//! limits, maintains the running minima of every derived quantity over the
//! surviving buckets, and remembers the bucket that attains the minimum of
//! the configured criterion. The cache is invalidated whenever an insertion
//! could beat a cached minimum or the cached bucket drains.

use std::fmt::Debug;
use std::hash::Hash;

use crate::fp::{fgreater, fless};

use super::list::{BucketList, BucketNode};
use super::{BucketInfo, MinCriterion, NodeId, NodeValues, TOMBSTONE};

/// Minima of the derived quantities over the buckets satisfying the limits.
#[derive(Debug, Clone, Copy)]
pub struct Minima {
    pub g: f64,
    pub f: f64,
    pub d: f64,
    pub b: f64,
    pub rf: f64,
    pub rd: f64,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    g: f64,
    f: f64,
    d: f64,
    b: f64,
    rf: f64,
    rd: f64,
}

const NO_COUNT: u64 = u64::MAX;

pub struct BestBucketList<S> {
    list: BucketList<S>,
    criterion: MinCriterion,
    use_b: bool,
    use_rc: bool,
    best: Option<(f64, f64, f64)>,
    minima: Minima,
    limits: Limits,
    expandable: u64,
}

impl<S: Clone + Eq + Hash + Debug> BestBucketList<S> {
    pub fn new(criterion: MinCriterion, use_b: bool, use_rc: bool) -> Self {
        Self {
            list: BucketList::new(),
            criterion,
            use_b,
            use_rc,
            best: None,
            minima: Minima {
                g: f64::MAX,
                f: f64::MAX,
                d: f64::MAX,
                b: f64::MAX,
                rf: f64::MAX,
                rd: f64::MAX,
            },
            limits: Limits {
                g: f64::MAX,
                f: f64::MAX,
                d: f64::MAX,
                b: f64::MAX,
                rf: f64::MAX,
                rd: f64::MAX,
            },
            expandable: NO_COUNT,
        }
    }

    pub fn reset(&mut self) {
        self.list.reset();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.best = None;
        self.expandable = NO_COUNT;
        self.minima = Minima {
            g: f64::MAX,
            f: f64::MAX,
            d: f64::MAX,
            b: f64::MAX,
            rf: f64::MAX,
            rd: f64::MAX,
        };
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn is_best_computed(&self) -> bool {
        self.best.is_some()
    }

    /// Minima of the last computation, if a best bucket is cached.
    pub fn minima(&self) -> Option<Minima> {
        self.best.map(|_| self.minima)
    }

    pub fn expandable_nodes(&self) -> u64 {
        self.expandable
    }

    pub fn node(&self, id: NodeId) -> &BucketNode<S> {
        self.list.node(id)
    }

    pub fn lookup(&self, state: &S) -> Option<&BucketNode<S>> {
        self.list.lookup(state)
    }

    pub fn lookup_g(&self, state: &S) -> Option<(bool, f64)> {
        self.list.lookup_g(state)
    }

    pub fn bucket_info(&self) -> Vec<BucketInfo> {
        self.list.bucket_info()
    }

    pub fn node_values(&self) -> NodeValues {
        self.list.node_values()
    }

    /// Insert or improve a node; drops the cache when the new bucket could
    /// undercut a cached minimum.
    pub fn add(&mut self, state: S, g: f64, h: f64, h_reverse: f64, parent: Option<NodeId>) -> bool {
        let added = self.list.add(state, g, h, h_reverse, parent);

        let f = g + h;
        let d = g - h_reverse;
        if added
            && (fless(g, self.minima.g)
                || fless(f, self.minima.f)
                || fless(d, self.minima.d)
                || (self.use_b && fless(f + d, self.minima.b))
                || (self.use_rc && fless(g - h, self.minima.rf))
                || (self.use_rc && fless(g + h_reverse, self.minima.rd)))
        {
            self.invalidate();
        }

        added
    }

    /// Scan the buckets satisfying all six limits, recording minima and the
    /// criterion-best bucket. Empty buckets encountered on the way are
    /// erased. Leaves no cached bucket when nothing satisfies the limits.
    pub fn compute_best_bucket(
        &mut self,
        g_lim: f64,
        f_lim: f64,
        d_lim: f64,
        b_lim: f64,
        rf_lim: f64,
        rd_lim: f64,
    ) {
        self.invalidate();
        self.limits = Limits {
            g: g_lim,
            f: f_lim,
            d: d_lim,
            b: b_lim,
            rf: rf_lim,
            rd: rd_lim,
        };

        let mut empties: Vec<(f64, f64, f64)> = Vec::new();

        'g_layers: for (gk, g_layer) in &self.list.layers {
            let g = gk.get();
            if fgreater(g, g_lim) {
                break 'g_layers;
            }

            for (hk, h_layer) in g_layer {
                let h = hk.get();
                let f = g + h;
                if fgreater(f, f_lim) {
                    break;
                }

                // rf decreases as h grows, so a violation skips this h only
                let rf = g - h;
                if self.use_rc && fgreater(rf, rf_lim) {
                    continue;
                }

                for (rk, bucket) in h_layer {
                    let h_reverse = rk.0.get();
                    let d = g - h_reverse;

                    if bucket.is_empty() {
                        empties.push((g, h, h_reverse));
                        continue;
                    }

                    if fgreater(d, d_lim) {
                        break;
                    }

                    let b = f + d;
                    if self.use_b && fgreater(b, b_lim) {
                        break;
                    }

                    // rd decreases with h_reverse, so keep scanning
                    let rd = g + h_reverse;
                    if self.use_rc && fgreater(rd, rd_lim) {
                        continue;
                    }

                    if fless(g, self.minima.g) {
                        self.minima.g = g;
                        if self.criterion == MinCriterion::MinG {
                            self.best = Some((g, h, h_reverse));
                        }
                    }
                    if fless(f, self.minima.f) {
                        self.minima.f = f;
                        if self.criterion == MinCriterion::MinF {
                            self.best = Some((g, h, h_reverse));
                        }
                    }
                    if fless(d, self.minima.d) {
                        self.minima.d = d;
                        if self.criterion == MinCriterion::MinD {
                            self.best = Some((g, h, h_reverse));
                        }
                    }
                    if self.use_b && fless(b, self.minima.b) {
                        self.minima.b = b;
                        if self.criterion == MinCriterion::MinB {
                            self.best = Some((g, h, h_reverse));
                        }
                    }
                    if self.use_rc && fless(rf, self.minima.rf) {
                        self.minima.rf = rf;
                    }
                    if self.use_rc && fless(rd, self.minima.rd) {
                        self.minima.rd = rd;
                    }
                }
            }
        }

        for (g, h, h_reverse) in empties {
            self.list.erase_bucket(g, h, h_reverse);
        }
    }

    /// Pop a node from the cached best bucket. Draining the bucket drops the
    /// cache, so the caller recomputes limits before the next pop. Tombstones
    /// at the tail are discarded on the way.
    pub fn pop(&mut self) -> Option<(NodeId, f64)> {
        loop {
            let (g, h, h_reverse) = self.best?;

            let bucket = self
                .list
                .bucket_mut(g, h, h_reverse)
                .expect("cached best bucket vanished");
            let id = bucket.pop().expect("cached best bucket is empty");
            let drained = bucket.is_empty();

            if self.expandable != NO_COUNT {
                self.expandable -= 1;
            }
            if drained {
                self.list.erase_bucket(g, h, h_reverse);
                self.invalidate();
            }

            if id != TOMBSTONE {
                let node = &mut self.list.nodes[id as usize];
                node.bucket_index = -1;
                return Some((id, node.g));
            }
        }
    }

    /// Count the nodes in all buckets satisfying the stored limits, using the
    /// same pruning rules as the scan.
    pub fn count_expandable_nodes(&mut self) {
        let mut count = 0u64;

        for (gk, g_layer) in &self.list.layers {
            let g = gk.get();
            if fgreater(g, self.limits.g) {
                break;
            }

            for (hk, h_layer) in g_layer {
                let h = hk.get();
                let f = g + h;
                if fgreater(f, self.limits.f) {
                    break;
                }
                if self.use_rc && fgreater(g - h, self.limits.rf) {
                    continue;
                }

                for (rk, bucket) in h_layer {
                    let h_reverse = rk.0.get();
                    let d = g - h_reverse;
                    let b = f + d;
                    if fgreater(d, self.limits.d) || (self.use_b && fgreater(b, self.limits.b)) {
                        break;
                    }
                    if self.use_rc && fgreater(g + h_reverse, self.limits.rd) {
                        continue;
                    }
                    count += bucket.len() as u64;
                }
            }
        }

        self.expandable = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loose(list: &mut BestBucketList<u32>) {
        list.compute_best_bucket(f64::MAX, f64::MAX, f64::MAX, f64::MAX, f64::MAX, f64::MAX);
    }

    #[test]
    fn test_minima_over_unlimited_scan() {
        let mut list = BestBucketList::new(MinCriterion::MinB, true, true);
        list.add(1, 1.0, 2.0, 0.5, None); // f 3.0, d 0.5, b 3.5, rf -1.0, rd 1.5
        list.add(2, 2.0, 1.0, 1.5, None); // f 3.0, d 0.5, b 3.5, rf 1.0, rd 3.5
        list.add(3, 2.5, 1.0, 2.5, None); // f 3.5, d 0.0, b 3.5, rf 1.5, rd 5.0
        loose(&mut list);

        let m = list.minima().unwrap();
        assert_eq!(m.g, 1.0);
        assert_eq!(m.f, 3.0);
        assert_eq!(m.d, 0.0);
        assert_eq!(m.b, 3.5);
        assert_eq!(m.rf, -1.0);
        assert_eq!(m.rd, 1.5);
    }

    #[test]
    fn test_limits_exclude_buckets() {
        let mut list = BestBucketList::new(MinCriterion::MinG, true, true);
        list.add(1, 1.0, 2.0, 0.5, None);
        list.add(2, 3.0, 1.0, 1.5, None);

        list.compute_best_bucket(2.0, f64::MAX, f64::MAX, f64::MAX, f64::MAX, f64::MAX);
        let m = list.minima().unwrap();
        assert_eq!(m.g, 1.0);
        assert_eq!(m.f, 3.0);

        // nothing satisfies a g limit below every bucket
        list.compute_best_bucket(0.5, f64::MAX, f64::MAX, f64::MAX, f64::MAX, f64::MAX);
        assert!(!list.is_best_computed());
        assert!(list.minima().is_none());
    }

    #[test]
    fn test_pop_invalidates_on_drain() {
        let mut list = BestBucketList::new(MinCriterion::MinG, true, true);
        list.add(1, 1.0, 2.0, 0.5, None);
        list.add(2, 1.0, 2.0, 0.5, None);
        loose(&mut list);

        let (first, g) = list.pop().unwrap();
        assert_eq!(g, 1.0);
        assert!(list.is_best_computed());
        let (second, _) = list.pop().unwrap();
        assert_ne!(first, second);
        // bucket drained, cache dropped
        assert!(!list.is_best_computed());
        assert!(list.pop().is_none());
    }

    #[test]
    fn test_add_invalidates_improving_cache() {
        let mut list = BestBucketList::new(MinCriterion::MinG, true, true);
        list.add(1, 2.0, 2.0, 0.5, None);
        loose(&mut list);
        assert!(list.is_best_computed());

        // a dominated bucket leaves the cache alone
        list.add(2, 3.0, 2.5, 0.5, None);
        assert!(list.is_best_computed());

        // a better g drops it
        list.add(3, 1.0, 2.0, 0.5, None);
        assert!(!list.is_best_computed());
    }

    #[test]
    fn test_count_expandable_nodes() {
        let mut list = BestBucketList::new(MinCriterion::MinG, true, true);
        list.add(1, 1.0, 2.0, 0.5, None);
        list.add(2, 1.0, 2.0, 0.5, None);
        list.add(3, 3.0, 1.0, 0.5, None);

        list.compute_best_bucket(2.0, f64::MAX, f64::MAX, f64::MAX, f64::MAX, f64::MAX);
        list.count_expandable_nodes();
        assert_eq!(list.expandable_nodes(), 2);

        // pops decrement the running count
        list.pop().unwrap();
        assert_eq!(list.expandable_nodes(), 1);
    }

    #[test]
    fn test_pop_skips_tombstones() {
        let mut list = BestBucketList::new(MinCriterion::MinG, true, true);
        list.add(1, 2.0, 1.0, 1.0, None);
        list.add(1, 1.5, 1.0, 1.0, None); // tombstones the g=2.0 slot
        list.add(2, 2.0, 1.0, 1.0, None);
        list.compute_best_bucket(f64::MAX, f64::MAX, f64::MAX, f64::MAX, f64::MAX, f64::MAX);
        let mut seen = Vec::new();
        while let Some((id, _)) = list.pop() {
            seen.push(list.node(id).state);
            if !list.is_best_computed() {
                list.compute_best_bucket(
                    f64::MAX,
                    f64::MAX,
                    f64::MAX,
                    f64::MAX,
                    f64::MAX,
                    f64::MAX,
                );
            }
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&1));
        assert!(seen.contains(&2));
    }
}
