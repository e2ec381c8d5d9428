//! Multi-dimensional bucket list
//!
//! Nodes live in an append-only arena; buckets hold node ids so that table
//! growth never invalidates a reference. Re-keying a node on a g improvement
//! tombstones its old slot instead of searching the bucket. Tombstones are
//! physically removed only when they surface at a bucket's tail.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::fp::{flesseq, CostKey};

use super::{BucketInfo, NodeId, NodeValues, TOMBSTONE};

type Bucket = Vec<NodeId>;
type HLayer = BTreeMap<Reverse<CostKey>, Bucket>;
type GLayer = BTreeMap<CostKey, HLayer>;

/// One search node owned by the side's table.
#[derive(Debug, Clone)]
pub struct BucketNode<S> {
    pub state: S,
    pub g: f64,
    /// Predecessor in this side's search tree; `None` for the root.
    pub parent: Option<NodeId>,
    /// Position inside the bucket, or -1 once expanded.
    pub bucket_index: i32,
}

/// Open list for one search side, keyed by `(g, h, h_reverse)`.
///
/// The outer map is ordered by `g` ascending, then `h` ascending, then
/// `h_reverse` descending so that a fixed `(g, h)` layer is visited in
/// ascending `d = g - h_reverse`.
pub struct BucketList<S> {
    pub(super) nodes: Vec<BucketNode<S>>,
    table: FxHashMap<S, NodeId>,
    pub(super) layers: BTreeMap<CostKey, GLayer>,
}

impl<S: Clone + Eq + Hash + Debug> BucketList<S> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            table: FxHashMap::default(),
            layers: BTreeMap::new(),
        }
    }

    pub fn reset(&mut self) {
        self.nodes.clear();
        self.table.clear();
        self.layers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn bucket_entry(&mut self, g: f64, h: f64, h_reverse: f64) -> &mut Bucket {
        self.layers
            .entry(CostKey(g))
            .or_default()
            .entry(CostKey(h))
            .or_default()
            .entry(Reverse(CostKey(h_reverse)))
            .or_default()
    }

    pub(super) fn bucket_mut(&mut self, g: f64, h: f64, h_reverse: f64) -> Option<&mut Bucket> {
        self.layers
            .get_mut(&CostKey(g))?
            .get_mut(&CostKey(h))?
            .get_mut(&Reverse(CostKey(h_reverse)))
    }

    /// Erase a bucket's key along with any now-empty ancestor maps.
    pub(super) fn erase_bucket(&mut self, g: f64, h: f64, h_reverse: f64) {
        if let Some(g_layer) = self.layers.get_mut(&CostKey(g)) {
            if let Some(h_layer) = g_layer.get_mut(&CostKey(h)) {
                h_layer.remove(&Reverse(CostKey(h_reverse)));
                if h_layer.is_empty() {
                    g_layer.remove(&CostKey(h));
                }
            }
            if g_layer.is_empty() {
                self.layers.remove(&CostKey(g));
            }
        }
    }

    /// Insert or improve a node. Returns whether anything was stored.
    ///
    /// An existing entry with no worse `g` wins. Improving a node that was
    /// already expanded is a precondition failure: with the limits the
    /// engines maintain it cannot happen, so it panics.
    pub fn add(&mut self, state: S, g: f64, h: f64, h_reverse: f64, parent: Option<NodeId>) -> bool {
        if let Some(&id) = self.table.get(&state) {
            let old_g = self.nodes[id as usize].g;
            if flesseq(old_g, g) {
                return false;
            }

            let old_index = self.nodes[id as usize].bucket_index;
            if old_index < 0 {
                panic!("reopening an expanded node: {state:?}");
            }

            // tombstone the superseded slot
            let old_bucket = self
                .bucket_mut(old_g, h, h_reverse)
                .expect("open node has no bucket");
            old_bucket[old_index as usize] = TOMBSTONE;

            let index = {
                let bucket = self.bucket_entry(g, h, h_reverse);
                bucket.push(id);
                bucket.len() as i32 - 1
            };
            let node = &mut self.nodes[id as usize];
            node.g = g;
            node.parent = parent;
            node.bucket_index = index;
        } else {
            let id = self.nodes.len() as NodeId;
            let index = {
                let bucket = self.bucket_entry(g, h, h_reverse);
                bucket.push(id);
                bucket.len() as i32 - 1
            };
            self.nodes.push(BucketNode {
                state: state.clone(),
                g,
                parent,
                bucket_index: index,
            });
            self.table.insert(state, id);
        }
        true
    }

    pub fn node(&self, id: NodeId) -> &BucketNode<S> {
        &self.nodes[id as usize]
    }

    pub fn lookup(&self, state: &S) -> Option<&BucketNode<S>> {
        let &id = self.table.get(state)?;
        Some(&self.nodes[id as usize])
    }

    /// The node's best-known `g`, with whether that value is already provably
    /// side-optimal (the node has been expanded).
    pub fn lookup_g(&self, state: &S) -> Option<(bool, f64)> {
        let node = self.lookup(state)?;
        Some((node.bucket_index < 0, node.g))
    }

    /// Pop the tail of the named bucket and mark the node expanded.
    ///
    /// The caller must have established via [`Self::remove_if_empty`] that
    /// the bucket exists and does not end in a tombstone.
    pub fn pop_bucket(&mut self, g: f64, h: f64, h_reverse: f64) -> NodeId {
        let bucket = self
            .bucket_mut(g, h, h_reverse)
            .expect("popping a missing bucket");
        let id = bucket.pop().expect("popping an empty bucket");
        assert_ne!(id, TOMBSTONE, "bucket tail was not stripped");
        self.remove_if_empty(g, h, h_reverse);
        self.nodes[id as usize].bucket_index = -1;
        id
    }

    /// Strip trailing tombstones; erase the bucket (and empty ancestors) if
    /// nothing remains. Returns whether an erasure occurred.
    pub fn remove_if_empty(&mut self, g: f64, h: f64, h_reverse: f64) -> bool {
        let Some(bucket) = self.bucket_mut(g, h, h_reverse) else {
            return true;
        };
        while bucket.last() == Some(&TOMBSTONE) {
            bucket.pop();
        }
        if bucket.is_empty() {
            self.erase_bucket(g, h, h_reverse);
            return true;
        }
        false
    }

    /// Keys and sizes of every bucket, in traversal order.
    pub fn bucket_info(&self) -> Vec<BucketInfo> {
        let mut result = Vec::new();
        for (gk, g_layer) in &self.layers {
            for (hk, h_layer) in g_layer {
                for (rk, bucket) in h_layer {
                    result.push(BucketInfo {
                        g: gk.get(),
                        h: hk.get(),
                        h_reverse: rk.0.get(),
                        nodes: bucket.len(),
                    });
                }
            }
        }
        result
    }

    /// Distinct derived values over all buckets, each sorted ascending.
    pub fn node_values(&self) -> NodeValues {
        let mut g_set = BTreeSet::new();
        let mut f_set = BTreeSet::new();
        let mut d_set = BTreeSet::new();
        let mut b_set = BTreeSet::new();
        let mut rf_set = BTreeSet::new();
        let mut rd_set = BTreeSet::new();

        for (gk, g_layer) in &self.layers {
            let g = gk.get();
            g_set.insert(CostKey(g));
            for (hk, h_layer) in g_layer {
                let h = hk.get();
                f_set.insert(CostKey(g + h));
                rf_set.insert(CostKey(g - h));
                for rk in h_layer.keys() {
                    let h_reverse = rk.0.get();
                    let d = g - h_reverse;
                    d_set.insert(CostKey(d));
                    rd_set.insert(CostKey(g + h_reverse));
                    b_set.insert(CostKey(g + h + d));
                }
            }
        }

        let flatten = |set: BTreeSet<CostKey>| set.into_iter().map(CostKey::get).collect();
        NodeValues {
            g: flatten(g_set),
            f: flatten(f_set),
            d: flatten(d_set),
            b: flatten(b_set),
            rf: flatten(rf_set),
            rd: flatten(rd_set),
        }
    }
}

impl<S: Clone + Eq + Hash + Debug> Default for BucketList<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut list: BucketList<u32> = BucketList::new();
        assert!(list.add(7, 2.0, 3.0, 1.0, None));
        assert!(!list.add(7, 2.0, 3.0, 1.0, None)); // equal g rejected
        assert!(!list.add(7, 2.5, 3.0, 1.0, None)); // worse g rejected
        let (optimal, g) = list.lookup_g(&7).unwrap();
        assert!(!optimal);
        assert_eq!(g, 2.0);
        assert!(list.lookup_g(&8).is_none());
    }

    #[test]
    fn test_improvement_tombstones_old_slot() {
        let mut list: BucketList<u32> = BucketList::new();
        list.add(7, 2.0, 3.0, 1.0, None);
        assert!(list.add(7, 1.5, 3.0, 1.0, None));
        assert_eq!(list.lookup_g(&7), Some((false, 1.5)));

        // the g=2.0 bucket now holds only a tombstone
        assert!(list.remove_if_empty(2.0, 3.0, 1.0));
        // the g=1.5 bucket is live
        assert!(!list.remove_if_empty(1.5, 3.0, 1.0));
    }

    #[test]
    fn test_pop_bucket_marks_expanded() {
        let mut list: BucketList<u32> = BucketList::new();
        list.add(7, 2.0, 3.0, 1.0, None);
        let id = list.pop_bucket(2.0, 3.0, 1.0);
        assert_eq!(list.node(id).state, 7);
        assert_eq!(list.node(id).bucket_index, -1);
        assert_eq!(list.lookup_g(&7), Some((true, 2.0)));
        assert!(list.is_empty());
    }

    #[test]
    #[should_panic(expected = "reopening an expanded node")]
    fn test_reopening_expanded_node_panics() {
        let mut list: BucketList<u32> = BucketList::new();
        list.add(7, 2.0, 3.0, 1.0, None);
        list.pop_bucket(2.0, 3.0, 1.0);
        list.add(7, 1.0, 3.0, 1.0, None);
    }

    #[test]
    fn test_traversal_order() {
        let mut list: BucketList<u32> = BucketList::new();
        list.add(1, 2.0, 1.0, 0.5, None);
        list.add(2, 1.0, 2.0, 1.5, None);
        list.add(3, 1.0, 2.0, 0.5, None);
        list.add(4, 1.0, 1.0, 1.0, None);

        let info = list.bucket_info();
        let keys: Vec<(f64, f64, f64)> = info.iter().map(|b| (b.g, b.h, b.h_reverse)).collect();
        // g ascending, h ascending, h_reverse descending
        assert_eq!(
            keys,
            vec![
                (1.0, 1.0, 1.0),
                (1.0, 2.0, 1.5),
                (1.0, 2.0, 0.5),
                (2.0, 1.0, 0.5),
            ]
        );
    }

    #[test]
    fn test_node_values() {
        let mut list: BucketList<u32> = BucketList::new();
        list.add(1, 1.0, 2.0, 0.5, None);
        list.add(2, 2.0, 1.0, 1.0, None);
        let values = list.node_values();
        assert_eq!(values.g, vec![1.0, 2.0]);
        assert_eq!(values.f, vec![3.0]);
        assert_eq!(values.d, vec![0.5, 1.0]);
        assert_eq!(values.rf, vec![-1.0, 1.0]);
        assert_eq!(values.rd, vec![1.5, 3.0]);
        assert_eq!(values.b, vec![3.5, 4.0]);
    }

    #[test]
    fn test_empty_layers_are_erased() {
        let mut list: BucketList<u32> = BucketList::new();
        list.add(1, 1.0, 2.0, 0.5, None);
        list.add(2, 1.0, 2.0, 1.5, None);
        list.pop_bucket(1.0, 2.0, 0.5);
        assert!(!list.is_empty());
        list.pop_bucket(1.0, 2.0, 1.5);
        assert!(list.is_empty());
    }
}
