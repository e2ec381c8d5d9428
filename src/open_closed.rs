//! Two-queue open/closed store
//!
//! A single element table indexed by dense id, two binary heaps over the ids
//! (a *ready* heap ordered by `B = 2g + h - rh`, a *waiting* heap ordered by
//! `F = g + h`, both breaking ties toward larger g) and a hash-to-id map for
//! the closed-set lookups. Each element records its heap slot so re-keying
//! and removal are O(log n).

use rustc_hash::FxHashMap;

use crate::fp::{fequal, fgreater, fless};

/// Where an element currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    OpenReady,
    OpenWaiting,
    Closed,
    Unseen,
}

/// One of the two open heaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenQueue {
    Ready,
    Waiting,
}

impl OpenQueue {
    fn index(self) -> usize {
        match self {
            OpenQueue::Ready => 0,
            OpenQueue::Waiting => 1,
        }
    }

    fn location(self) -> Location {
        match self {
            OpenQueue::Ready => Location::OpenReady,
            OpenQueue::Waiting => Location::OpenWaiting,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element<S> {
    pub state: S,
    pub g: f64,
    pub h: f64,
    pub rh: f64,
    /// Predecessor id; a root points at itself.
    pub parent: usize,
    /// Slot inside the heap named by `location` (meaningless otherwise).
    pub open_location: usize,
    pub reopened: bool,
    pub location: Location,
}

pub struct TwoQueueOpenClosed<S> {
    elements: Vec<Element<S>>,
    table: FxHashMap<u64, usize>,
    queues: [Vec<usize>; 2],
}

impl<S: Clone> TwoQueueOpenClosed<S> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            table: FxHashMap::default(),
            queues: [Vec::new(), Vec::new()],
        }
    }

    pub fn reset(&mut self) {
        self.elements.clear();
        self.table.clear();
        self.queues[0].clear();
        self.queues[1].clear();
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn open_ready_size(&self) -> usize {
        self.queues[0].len()
    }

    pub fn open_waiting_size(&self) -> usize {
        self.queues[1].len()
    }

    pub fn open_size(&self) -> usize {
        self.queues[0].len() + self.queues[1].len()
    }

    pub fn closed_size(&self) -> usize {
        self.len() - self.open_size()
    }

    pub fn entry(&self, id: usize) -> &Element<S> {
        &self.elements[id]
    }

    pub fn entry_mut(&mut self, id: usize) -> &mut Element<S> {
        &mut self.elements[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element<S>> {
        self.elements.iter()
    }

    /// Location and id of a state hash; `(Unseen, usize::MAX)` if absent.
    pub fn lookup(&self, hash: u64) -> (Location, usize) {
        match self.table.get(&hash) {
            Some(&id) => (self.elements[id].location, id),
            None => (Location::Unseen, usize::MAX),
        }
    }

    /// Insert a fresh node into one of the open heaps.
    ///
    /// Inserting a hash that is already present is a precondition failure.
    pub fn add_open(
        &mut self,
        state: S,
        hash: u64,
        g: f64,
        h: f64,
        rh: f64,
        parent: Option<usize>,
        which: OpenQueue,
    ) -> usize {
        assert!(
            !self.table.contains_key(&hash),
            "duplicate hash in open/closed store"
        );
        let id = self.elements.len();
        let q = which.index();
        self.elements.push(Element {
            state,
            g,
            h,
            rh,
            parent: parent.unwrap_or(id),
            open_location: self.queues[q].len(),
            reopened: false,
            location: which.location(),
        });
        self.table.insert(hash, id);
        self.queues[q].push(id);
        self.sift_up(self.queues[q].len() - 1, which);
        id
    }

    /// Insert a node directly into the closed set.
    pub fn add_closed(
        &mut self,
        state: S,
        hash: u64,
        g: f64,
        h: f64,
        rh: f64,
        parent: Option<usize>,
    ) -> usize {
        assert!(
            !self.table.contains_key(&hash),
            "duplicate hash in open/closed store"
        );
        let id = self.elements.len();
        self.elements.push(Element {
            state,
            g,
            h,
            rh,
            parent: parent.unwrap_or(id),
            open_location: 0,
            reopened: false,
            location: Location::Closed,
        });
        self.table.insert(hash, id);
        id
    }

    /// Top of a heap. Panics when the heap is empty.
    pub fn peek(&self, which: OpenQueue) -> usize {
        self.queues[which.index()][0]
    }

    /// Pop the ready top into the closed set; returns its id.
    pub fn close(&mut self) -> usize {
        let id = self.queues[0][0];
        self.elements[id].location = Location::Closed;
        let last = self.queues[0].pop().expect("close on empty ready heap");
        if !self.queues[0].is_empty() {
            self.queues[0][0] = last;
            self.elements[last].open_location = 0;
            self.sift_down(0, OpenQueue::Ready);
        }
        id
    }

    /// Move the waiting top into the ready heap; returns its id.
    pub fn put_to_ready(&mut self) -> usize {
        let id = self.queues[1][0];
        let last = self.queues[1].pop().expect("empty waiting heap");
        if !self.queues[1].is_empty() {
            self.queues[1][0] = last;
            self.elements[last].open_location = 0;
            self.sift_down(0, OpenQueue::Waiting);
        }

        self.elements[id].location = Location::OpenReady;
        self.elements[id].open_location = self.queues[0].len();
        self.queues[0].push(id);
        self.sift_up(self.queues[0].len() - 1, OpenQueue::Ready);
        id
    }

    /// Put a closed node back into an open heap, marking it reopened.
    pub fn reopen(&mut self, id: usize, which: OpenQueue) {
        assert_eq!(
            self.elements[id].location,
            Location::Closed,
            "reopen of a non-closed node"
        );
        let q = which.index();
        self.elements[id].reopened = true;
        self.elements[id].location = which.location();
        self.elements[id].open_location = self.queues[q].len();
        self.queues[q].push(id);
        self.sift_up(self.queues[q].len() - 1, which);
    }

    /// Drop an open node from its heap and mark it closed.
    pub fn remove(&mut self, id: usize) {
        let which = match self.elements[id].location {
            Location::OpenReady => OpenQueue::Ready,
            Location::OpenWaiting => OpenQueue::Waiting,
            _ => panic!("remove of a node that is not open"),
        };
        let q = which.index();
        let index = self.elements[id].open_location;
        self.elements[id].location = Location::Closed;

        let last = self.queues[q].pop().expect("empty heap on remove");
        if index < self.queues[q].len() {
            self.queues[q][index] = last;
            self.elements[last].open_location = index;
            if !self.sift_up(index, which) {
                self.sift_down(index, which);
            }
        }
    }

    /// Restore heap order around an element whose key changed.
    pub fn key_changed(&mut self, id: usize) {
        let which = match self.elements[id].location {
            Location::OpenReady => OpenQueue::Ready,
            Location::OpenWaiting => OpenQueue::Waiting,
            _ => return,
        };
        let index = self.elements[id].open_location;
        if !self.sift_up(index, which) {
            self.sift_down(index, which);
        }
    }

    /// True when element `a` belongs above element `b` in the given heap.
    fn precedes(&self, a: usize, b: usize, which: OpenQueue) -> bool {
        let (ea, eb) = (&self.elements[a], &self.elements[b]);
        let (ka, kb) = match which {
            OpenQueue::Ready => (
                2.0 * ea.g + ea.h - ea.rh,
                2.0 * eb.g + eb.h - eb.rh,
            ),
            OpenQueue::Waiting => (ea.g + ea.h, eb.g + eb.h),
        };
        if fequal(ka, kb) {
            fgreater(ea.g, eb.g) // prefer the deeper node
        } else {
            fless(ka, kb)
        }
    }

    fn swap_slots(&mut self, q: usize, i: usize, j: usize) {
        self.queues[q].swap(i, j);
        let (a, b) = (self.queues[q][i], self.queues[q][j]);
        self.elements[a].open_location = i;
        self.elements[b].open_location = j;
    }

    fn sift_up(&mut self, mut index: usize, which: OpenQueue) -> bool {
        let q = which.index();
        let mut moved = false;
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.precedes(self.queues[q][index], self.queues[q][parent], which) {
                self.swap_slots(q, index, parent);
                index = parent;
                moved = true;
            } else {
                break;
            }
        }
        moved
    }

    fn sift_down(&mut self, mut index: usize, which: OpenQueue) {
        let q = which.index();
        loop {
            let child1 = index * 2 + 1;
            let child2 = index * 2 + 2;
            let count = self.queues[q].len();
            if child1 >= count {
                return;
            }
            let which_child = if child2 >= count {
                child1
            } else if self.precedes(self.queues[q][child2], self.queues[q][child1], which) {
                child2
            } else {
                child1
            };
            if self.precedes(self.queues[q][which_child], self.queues[q][index], which) {
                self.swap_slots(q, index, which_child);
                index = which_child;
            } else {
                return;
            }
        }
    }

    #[cfg(test)]
    fn validate_heap(&self, which: OpenQueue) -> bool {
        let q = which.index();
        for index in 0..self.queues[q].len() {
            let id = self.queues[q][index];
            if self.elements[id].open_location != index {
                return false;
            }
            for child in [index * 2 + 1, index * 2 + 2] {
                if child < self.queues[q].len()
                    && self.precedes(self.queues[q][child], id, which)
                {
                    return false;
                }
            }
        }
        true
    }
}

impl<S: Clone> Default for TwoQueueOpenClosed<S> {
    fn default() -> Self {
        Self::new()
    }
}
