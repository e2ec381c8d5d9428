//! Reference unidirectional A*
//!
//! Plain binary-heap A* with lazy deletion, used as the correctness baseline
//! for the bidirectional engines. Ties on f prefer the deeper node.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::domains::{Heuristic, SearchDomain};
use crate::fp::fgreater;

struct HeapEntry {
    f: f64,
    g: f64,
    id: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.g == other.g
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // max-heap: smallest f on top, larger g breaking ties
        other
            .f
            .total_cmp(&self.f)
            .then(self.g.total_cmp(&other.g))
    }
}

struct Node<S> {
    state: S,
    g: f64,
    parent: Option<usize>,
    closed: bool,
}

#[derive(Debug)]
pub struct AStarResult<S> {
    /// Solution path, absent when the goal is unreachable.
    pub path: Option<Vec<S>>,
    pub cost: f64,
    pub nodes_expanded: u64,
    /// Closed nodes whose f exceeded the solution cost.
    pub f_above: usize,
}

pub fn astar<D: SearchDomain>(
    env: &D,
    start: &D::State,
    goal: &D::State,
    heuristic: &dyn Heuristic<D::State>,
) -> AStarResult<D::State>
where
    D::State: Clone + Eq + Hash + Debug,
{
    let mut nodes: Vec<Node<D::State>> = Vec::new();
    let mut table: FxHashMap<D::State, usize> = FxHashMap::default();
    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
    let mut successors = Vec::new();
    let mut expanded = 0u64;

    nodes.push(Node {
        state: start.clone(),
        g: 0.0,
        parent: None,
        closed: false,
    });
    table.insert(start.clone(), 0);
    heap.push(HeapEntry {
        f: heuristic.h_cost(start, goal),
        g: 0.0,
        id: 0,
    });

    let mut solution: Option<usize> = None;

    while let Some(entry) = heap.pop() {
        let id = entry.id;
        if nodes[id].closed || entry.g > nodes[id].g {
            continue; // stale heap entry
        }
        nodes[id].closed = true;
        if nodes[id].state == *goal {
            solution = Some(id);
            break;
        }
        expanded += 1;

        let state = nodes[id].state.clone();
        let g = nodes[id].g;
        env.successors(&state, &mut successors);
        for succ in &successors {
            let succ_g = g + env.edge_cost(&state, succ);
            match table.get(succ) {
                Some(&succ_id) => {
                    if succ_g < nodes[succ_id].g && !nodes[succ_id].closed {
                        nodes[succ_id].g = succ_g;
                        nodes[succ_id].parent = Some(id);
                        heap.push(HeapEntry {
                            f: succ_g + heuristic.h_cost(succ, goal),
                            g: succ_g,
                            id: succ_id,
                        });
                    }
                }
                None => {
                    let succ_id = nodes.len();
                    nodes.push(Node {
                        state: succ.clone(),
                        g: succ_g,
                        parent: Some(id),
                        closed: false,
                    });
                    table.insert(succ.clone(), succ_id);
                    heap.push(HeapEntry {
                        f: succ_g + heuristic.h_cost(succ, goal),
                        g: succ_g,
                        id: succ_id,
                    });
                }
            }
        }
    }

    match solution {
        Some(goal_id) => {
            let cost = nodes[goal_id].g;
            let mut path = Vec::new();
            let mut walk = Some(goal_id);
            while let Some(id) = walk {
                path.push(nodes[id].state.clone());
                walk = nodes[id].parent;
            }
            path.reverse();
            let f_above = nodes
                .iter()
                .filter(|n| n.closed && fgreater(n.g + heuristic.h_cost(&n.state, goal), cost))
                .count();
            AStarResult {
                path: Some(path),
                cost,
                nodes_expanded: expanded,
                f_above,
            }
        }
        None => AStarResult {
            path: None,
            cost: f64::MAX,
            nodes_expanded: expanded,
            f_above: 0,
        },
    }
}
