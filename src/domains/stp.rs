//! 4x4 sliding-tile puzzle domain
//!
//! Tiles are numbered 1..=15 with 0 as the blank. The canonical goal places
//! the blank first followed by the tiles in order. The heuristic is Manhattan
//! distance relative to an arbitrary target (blank excluded).

use super::{Heuristic, LoadError, SearchDomain};

pub const STP_WIDTH: usize = 4;
pub const STP_CELLS: usize = STP_WIDTH * STP_WIDTH;

/// A board: 16 cells in row-major order plus the cached blank position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StpState {
    tiles: [u8; STP_CELLS],
    blank: u8,
}

impl StpState {
    pub fn new(tiles: [u8; STP_CELLS]) -> Self {
        let blank = tiles.iter().position(|&t| t == 0).expect("no blank tile") as u8;
        Self { tiles, blank }
    }

    /// The canonical goal `0 1 2 ... 15`.
    pub fn goal() -> Self {
        let mut tiles = [0u8; STP_CELLS];
        for (i, tile) in tiles.iter_mut().enumerate() {
            *tile = i as u8;
        }
        Self::new(tiles)
    }

    pub fn tiles(&self) -> &[u8; STP_CELLS] {
        &self.tiles
    }

    fn with_blank_moved(&self, to: usize) -> Self {
        let mut tiles = self.tiles;
        tiles.swap(self.blank as usize, to);
        Self {
            tiles,
            blank: to as u8,
        }
    }
}

/// First ten start states of the classical 100-instance benchmark set.
const KORF_STARTS: [[u8; STP_CELLS]; 10] = [
    [14, 13, 15, 7, 11, 12, 9, 5, 6, 0, 2, 1, 4, 8, 10, 3],
    [13, 5, 4, 10, 9, 12, 8, 14, 2, 3, 7, 1, 0, 15, 11, 6],
    [14, 7, 8, 2, 13, 11, 10, 4, 9, 12, 5, 0, 3, 6, 1, 15],
    [5, 12, 10, 7, 15, 11, 14, 0, 8, 2, 1, 13, 3, 4, 9, 6],
    [4, 7, 14, 13, 10, 3, 9, 12, 11, 5, 6, 15, 1, 2, 8, 0],
    [14, 7, 1, 9, 12, 3, 6, 15, 8, 11, 2, 5, 10, 0, 4, 13],
    [2, 11, 15, 5, 13, 4, 6, 7, 12, 8, 10, 1, 9, 3, 14, 0],
    [12, 11, 15, 3, 8, 0, 4, 2, 6, 13, 9, 5, 14, 1, 10, 7],
    [3, 14, 9, 11, 5, 4, 8, 2, 13, 12, 6, 7, 10, 1, 15, 0],
    [13, 11, 8, 9, 0, 15, 7, 10, 4, 3, 6, 14, 5, 12, 1, 2],
];

/// Benchmark start state by its 1-based instance number.
pub fn korf_instance(id: usize) -> Result<StpState, LoadError> {
    if id == 0 || id > KORF_STARTS.len() {
        return Err(LoadError::UnknownInstance(id));
    }
    Ok(StpState::new(KORF_STARTS[id - 1]))
}

/// Sliding-tile environment.
pub struct SlidingTile;

impl SlidingTile {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SlidingTile {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchDomain for SlidingTile {
    type State = StpState;

    fn successors(&self, state: &StpState, out: &mut Vec<StpState>) {
        out.clear();
        let blank = state.blank as usize;
        let (x, y) = (blank % STP_WIDTH, blank / STP_WIDTH);
        if x > 0 {
            out.push(state.with_blank_moved(blank - 1));
        }
        if x + 1 < STP_WIDTH {
            out.push(state.with_blank_moved(blank + 1));
        }
        if y > 0 {
            out.push(state.with_blank_moved(blank - STP_WIDTH));
        }
        if y + 1 < STP_WIDTH {
            out.push(state.with_blank_moved(blank + STP_WIDTH));
        }
    }

    fn edge_cost(&self, _from: &StpState, _to: &StpState) -> f64 {
        1.0
    }

    fn state_hash(&self, state: &StpState) -> u64 {
        // 16 tiles of 4 bits pack exactly into a u64
        state
            .tiles
            .iter()
            .fold(0u64, |acc, &t| (acc << 4) | t as u64)
    }
}

impl Heuristic<StpState> for SlidingTile {
    fn h_cost(&self, from: &StpState, to: &StpState) -> f64 {
        let mut target_pos = [0u8; STP_CELLS];
        for (i, &t) in to.tiles.iter().enumerate() {
            target_pos[t as usize] = i as u8;
        }
        let mut total = 0i32;
        for (i, &t) in from.tiles.iter().enumerate() {
            if t == 0 {
                continue;
            }
            let j = target_pos[t as usize] as usize;
            let dx = (i % STP_WIDTH) as i32 - (j % STP_WIDTH) as i32;
            let dy = (i / STP_WIDTH) as i32 - (j / STP_WIDTH) as i32;
            total += dx.abs() + dy.abs();
        }
        total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_has_blank_first() {
        let goal = StpState::goal();
        assert_eq!(goal.tiles()[0], 0);
        assert_eq!(goal.tiles()[15], 15);
    }

    #[test]
    fn test_successor_counts() {
        let env = SlidingTile::new();
        let mut succ = Vec::new();
        env.successors(&StpState::goal(), &mut succ);
        assert_eq!(succ.len(), 2); // blank in a corner

        let center = StpState::new([1, 2, 3, 4, 5, 0, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
        env.successors(&center, &mut succ);
        assert_eq!(succ.len(), 4);
    }

    #[test]
    fn test_manhattan_distance() {
        let env = SlidingTile::new();
        let goal = StpState::goal();
        assert_eq!(env.h_cost(&goal, &goal), 0.0);

        // swap tiles 1 and 2: each is one cell from home
        let swapped = StpState::new([0, 2, 1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(env.h_cost(&swapped, &goal), 2.0);

        // blank moves do not count
        let slid = StpState::new([1, 0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(env.h_cost(&slid, &goal), 2.0);
    }

    #[test]
    fn test_korf_instance_lookup() {
        let start = korf_instance(1).unwrap();
        assert_eq!(start.tiles()[0], 14);
        assert_eq!(start.tiles()[15], 3);
        assert!(korf_instance(0).is_err());
        assert!(korf_instance(11).is_err());
    }

    #[test]
    fn test_state_hash_distinguishes_boards() {
        let env = SlidingTile::new();
        let a = StpState::goal();
        let b = StpState::new([1, 0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15]);
        assert_ne!(env.state_hash(&a), env.state_hash(&b));
    }
}
