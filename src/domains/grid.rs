//! Octile grid pathfinding domain
//!
//! Loads HOG-format `.map` / `.scen` files. Cardinal moves cost 1.0 and
//! diagonal moves a configurable amount (1.5 for the benchmark maps, chosen
//! so that costs stay on a 0.5 quantum). A diagonal step is only legal when
//! both adjacent cardinal cells are passable.

use std::fs;
use std::path::Path;

use super::{Heuristic, LoadError, SearchDomain};

/// A cell position on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Parsed occupancy grid.
#[derive(Debug, Clone)]
pub struct GridMap {
    width: i32,
    height: i32,
    passable: Vec<bool>,
}

impl GridMap {
    /// Parse the text `.map` format: a `type`/`height`/`width` header, a
    /// `map` line, then one row of terrain characters per line.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut height: Option<i32> = None;
        let mut width: Option<i32> = None;
        let mut lines = text.lines();

        for line in lines.by_ref() {
            let line = line.trim();
            if line == "map" {
                break;
            }
            if let Some(value) = line.strip_prefix("height ") {
                height = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| LoadError::BadMap(format!("bad height: {value}")))?,
                );
            } else if let Some(value) = line.strip_prefix("width ") {
                width = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| LoadError::BadMap(format!("bad width: {value}")))?,
                );
            }
        }

        let height = height.ok_or_else(|| LoadError::BadMap("missing height".into()))?;
        let width = width.ok_or_else(|| LoadError::BadMap("missing width".into()))?;
        if height <= 0 || width <= 0 {
            return Err(LoadError::BadMap(format!(
                "non-positive dimensions {width}x{height}"
            )));
        }

        let mut passable = Vec::with_capacity((width * height) as usize);
        for (row, line) in lines.take(height as usize).enumerate() {
            let line = line.trim_end();
            if line.chars().count() < width as usize {
                return Err(LoadError::BadMap(format!("row {row} shorter than width")));
            }
            for c in line.chars().take(width as usize) {
                // '.', 'G' and 'S' are traversable terrain; everything else
                // ('@', 'O', 'T', 'W', ...) blocks ground movement.
                passable.push(matches!(c, '.' | 'G' | 'S'));
            }
        }

        if passable.len() != (width * height) as usize {
            return Err(LoadError::BadMap(format!(
                "expected {} rows, got {}",
                height,
                passable.len() as i32 / width
            )));
        }

        Ok(Self {
            width,
            height,
            passable,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Build a map directly from ASCII rows ('.', 'G', 'S' passable).
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows[0].chars().count() as i32;
        let passable = rows
            .iter()
            .flat_map(|row| row.chars().map(|c| matches!(c, '.' | 'G' | 'S')))
            .collect();
        Self {
            width,
            height,
            passable,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && y < self.height
            && self.passable[(y * self.width + x) as usize]
    }
}

/// Grid environment: successor generation plus the octile heuristic.
pub struct GridEnv {
    map: GridMap,
    diagonal_cost: f64,
}

const CARDINALS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONALS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

impl GridEnv {
    pub fn new(map: GridMap, diagonal_cost: f64) -> Self {
        Self { map, diagonal_cost }
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }
}

impl SearchDomain for GridEnv {
    type State = GridPos;

    fn successors(&self, state: &GridPos, out: &mut Vec<GridPos>) {
        out.clear();
        for (dx, dy) in CARDINALS {
            if self.map.is_passable(state.x + dx, state.y + dy) {
                out.push(GridPos::new(state.x + dx, state.y + dy));
            }
        }
        for (dx, dy) in DIAGONALS {
            // no corner cutting: both cardinal cells must be open
            if self.map.is_passable(state.x + dx, state.y + dy)
                && self.map.is_passable(state.x + dx, state.y)
                && self.map.is_passable(state.x, state.y + dy)
            {
                out.push(GridPos::new(state.x + dx, state.y + dy));
            }
        }
    }

    fn edge_cost(&self, from: &GridPos, to: &GridPos) -> f64 {
        if from.x != to.x && from.y != to.y {
            self.diagonal_cost
        } else {
            1.0
        }
    }

    fn state_hash(&self, state: &GridPos) -> u64 {
        (state.y as u64) * (self.map.width as u64) + state.x as u64
    }
}

impl Heuristic<GridPos> for GridEnv {
    /// Octile distance: diagonal steps cover the shorter axis, cardinal steps
    /// the remainder.
    fn h_cost(&self, from: &GridPos, to: &GridPos) -> f64 {
        let dx = (from.x - to.x).abs() as f64;
        let dy = (from.y - to.y).abs() as f64;
        let diag = dx.min(dy);
        let straight = (dx - dy).abs();
        diag * self.diagonal_cost + straight
    }
}

/// One experiment line of a `.scen` file.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioEntry {
    pub bucket: u32,
    pub start: GridPos,
    pub goal: GridPos,
    pub optimal: f64,
}

/// Parsed scenario file: an ordered list of experiments over one map.
#[derive(Debug, Default)]
pub struct Scenario {
    entries: Vec<ScenarioEntry>,
}

impl Scenario {
    /// Parse the `.scen` format: an optional `version` line, then
    /// `bucket map width height sx sy gx gy optimal` per line.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut entries = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("version") {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 9 {
                return Err(LoadError::BadScenario(format!(
                    "line {}: expected 9 fields, got {}",
                    lineno + 1,
                    fields.len()
                )));
            }
            let field = |i: usize| -> Result<f64, LoadError> {
                fields[i].parse().map_err(|_| {
                    LoadError::BadScenario(format!("line {}: bad number {}", lineno + 1, fields[i]))
                })
            };
            entries.push(ScenarioEntry {
                bucket: field(0)? as u32,
                start: GridPos::new(field(4)? as i32, field(5)? as i32),
                goal: GridPos::new(field(6)? as i32, field(7)? as i32),
                optimal: field(8)?,
            });
        }
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScenarioEntry> {
        self.entries.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn open3x3() -> GridEnv {
        GridEnv::new(GridMap::from_rows(&["...", "...", "..."]), 1.5)
    }

    #[test]
    fn test_map_parse_roundtrip() {
        let text = "type octile\nheight 3\nwidth 4\nmap\n....\n.@@.\n....\n";
        let map = GridMap::parse(text).unwrap();
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
        assert!(map.is_passable(0, 0));
        assert!(!map.is_passable(1, 1));
        assert!(!map.is_passable(4, 0));
        assert!(!map.is_passable(-1, 2));
    }

    #[test]
    fn test_map_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "type octile\nheight 2\nwidth 2\nmap\n.@\n..\n").unwrap();
        let map = GridMap::load(file.path()).unwrap();
        assert!(!map.is_passable(1, 0));
        assert!(map.is_passable(1, 1));
    }

    #[test]
    fn test_successors_no_corner_cutting() {
        let env = GridEnv::new(GridMap::from_rows(&[".@.", "...", "..."]), 1.5);
        let mut succ = Vec::new();
        env.successors(&GridPos::new(0, 0), &mut succ);
        // (1,0) is blocked, so the diagonal (1,1) is illegal too
        assert_eq!(succ, vec![GridPos::new(0, 1)]);
    }

    #[test]
    fn test_octile_heuristic() {
        let env = open3x3();
        assert_eq!(env.h_cost(&GridPos::new(0, 0), &GridPos::new(2, 2)), 3.0);
        assert_eq!(env.h_cost(&GridPos::new(0, 0), &GridPos::new(2, 1)), 2.5);
        assert_eq!(env.h_cost(&GridPos::new(2, 2), &GridPos::new(2, 2)), 0.0);
    }

    #[test]
    fn test_diagonal_edge_cost() {
        let env = open3x3();
        assert_eq!(
            env.edge_cost(&GridPos::new(0, 0), &GridPos::new(1, 1)),
            1.5
        );
        assert_eq!(
            env.edge_cost(&GridPos::new(0, 0), &GridPos::new(0, 1)),
            1.0
        );
    }

    #[test]
    fn test_scenario_parse() {
        let text = "version 1\n\
                    0\tmaps/arena.map\t49\t49\t1\t11\t1\t12\t1\n\
                    4\tmaps/arena.map\t49\t49\t1\t13\t4\t12\t3.5\n";
        let scen = Scenario::parse(text).unwrap();
        assert_eq!(scen.len(), 2);
        let entry = scen.get(1).unwrap();
        assert_eq!(entry.bucket, 4);
        assert_eq!(entry.start, GridPos::new(1, 13));
        assert_eq!(entry.goal, GridPos::new(4, 12));
        assert_eq!(entry.optimal, 3.5);
    }

    #[test]
    fn test_scenario_rejects_short_lines() {
        assert!(Scenario::parse("0 map 1 2 3\n").is_err());
    }
}
