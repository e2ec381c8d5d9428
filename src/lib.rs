//! Bisearch: optimal bidirectional heuristic search
//!
//! Engines:
//! - DBBS - dynamic bidirectional bucket search over `(g, h, h_reverse)`
//!   buckets, with a fixed-point limit computation that locates the smallest
//!   expandable bucket on each frontier
//! - TwoLevelBAE - two-queue (ready/waiting) bidirectional search gated by a
//!   B bound computed from the two ready tops
//! - a unidirectional A* reference used for validation
//!
//! Domains plug in through `SearchDomain` + `Heuristic`: octile grids,
//! the pancake puzzle (GAP-k) and the 4x4 sliding-tile puzzle (Manhattan).
//!
//! Key principle: every engine returns provably optimal costs given
//! admissible heuristics; they differ only in how many nodes they expand
//! to prove it.

pub mod bucket;
pub mod cli;
pub mod domains;
pub mod engine;
pub mod fp;
pub mod open_closed;
pub mod validate;

pub use bucket::{BestBucketList, BucketList, MinCriterion};
pub use domains::{GridEnv, GridMap, GridPos, Heuristic, Pancake, SearchDomain, SlidingTile};
pub use engine::{astar, Dbbs, DbbsConfig, FrontToEnd, TwoLevelBae};
pub use open_closed::TwoQueueOpenClosed;
