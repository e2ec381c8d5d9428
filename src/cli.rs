//! CLI driver for the search engines
//!
//! Selects a domain, expands instance ranges, runs the requested algorithms
//! on each instance and prints one `[R]` line per run for downstream
//! tabulation.

use std::fmt::Debug;
use std::hash::Hash;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};

use crate::domains::{
    korf_instance, path_cost, GridEnv, GridMap, Heuristic, Pancake, Scenario, SearchDomain,
    SlidingTile, StpState,
};
use crate::engine::{astar, Dbbs, DbbsConfig, TwoLevelBae};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DomainKind {
    Grid,
    Pancake,
    Stp,
}

#[derive(Parser)]
#[command(name = "bisearch")]
#[command(about = "Optimal bidirectional heuristic search benchmarks", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    #[arg(long, action = ArgAction::Help, help = "Show this help message and exit")]
    help: Option<bool>,

    /// Search domain
    #[arg(short = 'd', long, value_enum, ignore_case = true)]
    pub domain: DomainKind,

    /// Domain-specific heuristic selector (e.g. the GAP number for pancake)
    #[arg(short = 'h', long, default_value = "0")]
    pub heuristic: String,

    /// Grid map file
    #[arg(short = 'm', long)]
    pub map: Option<PathBuf>,

    /// Grid scenario file
    #[arg(short = 's', long)]
    pub scenario: Option<PathBuf>,

    /// Instances: single numbers or half-open ranges a-b (b exclusive)
    #[arg(short = 'i', long, num_args = 1.., required = true, value_name = "ID|A-B")]
    pub instances: Vec<String>,

    /// Algorithms to run (e.g. dbbs-a dbbs-p tlbae astar)
    #[arg(short = 'a', long, num_args = 1.., required = true, value_name = "NAME")]
    pub algorithms: Vec<String>,
}

/// Expand instance tokens into a flat id list.
pub fn parse_instances(tokens: &[String]) -> Result<Vec<usize>> {
    let mut instances = Vec::new();
    for token in tokens {
        match token.split_once('-') {
            None => {
                let id: usize = token
                    .parse()
                    .with_context(|| format!("invalid instance: {token}"))?;
                instances.push(id);
            }
            Some((start, end)) => {
                let start: usize = start
                    .parse()
                    .with_context(|| format!("invalid range: {token}"))?;
                let end: usize = end
                    .parse()
                    .with_context(|| format!("invalid range: {token}"))?;
                if start >= end {
                    bail!("invalid range: {token} (start must be below end)");
                }
                instances.extend(start..end);
            }
        }
    }
    Ok(instances)
}

/// Extract the GAP number from a heuristic selector like `2` or `gap-2`.
fn parse_gap(selector: &str) -> Result<usize> {
    if let Ok(gap) = selector.parse() {
        return Ok(gap);
    }
    selector
        .rsplit('-')
        .next()
        .and_then(|tail| tail.parse().ok())
        .with_context(|| format!("invalid heuristic selector: {selector}"))
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let instances = parse_instances(&self.instances)?;
        match self.domain {
            DomainKind::Grid => self.run_grid(&instances),
            DomainKind::Pancake => self.run_pancake(&instances),
            DomainKind::Stp => self.run_stp(&instances),
        }
    }

    fn has_algorithm(&self, name: &str) -> bool {
        self.algorithms.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    fn run_grid(&self, instances: &[usize]) -> Result<()> {
        let map_path = self.map.as_ref().context("grid domain requires --map")?;
        let scen_path = self
            .scenario
            .as_ref()
            .context("grid domain requires --scenario")?;

        let map = GridMap::load(map_path)
            .with_context(|| format!("loading map {}", map_path.display()))?;
        let scenario = Scenario::load(scen_path)
            .with_context(|| format!("loading scenario {}", scen_path.display()))?;
        let env = GridEnv::new(map, 1.5);

        let map_name = map_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("[D] domain: grid; map: {map_name}");

        for &i in instances {
            let Some(entry) = scenario.get(i) else {
                continue;
            };
            if entry.optimal == 0.0 {
                continue;
            }
            println!(
                "[I] id: {i}; start: ({}, {}); goal: ({}, {})",
                entry.start.x, entry.start.y, entry.goal.x, entry.goal.y
            );
            self.run_instance(&env, &entry.start, &entry.goal, &env, &env, 1.0, 0.5, 1);
        }
        Ok(())
    }

    fn run_pancake(&self, instances: &[usize]) -> Result<()> {
        const N: usize = 16;
        let gap = parse_gap(&self.heuristic)?;
        println!("[D] domain: pancake; heuristic: GAP-{gap}");

        let env = Pancake::new(N, gap);
        let goal = crate::domains::PancakeState::sorted(N);
        for &i in instances {
            let start = env.instance(i);
            println!("[I] id: {i}; instance: {:?}", start.stack());
            self.run_instance(&env, &start, &goal, &env, &env, 1.0, 1.0, 0);
        }
        Ok(())
    }

    fn run_stp(&self, instances: &[usize]) -> Result<()> {
        println!("[D] domain: stp; heuristic: MD");

        let env = SlidingTile::new();
        let goal = StpState::goal();
        for &i in instances {
            let start = korf_instance(i).with_context(|| format!("instance {i}"))?;
            println!("[I] id: {i}; instance: {:?}", start.tiles());
            self.run_instance(&env, &start, &goal, &env, &env, 1.0, 1.0, 0);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_instance<D>(
        &self,
        env: &D,
        from: &D::State,
        to: &D::State,
        forward_h: &dyn Heuristic<D::State>,
        backward_h: &dyn Heuristic<D::State>,
        epsilon: f64,
        gcd: f64,
        decimals: usize,
    ) where
        D: SearchDomain,
        D::State: Clone + Eq + Hash + Debug,
    {
        if self.has_algorithm("dbbs-a") {
            self.run_dbbs(env, from, to, forward_h, backward_h, epsilon, gcd, true, decimals);
        }
        if self.has_algorithm("dbbs-p") {
            self.run_dbbs(env, from, to, forward_h, backward_h, epsilon, gcd, false, decimals);
        }

        if self.has_algorithm("tlbae") {
            let mut engine = TwoLevelBae::new(gcd);
            let timer = Instant::now();
            let path = engine.get_path(env, from, to, forward_h, backward_h);
            let elapsed = timer.elapsed().as_secs_f64();
            let cost = path.map(|_| engine.solution_cost()).unwrap_or(f64::INFINITY);
            let f_above = engine.expanded_above(forward_h, backward_h, cost);
            report(
                "tlbae",
                cost,
                decimals,
                engine.nodes_expanded(),
                f_above,
                elapsed,
            );
        }

        if self.has_algorithm("astar") {
            let timer = Instant::now();
            let result = astar(env, from, to, forward_h);
            let elapsed = timer.elapsed().as_secs_f64();
            let cost = if result.path.is_some() {
                result.cost
            } else {
                f64::INFINITY
            };
            report(
                "astar",
                cost,
                decimals,
                result.nodes_expanded,
                result.f_above,
                elapsed,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_dbbs<D>(
        &self,
        env: &D,
        from: &D::State,
        to: &D::State,
        forward_h: &dyn Heuristic<D::State>,
        backward_h: &dyn Heuristic<D::State>,
        epsilon: f64,
        gcd: f64,
        alternating: bool,
        decimals: usize,
    ) where
        D: SearchDomain,
        D::State: Clone + Eq + Hash + Debug,
    {
        let mut engine = Dbbs::new(DbbsConfig {
            alternating,
            epsilon,
            gcd,
            ..Default::default()
        });
        let timer = Instant::now();
        let path = engine.get_path(env, from, to, forward_h, backward_h);
        let elapsed = timer.elapsed().as_secs_f64();
        let cost = path
            .map(|p| path_cost(env, &p))
            .unwrap_or(f64::INFINITY);
        let name = if alternating { "dbbs-a" } else { "dbbs-p" };
        report(name, cost, decimals, engine.nodes_expanded(), 0, elapsed);
    }
}

fn report(alg: &str, cost: f64, decimals: usize, expanded: u64, f_above: usize, seconds: f64) {
    println!(
        "[R] alg: {alg}; solution: {cost:.decimals$}; expanded: {expanded}; fabove: {f_above}; time: {seconds:.6}s"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_single_instances() {
        assert_eq!(parse_instances(&tokens(&["3", "7"])).unwrap(), vec![3, 7]);
    }

    #[test]
    fn test_parse_ranges_are_half_open() {
        assert_eq!(
            parse_instances(&tokens(&["2-5", "9"])).unwrap(),
            vec![2, 3, 4, 9]
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_instances(&tokens(&["abc"])).is_err());
        assert!(parse_instances(&tokens(&["5-5"])).is_err());
        assert!(parse_instances(&tokens(&["7-3"])).is_err());
        assert!(parse_instances(&tokens(&["3-x"])).is_err());
    }

    #[test]
    fn test_parse_gap_selector() {
        assert_eq!(parse_gap("0").unwrap(), 0);
        assert_eq!(parse_gap("gap-2").unwrap(), 2);
        assert!(parse_gap("md").is_err());
    }
}
