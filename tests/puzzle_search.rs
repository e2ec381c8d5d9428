use bisearch::domains::{korf_instance, Pancake, PancakeState, SlidingTile, StpState};
use bisearch::engine::{astar, Dbbs, DbbsConfig, TwoLevelBae};
use bisearch::fp::fequal;
use bisearch::validate::ZeroHeuristic;

fn puzzle_dbbs<S: Clone + Eq + std::hash::Hash + std::fmt::Debug>(alternating: bool) -> Dbbs<S> {
    Dbbs::new(DbbsConfig {
        alternating,
        epsilon: 1.0,
        gcd: 1.0,
        ..Default::default()
    })
}

#[test]
fn test_pancake_single_flip() {
    let env = Pancake::new(4, 0);
    let start = PancakeState::new(vec![4, 3, 2, 1]);
    let goal = PancakeState::sorted(4);

    let mut dbbs = puzzle_dbbs(true);
    let path = dbbs.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(dbbs.solution_cost(), 1.0));
    assert_eq!(path.len(), 2);

    let mut tlbae = TwoLevelBae::new(1.0);
    tlbae.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(tlbae.solution_cost(), 1.0));
}

#[test]
fn test_pancake_matches_brute_force() {
    let env = Pancake::new(4, 0);
    let start = PancakeState::new(vec![3, 1, 4, 2]);
    let goal = PancakeState::sorted(4);

    // uniform-cost search as ground truth
    let brute = astar(&env, &start, &goal, &ZeroHeuristic);
    let optimal = brute.cost;
    assert!(fequal(optimal, 4.0));

    let mut dbbs = puzzle_dbbs(true);
    dbbs.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(dbbs.solution_cost(), optimal));

    let mut tlbae = TwoLevelBae::new(1.0);
    tlbae.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(tlbae.solution_cost(), optimal));
}

#[test]
fn test_pancake_five_scrambles_agree() {
    let env = Pancake::new(5, 0);
    let goal = PancakeState::sorted(5);
    for id in 0..6 {
        let start = env.instance(id);
        if start == goal {
            continue;
        }

        let brute = astar(&env, &start, &goal, &ZeroHeuristic);

        let mut dbbs = puzzle_dbbs(true);
        dbbs.get_path(&env, &start, &goal, &env, &env).unwrap();
        assert!(
            fequal(dbbs.solution_cost(), brute.cost),
            "instance {id}: dbbs {} vs brute force {}",
            dbbs.solution_cost(),
            brute.cost
        );

        let mut tlbae = TwoLevelBae::new(1.0);
        tlbae.get_path(&env, &start, &goal, &env, &env).unwrap();
        assert!(
            fequal(tlbae.solution_cost(), brute.cost),
            "instance {id}: tlbae {} vs brute force {}",
            tlbae.solution_cost(),
            brute.cost
        );
    }
}

#[test]
fn test_pancake_swapped_endpoints() {
    let env = Pancake::new(6, 0);
    let goal = PancakeState::sorted(6);
    let start = env.instance(11);

    let mut forward = puzzle_dbbs(true);
    forward.get_path(&env, &start, &goal, &env, &env).unwrap();
    let mut backward = puzzle_dbbs(true);
    backward.get_path(&env, &goal, &start, &env, &env).unwrap();
    assert!(fequal(forward.solution_cost(), backward.solution_cost()));
}

#[test]
fn test_stp_short_scramble() {
    let env = SlidingTile::new();
    let goal = StpState::goal();

    // walk the blank right/down/left/up a few times; optimal is at most the
    // walk length, brute force supplies the exact value
    use bisearch::domains::SearchDomain;
    let mut succ = Vec::new();
    let mut start = goal;
    for step in [1, 2, 1, 0, 3, 1, 2, 2, 0, 1] {
        env.successors(&start, &mut succ);
        start = succ[step % succ.len()];
    }
    if start == goal {
        return;
    }

    let brute = astar(&env, &start, &goal, &ZeroHeuristic);

    let mut dbbs = puzzle_dbbs(true);
    dbbs.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(dbbs.solution_cost(), brute.cost));

    let mut tlbae = TwoLevelBae::new(1.0);
    tlbae.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(tlbae.solution_cost(), brute.cost));
}

#[test]
#[ignore = "minutes of search; the classical reference value for the first benchmark instance"]
fn test_stp_first_benchmark_instance() {
    let env = SlidingTile::new();
    let start = korf_instance(1).unwrap();
    let goal = StpState::goal();

    let mut dbbs = puzzle_dbbs(true);
    dbbs.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(dbbs.solution_cost(), 57.0));
}
