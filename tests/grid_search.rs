use bisearch::domains::{path_cost, GridEnv, GridMap, GridPos};
use bisearch::engine::{Dbbs, DbbsConfig, Side, TwoLevelBae};
use bisearch::fp::{fequal, flesseq, fgreater};

fn open3x3() -> GridEnv {
    GridEnv::new(GridMap::from_rows(&["...", "...", "..."]), 1.5)
}

fn grid_dbbs(alternating: bool) -> Dbbs<GridPos> {
    Dbbs::new(DbbsConfig {
        alternating,
        epsilon: 1.0,
        gcd: 0.5,
        ..Default::default()
    })
}

#[test]
fn test_open_3x3_diagonal_route() {
    let env = open3x3();
    let start = GridPos::new(0, 0);
    let goal = GridPos::new(2, 2);

    let mut dbbs = grid_dbbs(true);
    let path = dbbs.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(dbbs.solution_cost(), 3.0));
    assert!(fequal(path_cost(&env, &path), 3.0));
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&goal));
    assert!(
        (2..=5).contains(&dbbs.nodes_expanded()),
        "dbbs expanded {}",
        dbbs.nodes_expanded()
    );

    let mut tlbae = TwoLevelBae::new(0.5);
    let path = tlbae.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(tlbae.solution_cost(), 3.0));
    assert!(fequal(path_cost(&env, &path), 3.0));
    assert!(
        (2..=5).contains(&tlbae.nodes_expanded()),
        "tlbae expanded {}",
        tlbae.nodes_expanded()
    );
}

#[test]
fn test_start_equals_goal() {
    let env = open3x3();
    let here = GridPos::new(1, 1);

    let mut dbbs = grid_dbbs(true);
    let path = dbbs.get_path(&env, &here, &here, &env, &env).unwrap();
    assert_eq!(path, vec![here]);
    assert_eq!(dbbs.solution_cost(), 0.0);
    assert_eq!(dbbs.nodes_expanded(), 0);

    let mut tlbae = TwoLevelBae::new(0.5);
    let path = tlbae.get_path(&env, &here, &here, &env, &env).unwrap();
    assert_eq!(path, vec![here]);
    assert_eq!(tlbae.solution_cost(), 0.0);
    assert_eq!(tlbae.nodes_expanded(), 0);
}

#[test]
fn test_disconnected_instance_returns_no_path() {
    let env = GridEnv::new(GridMap::from_rows(&[".@.", ".@.", ".@."]), 1.5);
    let start = GridPos::new(0, 0);
    let goal = GridPos::new(2, 2);

    let mut dbbs = grid_dbbs(true);
    assert!(dbbs.get_path(&env, &start, &goal, &env, &env).is_none());

    let mut tlbae = TwoLevelBae::new(0.5);
    assert!(tlbae.get_path(&env, &start, &goal, &env, &env).is_none());
}

#[test]
fn test_walled_map_costs_match_reference() {
    let rows = [
        "........",
        ".@@@@@..",
        ".@......",
        ".@.@@@@.",
        ".@.@....",
        "...@.@@.",
        ".@@@.@..",
        "........",
    ];
    let env = GridEnv::new(GridMap::from_rows(&rows), 1.5);
    let start = GridPos::new(0, 0);
    let goal = GridPos::new(7, 7);

    let reference = bisearch::engine::astar(&env, &start, &goal, &env);
    assert!(reference.path.is_some());

    for alternating in [true, false] {
        let mut dbbs = grid_dbbs(alternating);
        let path = dbbs.get_path(&env, &start, &goal, &env, &env).unwrap();
        assert!(
            fequal(dbbs.solution_cost(), reference.cost),
            "dbbs(alternating={alternating}) found {} instead of {}",
            dbbs.solution_cost(),
            reference.cost
        );
        assert!(fequal(path_cost(&env, &path), dbbs.solution_cost()));
        // the bound never needs to pass the proven solution by more than
        // the edge-cost granularity
        assert!(flesseq(dbbs.solution_cost(), dbbs.lower_bound() + 1.0));
    }

    let mut tlbae = TwoLevelBae::new(0.5);
    let path = tlbae.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(tlbae.solution_cost(), reference.cost));
    assert!(fequal(path_cost(&env, &path), tlbae.solution_cost()));
}

#[test]
fn test_swapped_endpoints_cost_is_symmetric() {
    let rows = ["......", ".@@@..", "...@..", ".@.@..", ".@....", "......"];
    let env = GridEnv::new(GridMap::from_rows(&rows), 1.5);
    let a = GridPos::new(0, 0);
    let b = GridPos::new(5, 5);

    let mut forward = grid_dbbs(true);
    forward.get_path(&env, &a, &b, &env, &env).unwrap();
    let mut backward = grid_dbbs(true);
    backward.get_path(&env, &b, &a, &env, &env).unwrap();
    assert!(fequal(forward.solution_cost(), backward.solution_cost()));

    let mut forward = TwoLevelBae::new(0.5);
    forward.get_path(&env, &a, &b, &env, &env).unwrap();
    let mut backward = TwoLevelBae::new(0.5);
    backward.get_path(&env, &b, &a, &env, &env).unwrap();
    assert!(fequal(forward.solution_cost(), backward.solution_cost()));
}

#[test]
fn test_rerun_is_deterministic() {
    let rows = ["......", "..@@..", "..@@..", "......"];
    let env = GridEnv::new(GridMap::from_rows(&rows), 1.5);
    let start = GridPos::new(0, 3);
    let goal = GridPos::new(5, 0);

    let mut dbbs = grid_dbbs(false);
    dbbs.get_path(&env, &start, &goal, &env, &env).unwrap();
    let first_cost = dbbs.solution_cost();
    let first_expanded = dbbs.nodes_expanded();

    dbbs.get_path(&env, &start, &goal, &env, &env).unwrap();
    assert!(fequal(dbbs.solution_cost(), first_cost));
    assert_eq!(dbbs.nodes_expanded(), first_expanded);
}

#[test]
fn test_fabove_counter_matches_closed_probe() {
    let rows = [
        ".........",
        ".@@@@@@@.",
        ".........",
        ".@@@@@@@@",
        ".........",
    ];
    let env = GridEnv::new(GridMap::from_rows(&rows), 1.5);
    let start = GridPos::new(0, 0);
    let goal = GridPos::new(8, 4);

    let mut tlbae = TwoLevelBae::new(0.5);
    tlbae.get_path(&env, &start, &goal, &env, &env).unwrap();
    let cost = tlbae.solution_cost();

    use bisearch::domains::Heuristic;
    let mut probe = 0usize;
    for (state, g) in tlbae.closed_entries(Side::Forward) {
        if fgreater(g + env.h_cost(state, &goal), cost) {
            probe += 1;
        }
    }
    for (state, g) in tlbae.closed_entries(Side::Backward) {
        if fgreater(g + env.h_cost(state, &start), cost) {
            probe += 1;
        }
    }
    assert_eq!(probe, tlbae.expanded_above(&env, &env, cost));
}
