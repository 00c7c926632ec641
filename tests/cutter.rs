use flowcut::config::Config;
use flowcut::cutter::{BasicCutter, PierceNodeScore, PierceScore, Terminals, SOURCE_SIDE};
use flowcut::graph::FlowGraph;
use flowcut::search::{ScratchSpace, SearchAlgorithm};
use flowcut::testing::{cycle_graph, grid_graph, path_graph, reference_max_flow};

fn avoid_augmenting(_: u32, _: usize, causes: bool, _: i32) -> PierceScore {
    (!causes, 0, 0)
}

/// Drives a single cutter to exhaustion and returns the emitted cut
/// sequence as `(flow_intensity, smaller_side_size)` pairs.
fn run_cutter(
    graph: &flowcut::AdjacencyArray,
    source: u32,
    target: u32,
    search: SearchAlgorithm,
) -> Vec<(u32, u32)> {
    let mut cutter = BasicCutter::new(graph, Config::default());
    let mut scratch = ScratchSpace::new(graph.node_count());
    cutter
        .init(
            graph,
            Vec::new(),
            Terminals {
                source: Some(source),
                target: Some(target),
            },
        )
        .unwrap();

    let mut cuts = Vec::new();
    while cutter.advance(graph, &mut scratch, search, &avoid_augmenting) {
        if cutter.cut_available() {
            let pair = (cutter.flow_intensity(), cutter.current_smaller_cut_side_size());
            if cuts.last() != Some(&pair) {
                cuts.push(pair);
            }
        }
    }
    cuts
}

#[test]
fn first_cut_on_a_path_is_the_min_cut() {
    let g = path_graph(5);
    let cuts = run_cutter(&g, 0, 4, SearchAlgorithm::PseudoDepthFirst);
    assert!(!cuts.is_empty());
    assert_eq!(cuts[0].0, 1);
    assert_eq!(cuts[0].0, reference_max_flow(&g, &[0], &[4]));
}

#[test]
fn cycle_cuts_grow_from_one_to_two() {
    let g = cycle_graph(8);
    let cuts = run_cutter(&g, 0, 4, SearchAlgorithm::PseudoDepthFirst);
    assert_eq!(cuts[0].0, 2);
    assert_eq!(reference_max_flow(&g, &[0], &[4]), 2);
}

#[test]
fn flow_intensity_is_monotone_and_small_side_strictly_grows() {
    let (g, _) = grid_graph(4, 4);
    let cuts = run_cutter(&g, 0, 15, SearchAlgorithm::PseudoDepthFirst);
    assert!(!cuts.is_empty());
    for w in cuts.windows(2) {
        assert!(w[1].0 >= w[0].0, "flow must not decrease: {cuts:?}");
    }
    // Balance improves across emitted cuts of one instance.
    for w in cuts.windows(2) {
        if w[1].0 == w[0].0 {
            assert!(w[1].1 > w[0].1, "same flow needs better balance: {cuts:?}");
        }
    }
}

#[test]
fn both_search_algorithms_find_the_same_min_cut() {
    let (g, _) = grid_graph(4, 4);
    let dfs = run_cutter(&g, 0, 15, SearchAlgorithm::PseudoDepthFirst);
    let bfs = run_cutter(&g, 0, 15, SearchAlgorithm::BreadthFirst);
    assert_eq!(dfs[0].0, bfs[0].0);
}

#[test]
fn swapping_terminals_preserves_the_min_cut_value() {
    let (g, _) = grid_graph(4, 3);
    let forward = run_cutter(&g, 0, 11, SearchAlgorithm::PseudoDepthFirst);
    let backward = run_cutter(&g, 11, 0, SearchAlgorithm::PseudoDepthFirst);
    assert_eq!(forward[0].0, backward[0].0);
}

#[test]
fn same_seed_reproduces_the_cut_sequence() {
    let (g, _) = grid_graph(5, 5);
    let first = run_cutter(&g, 0, 24, SearchAlgorithm::PseudoDepthFirst);
    let second = run_cutter(&g, 0, 24, SearchAlgorithm::PseudoDepthFirst);
    assert_eq!(first, second);
}

#[test]
fn cutter_rejects_bad_terminals() {
    let g = path_graph(4);
    let mut cutter = BasicCutter::new(&g, Config::default());
    assert!(cutter
        .init(
            &g,
            Vec::new(),
            Terminals {
                source: Some(0),
                target: Some(0),
            },
        )
        .is_err());
    assert!(cutter
        .init(
            &g,
            Vec::new(),
            Terminals {
                source: Some(0),
                target: Some(9),
            },
        )
        .is_err());
    assert!(cutter
        .init(
            &g,
            Vec::new(),
            Terminals {
                source: None,
                target: Some(1),
            },
        )
        .is_err());
}

#[test]
fn disconnected_terminals_stall_at_zero_flow() {
    let mut b = flowcut::GraphBuilder::new(4);
    b.add_arc(0, 1, 1);
    b.add_arc(2, 3, 1);
    b.symmetrize();
    let g = b.build().unwrap();
    let cuts = run_cutter(&g, 0, 3, SearchAlgorithm::PseudoDepthFirst);
    assert!(cuts.iter().all(|&(flow, _)| flow == 0));
}

#[test]
fn pierce_scores_order_lexicographically() {
    let config = Config::default();
    let score = PierceNodeScore::new(config);
    // Avoiding an augmenting path dominates any primary rating.
    let avoiding = score.score(1, SOURCE_SIDE, false, 1, 10, 0);
    let augmenting = score.score(2, SOURCE_SIDE, true, 1, 0, 100);
    assert!(avoiding > augmenting);
}

#[test]
fn circular_rating_reads_the_piercing_side() {
    let mut config = Config::default();
    config
        .set("pierce_rating", "circular_hop")
        .unwrap();
    let score = PierceNodeScore::new(config);
    // Source side minimizes own distance, target side maximizes the other
    // terminal's distance.
    let near_source = score.score(1, SOURCE_SIDE, false, 1, 2, 50);
    let far_source = score.score(2, SOURCE_SIDE, false, 1, 9, 50);
    assert!(near_source > far_source);
    let near_target = score.score(1, 1, false, 1, 2, 50);
    let far_target = score.score(2, 1, false, 1, 2, 80);
    assert!(far_target > near_target);
}

#[test]
fn random_rating_is_deterministic_per_seed() {
    let mut config = Config::default();
    config.set("pierce_rating", "random").unwrap();
    config.set("random_seed", "7").unwrap();
    let a = PierceNodeScore::new(config.clone());
    let b = PierceNodeScore::new(config);
    for node in 0..50u32 {
        assert_eq!(
            a.score(node, SOURCE_SIDE, false, 1, 0, 0),
            b.score(node, SOURCE_SIDE, false, 1, 0, 0)
        );
    }
}

#[test]
fn state_dump_reflects_the_terminals() {
    let g = path_graph(4);
    let mut cutter = BasicCutter::new(&g, Config::default());
    let mut scratch = ScratchSpace::new(g.node_count());
    cutter
        .init(
            &g,
            Vec::new(),
            Terminals {
                source: Some(0),
                target: Some(3),
            },
        )
        .unwrap();
    cutter.advance(&g, &mut scratch, SearchAlgorithm::PseudoDepthFirst, &avoid_augmenting);
    let dump = cutter.dump_state(&g);
    assert!(dump.source_assimilated.get(0));
    assert!(dump.target_assimilated.get(3));
    assert!(!dump.source_assimilated.get(3));
}
