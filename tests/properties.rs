//! Property sweeps: the incremental cutter against a reference max flow,
//! and the inertial baseline against the ensemble on geometric graphs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use flowcut::config::Config;
use flowcut::cutter::{BasicCutter, PierceScore, Terminals};
use flowcut::expanded::{in_node, out_node, ExpandedGraph};
use flowcut::graph::FlowGraph;
use flowcut::inertial::compute_inertial_flow_cut;
use flowcut::search::{ScratchSpace, SearchAlgorithm};
use flowcut::separator::compute_cut;
use flowcut::testing::{
    edge_pair_count, edge_subset_graph, random_geometric_graph, reference_max_flow,
};

fn avoid_augmenting(_: u32, _: usize, causes: bool, _: i32) -> PierceScore {
    (!causes, 0, 0)
}

/// Flow intensity at the first reported cut: the plain maximum flow between
/// the two terminals before any piercing.
fn first_cut_intensity<G: FlowGraph>(graph: &G, source: u32, target: u32) -> u32 {
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
    while cutter.advance(
        graph,
        &mut scratch,
        SearchAlgorithm::PseudoDepthFirst,
        &avoid_augmenting,
    ) {
        if cutter.cut_available() {
            return cutter.flow_intensity();
        }
    }
    cutter.flow_intensity()
}

#[test]
fn exhaustive_small_graphs_match_the_reference_flow() {
    for n in 2..=5u32 {
        let masks = 1u64 << edge_pair_count(n);
        for mask in 0..masks {
            let g = edge_subset_graph(n, mask);
            let source = 0;
            let target = n - 1;
            let expected = reference_max_flow(&g, &[source], &[target]);
            let got = first_cut_intensity(&g, source, target);
            assert_eq!(got, expected, "n={n} mask={mask:#b}");
        }
    }
}

#[test]
fn random_graphs_match_the_reference_flow_on_the_expanded_graph() {
    let mut rng = StdRng::seed_from_u64(0);
    for _ in 0..200 {
        let n = rng.gen_range(4..=8u32);
        let mask = rng.r#gen::<u64>() & ((1u64 << edge_pair_count(n)) - 1);
        let g = edge_subset_graph(n, mask);
        let source = 0;
        let target = n - 1;

        // Skip directly adjacent terminals: no vertex separator exists and
        // the flow is only bounded by the expanded arc capacities.
        let adjacent = g.out_arcs(source).any(|a| g.head(a) == target);
        if adjacent {
            continue;
        }

        let e = ExpandedGraph::new(&g);
        let expected = reference_max_flow(&e, &[out_node(source)], &[in_node(target)]);
        let got = first_cut_intensity(&e, out_node(source), in_node(target));
        assert_eq!(got, expected, "n={n} mask={mask:#b}");
    }
}

#[test]
fn both_search_modes_agree_with_the_reference() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..100 {
        let n = rng.gen_range(3..=7u32);
        let mask = rng.r#gen::<u64>() & ((1u64 << edge_pair_count(n)) - 1);
        let g = edge_subset_graph(n, mask);
        let expected = reference_max_flow(&g, &[0], &[n - 1]);

        for search in [SearchAlgorithm::PseudoDepthFirst, SearchAlgorithm::BreadthFirst] {
            let mut cutter = BasicCutter::new(&g, Config::default());
            let mut scratch = ScratchSpace::new(g.node_count());
            cutter
                .init(
                    &g,
                    Vec::new(),
                    Terminals {
                        source: Some(0),
                        target: Some(n - 1),
                    },
                )
                .unwrap();
            let mut first = None;
            while cutter.advance(&g, &mut scratch, search, &avoid_augmenting) {
                if cutter.cut_available() && first.is_none() {
                    first = Some(cutter.flow_intensity());
                }
            }
            assert_eq!(first.unwrap_or(cutter.flow_intensity()), expected);
        }
    }
}

#[test]
fn inertial_cut_tracks_the_ensemble_within_a_factor_of_two() {
    let (g, geo) = random_geometric_graph(200, 0.12, 7);
    let inertial = compute_inertial_flow_cut(&g, &geo, 0.25, true).unwrap();

    let config = Config {
        max_imbalance: 0.25,
        thread_count: 1,
        ..Config::default()
    };
    let ensemble_cut = compute_cut(&g, Some(&geo), &config).unwrap();
    // The ordered arc list holds each cut arc and its reverse.
    let ensemble_size = (ensemble_cut.len() / 2).max(1) as u32;

    assert!(inertial.cut_size >= 1);
    assert!(
        inertial.cut_size <= 2 * ensemble_size,
        "inertial {} vs ensemble {}",
        inertial.cut_size,
        ensemble_size
    );
}
