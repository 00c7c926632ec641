use std::sync::Mutex;

use flowcut::config::Config;
use flowcut::multi_cutter::{CutterFactory, SimpleCutter};
use flowcut::testing::{grid_graph, path_graph};
use flowcut::FlowGraph;

fn collect_ordered_cuts(config: Config) -> Vec<(u32, u32)> {
    let (g, geo) = grid_graph(6, 6);
    let factory = CutterFactory::new(config.clone());
    let terminals = factory.select_terminals(g.node_count(), Some(&geo), config.random_seed);
    let mut cutter = SimpleCutter::new(&g, config);
    cutter.init(terminals).unwrap();

    let cuts = Mutex::new(Vec::new());
    cutter.enum_cuts(
        &|_| true,
        &|c, _| {
            cuts.lock()
                .unwrap()
                .push((c.flow_intensity(), c.current_smaller_cut_side_size()));
        },
        true,
    );
    cuts.into_inner().unwrap()
}

#[test]
fn ordered_mode_emits_dominating_cuts() {
    let config = Config {
        thread_count: 1,
        ..Config::default()
    };
    let cuts = collect_ordered_cuts(config);
    assert!(!cuts.is_empty());
    for w in cuts.windows(2) {
        assert!(w[1].0 >= w[0].0, "flow must not decrease: {cuts:?}");
        assert!(
            w[1].1 > w[0].1,
            "every emitted cut must improve the balance: {cuts:?}"
        );
    }
}

#[test]
fn ordered_mode_is_thread_count_invariant() {
    let single = collect_ordered_cuts(Config {
        thread_count: 1,
        ..Config::default()
    });
    let multi = collect_ordered_cuts(Config {
        thread_count: 8,
        ..Config::default()
    });
    assert_eq!(single, multi);
}

#[test]
fn factory_produces_geo_orders_and_random_pairs() {
    let config = Config::default();
    let factory = CutterFactory::new(config.clone());
    let (g, geo) = grid_graph(5, 5);
    let terminals = factory.select_terminals(g.node_count(), Some(&geo), 0);
    assert_eq!(
        terminals.len(),
        config.geo_pos_ordering_cutter_count + config.distance_ordering_cutter_count
    );
    for (i, t) in terminals.iter().enumerate() {
        assert_eq!(t.cutter_id, i);
    }
    let geo_orders = &terminals[..config.geo_pos_ordering_cutter_count];
    for t in geo_orders {
        assert_eq!(t.node_order.len(), 25);
        assert!(t.terminals.source.is_none() && t.terminals.target.is_none());
        assert!(!t.build_order_from_distance);
    }
    for t in &terminals[config.geo_pos_ordering_cutter_count..] {
        assert!(t.node_order.is_empty());
        assert!(t.build_order_from_distance);
        assert_ne!(t.terminals.source, t.terminals.target);
    }
}

#[test]
fn factory_without_positions_falls_back_to_random_pairs() {
    let config = Config::default();
    let factory = CutterFactory::new(config.clone());
    let terminals = factory.select_terminals(100, None, 0);
    assert_eq!(terminals.len(), config.cutter_count);
    for t in &terminals {
        assert!(t.node_order.is_empty());
        assert!(t.terminals.source.is_some() && t.terminals.target.is_some());
    }
}

#[test]
fn pinned_terminals_run_in_every_instance() {
    let mut config = Config::default();
    config.set("source", "3").unwrap();
    config.set("target", "7").unwrap();
    let factory = CutterFactory::new(config.clone());
    let terminals = factory.select_terminals(12, None, 0);
    assert_eq!(terminals.len(), config.cutter_count);
    for t in &terminals {
        assert_eq!(t.terminals.source, Some(3));
        assert_eq!(t.terminals.target, Some(7));
    }
}

#[test]
fn pinned_source_keeps_pairs_distinct() {
    let mut config = Config::default();
    config.set("source", "0").unwrap();
    let factory = CutterFactory::new(config.clone());
    let terminals = factory.select_terminals(4, None, 0);
    for t in &terminals {
        assert_eq!(t.terminals.source, Some(0));
        assert_ne!(t.terminals.target, Some(0));
    }
}

#[test]
fn geo_order_sorts_both_bulk_ends() {
    let config = Config::default();
    let factory = CutterFactory::new(config.clone());
    let n = 100u32;
    let order = factory.build_geo_order(n, |x| x as f64);
    let max_bulk = (config.bulk_assimilation_order_threshold * n as f64) as usize;
    for w in order[..=max_bulk].windows(2) {
        assert!(w[0] < w[1]);
    }
    for w in order[n as usize - max_bulk - 1..].windows(2) {
        assert!(w[0] < w[1]);
    }
    assert_eq!(order[0], 0);
    assert_eq!(order[n as usize - 1], n - 1);
}

#[test]
fn state_dump_requires_a_single_instance() {
    let g = path_graph(6);
    let mut config = Config::default();
    config.set("cutter_count", "2").unwrap();
    let factory = CutterFactory::new(config.clone());
    let terminals = factory.select_terminals(g.node_count(), None, 0);
    let mut cutter = SimpleCutter::new(&g, config);
    cutter.init(terminals[..2].to_vec()).unwrap();
    assert!(cutter.dump_state().is_err());
}
