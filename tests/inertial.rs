use flowcut::inertial::{compute_inertial_flow_cut, compute_inertial_flow_separator};
use flowcut::separator::largest_component_size;
use flowcut::testing::{grid_graph, random_geometric_graph};
use flowcut::FlowGraph;

#[test]
fn grid_cut_is_small_and_balanced() {
    let (g, geo) = grid_graph(4, 4);
    let cut = compute_inertial_flow_cut(&g, &geo, 0.25, true).unwrap();
    assert!(cut.cut_size <= 4, "expected a column-like cut, got {}", cut.cut_size);
    assert!(cut.smaller_side_size >= 4);
    assert!(cut.smaller_side_size <= 8);

    // The flag set really is the cut: crossing arcs match the cut size.
    let crossing = (0..g.arc_count())
        .filter(|&a| {
            cut.is_on_smaller_side.get(flowcut::graph::FlowGraph::tail(&g, a))
                && !cut.is_on_smaller_side.get(flowcut::graph::FlowGraph::head(&g, a))
        })
        .count() as u32;
    assert_eq!(crossing, cut.cut_size);
}

#[test]
fn dinic_and_ford_fulkerson_agree_on_the_cut_size() {
    let (g, geo) = grid_graph(5, 4);
    let dinic = compute_inertial_flow_cut(&g, &geo, 0.3, true).unwrap();
    let ford = compute_inertial_flow_cut(&g, &geo, 0.3, false).unwrap();
    assert_eq!(dinic.cut_size, ford.cut_size);
    assert_eq!(dinic.smaller_side_size, ford.smaller_side_size);
}

#[test]
fn separator_disconnects_the_graph() {
    let (g, geo) = grid_graph(6, 6);
    let separator = compute_inertial_flow_separator(&g, &geo, 0.25, true).unwrap();
    assert!(!separator.is_empty());
    let largest = largest_component_size(&g, &separator);
    assert!(
        largest < g.node_count() - separator.len() as u32,
        "separator {separator:?} leaves the graph connected"
    );
}

#[test]
fn separator_of_a_single_node_is_that_node() {
    let g = flowcut::GraphBuilder::new(1).build().unwrap();
    let separator = compute_inertial_flow_separator(&g, &[flowcut::GeoPos::default()], 0.3, true).unwrap();
    assert_eq!(separator, vec![0]);
}

#[test]
fn geometric_graph_cut_is_valid_on_both_engines() {
    let (g, geo) = random_geometric_graph(200, 0.12, 42);
    let dinic = compute_inertial_flow_cut(&g, &geo, 0.3, true).unwrap();
    let ford = compute_inertial_flow_cut(&g, &geo, 0.3, false).unwrap();
    assert_eq!(dinic.cut_size, ford.cut_size);
    assert!(dinic.smaller_side_size >= (0.3 * 200.0) as u32);
}

#[test]
fn invalid_balance_is_rejected() {
    let (g, geo) = grid_graph(3, 3);
    assert!(compute_inertial_flow_cut(&g, &geo, 0.7, true).is_err());
    assert!(compute_inertial_flow_cut(&g, &geo[..4], 0.3, true).is_err());
}
