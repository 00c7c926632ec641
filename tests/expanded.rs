use flowcut::expanded::{
    expanded_node_count, in_node, original_node, out_node, ExpandedGraph,
};
use flowcut::graph::FlowGraph;
use flowcut::testing::{cycle_graph, grid_graph, path_graph, reference_max_flow};

#[test]
fn expansion_doubles_the_nodes_and_pairs_all_arcs() {
    let (g, _) = grid_graph(3, 3);
    let e = ExpandedGraph::new(&g);
    assert_eq!(e.node_count(), expanded_node_count(g.node_count()));
    assert_eq!(e.arc_count(), 2 * g.node_count() + 2 * g.arc_count());
    for a in 0..e.arc_count() {
        assert_eq!(e.back_arc(e.back_arc(a)), a);
        assert_eq!(e.tail(e.back_arc(a)), e.head(a));
    }
    for v in 0..g.node_count() {
        assert_eq!(original_node(in_node(v)), v);
        assert_eq!(original_node(out_node(v)), v);
    }
}

#[test]
fn expanded_max_flow_is_the_vertex_connectivity() {
    // Interior-to-interior flow in a 4-cycle passes two node-disjoint paths.
    let g = cycle_graph(4);
    let e = ExpandedGraph::new(&g);
    assert_eq!(reference_max_flow(&e, &[out_node(0)], &[in_node(2)]), 2);

    // A path has a single node-disjoint route.
    let p = path_graph(6);
    let ep = ExpandedGraph::new(&p);
    assert_eq!(reference_max_flow(&ep, &[out_node(0)], &[in_node(5)]), 1);
}

#[test]
fn expanded_flow_on_a_grid_matches_the_side_size() {
    // Corner to corner in a grid: vertex connectivity equals the smaller
    // dimension.
    let (g, _) = grid_graph(4, 3);
    let e = ExpandedGraph::new(&g);
    assert_eq!(reference_max_flow(&e, &[out_node(0)], &[in_node(11)]), 2);
}

#[test]
fn plain_flow_bounds_expanded_flow() {
    // Removing nodes is at least as strong as removing arcs, so the vertex
    // cut never exceeds the arc cut.
    for (s, t) in [(0u32, 8u32), (0, 4), (3, 7)] {
        let (g, _) = grid_graph(3, 3);
        let e = ExpandedGraph::new(&g);
        let arc_cut = reference_max_flow(&g, &[s], &[t]);
        let vertex_cut = reference_max_flow(&e, &[out_node(s)], &[in_node(t)]);
        assert!(vertex_cut <= arc_cut, "s={s} t={t}: {vertex_cut} > {arc_cut}");
    }
}
