use flowcut::graph::{validate_cutter_input, AdjacencyArray, FlowGraph, GraphBuilder};

#[test]
fn csr_input_builds_tails_and_back_arcs() {
    // 0 - 1 - 2 path in CSR form.
    let first_out = vec![0u32, 1, 3, 4];
    let head = vec![1u32, 0, 2, 1];
    let g = AdjacencyArray::from_csr(first_out, head, None).unwrap();
    assert_eq!(g.node_count(), 3);
    assert_eq!(g.arc_count(), 4);
    assert_eq!(g.tails(), &[0, 1, 1, 2]);
    for a in 0..g.arc_count() {
        assert_eq!(g.head(g.back_arc(a)), g.tail(a));
    }
    assert!(g.is_connected());
    assert!(g.is_simple());
}

#[test]
fn csr_input_is_validated() {
    assert!(AdjacencyArray::from_csr(vec![], vec![], None).is_err());
    // Offsets must close over the arc array.
    assert!(AdjacencyArray::from_csr(vec![0, 1], vec![0, 0], None).is_err());
    // Heads must be in bounds.
    assert!(AdjacencyArray::from_csr(vec![0, 1, 2], vec![5, 0], None).is_err());
    // Asymmetric graphs are rejected.
    assert!(AdjacencyArray::from_csr(vec![0, 1, 1], vec![1], None).is_err());
    // Weight length must match.
    assert!(AdjacencyArray::from_csr(vec![0, 1, 2], vec![1, 0], Some(vec![1])).is_err());
}

#[test]
fn symmetrize_then_deduplicate_reaches_cutter_shape() {
    let mut b = GraphBuilder::new(4);
    b.add_arc(0, 1, 3);
    b.add_arc(1, 0, 5);
    b.add_arc(1, 2, 2);
    b.add_arc(2, 2, 1);
    b.add_arc(2, 3, 4);
    b.add_arc(2, 3, 9);
    b.symmetrize();
    b.deduplicate();
    let g = b.build().unwrap();
    assert!(g.is_simple());
    assert_eq!(g.arc_count(), 6);
    assert!(validate_cutter_input(&g, true).is_ok());
    // The parallel 2->3 arcs collapsed onto the cheaper one.
    let arc = g.out_arcs(2).find(|&a| g.head(a) == 3).unwrap();
    assert_eq!(g.arc_weight(arc), 4);
}

#[test]
fn weighted_validation_rejects_negative_weights() {
    let mut b = GraphBuilder::new(2);
    b.add_arc(0, 1, -1);
    b.symmetrize();
    let g = b.build().unwrap();
    assert!(validate_cutter_input(&g, false).is_ok());
    assert!(validate_cutter_input(&g, true).is_err());
}

#[test]
fn connectivity_checks() {
    let mut b = GraphBuilder::new(4);
    b.add_arc(0, 1, 1);
    b.add_arc(2, 3, 1);
    b.symmetrize();
    let g = b.build().unwrap();
    assert!(!g.is_connected());
    assert_eq!(g.degree(0), 1);
}
