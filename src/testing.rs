//! Test utilities: graph builders, a reference max flow, and assertions.
//!
//! Everything here is deterministic under a fixed seed, so tests built on it
//! are reproducible. The reference max flow is deliberately the dumbest
//! correct implementation -- breadth-first augmenting paths over the paired
//! arc representation -- and serves as the ground truth the incremental
//! cutters are checked against.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo::GeoPos;
use crate::graph::{AdjacencyArray, FlowGraph, GraphBuilder};
use crate::ids::BitSet;

/// Path `0 - 1 - ... - n-1` with unit weights.
pub fn path_graph(n: u32) -> AdjacencyArray {
    let mut b = GraphBuilder::new(n);
    for v in 0..n.saturating_sub(1) {
        b.add_arc(v, v + 1, 1);
    }
    b.symmetrize();
    b.build().unwrap()
}

/// Cycle over `n` nodes with unit weights.
pub fn cycle_graph(n: u32) -> AdjacencyArray {
    let mut b = GraphBuilder::new(n);
    for v in 0..n {
        b.add_arc(v, (v + 1) % n, 1);
    }
    b.symmetrize();
    b.build().unwrap()
}

/// `width x height` grid with unit weights and positions on the unit
/// square.
pub fn grid_graph(width: u32, height: u32) -> (AdjacencyArray, Vec<GeoPos>) {
    let n = width * height;
    let node = |x: u32, y: u32| y * width + x;
    let mut b = GraphBuilder::new(n);
    for y in 0..height {
        for x in 0..width {
            if x + 1 < width {
                b.add_arc(node(x, y), node(x + 1, y), 1);
            }
            if y + 1 < height {
                b.add_arc(node(x, y), node(x, y + 1), 1);
            }
        }
    }
    b.symmetrize();
    let geo = (0..n)
        .map(|v| GeoPos {
            lon: (v % width) as f64 / (width.max(2) - 1) as f64,
            lat: (v / width) as f64 / (height.max(2) - 1) as f64,
        })
        .collect();
    (b.build().unwrap(), geo)
}

/// Random points on the unit square joined when closer than `radius`, plus
/// a chain along the x axis to keep the graph connected.
pub fn random_geometric_graph(n: u32, radius: f64, seed: u64) -> (AdjacencyArray, Vec<GeoPos>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let geo: Vec<GeoPos> = (0..n)
        .map(|_| GeoPos {
            lat: rng.r#gen::<f64>(),
            lon: rng.r#gen::<f64>(),
        })
        .collect();

    let mut b = GraphBuilder::new(n);
    for u in 0..n {
        for v in u + 1..n {
            let (du, dv) = (geo[u as usize], geo[v as usize]);
            let dist2 = (du.lat - dv.lat).powi(2) + (du.lon - dv.lon).powi(2);
            if dist2 < radius * radius {
                b.add_arc(u, v, 1);
            }
        }
    }

    let mut by_lon: Vec<u32> = (0..n).collect();
    by_lon.sort_by(|&l, &r| geo[l as usize].lon.total_cmp(&geo[r as usize].lon));
    for w in by_lon.windows(2) {
        b.add_arc(w[0], w[1], 1);
    }

    b.symmetrize();
    b.deduplicate();
    (b.build().unwrap(), geo)
}

/// Graph over `n` nodes whose undirected edges are the set bits of `mask`,
/// enumerating pairs `(i, j)` with `i < j` in lexicographic order. Drives
/// exhaustive small-graph sweeps.
pub fn edge_subset_graph(n: u32, mask: u64) -> AdjacencyArray {
    let mut b = GraphBuilder::new(n);
    let mut bit = 0;
    for i in 0..n {
        for j in i + 1..n {
            if mask >> bit & 1 != 0 {
                b.add_arc(i, j, 1);
            }
            bit += 1;
        }
    }
    b.symmetrize();
    b.build().unwrap()
}

/// Number of undirected node pairs of an `n`-node graph; the mask width for
/// [`edge_subset_graph`].
pub fn edge_pair_count(n: u32) -> u32 {
    n * (n - 1) / 2
}

/// Reference maximum flow between node sets, by breadth-first augmenting
/// paths over the paired arc representation. Honors per-arc capacities, so
/// it runs on expanded graphs too.
pub fn reference_max_flow<G: FlowGraph>(graph: &G, sources: &[u32], targets: &[u32]) -> u32 {
    let n = graph.node_count() as usize;
    let mut flow = vec![0i32; graph.arc_count() as usize];
    let mut is_source = BitSet::new(n);
    let mut is_target = BitSet::new(n);
    for &s in sources {
        is_source.set(s, true);
    }
    for &t in targets {
        is_target.set(t, true);
    }

    let mut value = 0u32;
    loop {
        let mut parent_arc = vec![u32::MAX; n];
        let mut queue: Vec<u32> = sources.to_vec();
        let mut seen = is_source.clone();
        let mut hit = None;
        let mut i = 0;
        'bfs: while i < queue.len() {
            let x = queue[i];
            i += 1;
            for a in graph.out_arcs(x) {
                let y = graph.head(a);
                if !seen.get(y) && flow[a as usize] < graph.capacity(a) {
                    seen.set(y, true);
                    parent_arc[y as usize] = a;
                    if is_target.get(y) {
                        hit = Some(y);
                        break 'bfs;
                    }
                    queue.push(y);
                }
            }
        }

        let Some(mut x) = hit else {
            return value;
        };
        while !is_source.get(x) {
            let a = parent_arc[x as usize];
            flow[a as usize] += 1;
            flow[graph.back_arc(a) as usize] -= 1;
            x = graph.tail(a);
        }
        value += 1;
    }
}

/// Panics unless `order` is a permutation of `0..order.len()`.
pub fn assert_is_permutation(order: &[u32]) {
    assert!(
        crate::order::is_permutation(order),
        "not a permutation: {order:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_expected_size() {
        let (g, geo) = grid_graph(4, 4);
        assert_eq!(g.node_count(), 16);
        assert_eq!(g.arc_count(), 48);
        assert_eq!(geo.len(), 16);
    }

    #[test]
    fn reference_flow_on_a_path_is_one() {
        let g = path_graph(5);
        assert_eq!(reference_max_flow(&g, &[0], &[4]), 1);
    }

    #[test]
    fn reference_flow_on_a_cycle_is_two() {
        let g = cycle_graph(6);
        assert_eq!(reference_max_flow(&g, &[0], &[3]), 2);
    }
}
