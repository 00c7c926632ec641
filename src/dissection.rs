//! Parallel nested-dissection ordering.
//!
//! The driver reduces a graph to trivial pieces -- single nodes, edgeless
//! graphs, cliques, trees -- and dissects everything else: simplify
//! (degree-2 chain contraction, biconnected-component placement), compute a
//! vertex separator, recurse on the remainders, and append the separator
//! last. The produced permutation puts every separator after the two pieces
//! it separates, which is exactly the elimination order contraction
//! hierarchies want.
//!
//! Subproblems above [`TASK_SPAWN_CUTOFF`] nodes are spawned as parallel
//! tasks; smaller ones run in a sequential batch per fork. A failing
//! subproblem falls back to its identity sub-order with a warning, keeping
//! the overall run alive.

use rayon::prelude::*;

use crate::config::Config;
use crate::error::CoreError;
use crate::geo::GeoPos;
use crate::graph::{AdjacencyArray, FlowGraph, GraphBuilder};
use crate::ids::BitSet;
use crate::inertial::compute_inertial_flow_separator;
use crate::separator::compute_separator;

/// Subproblems above this node count run as parallel tasks.
pub const TASK_SPAWN_CUTOFF: u32 = 800;

/// How the driver computes vertex separators at the recursion base.
#[derive(Clone, Debug)]
pub enum SeparatorAlgorithm {
    /// The cutter ensemble, honoring the full configuration.
    FlowCutter(Config),
    /// The geometric baseline. Requires node positions.
    InertialFlow { min_balance: f64, use_dinic: bool },
}

/// Optional reductions of the driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct DissectionOptions {
    /// Rewire an independent set of degree-3 nodes into triangles on their
    /// neighborhoods and order the set first.
    pub degree_three_reduction: bool,
}

struct Ctx<'a> {
    algorithm: &'a SeparatorAlgorithm,
    geo_pos: Option<&'a [GeoPos]>,
    options: DissectionOptions,
    thread_count: usize,
}

/// A subproblem: a symmetric simple arc list over local node IDs, with the
/// mapping back to the input graph.
#[derive(Clone, Debug)]
struct SubGraph {
    node_count: u32,
    tail: Vec<u32>,
    head: Vec<u32>,
    weight: Vec<i32>,
    /// Local node ID to input-graph node ID; drives geo position lookups.
    input_node_id: Vec<u32>,
}

impl SubGraph {
    fn arc_count(&self) -> usize {
        self.tail.len()
    }

    fn first_out(&self) -> (Vec<u32>, Vec<u32>) {
        // CSR over the unsorted arc list: offsets plus an arc permutation.
        let n = self.node_count as usize;
        let mut first_out = vec![0u32; n + 1];
        for &t in &self.tail {
            first_out[t as usize + 1] += 1;
        }
        for v in 0..n {
            first_out[v + 1] += first_out[v];
        }
        let mut position = first_out.clone();
        let mut arcs = vec![0u32; self.tail.len()];
        for a in 0..self.tail.len() {
            let t = self.tail[a] as usize;
            arcs[position[t] as usize] = a as u32;
            position[t] += 1;
        }
        (first_out, arcs)
    }

    fn degrees(&self) -> Vec<u32> {
        let mut deg = vec![0u32; self.node_count as usize];
        for &t in &self.tail {
            deg[t as usize] += 1;
        }
        deg
    }

    /// Subgraph induced on `nodes` (parent-local IDs), keeping only arcs with
    /// both endpoints inside.
    fn induced(&self, nodes: &[u32]) -> SubGraph {
        let mut local_id = vec![u32::MAX; self.node_count as usize];
        for (i, &v) in nodes.iter().enumerate() {
            local_id[v as usize] = i as u32;
        }
        let mut tail = Vec::new();
        let mut head = Vec::new();
        let mut weight = Vec::new();
        for a in 0..self.arc_count() {
            let (t, h) = (local_id[self.tail[a] as usize], local_id[self.head[a] as usize]);
            if t != u32::MAX && h != u32::MAX {
                tail.push(t);
                head.push(h);
                weight.push(self.weight[a]);
            }
        }
        SubGraph {
            node_count: nodes.len() as u32,
            tail,
            head,
            weight,
            input_node_id: nodes
                .iter()
                .map(|&v| self.input_node_id[v as usize])
                .collect(),
        }
    }
}

/// Computes a nested-dissection vertex ordering of `graph`. Position `i` of
/// the result holds the node contracted at step `i`; separator nodes come
/// after the pieces they separate.
pub fn compute_nested_dissection_order(
    graph: &AdjacencyArray,
    geo_pos: Option<&[GeoPos]>,
    algorithm: &SeparatorAlgorithm,
) -> Result<Vec<u32>, CoreError> {
    compute_nested_dissection_order_with(graph, geo_pos, algorithm, DissectionOptions::default())
}

/// [`compute_nested_dissection_order`] with explicit driver options.
pub fn compute_nested_dissection_order_with(
    graph: &AdjacencyArray,
    geo_pos: Option<&[GeoPos]>,
    algorithm: &SeparatorAlgorithm,
    options: DissectionOptions,
) -> Result<Vec<u32>, CoreError> {
    if !graph.is_simple() {
        return Err(CoreError::Input(
            "graph must not have loops or parallel arcs".into(),
        ));
    }
    let thread_count = match algorithm {
        SeparatorAlgorithm::FlowCutter(config) => {
            config.validate()?;
            config.thread_count
        }
        SeparatorAlgorithm::InertialFlow { min_balance, .. } => {
            if !(0.0..=0.5).contains(min_balance) {
                return Err(CoreError::Config(format!(
                    "min balance parameter must be between 0.0 and 0.5, got {min_balance}"
                )));
            }
            if geo_pos.is_none() {
                return Err(CoreError::Input(
                    "inertial flow requires node positions".into(),
                ));
            }
            num_cpus::get()
        }
    };
    if let Some(geo) = geo_pos {
        if geo.len() != graph.node_count() as usize {
            return Err(CoreError::Input(
                "geo position array must cover every node".into(),
            ));
        }
    }

    if thread_count > 1 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build_global()
            .ok();
    }

    let n = graph.node_count();
    let sub = SubGraph {
        node_count: n,
        tail: graph.tails().to_vec(),
        head: graph.heads().to_vec(),
        weight: graph.weights().to_vec(),
        input_node_id: (0..n).collect(),
    };
    let ctx = Ctx {
        algorithm,
        geo_pos,
        options,
        thread_count,
    };
    Ok(dissect(sub, &ctx))
}

/// Recursion workhorse; infallible. Subproblem failures degrade to the
/// identity sub-order.
fn dissect(sub: SubGraph, ctx: &Ctx<'_>) -> Vec<u32> {
    let n = sub.node_count;
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0];
    }
    let m = sub.arc_count() as u64;
    if m == 0 || m == n as u64 * (n as u64 - 1) {
        // Edgeless graphs and cliques are order-insensitive.
        return (0..n).collect();
    }
    if m == 2 * (n as u64 - 1) {
        if let Some(order) = tree_order(&sub) {
            return order;
        }
    }

    if let Some(components) = split_components(&sub) {
        let subs: Vec<SubGraph> = components.iter().map(|nodes| sub.induced(nodes)).collect();
        let orders = dissect_all(subs, ctx);
        let mut order = Vec::with_capacity(n as usize);
        for (nodes, sub_order) in components.iter().zip(orders) {
            order.extend(sub_order.into_iter().map(|x| nodes[x as usize]));
        }
        return order;
    }

    // Connected from here on.
    if let Some(order) = contract_degree_two_chains(&sub, ctx) {
        return order;
    }
    if let Some(order) = split_off_biconnected_components(&sub, ctx) {
        return order;
    }
    if ctx.options.degree_three_reduction {
        if let Some(order) = reduce_degree_three_independent_set(&sub, ctx) {
            return order;
        }
    }

    dissect_with_separator(sub, ctx)
}

/// Dissects many subproblems, spawning the large ones as parallel tasks and
/// batching the small ones sequentially.
fn dissect_all(subs: Vec<SubGraph>, ctx: &Ctx<'_>) -> Vec<Vec<u32>> {
    let spawn = ctx.thread_count > 1 && subs.iter().any(|s| s.node_count > TASK_SPAWN_CUTOFF);
    if !spawn {
        return subs.into_iter().map(|s| dissect(s, ctx)).collect();
    }

    let mut results: Vec<Vec<u32>> = vec![Vec::new(); subs.len()];
    let mut large: Vec<(usize, SubGraph)> = Vec::new();
    let mut small: Vec<(usize, SubGraph)> = Vec::new();
    for (i, s) in subs.into_iter().enumerate() {
        if s.node_count > TASK_SPAWN_CUTOFF {
            large.push((i, s));
        } else {
            small.push((i, s));
        }
    }

    let (large_results, small_results): (Vec<(usize, Vec<u32>)>, Vec<(usize, Vec<u32>)>) =
        rayon::join(
            || {
                large
                    .into_par_iter()
                    .map(|(i, s)| (i, dissect(s, ctx)))
                    .collect()
            },
            || small.into_iter().map(|(i, s)| (i, dissect(s, ctx))).collect(),
        );
    for (i, order) in large_results.into_iter().chain(small_results) {
        results[i] = order;
    }
    results
}

/// DFS preorder from the lowest-numbered nodes; components come out as
/// contiguous runs of the discovery order. Returns `None` for a connected
/// graph.
fn split_components(sub: &SubGraph) -> Option<Vec<Vec<u32>>> {
    let n = sub.node_count as usize;
    let (first_out, arcs) = sub.first_out();
    let mut preorder = Vec::with_capacity(n);
    let mut seen = BitSet::new(n);
    let mut stack = Vec::new();
    // Per-node cursor into its arc slice so every arc is scanned once.
    let mut next_out: Vec<u32> = first_out[..n].to_vec();
    let mut component_count = 0usize;

    for r in 0..n as u32 {
        if seen.get(r) {
            continue;
        }
        component_count += 1;
        seen.set(r, true);
        preorder.push(r);
        let mut x = r;
        loop {
            if next_out[x as usize] != first_out[x as usize + 1] {
                let a = arcs[next_out[x as usize] as usize];
                next_out[x as usize] += 1;
                let y = sub.head[a as usize];
                if !seen.get(y) {
                    seen.set(y, true);
                    preorder.push(y);
                    stack.push(x);
                    x = y;
                }
            } else {
                match stack.pop() {
                    Some(p) => x = p,
                    None => break,
                }
            }
        }
    }

    if component_count == 1 {
        return None;
    }

    // In preorder numbering, a node starting a component has no arc to an
    // earlier position.
    let mut position = vec![0u32; n];
    for (i, &v) in preorder.iter().enumerate() {
        position[v as usize] = i as u32;
    }
    let mut is_start = vec![true; n];
    for a in 0..sub.arc_count() {
        let (t, h) = (position[sub.tail[a] as usize], position[sub.head[a] as usize]);
        if h < t {
            is_start[t as usize] = false;
        }
    }

    let mut components = Vec::with_capacity(component_count);
    let mut current = Vec::new();
    for (i, &v) in preorder.iter().enumerate() {
        if i > 0 && is_start[i] {
            components.push(std::mem::take(&mut current));
        }
        current.push(v);
    }
    components.push(current);
    Some(components)
}

/// Nodes ordered by an optimal tree ranking, or `None` if the arc count lied
/// and the graph is not actually a tree.
fn tree_order(sub: &SubGraph) -> Option<Vec<u32>> {
    let n = sub.node_count as usize;
    let (first_out, arcs) = sub.first_out();

    // Root the tree at 0 by BFS; a cycle or disconnection shows up as a
    // missed or revisited node.
    let mut parent = vec![u32::MAX; n];
    let mut bfs_order = Vec::with_capacity(n);
    let mut seen = BitSet::new(n);
    seen.set(0, true);
    bfs_order.push(0u32);
    let mut i = 0;
    while i < bfs_order.len() {
        let x = bfs_order[i];
        i += 1;
        for &a in &arcs[first_out[x as usize] as usize..first_out[x as usize + 1] as usize] {
            let y = sub.head[a as usize];
            if y == parent[x as usize] {
                continue;
            }
            if seen.get(y) {
                return None;
            }
            seen.set(y, true);
            parent[y as usize] = x;
            bfs_order.push(y);
        }
    }
    if bfs_order.len() != n {
        return None;
    }

    // Bottom-up rank computation. Each node's visible ranks live in a
    // bitmask; the node takes the smallest rank above every duplicated
    // visible rank of its children.
    let mut visible = vec![0u64; n];
    let mut rank = vec![0u32; n];
    for &x in bfs_order.iter().rev() {
        let mut union = 0u64;
        let mut duplicated = 0u64;
        for &a in &arcs[first_out[x as usize] as usize..first_out[x as usize + 1] as usize] {
            let y = sub.head[a as usize];
            if parent[y as usize] == x {
                duplicated |= union & visible[y as usize];
                union |= visible[y as usize];
            }
        }
        let min_rank = 64 - duplicated.leading_zeros(); // 0 when no conflicts
        let r = (min_rank..64)
            .find(|&b| union & (1u64 << b) == 0)
            .expect("tree rank exceeds 64");
        rank[x as usize] = r;
        visible[x as usize] = (union & !((1u64 << (r + 1)) - 1)) | (1u64 << r);
    }

    let mut order: Vec<u32> = (0..sub.node_count).collect();
    order.sort_by_key(|&v| (rank[v as usize], v));
    Some(order)
}

/// Contracts every maximal degree-2 chain into a shortcut arc. Interiors are
/// ordered first; the contracted graph determines the suffix. `None` when no
/// chain exists or the component is a pure cycle.
fn contract_degree_two_chains(sub: &SubGraph, ctx: &Ctx<'_>) -> Option<Vec<u32>> {
    let n = sub.node_count as usize;
    let deg = sub.degrees();
    let has_interior = deg.iter().any(|&d| d == 2);
    let has_endpoint = deg.iter().any(|&d| d != 2);
    if !has_interior || !has_endpoint {
        return None;
    }

    let (first_out, arcs) = sub.first_out();
    let out_of = |v: u32| {
        arcs[first_out[v as usize] as usize..first_out[v as usize + 1] as usize]
            .iter()
            .copied()
    };

    let mut claimed = BitSet::new(n);
    let mut interiors: Vec<u32> = Vec::new();
    let mut builder_tail = Vec::new();
    let mut builder_head = Vec::new();
    let mut builder_weight = Vec::new();

    // Keep arcs between two endpoint nodes as they are.
    for a in 0..sub.arc_count() {
        if deg[sub.tail[a] as usize] != 2 && deg[sub.head[a] as usize] != 2 {
            builder_tail.push(sub.tail[a]);
            builder_head.push(sub.head[a]);
            builder_weight.push(sub.weight[a]);
        }
    }

    for u in 0..n as u32 {
        if deg[u as usize] == 2 {
            continue;
        }
        for a in out_of(u) {
            let mut current = sub.head[a as usize];
            if deg[current as usize] != 2 || claimed.get(current) {
                continue;
            }
            // Walk the chain from u until the far endpoint.
            let mut shortcut_weight = sub.weight[a as usize] as i64;
            let mut previous = u;
            while deg[current as usize] == 2 {
                claimed.set(current, true);
                interiors.push(current);
                let next_arc = out_of(current)
                    .find(|&b| sub.head[b as usize] != previous)
                    .expect("degree-2 node must have a second neighbor");
                shortcut_weight += sub.weight[next_arc as usize] as i64;
                previous = current;
                current = sub.head[next_arc as usize];
            }
            if current != u {
                builder_tail.push(u);
                builder_head.push(current);
                builder_weight.push(shortcut_weight.min(i32::MAX as i64) as i32);
                builder_tail.push(current);
                builder_head.push(u);
                builder_weight.push(shortcut_weight.min(i32::MAX as i64) as i32);
            }
        }
    }

    interiors.sort_unstable();

    let keep: Vec<u32> = (0..n as u32).filter(|&v| deg[v as usize] != 2).collect();
    let mut local_id = vec![u32::MAX; n];
    for (i, &v) in keep.iter().enumerate() {
        local_id[v as usize] = i as u32;
    }

    let mut contracted = GraphBuilder::new(keep.len() as u32);
    for ((&t, &h), &w) in builder_tail
        .iter()
        .zip(builder_head.iter())
        .zip(builder_weight.iter())
    {
        contracted.add_arc(local_id[t as usize], local_id[h as usize], w);
    }
    contracted.deduplicate();
    let (ctail, chead, cweight) = contracted.into_arcs();

    let contracted_sub = SubGraph {
        node_count: keep.len() as u32,
        tail: ctail,
        head: chead,
        weight: cweight,
        input_node_id: keep
            .iter()
            .map(|&v| sub.input_node_id[v as usize])
            .collect(),
    };

    let suffix = dissect(contracted_sub, ctx);
    let mut order = interiors;
    order.extend(suffix.into_iter().map(|x| keep[x as usize]));
    Some(order)
}

/// Splits the graph around its largest biconnected component, largest in
/// terms of arcs: every arc entering or leaving that component drops, the
/// detached pieces recurse, and the component's nodes come last in the
/// order. Smaller biconnected components stay joined to their neighbors
/// through shared cut nodes. `None` when the graph is already biconnected.
fn split_off_biconnected_components(sub: &SubGraph, ctx: &Ctx<'_>) -> Option<Vec<u32>> {
    let n = sub.node_count as usize;
    let (first_out, arcs) = sub.first_out();
    let back_arc = crate::ids::back_arc_permutation(&sub.tail, &sub.head)?;

    let mut disc = vec![u32::MAX; n];
    let mut low = vec![0u32; n];
    let mut edge_component = vec![u32::MAX; sub.arc_count()];
    let mut component_count = 0u32;
    let mut time = 1u32;

    // Frame: node, index into its arc slice, arc taken from the parent.
    let mut frames: Vec<(u32, usize, u32)> = Vec::new();
    let mut edge_stack: Vec<u32> = Vec::new();

    disc[0] = 0;
    low[0] = 0;
    frames.push((0, 0, u32::MAX));

    while let Some(&(x, next, parent_arc)) = frames.last() {
        let slice = &arcs[first_out[x as usize] as usize..first_out[x as usize + 1] as usize];
        if next < slice.len() {
            frames.last_mut().unwrap().1 += 1;
            let a = slice[next];
            if parent_arc != u32::MAX && a == back_arc[parent_arc as usize] {
                continue;
            }
            let y = sub.head[a as usize];
            if disc[y as usize] == u32::MAX {
                disc[y as usize] = time;
                low[y as usize] = time;
                time += 1;
                edge_stack.push(a);
                frames.push((y, 0, a));
            } else if disc[y as usize] < disc[x as usize] {
                edge_stack.push(a);
                low[x as usize] = low[x as usize].min(disc[y as usize]);
            }
        } else {
            frames.pop();
            if let Some(&(p, _, _)) = frames.last() {
                low[p as usize] = low[p as usize].min(low[x as usize]);
                if low[x as usize] >= disc[p as usize] {
                    // The edges down to (p, x) form one component.
                    while let Some(e) = edge_stack.pop() {
                        edge_component[e as usize] = component_count;
                        edge_component[back_arc[e as usize] as usize] = component_count;
                        if sub.tail[e as usize] == p && sub.head[e as usize] == x {
                            break;
                        }
                    }
                    component_count += 1;
                }
            }
        }
    }

    if component_count <= 1 {
        return None;
    }

    // The component with the most arcs wins; ties go to the first one.
    let mut component_arc_count = vec![0u32; component_count as usize];
    for &c in &edge_component {
        if c != u32::MAX {
            component_arc_count[c as usize] += 1;
        }
    }
    let mut largest = 0u32;
    for c in 1..component_count {
        if component_arc_count[c as usize] > component_arc_count[largest as usize] {
            largest = c;
        }
    }

    // Nodes incident to the largest component, then drop every arc that
    // crosses its boundary. Everything else stays connected as before.
    let mut in_largest = BitSet::new(n);
    for a in 0..sub.arc_count() {
        if edge_component[a] == largest {
            in_largest.set(sub.tail[a], true);
            in_largest.set(sub.head[a], true);
        }
    }

    let mut reduced = sub.clone();
    let mut kept_tail = Vec::new();
    let mut kept_head = Vec::new();
    let mut kept_weight = Vec::new();
    for a in 0..sub.arc_count() {
        if in_largest.get(sub.tail[a]) == in_largest.get(sub.head[a]) {
            kept_tail.push(sub.tail[a]);
            kept_head.push(sub.head[a]);
            kept_weight.push(sub.weight[a]);
        }
    }
    reduced.tail = kept_tail;
    reduced.head = kept_head;
    reduced.weight = kept_weight;

    let components = match split_components(&reduced) {
        Some(c) => c,
        // Dropping arcs did not disconnect anything; dissect as one piece
        // would loop, so fall through to the separator.
        None => return None,
    };

    // Kept arcs never cross the boundary, so each piece is entirely in or
    // out of the largest component; its first node decides the side.
    let mut front: Vec<Vec<u32>> = Vec::new();
    let mut back: Vec<Vec<u32>> = Vec::new();
    for nodes in components {
        debug_assert!(nodes
            .iter()
            .all(|&v| in_largest.get(v) == in_largest.get(nodes[0])));
        if in_largest.get(nodes[0]) {
            back.push(nodes);
        } else {
            front.push(nodes);
        }
    }
    front.extend(back);

    let subs: Vec<SubGraph> = front.iter().map(|nodes| reduced.induced(nodes)).collect();
    let orders = dissect_all(subs, ctx);
    let mut order = Vec::with_capacity(n);
    for (nodes, sub_order) in front.iter().zip(orders) {
        order.extend(sub_order.into_iter().map(|x| nodes[x as usize]));
    }
    Some(order)
}

/// Greedy independent set of degree-3 nodes, the surviving nodes, and the
/// reduced graph with each star rewired into a triangle on its neighborhood
/// (a minor of the graph). The six star arc slots turn into the six
/// triangle arcs and keep their weights.
fn degree_three_reduction(sub: &SubGraph) -> Option<(Vec<u32>, Vec<u32>, SubGraph)> {
    let n = sub.node_count as usize;
    let deg = sub.degrees();
    let (first_out, arcs) = sub.first_out();
    let back_arc = crate::ids::back_arc_permutation(&sub.tail, &sub.head)?;
    let out_of = |v: u32| &arcs[first_out[v as usize] as usize..first_out[v as usize + 1] as usize];

    let mut in_set = BitSet::new(n);
    let mut set_nodes: Vec<u32> = Vec::new();
    for v in 0..n as u32 {
        if deg[v as usize] != 3 {
            continue;
        }
        if out_of(v).iter().any(|&a| in_set.get(sub.head[a as usize])) {
            continue;
        }
        in_set.set(v, true);
        set_nodes.push(v);
    }
    if set_nodes.is_empty() {
        return None;
    }

    let keep: Vec<u32> = (0..n as u32).filter(|&v| !in_set.get(v)).collect();
    let mut local_id = vec![u32::MAX; n];
    for (i, &v) in keep.iter().enumerate() {
        local_id[v as usize] = i as u32;
    }

    let mut contracted = GraphBuilder::new(keep.len() as u32);
    for a in 0..sub.arc_count() {
        let (t, h) = (sub.tail[a], sub.head[a]);
        if !in_set.get(t) && !in_set.get(h) {
            contracted.add_arc(local_id[t as usize], local_id[h as usize], sub.weight[a]);
        }
    }
    for &c in &set_nodes {
        let slice = out_of(c);
        let (cx, cy, cz) = (slice[0] as usize, slice[1] as usize, slice[2] as usize);
        let (x, y, z) = (
            local_id[sub.head[cx] as usize],
            local_id[sub.head[cy] as usize],
            local_id[sub.head[cz] as usize],
        );
        contracted.add_arc(x, y, sub.weight[back_arc[cx] as usize]);
        contracted.add_arc(y, z, sub.weight[back_arc[cy] as usize]);
        contracted.add_arc(z, x, sub.weight[back_arc[cz] as usize]);
        contracted.add_arc(x, z, sub.weight[cx]);
        contracted.add_arc(y, x, sub.weight[cy]);
        contracted.add_arc(z, y, sub.weight[cz]);
    }
    contracted.deduplicate();
    let (ctail, chead, cweight) = contracted.into_arcs();

    let contracted_sub = SubGraph {
        node_count: keep.len() as u32,
        tail: ctail,
        head: chead,
        weight: cweight,
        input_node_id: keep
            .iter()
            .map(|&v| sub.input_node_id[v as usize])
            .collect(),
    };
    Some((set_nodes, keep, contracted_sub))
}

/// Places the independent set first; the rewired graph determines the
/// suffix.
fn reduce_degree_three_independent_set(sub: &SubGraph, ctx: &Ctx<'_>) -> Option<Vec<u32>> {
    let (set_nodes, keep, contracted_sub) = degree_three_reduction(sub)?;
    let suffix = dissect(contracted_sub, ctx);
    let mut order = set_nodes;
    order.extend(suffix.into_iter().map(|x| keep[x as usize]));
    Some(order)
}

/// Recursion base: separator, remainders, separator last.
fn dissect_with_separator(sub: SubGraph, ctx: &Ctx<'_>) -> Vec<u32> {
    let n = sub.node_count;
    let separator = match compute_sub_separator(&sub, ctx) {
        Ok(sep) if !sep.is_empty() => sep,
        Ok(_) => {
            log::warn!(
                "separator came back empty on a subproblem with {n} nodes; \
                 falling back to the identity order"
            );
            return (0..n).collect();
        }
        Err(err) => {
            log::warn!(
                "separator computation failed on a subproblem with {n} nodes \
                 ({err}); falling back to the identity order"
            );
            return (0..n).collect();
        }
    };

    let mut in_separator = BitSet::new(n as usize);
    for &v in &separator {
        in_separator.set(v, true);
    }
    let remainder: Vec<u32> = (0..n).filter(|&v| !in_separator.get(v)).collect();
    let remainder_sub = sub.induced(&remainder);

    log::debug!(
        "dissecting {} nodes: separator {}, remainder {}",
        n,
        separator.len(),
        remainder.len()
    );

    let remainder_order = dissect(remainder_sub, ctx);
    let mut order: Vec<u32> = remainder_order
        .into_iter()
        .map(|x| remainder[x as usize])
        .collect();
    order.extend(separator);
    order
}

fn compute_sub_separator(sub: &SubGraph, ctx: &Ctx<'_>) -> Result<Vec<u32>, CoreError> {
    let graph = GraphBuilder::from_arcs(
        sub.node_count,
        sub.tail.clone(),
        sub.head.clone(),
        sub.weight.clone(),
    )
    .build()?;

    let local_geo: Option<Vec<GeoPos>> = ctx.geo_pos.map(|geo| {
        sub.input_node_id
            .iter()
            .map(|&v| geo[v as usize])
            .collect()
    });

    match ctx.algorithm {
        SeparatorAlgorithm::FlowCutter(config) => {
            compute_separator(&graph, local_geo.as_deref(), config)
        }
        SeparatorAlgorithm::InertialFlow {
            min_balance,
            use_dinic,
        } => compute_inertial_flow_separator(
            &graph,
            local_geo.as_deref().unwrap(),
            *min_balance,
            *use_dinic,
        ),
    }
}
