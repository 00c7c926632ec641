//! Inertial flow: the geometric baseline partitioner.
//!
//! Terminals come from the extremes of four fixed projections of the node
//! embedding (longitude, latitude, and the two diagonals). One max-flow
//! instance runs per projection; the round-robin driver always advances the
//! instance with the smallest current flow intensity, so the first instance
//! to finish holds the smallest of the four cuts. Its residual-reachable
//! side, clipped to the smaller half, defines the cut.
//!
//! Two engines implement the max flow behind one trait: unit-capacity Dinic
//! (the default) and a Ford-Fulkerson reference used for validation.

use crate::error::CoreError;
use crate::geo::GeoPos;
use crate::graph::{AdjacencyArray, FlowGraph};
use crate::ids::BitSet;

/// A finished inertial cut.
pub struct InertialCut {
    pub is_on_smaller_side: BitSet,
    pub smaller_side_size: u32,
    pub cut_size: u32,
}

/// Incremental source-to-target max flow over unit capacities.
pub trait MaxFlowEngine {
    fn new(
        graph: &AdjacencyArray,
        source_list: Vec<u32>,
        target_list: Vec<u32>,
        is_source: BitSet,
        source_front: Vec<u32>,
    ) -> Self
    where
        Self: Sized;

    /// One augmentation round. Sets the finished flag when no augmenting
    /// path remains.
    fn advance(&mut self, graph: &AdjacencyArray);
    fn is_finished(&self) -> bool;
    fn flow_intensity(&self) -> u32;
    fn reachable_count(&self) -> u32;
    fn is_reachable(&self, node: u32) -> bool;
    fn take_reachable_flags(&mut self) -> BitSet;

    /// Debug-build checks; no-ops in release.
    fn verify_flow_conservation(&self, graph: &AdjacencyArray);
}

/// Orders nodes along `projection` and returns the `min_balance` extremes of
/// both ends as source and target lists.
fn build_source_and_target_lists<F>(
    node_count: u32,
    min_balance: f64,
    projection: F,
) -> (Vec<u32>, Vec<u32>)
where
    F: Fn(u32) -> f64,
{
    let n = node_count as usize;
    let mut order: Vec<u32> = (0..node_count).collect();
    let min_side_size = ((min_balance * n as f64) as usize).max(1);
    let cmp = |&l: &u32, &r: &u32| projection(l).total_cmp(&projection(r));

    order.select_nth_unstable_by(min_side_size, cmp);
    if min_side_size + 1 < n - min_side_size {
        order[min_side_size..].select_nth_unstable_by(n - 2 * min_side_size, cmp);
    }

    let source_list = order[..min_side_size].to_vec();
    let target_list: Vec<u32> = order[n - min_side_size..].iter().rev().copied().collect();
    (source_list, target_list)
}

/// Source flags plus the source *front*: sources with at least one neighbor
/// outside the source set. Only those can start augmenting paths.
fn build_is_source_and_front(
    graph: &AdjacencyArray,
    source_list: &[u32],
) -> (BitSet, Vec<u32>) {
    let mut is_source = BitSet::new(graph.node_count() as usize);
    for &u in source_list {
        is_source.set(u, true);
    }
    let source_front = source_list
        .iter()
        .copied()
        .filter(|&u| graph.out_arcs(u).any(|uv| !is_source.get(graph.head(uv))))
        .collect();
    (is_source, source_front)
}

/// Unit-capacity Dinic: level graph by BFS, then all augmenting paths of the
/// blocking flow by repeated DFS.
pub struct UnitDinic {
    source_list: Vec<u32>,
    source_front: Vec<u32>,
    is_source: BitSet,
    is_target: BitSet,
    is_saturated: BitSet,
    is_blocked: BitSet,
    queue: Vec<u32>,
    was_pushed: BitSet,
    is_on_same_level_or_lower: BitSet,
    current_path_node: Vec<u32>,
    current_path_arc: Vec<u32>,
    flow_intensity: u32,
    num_reachable: u32,
    finished: bool,
}

impl UnitDinic {
    fn compute_blocking_flow(&mut self, graph: &AdjacencyArray) -> bool {
        let mut target_reachable = false;
        self.is_blocked.fill(false);
        self.is_on_same_level_or_lower.clone_from(&self.is_source);
        self.num_reachable = self.source_list.len() as u32;
        self.was_pushed.fill(false);

        let mut queue_begin = 0usize;
        let mut queue_end = self.source_front.len();
        self.queue[..queue_end].copy_from_slice(&self.source_front);
        let mut queue_current_level_end = queue_end;

        while queue_begin != queue_end {
            for i in queue_begin..queue_current_level_end {
                self.is_on_same_level_or_lower.set(self.queue[i], true);
            }

            for i in queue_begin..queue_current_level_end {
                let x = self.queue[i];
                for xy in graph.out_arcs(x) {
                    if self.is_saturated.get(xy) {
                        self.is_blocked.set(xy, true);
                        continue;
                    }
                    let y = graph.head(xy);
                    if self.is_on_same_level_or_lower.get(y) {
                        self.is_blocked.set(xy, true);
                    } else if self.is_target.get(y) {
                        target_reachable = true;
                    } else if !self.was_pushed.get(y) {
                        self.num_reachable += 1;
                        self.queue[queue_end] = y;
                        queue_end += 1;
                        self.was_pushed.set(y, true);
                    }
                }
            }

            queue_begin = queue_current_level_end;
            queue_current_level_end = queue_end;
        }

        target_reachable
    }

    fn first_non_blocked_out_arc(&self, graph: &AdjacencyArray, x: u32) -> Option<u32> {
        graph.out_arcs(x).find(|&xy| !self.is_blocked.get(xy))
    }

    fn augment_all_non_blocked_paths(&mut self, graph: &AdjacencyArray) {
        for i in 0..self.source_front.len() {
            self.current_path_node[0] = self.source_front[i];
            let mut path_len = 0usize;
            loop {
                let x = self.current_path_node[path_len];
                match self.first_non_blocked_out_arc(graph, x) {
                    None => {
                        if path_len == 0 {
                            break;
                        }
                        path_len -= 1;
                        self.is_blocked.set(self.current_path_arc[path_len], true);
                    }
                    Some(xy) => {
                        let y = graph.head(xy);
                        self.current_path_arc[path_len] = xy;
                        path_len += 1;
                        self.current_path_node[path_len] = y;
                        if self.is_target.get(y) {
                            for j in 0..path_len {
                                let a = self.current_path_arc[j];
                                self.is_blocked.set(a, true);
                                let b = graph.back_arc(a);
                                if self.is_saturated.get(b) {
                                    self.is_saturated.set(b, false);
                                } else {
                                    self.is_saturated.set(a, true);
                                }
                            }
                            path_len = 0;
                            self.flow_intensity += 1;
                        }
                    }
                }
            }
        }
    }

    fn excess_at_node(&self, graph: &AdjacencyArray, u: u32) -> i32 {
        graph
            .out_arcs(u)
            .map(|uv| {
                self.is_saturated.get(graph.back_arc(uv)) as i32 - self.is_saturated.get(uv) as i32
            })
            .sum()
    }
}

impl MaxFlowEngine for UnitDinic {
    fn new(
        graph: &AdjacencyArray,
        source_list: Vec<u32>,
        target_list: Vec<u32>,
        is_source: BitSet,
        source_front: Vec<u32>,
    ) -> Self {
        let n = graph.node_count() as usize;
        let m = graph.arc_count() as usize;
        let mut is_target = BitSet::new(n);
        for &t in &target_list {
            is_target.set(t, true);
        }
        Self {
            source_list,
            source_front,
            is_source,
            is_target,
            is_saturated: BitSet::new(m),
            is_blocked: BitSet::new(m),
            queue: vec![0; n],
            was_pushed: BitSet::new(n),
            is_on_same_level_or_lower: BitSet::new(n),
            current_path_node: vec![0; n],
            current_path_arc: vec![0; n],
            flow_intensity: 0,
            num_reachable: 0,
            finished: false,
        }
    }

    fn advance(&mut self, graph: &AdjacencyArray) {
        if !self.finished && self.compute_blocking_flow(graph) {
            self.augment_all_non_blocked_paths(graph);
        } else {
            self.finished = true;
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn flow_intensity(&self) -> u32 {
        self.flow_intensity
    }

    fn reachable_count(&self) -> u32 {
        self.num_reachable
    }

    fn is_reachable(&self, node: u32) -> bool {
        self.is_on_same_level_or_lower.get(node)
    }

    fn take_reachable_flags(&mut self) -> BitSet {
        std::mem::replace(&mut self.is_on_same_level_or_lower, BitSet::new(0))
    }

    fn verify_flow_conservation(&self, graph: &AdjacencyArray) {
        if cfg!(debug_assertions) {
            let mut source_excess = 0i64;
            let mut target_excess = 0i64;
            for u in 0..graph.node_count() {
                if self.is_source.get(u) {
                    source_excess += self.excess_at_node(graph, u) as i64;
                } else if self.is_target.get(u) {
                    target_excess += self.excess_at_node(graph, u) as i64;
                } else {
                    assert_eq!(self.excess_at_node(graph, u), 0);
                }
            }
            assert_eq!(source_excess, -(self.flow_intensity as i64));
            assert_eq!(target_excess, self.flow_intensity as i64);
            for a in 0..graph.arc_count() {
                assert!(!(self.is_saturated.get(a) && self.is_saturated.get(graph.back_arc(a))));
            }
        }
    }
}

/// Ford-Fulkerson with one augmenting path per advance; the reference
/// engine.
pub struct FordFulkerson {
    source_list: Vec<u32>,
    source_front: Vec<u32>,
    is_source: BitSet,
    is_target: BitSet,
    is_saturated: BitSet,
    stack: Vec<u32>,
    predecessor: Vec<u32>,
    is_reachable: BitSet,
    last_source: usize,
    flow_intensity: u32,
    num_reachable: u32,
    finished: bool,
}

impl FordFulkerson {
    fn search_from(&mut self, graph: &AdjacencyArray, source_node: u32) -> Option<u32> {
        let mut stack_end = 1usize;
        self.stack[0] = source_node;
        while stack_end != 0 {
            stack_end -= 1;
            let x = self.stack[stack_end];
            for xy in graph.out_arcs(x) {
                let y = graph.head(xy);
                if !self.is_reachable.get(y) && !self.is_saturated.get(xy) {
                    self.is_reachable.set(y, true);
                    self.num_reachable += 1;
                    self.predecessor[y as usize] = xy;
                    if self.is_target.get(y) {
                        return Some(y);
                    }
                    self.stack[stack_end] = y;
                    stack_end += 1;
                }
            }
        }
        None
    }

    fn augment_flow_from(&mut self, graph: &AdjacencyArray, source_node: u32) -> bool {
        let Some(target_hit) = self.search_from(graph, source_node) else {
            return false;
        };
        self.flow_intensity += 1;
        let mut x = target_hit;
        while !self.is_source.get(x) {
            let a = self.predecessor[x as usize];
            let b = graph.back_arc(a);
            if self.is_saturated.get(b) {
                self.is_saturated.set(b, false);
            } else {
                self.is_saturated.set(a, true);
            }
            x = graph.tail(a);
        }
        true
    }

    fn excess_at_node(&self, graph: &AdjacencyArray, u: u32) -> i32 {
        graph
            .out_arcs(u)
            .map(|uv| {
                self.is_saturated.get(graph.back_arc(uv)) as i32 - self.is_saturated.get(uv) as i32
            })
            .sum()
    }
}

impl MaxFlowEngine for FordFulkerson {
    fn new(
        graph: &AdjacencyArray,
        source_list: Vec<u32>,
        target_list: Vec<u32>,
        is_source: BitSet,
        source_front: Vec<u32>,
    ) -> Self {
        let n = graph.node_count() as usize;
        let mut is_target = BitSet::new(n);
        for &t in &target_list {
            is_target.set(t, true);
        }
        Self {
            source_list,
            source_front,
            is_source,
            is_target,
            is_saturated: BitSet::new(graph.arc_count() as usize),
            stack: vec![0; n],
            predecessor: vec![0; n],
            is_reachable: BitSet::new(n),
            last_source: 0,
            flow_intensity: 0,
            num_reachable: 0,
            finished: false,
        }
    }

    fn advance(&mut self, graph: &AdjacencyArray) {
        self.is_reachable.clone_from(&self.is_source);
        self.num_reachable = self.source_list.len() as u32;

        let front_len = self.source_front.len();
        let rotation = (self.last_source..front_len).chain(0..self.last_source);
        for i in rotation {
            if self.augment_flow_from(graph, self.source_front[i]) {
                self.last_source = i;
                return;
            }
        }
        self.finished = true;
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn flow_intensity(&self) -> u32 {
        self.flow_intensity
    }

    fn reachable_count(&self) -> u32 {
        self.num_reachable
    }

    fn is_reachable(&self, node: u32) -> bool {
        self.is_reachable.get(node)
    }

    fn take_reachable_flags(&mut self) -> BitSet {
        std::mem::replace(&mut self.is_reachable, BitSet::new(0))
    }

    fn verify_flow_conservation(&self, graph: &AdjacencyArray) {
        if cfg!(debug_assertions) {
            let mut source_excess = 0i64;
            let mut target_excess = 0i64;
            for u in 0..graph.node_count() {
                if self.is_source.get(u) {
                    source_excess += self.excess_at_node(graph, u) as i64;
                } else if self.is_target.get(u) {
                    target_excess += self.excess_at_node(graph, u) as i64;
                } else {
                    assert_eq!(self.excess_at_node(graph, u), 0);
                }
            }
            assert_eq!(source_excess, -(self.flow_intensity as i64));
            assert_eq!(target_excess, self.flow_intensity as i64);
        }
    }
}

fn run_engines<E: MaxFlowEngine>(graph: &AdjacencyArray, geo_pos: &[GeoPos], min_balance: f64) -> InertialCut {
    let node_count = graph.node_count();
    let projections: [Box<dyn Fn(u32) -> f64 + '_>; 4] = [
        Box::new(|x| geo_pos[x as usize].lon),
        Box::new(|x| geo_pos[x as usize].lat),
        Box::new(|x| geo_pos[x as usize].lon + geo_pos[x as usize].lat),
        Box::new(|x| geo_pos[x as usize].lon - geo_pos[x as usize].lat),
    ];

    let mut instances: Vec<E> = projections
        .iter()
        .map(|projection| {
            let (source_list, target_list) =
                build_source_and_target_lists(node_count, min_balance, projection);
            let (is_source, source_front) = build_is_source_and_front(graph, &source_list);
            E::new(graph, source_list, target_list, is_source, source_front)
        })
        .collect();

    loop {
        let next = (0..instances.len())
            .min_by_key(|&i| instances[i].flow_intensity())
            .unwrap();

        if instances[next].is_finished() {
            let instance = &mut instances[next];
            let reachable_count = instance.reachable_count();
            let flow_intensity = instance.flow_intensity();
            instance.verify_flow_conservation(graph);
            if cfg!(debug_assertions) {
                let crossing = (0..graph.arc_count())
                    .filter(|&a| {
                        instance.is_reachable(graph.tail(a)) && !instance.is_reachable(graph.head(a))
                    })
                    .count() as u32;
                assert_eq!(crossing, flow_intensity);
            }
            log::debug!(
                "inertial instance finished: flow {flow_intensity}, reachable {reachable_count}"
            );
            let mut flags = instance.take_reachable_flags();
            return if reachable_count <= node_count / 2 {
                InertialCut {
                    is_on_smaller_side: flags,
                    smaller_side_size: reachable_count,
                    cut_size: flow_intensity,
                }
            } else {
                flags.negate();
                InertialCut {
                    is_on_smaller_side: flags,
                    smaller_side_size: node_count - reachable_count,
                    cut_size: flow_intensity,
                }
            };
        }

        instances[next].advance(graph);
        instances[next].verify_flow_conservation(graph);
    }
}

/// Computes the best of the four projection cuts.
pub fn compute_inertial_flow_cut(
    graph: &AdjacencyArray,
    geo_pos: &[GeoPos],
    min_balance: f64,
    use_dinic: bool,
) -> Result<InertialCut, CoreError> {
    if !(0.0..=0.5).contains(&min_balance) {
        return Err(CoreError::Config(format!(
            "min balance must be between 0.0 and 0.5, got {min_balance}"
        )));
    }
    if geo_pos.len() != graph.node_count() as usize {
        return Err(CoreError::Input(
            "geo position array must cover every node".into(),
        ));
    }
    Ok(if use_dinic {
        run_engines::<UnitDinic>(graph, geo_pos, min_balance)
    } else {
        run_engines::<FordFulkerson>(graph, geo_pos, min_balance)
    })
}

/// The vertex separator induced by the inertial cut: heads of the crossing
/// arcs, reached from the smaller side.
pub fn compute_inertial_flow_separator(
    graph: &AdjacencyArray,
    geo_pos: &[GeoPos],
    min_balance: f64,
    use_dinic: bool,
) -> Result<Vec<u32>, CoreError> {
    if graph.node_count() == 1 {
        return Ok(vec![0]);
    }
    let cut = compute_inertial_flow_cut(graph, geo_pos, min_balance, use_dinic)?;
    let mut separator: Vec<u32> = (0..graph.arc_count())
        .filter(|&a| {
            cut.is_on_smaller_side.get(graph.tail(a)) && !cut.is_on_smaller_side.get(graph.head(a))
        })
        .map(|a| graph.head(a))
        .collect();
    separator.sort_unstable();
    separator.dedup();
    Ok(separator)
}
