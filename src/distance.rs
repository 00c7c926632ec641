//! Distance labels feeding the pierce scorer.
//!
//! Before a cutter starts, this layer computes per-node distances from both
//! terminals -- hop counts via BFS, weighted distances via Dijkstra, or hop
//! counts seeded from a whole slice of the node order (the terminal-set
//! variant used with bulk distances). The labels are closed over when the
//! cutter asks for pierce scores.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::config::DistanceType;
use crate::cutter::{
    BasicCutter, CutterStateDump, PierceNodeScore, Terminals, SOURCE_SIDE, TARGET_SIDE,
};
use crate::error::CoreError;
use crate::graph::FlowGraph;
use crate::ids::BitSet;
use crate::search::{ScratchSpace, SearchAlgorithm};

const UNREACHED: i32 = i32::MAX;

/// Terminal configuration of one ensemble member.
#[derive(Clone, Debug, Default)]
pub struct TerminalInformation {
    /// Linear node order for bulk piercing and fallback pierce candidates.
    /// May be empty when explicit terminals are given.
    pub node_order: Vec<u32>,
    /// Rebuild the node order from `target_dist - source_dist` before the
    /// cutter starts. Requires explicit terminals.
    pub build_order_from_distance: bool,
    pub terminals: Terminals,
    /// Identifies the instance within its ensemble.
    pub cutter_id: usize,
}

fn hop_distances_from<G: FlowGraph>(
    graph: &G,
    scratch: &mut ScratchSpace,
    sources: &[u32],
    dist: &mut [i32],
) {
    dist.fill(UNREACHED);
    for &s in sources {
        dist[s as usize] = 0;
    }
    // The distance array doubles as the seen set.
    let queue = &mut scratch.node_space;
    let mut begin = 0usize;
    let mut end = sources.len();
    queue[..end].copy_from_slice(sources);
    while begin != end {
        let x = queue[begin];
        begin += 1;
        for xy in graph.out_arcs(x) {
            let y = graph.head(xy);
            if dist[y as usize] == UNREACHED {
                dist[y as usize] = dist[x as usize] + 1;
                queue[end] = y;
                end += 1;
            }
        }
    }
}

fn weighted_distances_from<G: FlowGraph>(graph: &G, source: u32, dist: &mut [i32]) {
    dist.fill(UNREACHED);
    dist[source as usize] = 0;
    let mut settled = BitSet::new(graph.node_count() as usize);
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0i64, source)));
    while let Some(Reverse((d, x))) = heap.pop() {
        if settled.get(x) {
            continue;
        }
        settled.set(x, true);
        for xy in graph.out_arcs(x) {
            let y = graph.head(xy);
            let candidate = d + graph.arc_weight(xy) as i64;
            if !settled.get(y) && candidate < dist[y as usize] as i64 {
                dist[y as usize] = candidate as i32;
                heap.push(Reverse((candidate, y)));
            }
        }
    }
}

/// A [`BasicCutter`] paired with precomputed distance labels for both sides.
pub struct DistanceAwareCutter {
    cutter: BasicCutter,
    node_dist: [Vec<i32>; 2],
    cutter_id: usize,
    terminals: Terminals,
}

impl DistanceAwareCutter {
    pub fn new<G: FlowGraph>(graph: &G, config: crate::config::Config) -> Self {
        let n = graph.node_count() as usize;
        Self {
            cutter: BasicCutter::new(graph, config.clone()),
            node_dist: [vec![0; n], vec![0; n]],
            cutter_id: 0,
            terminals: Terminals::default(),
        }
    }

    pub fn cutter_id(&self) -> usize {
        self.cutter_id
    }

    /// The terminal pair this instance was initialized with; `None` entries
    /// mean the ends of the node order.
    pub fn terminals(&self) -> Terminals {
        self.terminals
    }

    /// Computes distance labels, optionally rebuilds the node order from
    /// them, and initializes the wrapped cutter.
    pub fn init<G: FlowGraph>(
        &mut self,
        graph: &G,
        scratch: &mut ScratchSpace,
        dist_type: DistanceType,
        terminal_info: TerminalInformation,
        bulk_distance_factor: f64,
        bulk_order_threshold: f64,
    ) -> Result<(), CoreError> {
        let TerminalInformation {
            mut node_order,
            build_order_from_distance,
            terminals,
            cutter_id,
        } = terminal_info;
        self.cutter_id = cutter_id;
        self.terminals = terminals;

        if build_order_from_distance && (terminals.source.is_none() || terminals.target.is_none()) {
            return Err(CoreError::Input(
                "node order from distance requires explicit source and target".into(),
            ));
        }

        let source = match terminals.source {
            Some(s) => s,
            None => *node_order.first().ok_or_else(|| {
                CoreError::Input("no source given and node order is empty".into())
            })?,
        };
        let target = match terminals.target {
            Some(t) => t,
            None => {
                if node_order.len() < 2 {
                    return Err(CoreError::Input(
                        "no target given and node order has fewer than two nodes".into(),
                    ));
                }
                *node_order.last().unwrap()
            }
        };

        let terminal_set_size = ((node_order.len() as f64 * bulk_distance_factor) as usize).max(1);

        match dist_type {
            DistanceType::HopDistance => {
                hop_distances_from(graph, scratch, &[source], &mut self.node_dist[SOURCE_SIDE]);
                hop_distances_from(graph, scratch, &[target], &mut self.node_dist[TARGET_SIDE]);
            }
            DistanceType::HopDistanceTerminalSet => {
                if node_order.len() < 2 * terminal_set_size {
                    return Err(CoreError::Input(
                        "node order too small for terminal-set distances".into(),
                    ));
                }
                hop_distances_from(
                    graph,
                    scratch,
                    &node_order[..terminal_set_size],
                    &mut self.node_dist[SOURCE_SIDE],
                );
                hop_distances_from(
                    graph,
                    scratch,
                    &node_order[node_order.len() - terminal_set_size..],
                    &mut self.node_dist[TARGET_SIDE],
                );
            }
            DistanceType::WeightedDistance => {
                weighted_distances_from(graph, source, &mut self.node_dist[SOURCE_SIDE]);
                weighted_distances_from(graph, target, &mut self.node_dist[TARGET_SIDE]);
            }
            DistanceType::NoDistance => {
                self.node_dist[SOURCE_SIDE].fill(0);
                self.node_dist[TARGET_SIDE].fill(0);
            }
        }

        if build_order_from_distance {
            node_order = self.build_order_from_distance(graph, bulk_order_threshold);
        }

        self.cutter.init(graph, node_order, terminals)
    }

    /// Orders nodes by decreasing `target_dist - source_dist`, fully sorting
    /// only the bulk prefix and suffix. The middle stays partially ordered,
    /// which is all bulk piercing ever reads.
    fn build_order_from_distance<G: FlowGraph>(
        &self,
        graph: &G,
        bulk_order_threshold: f64,
    ) -> Vec<u32> {
        let n = graph.node_count() as usize;
        let mut order: Vec<u32> = (0..n as u32).collect();
        let score = |x: u32| -> i64 {
            self.node_dist[TARGET_SIDE][x as usize] as i64
                - self.node_dist[SOURCE_SIDE][x as usize] as i64
        };
        let max_bulk = ((bulk_order_threshold * n as f64) as usize).max(1);
        if max_bulk + 1 < n {
            order.select_nth_unstable_by(max_bulk, |&l, &r| score(r).cmp(&score(l)));
            order[..=max_bulk].sort_by(|&l, &r| score(r).cmp(&score(l)));
            let back = n - max_bulk - 1;
            order[max_bulk + 1..].select_nth_unstable_by(back.saturating_sub(max_bulk + 1), |&l, &r| {
                score(r).cmp(&score(l))
            });
            order[back..].sort_by(|&l, &r| score(r).cmp(&score(l)));
        } else {
            order.sort_by(|&l, &r| score(r).cmp(&score(l)));
        }
        order
    }

    pub fn advance<G: FlowGraph>(
        &mut self,
        graph: &G,
        scratch: &mut ScratchSpace,
        search: SearchAlgorithm,
        score: &PierceNodeScore,
    ) -> bool {
        let node_dist = &self.node_dist;
        let scorer = |x: u32, side: usize, causes_augmenting_path: bool, arc_weight: i32| {
            score.score(
                x,
                side,
                causes_augmenting_path,
                arc_weight,
                node_dist[side][x as usize] as i64,
                node_dist[1 - side][x as usize] as i64,
            )
        };
        self.cutter.advance(graph, scratch, search, &scorer)
    }

    pub fn does_next_advance_increase_flow<G: FlowGraph>(
        &mut self,
        graph: &G,
        score: &PierceNodeScore,
    ) -> bool {
        let node_dist = &self.node_dist;
        let scorer = |x: u32, side: usize, causes_augmenting_path: bool, arc_weight: i32| {
            score.score(
                x,
                side,
                causes_augmenting_path,
                arc_weight,
                node_dist[side][x as usize] as i64,
                node_dist[1 - side][x as usize] as i64,
            )
        };
        self.cutter.does_next_advance_increase_flow(graph, &scorer)
    }

    pub fn is_not_finished(&self) -> bool {
        self.cutter.is_not_finished()
    }

    pub fn cut_available(&self) -> bool {
        self.cutter.cut_available()
    }

    pub fn current_cut_side(&self) -> usize {
        self.cutter.current_cut_side()
    }

    pub fn current_smaller_cut_side_size(&self) -> u32 {
        self.cutter.current_smaller_cut_side_size()
    }

    pub fn current_cut(&self) -> &[u32] {
        self.cutter.current_cut()
    }

    pub fn flow_intensity(&self) -> u32 {
        self.cutter.flow_intensity()
    }

    pub fn assimilated_node_count(&self) -> u32 {
        self.cutter.assimilated_node_count()
    }

    pub fn is_on_smaller_side(&self, node: u32) -> bool {
        self.cutter.is_on_smaller_side(node)
    }

    pub fn dump_state<G: FlowGraph>(&self, graph: &G) -> CutterStateDump {
        self.cutter.dump_state(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn path(n: u32) -> crate::graph::AdjacencyArray {
        let mut b = GraphBuilder::new(n);
        for v in 0..n - 1 {
            b.add_arc(v, v + 1, 1);
        }
        b.symmetrize();
        b.build().unwrap()
    }

    #[test]
    fn hop_distances_count_arcs() {
        let g = path(5);
        let mut scratch = ScratchSpace::new(5);
        let mut dist = vec![0; 5];
        hop_distances_from(&g, &mut scratch, &[0], &mut dist);
        assert_eq!(dist, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn terminal_set_distances_take_the_closest_seed() {
        let g = path(5);
        let mut scratch = ScratchSpace::new(5);
        let mut dist = vec![0; 5];
        hop_distances_from(&g, &mut scratch, &[0, 1], &mut dist);
        assert_eq!(dist, vec![0, 0, 1, 2, 3]);
    }

    #[test]
    fn weighted_distances_follow_weights() {
        let mut b = GraphBuilder::new(3);
        b.add_arc(0, 1, 5);
        b.add_arc(1, 2, 7);
        b.add_arc(0, 2, 20);
        b.symmetrize();
        let g = b.build().unwrap();
        let mut dist = vec![0; 3];
        weighted_distances_from(&g, 0, &mut dist);
        assert_eq!(dist, vec![0, 5, 12]);
    }
}
