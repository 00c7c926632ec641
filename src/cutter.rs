//! The incremental cutter state machine.
//!
//! A [`BasicCutter`] grows two terminal sides inside one graph, maintains a
//! maximum flow between them, and exposes a sequence of minimum cuts of
//! increasing cardinality. Callers drive it one [`advance`](BasicCutter::advance)
//! at a time; between two cuts the cutter *pierces* -- it commits one node
//! (or a bulk of nodes drawn from a precomputed order) to the side with the
//! smaller reachable set, forcing the next cut to be more balanced.
//!
//! The machine never backtracks: flow intensity is monotone across advances
//! and each reported cut has a strictly larger smaller side than the one
//! before it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{AvoidAugmentingPath, Config, PierceRating};
use crate::error::CoreError;
use crate::flow::UnitFlow;
use crate::graph::FlowGraph;
use crate::ids::BitSet;
use crate::node_set::{AssimilatedNodeSet, ReachableNodeSet};
use crate::search::{ScratchSpace, SearchAlgorithm};

pub const SOURCE_SIDE: usize = 0;
pub const TARGET_SIDE: usize = 1;

/// Terminal nodes of one cutter instance. `None` means "take the ends of
/// the node order instead", which also enables bulk piercing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Terminals {
    pub source: Option<u32>,
    pub target: Option<u32>,
}

/// Lexicographic pierce score: avoids-augmenting-path flag, primary rating,
/// tie-break.
pub type PierceScore = (bool, i64, i64);

/// Rates a pierce candidate without distance labels. Arguments: node,
/// piercing side, whether adding the node opens an augmenting path, weight
/// of the cut-front arc. The distance-aware layer closes over its labels and
/// forwards to [`PierceNodeScore::score`].
pub trait ScorePierceNode {
    fn score(&self, node: u32, side: usize, causes_augmenting_path: bool, arc_weight: i32)
        -> PierceScore;
}

impl<F> ScorePierceNode for F
where
    F: Fn(u32, usize, bool, i32) -> PierceScore,
{
    fn score(
        &self,
        node: u32,
        side: usize,
        causes_augmenting_path: bool,
        arc_weight: i32,
    ) -> PierceScore {
        self(node, side, causes_augmenting_path, arc_weight)
    }
}

/// Configured pierce rating with a deterministic per-seed hash for the
/// random variants.
#[derive(Clone, Debug)]
pub struct PierceNodeScore {
    config: Config,
    hash_factor: u64,
    hash_offset: u64,
}

const HASH_MODULO: u64 = (1u64 << 31) - 1;

impl PierceNodeScore {
    pub fn new(config: Config) -> Self {
        let mut rng = StdRng::seed_from_u64(config.random_seed);
        let _: u64 = rng.r#gen();
        let hash_factor = rng.r#gen::<u64>() % HASH_MODULO;
        let hash_offset = rng.r#gen::<u64>() % HASH_MODULO;
        Self {
            config,
            hash_factor,
            hash_offset,
        }
    }

    fn random_number(&self, node: u32, side: usize) -> i64 {
        let key = ((node as u64) << 1) | side as u64;
        ((self.hash_factor.wrapping_mul(key) + self.hash_offset) % HASH_MODULO) as i64
    }
}

impl PierceNodeScore {
    /// Full rating with distance labels. `source_dist` is the distance from
    /// the piercing side's own terminal, `target_dist` from the other one.
    pub fn score(
        &self,
        node: u32,
        side: usize,
        causes_augmenting_path: bool,
        arc_weight: i32,
        source_dist: i64,
        target_dist: i64,
    ) -> PierceScore {
        use PierceRating::*;
        let mut secondary = 0i64;
        let mut primary = match self.config.pierce_rating {
            MaxTargetMinusSourceHopDist | MaxTargetMinusSourceWeightDist => {
                target_dist - source_dist
            }
            MaxTargetHopDist | MaxTargetWeightDist => target_dist,
            MinSourceHopDist | MinSourceWeightDist => -source_dist,
            Oldest => 0,
            Random => self.random_number(node, side),
            MaxArcWeight => arc_weight as i64,
            MinArcWeight => -(arc_weight as i64),
            CircularHop | CircularWeight => {
                if side == SOURCE_SIDE {
                    -source_dist
                } else {
                    target_dist
                }
            }
            MaxTargetMinusSourceHopDistWithSourceDistTieBreak => {
                secondary = source_dist;
                target_dist - source_dist
            }
            MaxTargetMinusSourceHopDistWithCloserDistTieBreak => {
                secondary = if source_dist < target_dist {
                    -source_dist
                } else {
                    -target_dist
                };
                target_dist - source_dist
            }
        };

        let avoids = match self.config.avoid_augmenting_path {
            AvoidAugmentingPath::DoNotAvoid => false,
            AvoidAugmentingPath::AvoidAndPickBest => !causes_augmenting_path,
            AvoidAugmentingPath::AvoidAndPickOldest => {
                if !causes_augmenting_path {
                    primary = i64::MAX;
                }
                !causes_augmenting_path
            }
            AvoidAugmentingPath::AvoidAndPickRandom => {
                if !causes_augmenting_path {
                    primary = self.random_number(node, side);
                }
                !causes_augmenting_path
            }
        };

        (avoids, primary, secondary)
    }
}

/// Snapshot of the full cutter state, for debugging front-ends.
#[derive(Clone, Debug)]
pub struct CutterStateDump {
    pub source_assimilated: BitSet,
    pub target_assimilated: BitSet,
    pub source_reachable: BitSet,
    pub target_reachable: BitSet,
    pub flow: BitSet,
}

/// One source/target configuration advancing toward increasingly balanced
/// cuts.
pub struct BasicCutter {
    assimilated: [AssimilatedNodeSet; 2],
    reachable: [ReachableNodeSet; 2],
    flow: UnitFlow,
    flow_intensity: u32,
    can_advance: bool,
    has_cut: bool,
    side: usize,
    node_order: Vec<u32>,
    order_pointer: [i64; 2],
    perform_bulk_piercing: bool,
    config: Config,
}

impl BasicCutter {
    pub fn new<G: FlowGraph>(graph: &G, config: Config) -> Self {
        let n = graph.node_count();
        Self {
            assimilated: [AssimilatedNodeSet::new(n), AssimilatedNodeSet::new(n)],
            reachable: [ReachableNodeSet::new(n), ReachableNodeSet::new(n)],
            flow: UnitFlow::new(graph.arc_count()),
            flow_intensity: 0,
            can_advance: false,
            has_cut: false,
            side: SOURCE_SIDE,
            node_order: Vec::new(),
            order_pointer: [0, 0],
            perform_bulk_piercing: false,
            config,
        }
    }

    /// Resets the cutter onto fresh terminals. With an explicit pair the
    /// cutter runs in single-terminal mode; with a node order and no pair it
    /// bulk-seeds both ends of the order.
    pub fn init<G: FlowGraph>(
        &mut self,
        graph: &G,
        node_order: Vec<u32>,
        terminals: Terminals,
    ) -> Result<(), CoreError> {
        let n = graph.node_count();
        if n < 2 {
            return Err(CoreError::Input(
                "cutter needs at least two nodes".into(),
            ));
        }
        for side in [SOURCE_SIDE, TARGET_SIDE] {
            self.assimilated[side].clear();
            self.reachable[side].clear();
        }
        self.node_order = node_order;
        self.order_pointer = [0, n as i64 - 1];
        self.flow.clear();
        self.flow_intensity = 0;
        self.has_cut = false;
        self.side = SOURCE_SIDE;

        self.perform_bulk_piercing =
            terminals.source.is_none() && terminals.target.is_none() && !self.node_order.is_empty();

        if self.perform_bulk_piercing {
            // Equidistant seeding; falls back to the plain order ends when
            // the order is too short for a bulk step.
            if !self.bulk_piercing(graph, SOURCE_SIDE, self.config.initial_assimilated_fraction, true)
            {
                let front = self.node_order[0];
                self.add_terminal(SOURCE_SIDE, front);
            }
            if !self.bulk_piercing(graph, TARGET_SIDE, self.config.initial_assimilated_fraction, true)
            {
                let back = *self.node_order.last().unwrap();
                self.add_terminal(TARGET_SIDE, back);
            }
        } else {
            let (Some(source), Some(target)) = (terminals.source, terminals.target) else {
                return Err(CoreError::Input(
                    "single-terminal mode needs both source and target".into(),
                ));
            };
            if source >= n || target >= n {
                return Err(CoreError::Input(format!(
                    "terminal out of bounds: source {source}, target {target}, node count {n}"
                )));
            }
            if source == target {
                return Err(CoreError::Input("source and target must differ".into()));
            }
            self.add_terminal(SOURCE_SIDE, source);
            self.add_terminal(TARGET_SIDE, target);
        }

        self.can_advance = true;
        self.check_invariants(graph);
        Ok(())
    }

    fn add_terminal(&mut self, side: usize, node: u32) {
        self.assimilated[side].add_node(node);
        self.assimilated[side].add_extra_node(node);
        self.reachable[side].add_node(node);
        self.reachable[side].add_extra_node(node);
    }

    /// Advances the state machine one step. Returns `false` once the cutter
    /// is exhausted; after that, further calls do nothing.
    pub fn advance<G: FlowGraph, S: ScorePierceNode>(
        &mut self,
        graph: &G,
        scratch: &mut ScratchSpace,
        search: SearchAlgorithm,
        score: &S,
    ) -> bool {
        debug_assert!(self.can_advance);
        let mut has_pierced = false;

        if self.has_cut {
            self.check_invariants(graph);
            self.side = self.current_cut_side();
            let side = self.side;
            if self.assimilated[side].inside_count() >= graph.node_count() / 2 {
                self.can_advance = false;
                return false;
            }
            self.reachable[side].clear_extra_nodes();
            self.assimilated[side].clear_extra_nodes();

            has_pierced = true;

            // Bulk piercing only pays off when the flow is about to grow
            // anyway; otherwise pick the single best front node.
            if !self.does_next_advance_increase_flow(graph, score)
                || !self.bulk_piercing(graph, side, self.config.bulk_step_fraction, false)
            {
                let Some(pierce_node) = self.select_pierce_node(graph, side, score) else {
                    self.can_advance = false;
                    return false;
                };
                debug_assert!(!self.assimilated[1 - side].contains(pierce_node));
                self.add_terminal(side, pierce_node);
            }

            self.has_cut = false;
        }

        self.advance_flow(graph, scratch, search, self.side, has_pierced);

        if self.has_cut {
            self.grow_assimilated_sets(graph, scratch, search);
        }

        self.check_invariants(graph);
        self.can_advance = true;
        true
    }

    /// Whether the next advance is forced to augment the flow: either the
    /// pierce candidate lies in the other side's reachable set, or there is
    /// no candidate at all.
    pub fn does_next_advance_increase_flow<G: FlowGraph, S: ScorePierceNode>(
        &mut self,
        graph: &G,
        score: &S,
    ) -> bool {
        debug_assert!(self.cut_available());
        let side = self.current_cut_side();
        if self.assimilated[side].inside_count() >= graph.node_count() / 2 {
            return true;
        }
        match self.select_pierce_node(graph, side, score) {
            None => true,
            Some(node) => self.reachable[1 - side].contains(node),
        }
    }

    pub fn is_not_finished(&self) -> bool {
        self.can_advance
    }

    pub fn cut_available(&self) -> bool {
        self.has_cut
    }

    /// The side whose assimilated set defines the current cut: the one whose
    /// reachable set has stabilized, smaller assimilated side first.
    pub fn current_cut_side(&self) -> usize {
        let src_stable = self.reachable[SOURCE_SIDE].inside_count()
            == self.assimilated[SOURCE_SIDE].inside_count();
        let tgt_stable = self.reachable[TARGET_SIDE].inside_count()
            == self.assimilated[TARGET_SIDE].inside_count();
        if src_stable
            && (!tgt_stable
                || self.assimilated[SOURCE_SIDE].inside_count()
                    <= self.assimilated[TARGET_SIDE].inside_count())
        {
            SOURCE_SIDE
        } else {
            TARGET_SIDE
        }
    }

    pub fn current_smaller_cut_side_size(&self) -> u32 {
        self.assimilated[self.current_cut_side()].inside_count()
    }

    pub fn current_cut(&self) -> &[u32] {
        self.assimilated[self.current_cut_side()].cut_front()
    }

    pub fn flow_intensity(&self) -> u32 {
        self.flow_intensity
    }

    pub fn assimilated_node_count(&self) -> u32 {
        self.assimilated[SOURCE_SIDE].inside_count() + self.assimilated[TARGET_SIDE].inside_count()
    }

    pub fn is_on_smaller_side(&self, node: u32) -> bool {
        self.assimilated[self.current_cut_side()].contains(node)
    }

    pub fn dump_state<G: FlowGraph>(&self, graph: &G) -> CutterStateDump {
        let n = graph.node_count() as usize;
        let mut dump = CutterStateDump {
            source_assimilated: BitSet::new(n),
            target_assimilated: BitSet::new(n),
            source_reachable: BitSet::new(n),
            target_reachable: BitSet::new(n),
            flow: BitSet::new(graph.arc_count() as usize),
        };
        for x in 0..graph.node_count() {
            dump.source_assimilated
                .set(x, self.assimilated[SOURCE_SIDE].contains(x));
            dump.target_assimilated
                .set(x, self.assimilated[TARGET_SIDE].contains(x));
            dump.source_reachable
                .set(x, self.reachable[SOURCE_SIDE].contains(x));
            dump.target_reachable
                .set(x, self.reachable[TARGET_SIDE].contains(x));
        }
        for a in 0..graph.arc_count() {
            dump.flow.set(a, self.flow.get(a) != 0);
        }
        dump
    }

    fn node_order_exceeded(&self, side: usize) -> bool {
        self.remaining_bulk_nodes(side) <= 0
    }

    fn remaining_bulk_nodes(&self, side: usize) -> i64 {
        let order_len = self.node_order.len() as f64;
        let threshold = self.config.bulk_assimilation_order_threshold;
        if side == SOURCE_SIDE {
            (threshold * order_len) as i64 - self.order_pointer[SOURCE_SIDE]
        } else {
            self.order_pointer[TARGET_SIDE] - ((1.0 - threshold) * order_len) as i64
        }
    }

    /// Next unassimilated node from the side's end of the order. The cursor
    /// stays on the returned node until it gets assimilated, so repeated
    /// calls return the same node. `force` overrides the order threshold.
    fn next_node_from_order(&mut self, side: usize, force: bool) -> Option<u32> {
        while self.order_pointer[SOURCE_SIDE] <= self.order_pointer[TARGET_SIDE]
            && (force || !self.node_order_exceeded(side))
        {
            let x = self.node_order[self.order_pointer[side] as usize];
            if !self.assimilated[SOURCE_SIDE].contains(x)
                && !self.assimilated[TARGET_SIDE].contains(x)
            {
                return Some(x);
            }
            if side == SOURCE_SIDE {
                self.order_pointer[SOURCE_SIDE] += 1;
            } else {
                self.order_pointer[TARGET_SIDE] -= 1;
            }
        }
        None
    }

    fn bulk_piercing<G: FlowGraph>(
        &mut self,
        graph: &G,
        side: usize,
        max_step_fraction: f64,
        overrule_adaptive: bool,
    ) -> bool {
        // The equidistant variant is only sound as initial seeding.
        if overrule_adaptive {
            self.equidistant_bulk_piercing(graph, side, max_step_fraction)
        } else {
            self.adaptive_bulk_piercing(graph, side, max_step_fraction)
        }
    }

    fn all_neighbors_in_side<G: FlowGraph>(&self, graph: &G, node: u32, side: usize) -> bool {
        graph
            .out_arcs(node)
            .all(|xy| self.assimilated[side].contains(graph.head(xy)))
    }

    fn adaptive_bulk_piercing<G: FlowGraph>(
        &mut self,
        graph: &G,
        side: usize,
        chunk_size: f64,
    ) -> bool {
        if !self.perform_bulk_piercing || self.node_order_exceeded(side) {
            return false;
        }
        let n = graph.node_count() as f64;
        if self.assimilated[side].inside_count() as f64
            > self.config.bulk_assimilation_threshold * n
        {
            return false;
        }

        let budget = (1.0 - chunk_size) * n / 2.0 - self.assimilated[side].inside_count() as f64;
        let nodes_to_assimilate = ((chunk_size * budget) as i64).max(1);

        let mut newly_assimilated = Vec::new();
        while (newly_assimilated.len() as i64) < nodes_to_assimilate {
            let Some(node) = self.next_node_from_order(side, false) else {
                break;
            };
            self.assimilated[side].add_node(node);
            self.reachable[side].add_node(node);
            newly_assimilated.push(node);
        }
        for &node in &newly_assimilated {
            // Interior nodes cannot contribute frontier, skip them as roots.
            if !self.all_neighbors_in_side(graph, node, side) {
                self.assimilated[side].add_extra_node(node);
                self.reachable[side].add_extra_node(node);
            }
        }
        !newly_assimilated.is_empty()
    }

    fn equidistant_bulk_piercing<G: FlowGraph>(
        &mut self,
        graph: &G,
        side: usize,
        max_step_fraction: f64,
    ) -> bool {
        if !self.perform_bulk_piercing {
            return false;
        }
        let n = graph.node_count() as f64;
        if self.assimilated[side].inside_count() as f64
            > self.config.bulk_assimilation_threshold * n
        {
            return false;
        }
        let mut nodes_to_assimilate = (n * max_step_fraction) as i64;
        if nodes_to_assimilate <= 1 {
            return false;
        }

        let mut newly_assimilated: Vec<u32> = Vec::new();
        while newly_assimilated.is_empty() && self.remaining_bulk_nodes(side) > 1 {
            nodes_to_assimilate = nodes_to_assimilate.min(self.remaining_bulk_nodes(side));
            for _ in 0..nodes_to_assimilate {
                let pos = self.order_pointer[side];
                let node = self.node_order[pos as usize];
                if !self.assimilated[SOURCE_SIDE].contains(node)
                    && !self.assimilated[TARGET_SIDE].contains(node)
                {
                    self.assimilated[side].add_node(node);
                    self.reachable[side].add_node(node);
                    newly_assimilated.push(node);
                }
                if side == SOURCE_SIDE {
                    self.order_pointer[SOURCE_SIDE] += 1;
                } else {
                    self.order_pointer[TARGET_SIDE] -= 1;
                }
            }
        }

        for &node in &newly_assimilated {
            if !self.all_neighbors_in_side(graph, node, side) {
                self.assimilated[side].add_extra_node(node);
                self.reachable[side].add_extra_node(node);
            }
        }
        !newly_assimilated.is_empty()
    }

    fn select_pierce_node<G: FlowGraph, S: ScorePierceNode>(
        &mut self,
        graph: &G,
        side: usize,
        score: &S,
    ) -> Option<u32> {
        let mut pierce_node = None;
        let mut max_score: PierceScore = (false, i64::MIN, i64::MIN);
        for &xy in self.assimilated[side].cut_front() {
            let y = graph.head(xy);
            if self.assimilated[1 - side].contains(y) {
                continue;
            }
            let s = score.score(
                y,
                side,
                self.reachable[1 - side].contains(y),
                graph.arc_weight(xy),
            );
            if s > max_score {
                max_score = s;
                pierce_node = Some(y);
            }
        }

        if pierce_node.is_none() {
            pierce_node = self.next_node_from_order(side, true);
        }
        debug_assert!(
            pierce_node.is_some()
                || self.assimilated_node_count() == graph.node_count(),
            "no pierce candidate although unassimilated nodes remain"
        );
        pierce_node
    }

    fn is_saturated<G: FlowGraph>(&self, graph: &G, direction: usize, arc: u32) -> bool {
        let arc = if direction == TARGET_SIDE {
            graph.back_arc(arc)
        } else {
            arc
        };
        graph.capacity(arc) == self.flow.get(arc)
    }

    fn advance_flow<G: FlowGraph>(
        &mut self,
        graph: &G,
        scratch: &mut ScratchSpace,
        search: SearchAlgorithm,
        pierced_side: usize,
        has_pierced: bool,
    ) {
        let my_source_side = pierced_side;
        let my_target_side = 1 - pierced_side;

        let mut target_hit = None;
        if self.reachable[my_source_side].can_grow() {
            let (assimilated, reachable, flow) =
                (&self.assimilated, &mut self.reachable, &self.flow);
            let target_set = &assimilated[my_target_side];
            reachable[my_source_side].grow(
                graph,
                scratch,
                search,
                |x| {
                    if target_set.contains(x) {
                        target_hit = Some(x);
                        false
                    } else {
                        true
                    }
                },
                |xy| {
                    let arc = if my_source_side == TARGET_SIDE {
                        graph.back_arc(xy)
                    } else {
                        xy
                    };
                    graph.capacity(arc) != flow.get(arc)
                },
                |_| {},
            );
        }

        let was_flow_augmented = if let Some(hit) = target_hit {
            self.check_flow_conservation(graph);
            {
                let (assimilated, reachable, flow) =
                    (&self.assimilated, &self.reachable, &mut self.flow);
                let source_set = &assimilated[my_source_side];
                reachable[my_source_side].for_arcs_in_path_to(
                    graph,
                    |x| source_set.contains(x),
                    hit,
                    |xy| {
                        if pierced_side == SOURCE_SIDE {
                            flow.increase(graph, xy);
                        } else {
                            flow.decrease(graph, xy);
                        }
                    },
                );
            }
            self.check_flow_conservation(graph);
            let assimilated = &self.assimilated[my_source_side];
            self.reachable[my_source_side].reset(assimilated, true);
            self.flow_intensity += 1;
            self.check_flow_conservation(graph);
            true
        } else {
            false
        };

        if !was_flow_augmented {
            self.has_cut = true;
            if !has_pierced {
                // A pierce without flow change leaves the backward-reachable
                // set valid; only a real advance invalidates it.
                self.grow_backward_reachable(graph, scratch, search, my_target_side);
            }
        }
    }

    fn grow_backward_reachable<G: FlowGraph>(
        &mut self,
        graph: &G,
        scratch: &mut ScratchSpace,
        search: SearchAlgorithm,
        my_target_side: usize,
    ) {
        let assimilated = &self.assimilated[my_target_side];
        self.reachable[my_target_side].reset(assimilated, false);
        if !self.reachable[my_target_side].can_grow() {
            return;
        }
        let flow = &self.flow;
        self.reachable[my_target_side].grow(
            graph,
            scratch,
            search,
            |_| true,
            |xy| {
                let arc = if my_target_side == TARGET_SIDE {
                    graph.back_arc(xy)
                } else {
                    xy
                };
                graph.capacity(arc) != flow.get(arc)
            },
            |_| {},
        );
    }

    fn grow_assimilated_sets<G: FlowGraph>(
        &mut self,
        graph: &G,
        scratch: &mut ScratchSpace,
        search: SearchAlgorithm,
    ) {
        let side = if self.reachable[SOURCE_SIDE].inside_count()
            <= self.reachable[TARGET_SIDE].inside_count()
        {
            SOURCE_SIDE
        } else {
            TARGET_SIDE
        };
        if self.assimilated[side].can_grow() {
            let flow = &self.flow;
            self.assimilated[side].grow(
                graph,
                scratch,
                search,
                |_| true,
                |xy| {
                    let arc = if side == TARGET_SIDE {
                        graph.back_arc(xy)
                    } else {
                        xy
                    };
                    graph.capacity(arc) != flow.get(arc)
                },
                |xy| flow.get(xy) != 0,
            );
        }
        self.assimilated[side].shrink_cut_front(graph);
    }

    fn check_flow_conservation<G: FlowGraph>(&self, graph: &G) {
        if cfg!(debug_assertions) {
            for x in 0..graph.node_count() {
                if !self.assimilated[SOURCE_SIDE].contains(x)
                    && !self.assimilated[TARGET_SIDE].contains(x)
                {
                    let surplus: i32 = graph.out_arcs(x).map(|xy| self.flow.get(xy)).sum();
                    assert_eq!(
                        surplus, 0,
                        "flow must be conserved outside of the assimilated sides"
                    );
                }
            }
        }
    }

    fn check_invariants<G: FlowGraph>(&self, graph: &G) {
        if !cfg!(debug_assertions) {
            return;
        }
        for side in [SOURCE_SIDE, TARGET_SIDE] {
            assert!(
                self.assimilated[side].inside_count() > 0,
                "each side must contain at least one node"
            );
            for x in 0..graph.node_count() {
                if self.assimilated[side].contains(x) {
                    assert!(
                        self.reachable[side].contains(x),
                        "assimilated must be a subset of reachable"
                    );
                }
            }
        }

        if self.has_cut {
            for x in 0..graph.node_count() {
                assert!(
                    !self.assimilated[SOURCE_SIDE].contains(x)
                        || !self.assimilated[TARGET_SIDE].contains(x),
                    "a node can not be assimilated by both sides"
                );
            }
        }

        self.check_flow_conservation(graph);

        if self.has_cut {
            let smaller = if self.reachable[SOURCE_SIDE].inside_count()
                <= self.reachable[TARGET_SIDE].inside_count()
            {
                SOURCE_SIDE
            } else {
                TARGET_SIDE
            };
            assert_eq!(
                self.reachable[smaller].inside_count(),
                self.assimilated[smaller].inside_count()
            );
            for x in 0..graph.node_count() {
                assert_eq!(
                    self.reachable[smaller].contains(x),
                    self.assimilated[smaller].contains(x)
                );
            }
            assert_eq!(self.flow_intensity as usize, self.current_cut().len());

            // The stored reachable sets must equal a from-scratch recompute.
            let mut scratch = ScratchSpace::new(graph.node_count());
            for side in [SOURCE_SIDE, TARGET_SIDE] {
                let mut check = ReachableNodeSet::new(graph.node_count());
                check.reset(&self.assimilated[side], false);
                check.clear_extra_nodes();
                for x in 0..graph.node_count() {
                    if self.assimilated[side].contains(x) {
                        check.add_extra_node(x);
                    }
                }
                let flow = &self.flow;
                check.grow(
                    graph,
                    &mut scratch,
                    SearchAlgorithm::PseudoDepthFirst,
                    |_| true,
                    |xy| {
                        let arc = if side == TARGET_SIDE {
                            graph.back_arc(xy)
                        } else {
                            xy
                        };
                        graph.capacity(arc) != flow.get(arc)
                    },
                    |_| {},
                );
                assert_eq!(self.reachable[side].inside_count(), check.inside_count());
                for x in 0..graph.node_count() {
                    assert_eq!(self.reachable[side].contains(x), check.contains(x));
                }
            }
        }
    }
}
