//! The cutter ensemble: many terminal configurations advancing in lockstep.
//!
//! [`MultiCutter`] owns a pool of [`DistanceAwareCutter`]s and two execution
//! modes. *Ordered* enumeration advances every instance at the minimum
//! current flow intensity until it reaches its next cut, then emits the cut
//! with the largest smaller side at that intensity -- each emitted cut
//! strictly dominates the previous one. *Unordered* enumeration lets worker
//! threads grab whichever active instance currently has the smallest flow,
//! advance it one step, and report cuts as they appear; it is faster but
//! gives no emission order.
//!
//! [`CutterFactory`] produces the terminal configurations: evenly fanned
//! geometric projection orders plus random source-target pairs.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{Config, DistanceType, GraphSearchAlgorithm};
use crate::cutter::{PierceNodeScore, Terminals};
use crate::distance::{DistanceAwareCutter, TerminalInformation};
use crate::error::CoreError;
use crate::geo::{unit_direction, GeoPos};
use crate::graph::FlowGraph;
use crate::search::{ScratchSpace, SearchAlgorithm};

/// Graphs at or below this node count run the ensemble sequentially; the
/// fork/join overhead dominates below it.
pub const PARALLELISM_CUTOFF: u32 = 5000;

struct CutterSlot {
    cutter: Mutex<DistanceAwareCutter>,
    active: AtomicBool,
    /// Published copy of the cutter's flow intensity so schedulers can rank
    /// instances without taking the lock.
    intensity: AtomicU32,
}

/// Pool of cutters advancing on minimum current flow intensity.
pub struct MultiCutter {
    slots: Vec<CutterSlot>,
    config: Config,
}

impl MultiCutter {
    pub fn new(config: Config) -> Self {
        Self {
            slots: Vec::new(),
            config,
        }
    }

    pub fn cutter_count(&self) -> usize {
        self.slots.len()
    }

    /// Creates one cutter per terminal configuration and initializes them,
    /// in parallel above the cutoff.
    pub fn init<G: FlowGraph>(
        &mut self,
        graph: &G,
        dist_type: DistanceType,
        terminal_info: Vec<TerminalInformation>,
    ) -> Result<(), CoreError> {
        self.slots.clear();
        for _ in 0..terminal_info.len() {
            self.slots.push(CutterSlot {
                cutter: Mutex::new(DistanceAwareCutter::new(graph, self.config.clone())),
                active: AtomicBool::new(true),
                intensity: AtomicU32::new(0),
            });
        }

        let bulk_distance_factor = self.config.bulk_distance_factor;
        let bulk_order_threshold = self.config.bulk_assimilation_order_threshold;
        let init_one = |scratch: &mut ScratchSpace,
                        (slot, ti): (&CutterSlot, TerminalInformation)|
         -> Result<(), CoreError> {
            scratch.ensure(graph.node_count());
            slot.cutter.lock().unwrap().init(
                graph,
                scratch,
                dist_type,
                ti,
                bulk_distance_factor,
                bulk_order_threshold,
            )
        };

        if graph.node_count() > PARALLELISM_CUTOFF && self.config.thread_count > 1 {
            self.slots
                .par_iter()
                .zip(terminal_info.into_par_iter())
                .try_for_each_init(
                    || ScratchSpace::new(graph.node_count()),
                    |scratch, pair| init_one(scratch, pair),
                )
        } else {
            let mut scratch = ScratchSpace::new(graph.node_count());
            for pair in self.slots.iter().zip(terminal_info.into_iter()) {
                init_one(&mut scratch, pair)?;
            }
            Ok(())
        }
    }

    /// Dumps the full state of the single instance. Only meaningful -- and
    /// only allowed -- when the pool holds exactly one cutter.
    pub fn dump_state<G: FlowGraph>(
        &self,
        graph: &G,
    ) -> Result<crate::cutter::CutterStateDump, CoreError> {
        if self.slots.len() != 1 {
            return Err(CoreError::Input(
                "state dumps need a single cutter instance".into(),
            ));
        }
        Ok(self.slots[0].cutter.lock().unwrap().dump_state(graph))
    }

    /// Enumerates cuts. `shall_continue` is read between advances and can
    /// deactivate an instance; `report_cut` receives every surviving cut.
    /// With `report_cuts_in_order` the emission obeys the dominance order;
    /// without it, large graphs run the unordered parallel scheduler.
    pub fn enum_cuts<G, C, R>(
        &mut self,
        graph: &G,
        search: SearchAlgorithm,
        score: &PierceNodeScore,
        shall_continue: &C,
        report_cut: &R,
        report_cuts_in_order: bool,
    ) where
        G: FlowGraph,
        C: Fn(&DistanceAwareCutter) -> bool + Sync,
        R: Fn(&DistanceAwareCutter, usize) + Sync,
    {
        if !report_cuts_in_order
            && graph.node_count() > PARALLELISM_CUTOFF
            && self.config.thread_count > 1
        {
            self.parallel_enum_cuts(graph, search, score, shall_continue, report_cut);
            return;
        }
        self.ordered_enum_cuts(graph, search, score, shall_continue, report_cut);
    }

    fn advance_to_next_cut<G: FlowGraph>(
        slot: &CutterSlot,
        cutter: &mut DistanceAwareCutter,
        graph: &G,
        scratch: &mut ScratchSpace,
        search: SearchAlgorithm,
        score: &PierceNodeScore,
    ) {
        if cutter.advance(graph, scratch, search, score) {
            // Skip dominated cuts: keep piercing while it cannot change the
            // flow, so only the most balanced cut per intensity surfaces.
            while cutter.cut_available() && !cutter.does_next_advance_increase_flow(graph, score) {
                if !cutter.advance(graph, scratch, search, score) {
                    slot.active.store(false, Ordering::Release);
                    break;
                }
            }
        }
        slot.intensity.store(cutter.flow_intensity(), Ordering::Release);
    }

    fn ordered_enum_cuts<G, C, R>(
        &mut self,
        graph: &G,
        search: SearchAlgorithm,
        score: &PierceNodeScore,
        shall_continue: &C,
        report_cut: &R,
    ) where
        G: FlowGraph,
        C: Fn(&DistanceAwareCutter) -> bool + Sync,
        R: Fn(&DistanceAwareCutter, usize) + Sync,
    {
        let parallel =
            graph.node_count() > PARALLELISM_CUTOFF && self.config.thread_count > 1;

        let mut minimum_flow_intensity = u32::MAX;
        let mut all_cutters_with_min_flow_have_cut = true;

        let update_min_flow = |slots: &[CutterSlot],
                               minimum_flow_intensity: &mut u32,
                               all_with_cut: &mut bool| {
            *minimum_flow_intensity = u32::MAX;
            for slot in slots {
                if !slot.active.load(Ordering::Acquire) {
                    continue;
                }
                let cutter = slot.cutter.lock().unwrap();
                if !cutter.is_not_finished() {
                    continue;
                }
                if cutter.flow_intensity() < *minimum_flow_intensity {
                    *all_with_cut = cutter.cut_available();
                    *minimum_flow_intensity = cutter.flow_intensity();
                } else if cutter.flow_intensity() == *minimum_flow_intensity {
                    *all_with_cut &= cutter.cut_available();
                }
            }
        };

        update_min_flow(
            &self.slots,
            &mut minimum_flow_intensity,
            &mut all_cutters_with_min_flow_have_cut,
        );

        let mut current_smaller_side_size = 0u32;

        loop {
            let mut active_cutter_ids = Vec::new();
            for (i, slot) in self.slots.iter().enumerate() {
                if !slot.active.load(Ordering::Acquire) {
                    continue;
                }
                let cutter = slot.cutter.lock().unwrap();
                if cutter.is_not_finished()
                    && cutter.flow_intensity() == minimum_flow_intensity
                    && (!cutter.cut_available() || all_cutters_with_min_flow_have_cut)
                {
                    active_cutter_ids.push(i);
                }
            }

            let handle_cutter = |scratch: &mut ScratchSpace, cutter_id: usize| {
                let slot = &self.slots[cutter_id];
                let mut cutter = slot.cutter.lock().unwrap();
                if !shall_continue(&cutter) {
                    slot.active.store(false, Ordering::Release);
                    return;
                }
                scratch.ensure(graph.node_count());
                Self::advance_to_next_cut(slot, &mut cutter, graph, scratch, search, score);
            };

            if parallel {
                active_cutter_ids.par_iter().for_each_init(
                    || ScratchSpace::new(graph.node_count()),
                    |scratch, &id| handle_cutter(scratch, id),
                );
            } else {
                let mut scratch = ScratchSpace::new(graph.node_count());
                for &id in &active_cutter_ids {
                    handle_cutter(&mut scratch, id);
                }
            }

            update_min_flow(
                &self.slots,
                &mut minimum_flow_intensity,
                &mut all_cutters_with_min_flow_have_cut,
            );

            if minimum_flow_intensity == u32::MAX {
                return;
            }

            if all_cutters_with_min_flow_have_cut {
                let mut best_cutter_id = None;
                let mut best_cutter_weight = 0u32;
                for (i, slot) in self.slots.iter().enumerate() {
                    let cutter = slot.cutter.lock().unwrap();
                    if cutter.is_not_finished()
                        && cutter.flow_intensity() == minimum_flow_intensity
                        && cutter.current_smaller_cut_side_size() > best_cutter_weight
                    {
                        best_cutter_id = Some(i);
                        best_cutter_weight = cutter.current_smaller_cut_side_size();
                    }
                }

                let Some(best_cutter_id) = best_cutter_id else {
                    continue;
                };
                if best_cutter_weight <= current_smaller_side_size {
                    continue;
                }
                current_smaller_side_size = best_cutter_weight;
                let cutter = self.slots[best_cutter_id].cutter.lock().unwrap();
                report_cut(&cutter, cutter.cutter_id());
            }
        }
    }

    fn parallel_enum_cuts<G, C, R>(
        &mut self,
        graph: &G,
        search: SearchAlgorithm,
        score: &PierceNodeScore,
        shall_continue: &C,
        report_cut: &R,
    ) where
        G: FlowGraph,
        C: Fn(&DistanceAwareCutter) -> bool + Sync,
        R: Fn(&DistanceAwareCutter, usize) + Sync,
    {
        let slots = &self.slots;
        let acquired_cutters = AtomicUsize::new(0);

        // Among unheld active cutters, greedily take the one with the
        // smallest published flow intensity.
        let get_cutter_to_work_on = || {
            let mut by_flow: Vec<(usize, u32)> = slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.active.load(Ordering::Acquire))
                .map(|(i, s)| (i, s.intensity.load(Ordering::Acquire)))
                .collect();
            by_flow.sort_by_key(|&(_, f)| f);
            for (i, _) in by_flow {
                if let Ok(guard) = slots[i].cutter.try_lock() {
                    acquired_cutters.fetch_add(1, Ordering::AcqRel);
                    return Some((i, guard));
                }
            }
            None
        };

        (0..slots.len()).into_par_iter().for_each_init(
            || ScratchSpace::new(graph.node_count()),
            |scratch, task_id| {
                scratch.ensure(graph.node_count());
                let mut held = match slots[task_id].cutter.try_lock() {
                    Ok(guard) => {
                        acquired_cutters.fetch_add(1, Ordering::AcqRel);
                        Some((task_id, guard))
                    }
                    Err(_) => get_cutter_to_work_on(),
                };

                while let Some((cutter_id, mut cutter)) = held.take() {
                    let slot = &slots[cutter_id];
                    if slot.active.load(Ordering::Acquire) {
                        if cutter.is_not_finished() && shall_continue(&cutter) {
                            if !cutter.advance(graph, scratch, search, score) {
                                slot.active.store(false, Ordering::Release);
                            } else if cutter.cut_available() {
                                while !cutter.does_next_advance_increase_flow(graph, score) {
                                    cutter.advance(graph, scratch, search, score);
                                }
                                report_cut(&cutter, cutter.cutter_id());
                            }
                            slot.intensity
                                .store(cutter.flow_intensity(), Ordering::Release);
                        } else {
                            slot.active.store(false, Ordering::Release);
                        }
                    }

                    // Hold on to a cutter only while every other task also
                    // has one; otherwise release and rebalance onto the
                    // smallest-flow instance.
                    if acquired_cutters.load(Ordering::Acquire) != slots.len()
                        || !slot.active.load(Ordering::Acquire)
                    {
                        drop(cutter);
                        acquired_cutters.fetch_sub(1, Ordering::AcqRel);
                        held = get_cutter_to_work_on();
                    } else {
                        held = Some((cutter_id, cutter));
                    }
                }
            },
        );
    }
}

/// Produces terminal configurations for an ensemble and wires a pool to a
/// graph.
pub struct CutterFactory {
    config: Config,
}

impl CutterFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Builds the ensemble's terminal information: pinned pairs if the
    /// configuration fixes terminals, otherwise geometric projection orders
    /// (when an embedding is available) plus random distance-ordered pairs.
    pub fn select_terminals(
        &self,
        node_count: u32,
        geo_pos: Option<&[GeoPos]>,
        seed: u64,
    ) -> Vec<TerminalInformation> {
        match (self.config.source, self.config.target) {
            (Some(source), Some(target)) => (0..self.config.cutter_count)
                .map(|i| TerminalInformation {
                    node_order: Vec::new(),
                    build_order_from_distance: false,
                    terminals: Terminals {
                        source: Some(source),
                        target: Some(target),
                    },
                    cutter_id: i,
                })
                .collect(),
            (Some(pinned), None) | (None, Some(pinned)) => {
                let source_pinned = self.config.source.is_some();
                self.random_pairs(node_count, self.config.cutter_count, seed)
                    .into_iter()
                    .enumerate()
                    .map(|(i, mut t)| {
                        // Keep the pair distinct while forcing one endpoint.
                        if source_pinned {
                            if t.target == Some(pinned) {
                                t.target = t.source;
                            }
                            t.source = Some(pinned);
                        } else {
                            if t.source == Some(pinned) {
                                t.source = t.target;
                            }
                            t.target = Some(pinned);
                        }
                        TerminalInformation {
                            node_order: Vec::new(),
                            build_order_from_distance: false,
                            terminals: t,
                            cutter_id: i,
                        }
                    })
                    .collect()
            }
            (None, None) => {
                let mut result = Vec::new();
                if let Some(geo_pos) = geo_pos {
                    self.geo_projection_orders(node_count, geo_pos, &mut result);
                    let offset = result.len();
                    for (i, t) in self
                        .random_pairs(node_count, self.config.distance_ordering_cutter_count, seed)
                        .into_iter()
                        .enumerate()
                    {
                        result.push(TerminalInformation {
                            node_order: Vec::new(),
                            build_order_from_distance: true,
                            terminals: t,
                            cutter_id: offset + i,
                        });
                    }
                } else {
                    for (i, t) in self
                        .random_pairs(node_count, self.config.cutter_count, seed)
                        .into_iter()
                        .enumerate()
                    {
                        result.push(TerminalInformation {
                            node_order: Vec::new(),
                            build_order_from_distance: false,
                            terminals: t,
                            cutter_id: i,
                        });
                    }
                }
                result
            }
        }
    }

    /// Orders nodes along a projection direction, fully sorting only the
    /// bulk prefix and suffix.
    pub fn build_geo_order<F>(&self, node_count: u32, projection: F) -> Vec<u32>
    where
        F: Fn(u32) -> f64,
    {
        let n = node_count as usize;
        let mut order: Vec<u32> = (0..node_count).collect();
        let cmp = |&l: &u32, &r: &u32| projection(l).total_cmp(&projection(r));
        let max_bulk =
            ((self.config.bulk_assimilation_order_threshold * n as f64) as usize).max(1);
        if max_bulk + 1 < n {
            order.select_nth_unstable_by(max_bulk, cmp);
            order[..=max_bulk].sort_by(cmp);
            let back = n - max_bulk - 1;
            order[max_bulk + 1..].select_nth_unstable_by(back.saturating_sub(max_bulk + 1), cmp);
            order[back..].sort_by(cmp);
        } else {
            order.sort_by(cmp);
        }
        order
    }

    fn geo_projection_orders(
        &self,
        node_count: u32,
        geo_pos: &[GeoPos],
        terminals: &mut Vec<TerminalInformation>,
    ) {
        let cutter_count = self.config.geo_pos_ordering_cutter_count;
        debug_assert!(
            cutter_count >= 4,
            "at least four projection orders are required"
        );
        if cutter_count % 4 != 0 {
            log::warn!(
                "projection order count {cutter_count} is not a multiple of 4; the \
                 horizontal, vertical and diagonal lines will not all be projected"
            );
        }
        let build_one = |i: usize| {
            let phi = i as f64 * PI / cutter_count as f64;
            let dir = unit_direction(phi);
            let order =
                self.build_geo_order(node_count, |x| geo_pos[x as usize].project(dir));
            TerminalInformation {
                node_order: order,
                build_order_from_distance: false,
                terminals: Terminals::default(),
                cutter_id: i,
            }
        };
        if node_count > PARALLELISM_CUTOFF / 2 && self.config.thread_count > 1 {
            terminals.par_extend((0..cutter_count).into_par_iter().map(build_one));
        } else {
            terminals.extend((0..cutter_count).map(build_one));
        }
    }

    fn random_pairs(&self, node_count: u32, count: usize, seed: u64) -> Vec<Terminals> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| loop {
                let source = rng.gen_range(0..node_count);
                let target = rng.gen_range(0..node_count);
                if source != target {
                    return Terminals {
                        source: Some(source),
                        target: Some(target),
                    };
                }
            })
            .collect()
    }
}

/// A pool bound to one graph with search algorithm and distance type picked
/// from the configuration.
pub struct SimpleCutter<'g, G: FlowGraph> {
    graph: &'g G,
    pool: MultiCutter,
    config: Config,
}

impl<'g, G: FlowGraph> SimpleCutter<'g, G> {
    pub fn new(graph: &'g G, config: Config) -> Self {
        Self {
            graph,
            pool: MultiCutter::new(config.clone()),
            config,
        }
    }

    pub fn init(&mut self, terminal_info: Vec<TerminalInformation>) -> Result<(), CoreError> {
        self.pool
            .init(self.graph, self.config.distance_type(), terminal_info)
    }

    pub fn enum_cuts<C, R>(&mut self, shall_continue: &C, report_cut: &R, report_cuts_in_order: bool)
    where
        C: Fn(&DistanceAwareCutter) -> bool + Sync,
        R: Fn(&DistanceAwareCutter, usize) + Sync,
    {
        let search = match self.config.graph_search_algorithm {
            GraphSearchAlgorithm::PseudoDepthFirstSearch => SearchAlgorithm::PseudoDepthFirst,
            GraphSearchAlgorithm::BreadthFirstSearch => SearchAlgorithm::BreadthFirst,
            // Rejected by Config::validate; unreachable past it.
            GraphSearchAlgorithm::DepthFirstSearch => SearchAlgorithm::PseudoDepthFirst,
        };
        let score = PierceNodeScore::new(self.config.clone());
        self.pool.enum_cuts(
            self.graph,
            search,
            &score,
            shall_continue,
            report_cut,
            report_cuts_in_order,
        );
    }

    pub fn dump_state(&self) -> Result<crate::cutter::CutterStateDump, CoreError> {
        self.pool.dump_state(self.graph)
    }
}
