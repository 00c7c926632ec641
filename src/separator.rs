//! From cut enumeration to a vertex separator.
//!
//! Drives a cutter ensemble and keeps the best cut seen so far under the
//! configured selection rule. The expansion rules score a cut by
//! `cut_size / smaller_side_size` and penalize cuts below the balance bound;
//! the first-cut rules take the smallest cut meeting the bound. Ensembles
//! report concurrently, so the best record sits behind a mutex with the
//! score additionally published through an atomic for the cheap
//! `shall_continue` reads between advances.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use ordered_float::OrderedFloat;

use crate::config::{Config, SeparatorSelection};
use crate::error::CoreError;
use crate::expanded::{expand_terminal_list, expanded_node_count, extract_separator, ExpandedGraph};
use crate::geo::GeoPos;
use crate::graph::{validate_cutter_input, AdjacencyArray, FlowGraph};
use crate::multi_cutter::{CutterFactory, SimpleCutter};

const IMBALANCE_PENALTY: f64 = 1_000_000.0;

struct SharedScore(AtomicU64);

impl SharedScore {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// Computes a vertex separator of a connected simple symmetric graph with
/// the configured strategy.
pub fn compute_separator(
    graph: &AdjacencyArray,
    geo_pos: Option<&[GeoPos]>,
    config: &Config,
) -> Result<Vec<u32>, CoreError> {
    config.validate()?;
    validate_cutter_input(graph, config.requires_non_negative_weights())?;
    if graph.node_count() < 2 {
        return Err(CoreError::Input(
            "separator computation needs at least two nodes".into(),
        ));
    }

    let node_count = graph.node_count();
    let factory = CutterFactory::new(config.clone());
    let terminals = factory.select_terminals(node_count, geo_pos, config.random_seed);

    match config.separator_selection {
        SeparatorSelection::NodeMinExpansion => {
            let expanded = ExpandedGraph::new(graph);
            let mut cutter = SimpleCutter::new(&expanded, config.clone());
            cutter.init(expand_terminal_list(terminals))?;

            let half = (expanded_node_count(node_count) / 2) as f64;
            let best_score = SharedScore::new(f64::MAX);
            let best = Mutex::new((u32::MAX, usize::MAX, Vec::new()));
            let max_imbalance = config.max_imbalance;

            cutter.enum_cuts(
                &|c| {
                    // The next cut is at least one arc larger than the
                    // current flow once a cut is available.
                    let mut next_cut = c.flow_intensity() as f64;
                    if c.cut_available() {
                        next_cut += 1.0;
                    }
                    next_cut / half <= best_score.load()
                },
                &|c, cutter_id| {
                    let cut_size = c.flow_intensity() as f64;
                    let small_side = c.current_smaller_cut_side_size() as f64;
                    let mut score = cut_size / small_side;
                    if small_side < max_imbalance * expanded_node_count(node_count) as f64 {
                        score += IMBALANCE_PENALTY;
                    }
                    if score <= best_score.load() {
                        let mut guard = best.lock().unwrap();
                        let (best_flow, best_cutter_id, _) = &*guard;
                        let challenger =
                            (OrderedFloat(score), c.flow_intensity(), cutter_id);
                        let incumbent =
                            (OrderedFloat(best_score.load()), *best_flow, *best_cutter_id);
                        if challenger < incumbent {
                            best_score.store(score);
                            *guard = (c.flow_intensity(), cutter_id, extract_separator(&expanded, c));
                        }
                    }
                },
                false,
            );

            Ok(best.into_inner().unwrap().2)
        }
        SeparatorSelection::EdgeMinExpansion => {
            let mut cutter = SimpleCutter::new(graph, config.clone());
            cutter.init(terminals)?;

            let half = (node_count / 2) as f64;
            let best_score = SharedScore::new(f64::MAX);
            let best_cut: Mutex<Vec<u32>> = Mutex::new(Vec::new());
            let max_imbalance = config.max_imbalance;

            cutter.enum_cuts(
                &|c| {
                    let mut next_cut = c.flow_intensity() as f64;
                    if c.cut_available() {
                        next_cut += 1.0;
                    }
                    next_cut / half < best_score.load()
                },
                &|c, _| {
                    let cut_size = c.flow_intensity() as f64;
                    let small_side = c.current_smaller_cut_side_size() as f64;
                    let mut score = cut_size / small_side;
                    if small_side < max_imbalance * node_count as f64 {
                        score += IMBALANCE_PENALTY;
                    }
                    if score < best_score.load() {
                        let mut guard = best_cut.lock().unwrap();
                        if score < best_score.load() {
                            best_score.store(score);
                            *guard = c.current_cut().to_vec();
                        }
                    }
                },
                false,
            );

            Ok(separator_from_arc_cut(graph, &best_cut.into_inner().unwrap()))
        }
        SeparatorSelection::EdgeFirst => {
            let mut cutter = SimpleCutter::new(graph, config.clone());
            cutter.init(terminals)?;
            let cut = first_balanced_cut(&mut cutter, node_count, config, |c| {
                c.current_cut().to_vec()
            });
            Ok(separator_from_arc_cut(graph, &cut))
        }
        SeparatorSelection::NodeFirst => {
            let expanded = ExpandedGraph::new(graph);
            let mut cutter = SimpleCutter::new(&expanded, config.clone());
            cutter.init(expand_terminal_list(terminals))?;
            let bound = expanded_node_count(node_count);
            let separator = first_balanced_cut(&mut cutter, bound, config, |c| {
                extract_separator(&expanded, c)
            });
            Ok(separator)
        }
    }
}

/// Smallest cut meeting the balance bound, favoring the larger smaller side
/// among equals.
fn first_balanced_cut<G, F>(
    cutter: &mut SimpleCutter<'_, G>,
    balance_node_count: u32,
    config: &Config,
    extract: F,
) -> Vec<u32>
where
    G: FlowGraph,
    F: Fn(&crate::distance::DistanceAwareCutter) -> Vec<u32> + Sync,
{
    let best_cut_size = AtomicU32::new(u32::MAX);
    let best: Mutex<(u32, Vec<u32>)> = Mutex::new((0, Vec::new()));
    let max_imbalance = config.max_imbalance;

    cutter.enum_cuts(
        &|c| {
            let mut next_cut = c.flow_intensity();
            if c.cut_available() {
                next_cut += 1;
            }
            next_cut <= best_cut_size.load(Ordering::Acquire)
        },
        &|c, _| {
            let cut_size = c.flow_intensity();
            let small_side = c.current_smaller_cut_side_size();
            if (small_side as f64) < max_imbalance * balance_node_count as f64 {
                return;
            }
            if cut_size <= best_cut_size.load(Ordering::Acquire) {
                let mut guard = best.lock().unwrap();
                let current_best = best_cut_size.load(Ordering::Acquire);
                if cut_size < current_best || (cut_size == current_best && guard.0 < small_side) {
                    best_cut_size.store(cut_size, Ordering::Release);
                    *guard = (small_side, extract(c));
                }
            }
        },
        false,
    );

    best.into_inner().unwrap().1
}

fn separator_from_arc_cut(graph: &AdjacencyArray, cut: &[u32]) -> Vec<u32> {
    let mut separator: Vec<u32> = cut.iter().map(|&a| graph.head(a)).collect();
    separator.sort_unstable();
    separator.dedup();
    separator
}

/// Best edge cut of the graph under the min-expansion score, with the cut
/// arcs ordered by direction: arcs leaving the smaller side first, their
/// reverses appended behind.
pub fn compute_cut(
    graph: &AdjacencyArray,
    geo_pos: Option<&[GeoPos]>,
    config: &Config,
) -> Result<Vec<u32>, CoreError> {
    config.validate()?;
    validate_cutter_input(graph, config.requires_non_negative_weights())?;
    if graph.node_count() < 2 {
        return Err(CoreError::Input(
            "cut computation needs at least two nodes".into(),
        ));
    }

    let node_count = graph.node_count();
    let factory = CutterFactory::new(config.clone());
    let terminals = factory.select_terminals(node_count, geo_pos, config.random_seed);

    let mut cutter = SimpleCutter::new(graph, config.clone());
    cutter.init(terminals)?;

    let half = (node_count / 2) as f64;
    let best_score = SharedScore::new(f64::MAX);
    let best: Mutex<(u32, usize, VecDeque<u32>)> = Mutex::new((u32::MAX, usize::MAX, VecDeque::new()));
    let max_imbalance = config.max_imbalance;

    cutter.enum_cuts(
        &|c| {
            let mut next_cut = c.flow_intensity() as f64;
            if c.cut_available() {
                next_cut += 1.0;
            }
            next_cut / half < best_score.load()
        },
        &|c, cutter_id| {
            let cut_size = c.flow_intensity() as f64;
            let small_side = c.current_smaller_cut_side_size() as f64;
            let mut score = cut_size / small_side;
            if small_side < max_imbalance * node_count as f64 {
                score += IMBALANCE_PENALTY;
            }
            if score <= best_score.load() {
                let mut guard = best.lock().unwrap();
                let (best_flow, best_cutter_id, _) = &*guard;
                let challenger = (OrderedFloat(score), c.flow_intensity(), cutter_id);
                let incumbent = (OrderedFloat(best_score.load()), *best_flow, *best_cutter_id);
                if challenger < incumbent {
                    best_score.store(score);
                    let mut ordered = VecDeque::new();
                    for &x in c.current_cut() {
                        if c.is_on_smaller_side(graph.head(x)) {
                            ordered.push_back(x);
                            ordered.push_front(graph.back_arc(x));
                        } else {
                            ordered.push_front(x);
                            ordered.push_back(graph.back_arc(x));
                        }
                    }
                    *guard = (c.flow_intensity(), cutter_id, ordered);
                }
            }
        },
        false,
    );

    Ok(best.into_inner().unwrap().2.into())
}

/// Disjoint sets over node IDs, by size with path halving.
pub struct UnionFind {
    parent: Vec<u32>,
    size: Vec<u32>,
}

impl UnionFind {
    pub fn new(node_count: u32) -> Self {
        Self {
            parent: (0..node_count).collect(),
            size: vec![1; node_count as usize],
        }
    }

    pub fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    pub fn unite(&mut self, a: u32, b: u32) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra as usize] < self.size[rb as usize] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb as usize] = ra;
        self.size[ra as usize] += self.size[rb as usize];
    }

    pub fn component_size(&mut self, x: u32) -> u32 {
        let root = self.find(x);
        self.size[root as usize]
    }
}

/// Size of the largest connected component after removing the separator.
pub fn largest_component_size(graph: &AdjacencyArray, separator: &[u32]) -> u32 {
    let node_count = graph.node_count();
    let mut in_separator = crate::ids::BitSet::new(node_count as usize);
    for &x in separator {
        in_separator.set(x, true);
    }
    let mut uf = UnionFind::new(node_count);
    for a in 0..graph.arc_count() {
        let (t, h) = (graph.tail(a), graph.head(a));
        if !in_separator.get(t) && !in_separator.get(h) {
            uf.unite(t, h);
        }
    }
    let mut largest = 0;
    for x in 0..node_count {
        if !in_separator.get(x) {
            largest = largest.max(uf.component_size(x));
        }
    }
    largest
}

/// One row of separator quality reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeparatorStats {
    pub node_count: u32,
    pub arc_count: u32,
    pub separator_size: u32,
    pub largest_component: u32,
    pub running_time_us: u64,
}

impl SeparatorStats {
    pub fn csv_header() -> &'static str {
        "node_count,arc_count,sep_node_count,large_node_count,running_time"
    }

    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.node_count,
            self.arc_count,
            self.separator_size,
            self.largest_component,
            self.running_time_us
        )
    }
}

/// Computes a separator and measures it.
pub fn compute_separator_with_stats(
    graph: &AdjacencyArray,
    geo_pos: Option<&[GeoPos]>,
    config: &Config,
) -> Result<(Vec<u32>, SeparatorStats), CoreError> {
    let start = Instant::now();
    let separator = compute_separator(graph, geo_pos, config)?;
    let running_time_us = start.elapsed().as_micros() as u64;
    let stats = SeparatorStats {
        node_count: graph.node_count(),
        arc_count: graph.arc_count(),
        separator_size: separator.len() as u32,
        largest_component: largest_component_size(graph, &separator),
        running_time_us,
    };
    Ok((separator, stats))
}
