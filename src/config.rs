//! Partitioner configuration.
//!
//! Every tunable of the cutter ensemble lives in [`Config`]. Options can be
//! set programmatically, deserialized, or assigned by name through
//! [`Config::set`] (the string interface front-ends expose). Validation is
//! explicit: construct, mutate, then call [`Config::validate`] once before
//! handing the config to a cutter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How pierce candidates on the cut front are rated. Higher rates win.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PierceRating {
    /// Maximize `target_dist - source_dist` on the hop metric.
    #[default]
    MaxTargetMinusSourceHopDist,
    /// Maximize `target_dist - source_dist` on the weighted metric.
    MaxTargetMinusSourceWeightDist,
    MaxTargetHopDist,
    MaxTargetWeightDist,
    MinSourceHopDist,
    MinSourceWeightDist,
    /// All candidates rate equal; the first cut-front arc wins.
    Oldest,
    /// Deterministic hash of the candidate node.
    Random,
    MaxArcWeight,
    MinArcWeight,
    /// Source side minimizes source distance, target side maximizes target
    /// distance, circling the terminals.
    CircularHop,
    CircularWeight,
    MaxTargetMinusSourceHopDistWithSourceDistTieBreak,
    MaxTargetMinusSourceHopDistWithCloserDistTieBreak,
}

/// Whether piercing prefers nodes that do not open an augmenting path, and
/// how ties among such nodes break.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvoidAugmentingPath {
    DoNotAvoid,
    #[default]
    AvoidAndPickBest,
    AvoidAndPickOldest,
    AvoidAndPickRandom,
}

/// Graph search used for growing reachable sets and augmenting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphSearchAlgorithm {
    /// Stack-based search without tree bookkeeping. Reaches targets with
    /// fewer arc touches on planar-like inputs.
    #[default]
    PseudoDepthFirstSearch,
    BreadthFirstSearch,
    /// Reserved; rejected by validation.
    DepthFirstSearch,
}

/// How the driver turns cut enumeration into a vertex separator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorSelection {
    /// Run on the expanded graph; minimize `cut_size / smaller_side_size`.
    #[default]
    NodeMinExpansion,
    /// Run on the plain graph; minimize expansion of the arc cut, take heads.
    EdgeMinExpansion,
    /// Run on the expanded graph; first cut meeting the balance bound wins.
    NodeFirst,
    /// Run on the plain graph; first cut meeting the balance bound wins.
    EdgeFirst,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkDistance {
    #[default]
    No,
    Yes,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCuts {
    #[default]
    No,
    Yes,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DumpState {
    #[default]
    No,
    Yes,
}

/// Distance labels a cutter needs before piercing can be scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceType {
    NoDistance,
    HopDistance,
    /// Hop distance seeded from the first/last slice of the node order.
    HopDistanceTerminalSet,
    WeightedDistance,
}

macro_rules! enum_from_str {
    ($ty:ident { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, CoreError> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(CoreError::Config(format!(
                        concat!("unknown ", stringify!($ty), " value: {}"), s
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $($ty::$variant => $text,)+
                };
                f.write_str(text)
            }
        }
    };
}

enum_from_str!(PierceRating {
    "max_target_minus_source_hop_dist" => MaxTargetMinusSourceHopDist,
    "max_target_minus_source_weight_dist" => MaxTargetMinusSourceWeightDist,
    "max_target_hop_dist" => MaxTargetHopDist,
    "max_target_weight_dist" => MaxTargetWeightDist,
    "min_source_hop_dist" => MinSourceHopDist,
    "min_source_weight_dist" => MinSourceWeightDist,
    "oldest" => Oldest,
    "random" => Random,
    "max_arc_weight" => MaxArcWeight,
    "min_arc_weight" => MinArcWeight,
    "circular_hop" => CircularHop,
    "circular_weight" => CircularWeight,
    "max_target_minus_source_hop_dist_with_source_dist_tie_break"
        => MaxTargetMinusSourceHopDistWithSourceDistTieBreak,
    "max_target_minus_source_hop_dist_with_closer_dist_tie_break"
        => MaxTargetMinusSourceHopDistWithCloserDistTieBreak,
});

enum_from_str!(AvoidAugmentingPath {
    "do_not_avoid" => DoNotAvoid,
    "avoid_and_pick_best" => AvoidAndPickBest,
    "avoid_and_pick_oldest" => AvoidAndPickOldest,
    "avoid_and_pick_random" => AvoidAndPickRandom,
});

enum_from_str!(GraphSearchAlgorithm {
    "pseudo_depth_first_search" => PseudoDepthFirstSearch,
    "breadth_first_search" => BreadthFirstSearch,
    "depth_first_search" => DepthFirstSearch,
});

enum_from_str!(SeparatorSelection {
    "node_min_expansion" => NodeMinExpansion,
    "edge_min_expansion" => EdgeMinExpansion,
    "node_first" => NodeFirst,
    "edge_first" => EdgeFirst,
});

enum_from_str!(BulkDistance {
    "no" => No,
    "yes" => Yes,
});

enum_from_str!(ReportCuts {
    "no" => No,
    "yes" => Yes,
});

enum_from_str!(DumpState {
    "no" => No,
    "yes" => Yes,
});

/// Full configuration of the cutter ensemble and the dissection driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pierce_rating: PierceRating,
    pub avoid_augmenting_path: AvoidAugmentingPath,
    pub graph_search_algorithm: GraphSearchAlgorithm,
    pub separator_selection: SeparatorSelection,

    /// Seed hop distances from a slice of the node order instead of a single
    /// terminal.
    pub bulk_distance: BulkDistance,
    /// Fraction of the node order used as the terminal set, in `(0, 1]`.
    pub bulk_distance_factor: f64,

    /// Largest accepted imbalance, in `(0, 0.5]`. Cuts whose smaller side
    /// falls below `max_imbalance * node_count` are penalized.
    pub max_imbalance: f64,
    /// Enumeration stops once the next cut would exceed this size.
    pub max_cut_size: i32,

    /// Total number of cutter instances in the ensemble.
    pub cutter_count: usize,
    /// Instances seeded from geometric projection orders.
    pub geo_pos_ordering_cutter_count: usize,
    /// Instances seeded from random terminal pairs with distance orders.
    pub distance_ordering_cutter_count: usize,

    /// Bulk piercing stops once a side holds this fraction of all nodes.
    pub bulk_assimilation_threshold: f64,
    /// Fraction of the node order reachable by bulk piercing from either end.
    pub bulk_assimilation_order_threshold: f64,
    /// Fraction of nodes absorbed per side at initialization.
    pub initial_assimilated_fraction: f64,
    /// Chunk fraction for adaptive bulk piercing steps.
    pub bulk_step_fraction: f64,

    pub random_seed: u64,
    pub thread_count: usize,

    /// Pinned source node; `None` lets the terminal factory choose.
    pub source: Option<u32>,
    /// Pinned target node; `None` lets the terminal factory choose.
    pub target: Option<u32>,

    pub report_cuts: ReportCuts,
    pub dump_state: DumpState,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pierce_rating: PierceRating::default(),
            avoid_augmenting_path: AvoidAugmentingPath::default(),
            graph_search_algorithm: GraphSearchAlgorithm::default(),
            separator_selection: SeparatorSelection::default(),
            bulk_distance: BulkDistance::default(),
            bulk_distance_factor: 0.05,
            max_imbalance: 0.4,
            max_cut_size: i32::MAX,
            cutter_count: 20,
            geo_pos_ordering_cutter_count: 4,
            distance_ordering_cutter_count: 16,
            bulk_assimilation_threshold: 0.4,
            bulk_assimilation_order_threshold: 0.15,
            initial_assimilated_fraction: 0.05,
            bulk_step_fraction: 0.05,
            random_seed: 0,
            thread_count: num_cpus::get(),
            source: None,
            target: None,
            report_cuts: ReportCuts::default(),
            dump_state: DumpState::default(),
        }
    }
}

fn check_fraction(name: &str, value: f64, upper: f64) -> Result<(), CoreError> {
    if !(value > 0.0 && value <= upper) {
        return Err(CoreError::Config(format!(
            "{name} must be in (0, {upper}], got {value}"
        )));
    }
    Ok(())
}

impl Config {
    /// Checks every numeric range and policy combination. Call once before
    /// constructing cutters.
    pub fn validate(&self) -> Result<(), CoreError> {
        check_fraction("bulk_distance_factor", self.bulk_distance_factor, 1.0)?;
        check_fraction("max_imbalance", self.max_imbalance, 0.5)?;
        check_fraction(
            "bulk_assimilation_threshold",
            self.bulk_assimilation_threshold,
            0.5,
        )?;
        check_fraction(
            "bulk_assimilation_order_threshold",
            self.bulk_assimilation_order_threshold,
            1.0,
        )?;
        check_fraction(
            "initial_assimilated_fraction",
            self.initial_assimilated_fraction,
            1.0,
        )?;
        check_fraction("bulk_step_fraction", self.bulk_step_fraction, 1.0)?;

        if self.max_cut_size < 0 {
            return Err(CoreError::Config(format!(
                "max_cut_size must be non-negative, got {}",
                self.max_cut_size
            )));
        }
        if self.cutter_count == 0 {
            return Err(CoreError::Config("cutter_count must be positive".into()));
        }
        if self.thread_count == 0 {
            return Err(CoreError::Config("thread_count must be positive".into()));
        }
        if self.graph_search_algorithm == GraphSearchAlgorithm::DepthFirstSearch {
            return Err(CoreError::Config(
                "depth_first_search is reserved and not yet available".into(),
            ));
        }
        if self.bulk_distance == BulkDistance::Yes && !self.pierce_rating.uses_hop_distance() {
            return Err(CoreError::Config(format!(
                "bulk_distance requires a hop-distance pierce rating, got {}",
                self.pierce_rating
            )));
        }
        Ok(())
    }

    /// Assigns an option by name, as exposed by console front-ends.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        fn num<T: FromStr>(key: &str, value: &str) -> Result<T, CoreError> {
            value.parse().map_err(|_| {
                CoreError::Config(format!("invalid value for {key}: {value}"))
            })
        }

        match key {
            "pierce_rating" => self.pierce_rating = value.parse()?,
            "avoid_augmenting_path" => self.avoid_augmenting_path = value.parse()?,
            "graph_search_algorithm" => self.graph_search_algorithm = value.parse()?,
            "separator_selection" => self.separator_selection = value.parse()?,
            "bulk_distance" => self.bulk_distance = value.parse()?,
            "bulk_distance_factor" => self.bulk_distance_factor = num(key, value)?,
            "max_imbalance" => self.max_imbalance = num(key, value)?,
            "max_cut_size" => self.max_cut_size = num(key, value)?,
            "cutter_count" => self.cutter_count = num(key, value)?,
            "geo_pos_ordering_cutter_count" => {
                self.geo_pos_ordering_cutter_count = num(key, value)?;
            }
            "distance_ordering_cutter_count" => {
                self.distance_ordering_cutter_count = num(key, value)?;
            }
            "bulk_assimilation_threshold" => {
                self.bulk_assimilation_threshold = num(key, value)?;
            }
            "bulk_assimilation_order_threshold" => {
                self.bulk_assimilation_order_threshold = num(key, value)?;
            }
            "initial_assimilated_fraction" => {
                self.initial_assimilated_fraction = num(key, value)?;
            }
            "bulk_step_fraction" => self.bulk_step_fraction = num(key, value)?,
            "random_seed" => self.random_seed = num(key, value)?,
            "thread_count" => self.thread_count = num(key, value)?,
            "source" => {
                self.source = if value == "-1" { None } else { Some(num(key, value)?) };
            }
            "target" => {
                self.target = if value == "-1" { None } else { Some(num(key, value)?) };
            }
            "report_cuts" => self.report_cuts = value.parse()?,
            "dump_state" => self.dump_state = value.parse()?,
            _ => {
                return Err(CoreError::Config(format!("unknown option: {key}")));
            }
        }
        Ok(())
    }

    /// Distance labels required by the configured pierce rating.
    pub fn distance_type(&self) -> DistanceType {
        use PierceRating::*;
        match self.pierce_rating {
            MinSourceHopDist
            | MaxTargetHopDist
            | MaxTargetMinusSourceHopDist
            | CircularHop
            | MaxTargetMinusSourceHopDistWithSourceDistTieBreak
            | MaxTargetMinusSourceHopDistWithCloserDistTieBreak => {
                if self.bulk_distance == BulkDistance::Yes {
                    DistanceType::HopDistanceTerminalSet
                } else {
                    DistanceType::HopDistance
                }
            }
            MinSourceWeightDist | MaxTargetWeightDist | CircularWeight
            | MaxTargetMinusSourceWeightDist => DistanceType::WeightedDistance,
            Oldest | Random | MaxArcWeight | MinArcWeight => DistanceType::NoDistance,
        }
    }

    /// Whether the configured rating reads arc weights as distances, which
    /// requires them to be non-negative.
    pub fn requires_non_negative_weights(&self) -> bool {
        matches!(
            self.pierce_rating,
            PierceRating::MinSourceWeightDist
                | PierceRating::MaxTargetWeightDist
                | PierceRating::MaxTargetMinusSourceWeightDist
        )
    }
}

impl PierceRating {
    fn uses_hop_distance(&self) -> bool {
        matches!(
            self,
            PierceRating::MaxTargetMinusSourceHopDist
                | PierceRating::MaxTargetHopDist
                | PierceRating::MinSourceHopDist
                | PierceRating::CircularHop
                | PierceRating::MaxTargetMinusSourceHopDistWithSourceDistTieBreak
                | PierceRating::MaxTargetMinusSourceHopDistWithCloserDistTieBreak
        )
    }
}
