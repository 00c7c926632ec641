//! # Flowcut
//!
//! A **graph partitioner** for road-network-scale sparse graphs: an
//! incremental, piercing-based max-flow/min-cut algorithm together with a
//! parallel nested-dissection driver that produces vertex orderings for
//! customizable contraction hierarchies.
//!
//! ## Key Features
//!
//! - **Incremental cutter** - grows two terminal regions, keeps a maximum
//!   flow between them, and enumerates cuts of increasing size and balance
//! - **Cutter ensembles** - many terminal configurations advance in
//!   lockstep on minimum flow intensity, in ordered or work-stealing
//!   parallel mode
//! - **Vertex separators** - the node-split expanded graph turns separator
//!   problems into arc cuts; four selection strategies trade cut size
//!   against balance
//! - **Inertial flow** - a geometric baseline running four projection-seeded
//!   max flows
//! - **Nested dissection** - trees, cliques, degree-2 chains and
//!   biconnected components are reduced directly; everything else is
//!   dissected recursively with parallel task spawning
//! - **Deterministic** - fixed seed and a single thread reproduce cut
//!   sequences exactly
//!
//! ## Quick Start
//!
//! ```no_run
//! use flowcut::{
//!     compute_nested_dissection_order, AdjacencyArray, Config, SeparatorAlgorithm,
//! };
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! // CSR input: first_out has node_count + 1 entries, head lists arc heads.
//! let first_out = vec![0, 1, 3, 4];
//! let head = vec![1, 0, 2, 1];
//! let graph = AdjacencyArray::from_csr(first_out, head, None)?;
//!
//! let order = compute_nested_dissection_order(
//!     &graph,
//!     None,
//!     &SeparatorAlgorithm::FlowCutter(Config::default()),
//! )?;
//! assert_eq!(order.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Cut enumeration
//!
//! A cutter is a state machine: callers drive it with `advance` and read the
//! current cut between advances. [`MultiCutter`](multi_cutter::MultiCutter)
//! schedules a whole ensemble and reports each cut through a callback;
//! cancellation is a predicate read between advances, never an interrupt.
//!
//! ### Orderings
//!
//! [`compute_nested_dissection_order`] returns a permutation: position `i`
//! holds the node contracted at step `i`, with every separator placed after
//! the pieces it separates. [`order`] has the on-disk format.

pub mod config;
pub mod cutter;
pub mod dissection;
pub mod distance;
pub mod error;
pub mod expanded;
pub mod flow;
pub mod geo;
pub mod graph;
pub mod ids;
pub mod inertial;
pub mod multi_cutter;
pub mod node_set;
pub mod order;
pub mod report;
pub mod search;
pub mod separator;
pub mod testing;

pub use config::{
    AvoidAugmentingPath, BulkDistance, Config, DumpState, GraphSearchAlgorithm, PierceRating,
    ReportCuts, SeparatorSelection,
};
pub use cutter::{BasicCutter, PierceNodeScore, Terminals};
pub use dissection::{
    compute_nested_dissection_order, compute_nested_dissection_order_with, DissectionOptions,
    SeparatorAlgorithm, TASK_SPAWN_CUTOFF,
};
pub use distance::{DistanceAwareCutter, TerminalInformation};
pub use error::{CoreError, Result};
pub use expanded::ExpandedGraph;
pub use geo::GeoPos;
pub use graph::{AdjacencyArray, FlowGraph, GraphBuilder};
pub use inertial::{compute_inertial_flow_cut, compute_inertial_flow_separator, InertialCut};
pub use multi_cutter::{CutterFactory, MultiCutter, SimpleCutter, PARALLELISM_CUTOFF};
pub use order::{load_order, save_order};
pub use report::{enumerate_cuts, CutRecord, CutWriter};
pub use separator::{compute_separator, compute_separator_with_stats, SeparatorStats};
