//! Node-split expansion: vertex separators as arc cuts.
//!
//! Every node `v` becomes an in-node and an out-node joined by an internal
//! arc of capacity one; every original arc becomes an external arc of
//! effectively unbounded capacity (two, which unit flows never reach). A
//! minimum arc cut of the expanded graph saturates only internal arcs, and
//! the owning nodes of those arcs form a minimum vertex separator of the
//! original graph.
//!
//! IDs pack as `in(v) = 2v`, `out(v) = 2v + 1`, so the original node of any
//! expanded node is a shift away.

use crate::cutter::Terminals;
use crate::distance::{DistanceAwareCutter, TerminalInformation};
use crate::graph::{AdjacencyArray, FlowGraph};

#[inline]
pub fn in_node(v: u32) -> u32 {
    2 * v
}

#[inline]
pub fn out_node(v: u32) -> u32 {
    2 * v + 1
}

#[inline]
pub fn original_node(expanded: u32) -> u32 {
    expanded / 2
}

pub fn expanded_node_count(node_count: u32) -> u32 {
    2 * node_count
}

/// The node-split graph, materialized in CSR form.
pub struct ExpandedGraph {
    first_out: Vec<u32>,
    tail: Vec<u32>,
    head: Vec<u32>,
    back_arc: Vec<u32>,
    weight: Vec<i32>,
    capacity: Vec<i32>,
}

impl ExpandedGraph {
    /// Expands a simple symmetric graph. Internal arcs carry the node weight
    /// (one per default); external arcs keep their original weight.
    pub fn new(graph: &AdjacencyArray) -> Self {
        let n = graph.node_count();
        let m = graph.arc_count();
        let arc_count = (2 * n + 2 * m) as usize;

        let mut first_out = Vec::with_capacity(2 * n as usize + 1);
        let mut tail = Vec::with_capacity(arc_count);
        let mut head = Vec::with_capacity(arc_count);
        let mut weight = Vec::with_capacity(arc_count);
        let mut capacity = Vec::with_capacity(arc_count);
        // Remembers where each node's arc block starts so back arcs can be
        // located by offset within the block.
        let mut block_start = vec![0u32; 2 * n as usize];

        first_out.push(0);
        for v in 0..n {
            // in(v): the internal arc, then one residual arc per neighbor,
            // in out-arc order of v.
            block_start[in_node(v) as usize] = tail.len() as u32;
            tail.push(in_node(v));
            head.push(out_node(v));
            weight.push(1);
            capacity.push(1);
            for a in graph.out_arcs(v) {
                tail.push(in_node(v));
                head.push(out_node(graph.head(a)));
                weight.push(graph.arc_weight(a));
                capacity.push(0);
            }
            first_out.push(tail.len() as u32);

            // out(v): the internal reverse, then one forward arc per
            // neighbor, same order.
            block_start[out_node(v) as usize] = tail.len() as u32;
            tail.push(out_node(v));
            head.push(in_node(v));
            weight.push(1);
            capacity.push(0);
            for a in graph.out_arcs(v) {
                tail.push(out_node(v));
                head.push(in_node(graph.head(a)));
                weight.push(graph.arc_weight(a));
                capacity.push(2);
            }
            first_out.push(tail.len() as u32);
        }

        // Pair the arcs. Internal arcs pair within their node. An external
        // arc at offset `i` in v's block mirrors the arc toward v at the
        // same position the original back arc has in its own block.
        let mut back_arc = vec![0u32; tail.len()];
        for v in 0..n {
            let in_start = block_start[in_node(v) as usize];
            let out_start = block_start[out_node(v) as usize];
            back_arc[in_start as usize] = out_start;
            back_arc[out_start as usize] = in_start;
            for (offset, a) in graph.out_arcs(v).enumerate() {
                let b = graph.back_arc(a);
                let w = graph.head(a);
                let b_offset = (b - graph.out_arcs(w).start) as u32;
                // forward v_out -> w_in pairs with residual w_in -> v_out
                let forward = out_start + 1 + offset as u32;
                let residual = block_start[in_node(w) as usize] + 1 + b_offset;
                back_arc[forward as usize] = residual;
                back_arc[residual as usize] = forward;
            }
        }

        Self {
            first_out,
            tail,
            head,
            back_arc,
            weight,
            capacity,
        }
    }
}

impl FlowGraph for ExpandedGraph {
    fn node_count(&self) -> u32 {
        (self.first_out.len() - 1) as u32
    }

    fn arc_count(&self) -> u32 {
        self.head.len() as u32
    }

    #[inline]
    fn tail(&self, arc: u32) -> u32 {
        self.tail[arc as usize]
    }

    #[inline]
    fn head(&self, arc: u32) -> u32 {
        self.head[arc as usize]
    }

    #[inline]
    fn back_arc(&self, arc: u32) -> u32 {
        self.back_arc[arc as usize]
    }

    #[inline]
    fn arc_weight(&self, arc: u32) -> i32 {
        self.weight[arc as usize]
    }

    #[inline]
    fn capacity(&self, arc: u32) -> i32 {
        self.capacity[arc as usize]
    }

    #[inline]
    fn out_arcs(&self, node: u32) -> std::ops::Range<u32> {
        self.first_out[node as usize]..self.first_out[node as usize + 1]
    }
}

/// Maps original terminals into the expanded graph: sources emit flow from
/// their out-node, targets collect it at their in-node. Node orders expand
/// to in/out pairs.
pub fn expand_terminal_list(terminals: Vec<TerminalInformation>) -> Vec<TerminalInformation> {
    terminals
        .into_iter()
        .map(|ti| TerminalInformation {
            node_order: ti
                .node_order
                .iter()
                .flat_map(|&v| [in_node(v), out_node(v)])
                .collect(),
            build_order_from_distance: ti.build_order_from_distance,
            terminals: Terminals {
                source: ti.terminals.source.map(out_node),
                target: ti.terminals.target.map(in_node),
            },
            cutter_id: ti.cutter_id,
        })
        .collect()
}

/// Reads the vertex separator out of a finished cut on the expanded graph:
/// the owning nodes of the saturated internal arcs, deduplicated and sorted.
pub fn extract_separator(expanded: &ExpandedGraph, cutter: &DistanceAwareCutter) -> Vec<u32> {
    let mut separator: Vec<u32> = cutter
        .current_cut()
        .iter()
        .map(|&arc| original_node(expanded.head(arc)))
        .collect();
    separator.sort_unstable();
    separator.dedup();
    separator
}
