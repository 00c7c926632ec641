//! CSR graph container.
//!
//! [`AdjacencyArray`] is the immutable adjacency representation every cutter
//! runs on: arcs sorted by tail, an offset array per node, and the back-arc
//! permutation pairing each arc with its reverse. Graphs are built through
//! [`GraphBuilder`], which owns the mutating operations (symmetrize, sort,
//! deduplicate) that renumber arcs; once built, the adjacency is read-only
//! and shared freely across threads.

use crate::error::CoreError;
use crate::ids::{back_arc_permutation, BitSet};

/// Read access to a unit-capacity flow network. Implemented by the plain
/// adjacency array and by the node-split expanded graph, so the cutter code
/// is written once against this trait.
pub trait FlowGraph: Sync {
    fn node_count(&self) -> u32;
    fn arc_count(&self) -> u32;
    fn tail(&self, arc: u32) -> u32;
    fn head(&self, arc: u32) -> u32;
    /// The paired reverse arc; an involution.
    fn back_arc(&self, arc: u32) -> u32;
    fn arc_weight(&self, arc: u32) -> i32;
    /// Capacity in the tail-to-head direction, in units of flow.
    fn capacity(&self, arc: u32) -> i32;
    /// IDs of the arcs leaving `node`; contiguous because arcs are sorted by
    /// tail.
    fn out_arcs(&self, node: u32) -> std::ops::Range<u32>;
}

/// Immutable CSR adjacency with back-arc permutation and arc weights.
#[derive(Clone, Debug)]
pub struct AdjacencyArray {
    first_out: Vec<u32>,
    tail: Vec<u32>,
    head: Vec<u32>,
    weight: Vec<i32>,
    back_arc: Vec<u32>,
}

impl AdjacencyArray {
    /// Builds the adjacency from the two CSR input arrays (`first_out` of
    /// length `n + 1`, `head` of length `m`) and optional arc weights.
    ///
    /// The input must be symmetric: every arc needs a paired reverse arc.
    pub fn from_csr(
        first_out: Vec<u32>,
        head: Vec<u32>,
        weight: Option<Vec<i32>>,
    ) -> Result<Self, CoreError> {
        if first_out.is_empty() {
            return Err(CoreError::Input(
                "first_out must have length node_count + 1".into(),
            ));
        }
        let node_count = first_out.len() - 1;
        let arc_count = head.len();
        if first_out[0] != 0 || first_out[node_count] as usize != arc_count {
            return Err(CoreError::Input(
                "first_out must start at 0 and end at arc_count".into(),
            ));
        }
        if first_out.windows(2).any(|w| w[0] > w[1]) {
            return Err(CoreError::Input("first_out must be non-decreasing".into()));
        }
        if head.iter().any(|&h| h as usize >= node_count) {
            return Err(CoreError::Input("head contains an out-of-bounds node".into()));
        }
        let weight = match weight {
            Some(w) => {
                if w.len() != arc_count {
                    return Err(CoreError::Input(
                        "weight length must equal arc_count".into(),
                    ));
                }
                w
            }
            None => vec![1; arc_count],
        };

        let mut tail = vec![0u32; arc_count];
        for v in 0..node_count {
            for a in first_out[v]..first_out[v + 1] {
                tail[a as usize] = v as u32;
            }
        }

        let back_arc = back_arc_permutation(&tail, &head)
            .ok_or_else(|| CoreError::Input("graph must be symmetric".into()))?;

        Ok(Self {
            first_out,
            tail,
            head,
            weight,
            back_arc,
        })
    }

    pub fn first_out(&self) -> &[u32] {
        &self.first_out
    }

    pub fn heads(&self) -> &[u32] {
        &self.head
    }

    pub fn tails(&self) -> &[u32] {
        &self.tail
    }

    pub fn weights(&self) -> &[i32] {
        &self.weight
    }

    pub fn degree(&self, node: u32) -> u32 {
        self.first_out[node as usize + 1] - self.first_out[node as usize]
    }

    /// True if there are no loops and no parallel arcs. Required at cutter
    /// entry.
    pub fn is_simple(&self) -> bool {
        for v in 0..self.node_count() {
            let mut seen: Vec<u32> = self.out_arcs(v).map(|a| self.head(a)).collect();
            seen.sort_unstable();
            if seen.windows(2).any(|w| w[0] == w[1]) || seen.contains(&v) {
                return false;
            }
        }
        true
    }

    /// True if every node reaches every other node. Arcs are symmetric, so
    /// one search settles it.
    pub fn is_connected(&self) -> bool {
        let n = self.node_count();
        if n <= 1 {
            return true;
        }
        let mut seen = BitSet::new(n as usize);
        let mut stack = vec![0u32];
        seen.set(0, true);
        let mut count = 1u32;
        while let Some(v) = stack.pop() {
            for a in self.out_arcs(v) {
                let w = self.head(a);
                if !seen.get(w) {
                    seen.set(w, true);
                    count += 1;
                    stack.push(w);
                }
            }
        }
        count == n
    }
}

impl FlowGraph for AdjacencyArray {
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
    fn capacity(&self, _arc: u32) -> i32 {
        1
    }

    #[inline]
    fn out_arcs(&self, node: u32) -> std::ops::Range<u32> {
        self.first_out[node as usize]..self.first_out[node as usize + 1]
    }
}

/// Mutable arc list used to massage raw input into cutter-ready shape.
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
    node_count: u32,
    tail: Vec<u32>,
    head: Vec<u32>,
    weight: Vec<i32>,
}

impl GraphBuilder {
    pub fn new(node_count: u32) -> Self {
        Self {
            node_count,
            ..Self::default()
        }
    }

    /// Builder pre-filled from parallel arc arrays.
    pub fn from_arcs(node_count: u32, tail: Vec<u32>, head: Vec<u32>, weight: Vec<i32>) -> Self {
        debug_assert_eq!(tail.len(), head.len());
        debug_assert_eq!(tail.len(), weight.len());
        Self {
            node_count,
            tail,
            head,
            weight,
        }
    }

    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    pub fn arc_count(&self) -> usize {
        self.tail.len()
    }

    pub fn add_arc(&mut self, tail: u32, head: u32, weight: i32) {
        debug_assert!(tail < self.node_count && head < self.node_count);
        self.tail.push(tail);
        self.head.push(head);
        self.weight.push(weight);
    }

    /// Adds the reverse of every arc that lacks one. Existing arcs keep
    /// their IDs; new arcs append at the end with the weight of the arc they
    /// mirror.
    pub fn symmetrize(&mut self) {
        let mut pairs: Vec<(u32, u32)> = self
            .tail
            .iter()
            .zip(self.head.iter())
            .map(|(&t, &h)| (t, h))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();

        let arc_count = self.tail.len();
        for a in 0..arc_count {
            let (t, h) = (self.tail[a], self.head[a]);
            if t == h {
                continue;
            }
            if pairs.binary_search(&(h, t)).is_err() {
                // First occurrence of (t, h) adds the reverse; duplicates skip.
                let first = self
                    .tail
                    .iter()
                    .zip(self.head.iter())
                    .position(|(&pt, &ph)| (pt, ph) == (t, h))
                    .unwrap();
                if first == a {
                    self.tail.push(h);
                    self.head.push(t);
                    self.weight.push(self.weight[a]);
                }
            }
        }
    }

    /// Renumbers arcs so they are sorted by tail, then head. Callers must
    /// recompute any back-arc permutation afterwards; `build` does.
    pub fn sort_arcs(&mut self) {
        let mut order: Vec<u32> = (0..self.tail.len() as u32).collect();
        order.sort_by_key(|&a| (self.tail[a as usize], self.head[a as usize]));
        self.tail = order.iter().map(|&a| self.tail[a as usize]).collect();
        self.head = order.iter().map(|&a| self.head[a as usize]).collect();
        self.weight = order.iter().map(|&a| self.weight[a as usize]).collect();
    }

    /// Removes loops and collapses parallel arcs, keeping the minimum-weight
    /// representative. Renumbers arcs.
    pub fn deduplicate(&mut self) {
        self.sort_arcs();
        let mut tail = Vec::with_capacity(self.tail.len());
        let mut head = Vec::with_capacity(self.head.len());
        let mut weight: Vec<i32> = Vec::with_capacity(self.weight.len());
        for a in 0..self.tail.len() {
            let (t, h, w) = (self.tail[a], self.head[a], self.weight[a]);
            if t == h {
                continue;
            }
            if tail.last() == Some(&t) && head.last() == Some(&h) {
                let last = weight.last_mut().unwrap();
                *last = (*last).min(w);
            } else {
                tail.push(t);
                head.push(h);
                weight.push(w);
            }
        }
        self.tail = tail;
        self.head = head;
        self.weight = weight;
    }

    /// Dissolves the builder into its parallel arc arrays.
    pub fn into_arcs(self) -> (Vec<u32>, Vec<u32>, Vec<i32>) {
        (self.tail, self.head, self.weight)
    }

    /// Finishes into the immutable CSR form. Sorts arcs and computes the
    /// back-arc permutation; fails if the arc list is not symmetric.
    pub fn build(mut self) -> Result<AdjacencyArray, CoreError> {
        self.sort_arcs();
        let n = self.node_count as usize;
        let mut first_out = vec![0u32; n + 1];
        for &t in &self.tail {
            first_out[t as usize + 1] += 1;
        }
        for v in 0..n {
            first_out[v + 1] += first_out[v];
        }
        let back_arc = back_arc_permutation(&self.tail, &self.head)
            .ok_or_else(|| CoreError::Input("graph must be symmetric".into()))?;
        Ok(AdjacencyArray {
            first_out,
            tail: self.tail,
            head: self.head,
            weight: self.weight,
            back_arc,
        })
    }
}

/// Entry contract for cutters: simple, symmetric, and -- under a weighted
/// pierce policy -- non-negatively weighted.
pub fn validate_cutter_input(
    graph: &AdjacencyArray,
    needs_non_negative_weights: bool,
) -> Result<(), CoreError> {
    if !graph.is_simple() {
        return Err(CoreError::Input(
            "graph must not have loops or parallel arcs".into(),
        ));
    }
    if needs_non_negative_weights && graph.weights().iter().any(|&w| w < 0) {
        return Err(CoreError::Input(
            "arc weights must be non-negative under a weighted pierce policy".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_symmetrize_and_build() {
        let mut b = GraphBuilder::new(3);
        b.add_arc(0, 1, 2);
        b.add_arc(1, 2, 3);
        b.symmetrize();
        let g = b.build().unwrap();
        assert_eq!(g.arc_count(), 4);
        for a in 0..g.arc_count() {
            assert_eq!(g.tail(g.back_arc(a)), g.head(a));
            assert_eq!(g.back_arc(g.back_arc(a)), a);
        }
    }

    #[test]
    fn deduplicate_keeps_min_weight() {
        let mut b = GraphBuilder::new(2);
        b.add_arc(0, 1, 5);
        b.add_arc(0, 1, 3);
        b.add_arc(1, 0, 4);
        b.add_arc(0, 0, 1);
        b.deduplicate();
        assert_eq!(b.arc_count(), 2);
        let g = b.build().unwrap();
        assert_eq!(g.arc_weight(0), 3);
    }

    #[test]
    fn asymmetric_input_is_rejected() {
        let mut b = GraphBuilder::new(2);
        b.add_arc(0, 1, 1);
        assert!(b.build().is_err());
    }
}
