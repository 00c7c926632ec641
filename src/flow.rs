//! Unit-capacity flow over paired arcs.
//!
//! The flow value of an arc is one of `-1`, `0`, `+1`, stored biased by one
//! in two bits. The pairing invariant `flow(a) == -flow(back_arc(a))` is
//! maintained by construction: every increase on an arc decreases its back
//! arc.

use crate::graph::FlowGraph;
use crate::ids::TwoBitArray;

/// Flow function over all arcs of a graph.
#[derive(Clone, Debug)]
pub struct UnitFlow {
    flow: TwoBitArray,
}

impl UnitFlow {
    pub fn new(arc_count: u32) -> Self {
        let mut flow = TwoBitArray::new(arc_count as usize);
        flow.fill(1);
        Self { flow }
    }

    /// Resets every arc to zero flow.
    pub fn clear(&mut self) {
        self.flow.fill(1);
    }

    pub fn arc_count(&self) -> u32 {
        self.flow.len() as u32
    }

    /// Flow on `arc`, in `{-1, 0, +1}`.
    #[inline]
    pub fn get(&self, arc: u32) -> i32 {
        self.flow.get(arc) as i32 - 1
    }

    /// Adds one unit in the tail-to-head direction of `arc`.
    pub fn increase<G: FlowGraph>(&mut self, graph: &G, arc: u32) {
        let f = self.flow.get(arc);
        debug_assert!(
            f == 0 || f == 1,
            "flow is already maximum and can not be increased"
        );
        debug_assert!(
            self.flow.get(graph.back_arc(arc)) == 2 - f,
            "back arc has invalid flow"
        );
        self.flow.set(arc, f + 1);
        self.flow.set(graph.back_arc(arc), 1 - f);
    }

    /// Removes one unit in the tail-to-head direction of `arc`.
    pub fn decrease<G: FlowGraph>(&mut self, graph: &G, arc: u32) {
        let f = self.flow.get(arc);
        debug_assert!(
            f == 1 || f == 2,
            "flow is already minimum and can not be decreased"
        );
        debug_assert!(
            self.flow.get(graph.back_arc(arc)) == 2 - f,
            "back arc has invalid flow"
        );
        self.flow.set(arc, f - 1);
        self.flow.set(graph.back_arc(arc), 3 - f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    #[test]
    fn increase_flips_back_arc() {
        let mut b = GraphBuilder::new(2);
        b.add_arc(0, 1, 1);
        b.symmetrize();
        let g = b.build().unwrap();
        let mut f = UnitFlow::new(2);
        assert_eq!(f.get(0), 0);
        f.increase(&g, 0);
        assert_eq!(f.get(0), 1);
        assert_eq!(f.get(1), -1);
        f.decrease(&g, 0);
        assert_eq!(f.get(0), 0);
        assert_eq!(f.get(1), 0);
    }
}
