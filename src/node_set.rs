//! Growing node sets of the cutter: assimilated and reachable sides.
//!
//! Each set tracks membership flags plus a queue of *extra nodes* -- roots
//! added since the last growth step. [`BasicNodeSet::grow`] expands only from
//! those roots, resuming at a rotating cursor so an aborted pass picks up
//! where it stopped. Already-inside nodes block expansion, which makes
//! repeated grows incremental rather than quadratic.

use crate::graph::FlowGraph;
use crate::ids::BitSet;
use crate::search::{ScratchSpace, SearchAlgorithm, Visit};

/// Membership flags plus pending growth roots.
#[derive(Clone, Debug)]
pub struct BasicNodeSet {
    last_grow_index: usize,
    inside_count: u32,
    inside: BitSet,
    extra_nodes: Vec<u32>,
}

struct GrowVisitor<'a, N, F, A> {
    inside: &'a mut BitSet,
    inside_count: &'a mut u32,
    on_new_node: N,
    should_follow_arc: F,
    on_new_arc: A,
}

impl<N, F, A> Visit for GrowVisitor<'_, N, F, A>
where
    N: FnMut(u32) -> bool,
    F: FnMut(u32) -> bool,
    A: FnMut(u32),
{
    fn was_seen(&self, node: u32) -> bool {
        self.inside.get(node)
    }

    fn see_node(&mut self, node: u32) -> bool {
        debug_assert!(!self.inside.get(node));
        self.inside.set(node, true);
        *self.inside_count += 1;
        (self.on_new_node)(node)
    }

    fn should_follow_arc(&mut self, arc: u32) -> bool {
        (self.should_follow_arc)(arc)
    }

    fn on_new_arc(&mut self, arc: u32) {
        (self.on_new_arc)(arc)
    }
}

impl BasicNodeSet {
    pub fn new(node_count: u32) -> Self {
        Self {
            last_grow_index: 0,
            inside_count: 0,
            inside: BitSet::new(node_count as usize),
            extra_nodes: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.inside_count = 0;
        self.inside.fill(false);
        self.extra_nodes.clear();
    }

    pub fn can_grow(&self) -> bool {
        !self.extra_nodes.is_empty()
    }

    /// One growth pass from all extra roots. `on_new_node` returning `false`
    /// aborts the pass; the cursor remembers the aborted root so the next
    /// pass resumes there. Returns whether the pass completed.
    pub fn grow<G, N, F, A>(
        &mut self,
        graph: &G,
        scratch: &mut ScratchSpace,
        search: SearchAlgorithm,
        mut on_new_node: N,
        mut should_follow_arc: F,
        mut on_new_arc: A,
    ) -> bool
    where
        G: FlowGraph,
        N: FnMut(u32) -> bool,
        F: FnMut(u32) -> bool,
        A: FnMut(u32),
    {
        debug_assert!(self.can_grow());
        let Self {
            last_grow_index,
            inside_count,
            inside,
            extra_nodes,
        } = self;

        let mut visitor = GrowVisitor {
            inside,
            inside_count,
            on_new_node: &mut on_new_node,
            should_follow_arc: &mut should_follow_arc,
            on_new_arc: &mut on_new_arc,
        };

        if *last_grow_index >= extra_nodes.len() {
            *last_grow_index = 0;
        }
        let split = *last_grow_index;
        let order = (split..extra_nodes.len()).chain(0..split);
        for i in order {
            if !search.run(graph, scratch, extra_nodes[i], &mut visitor) {
                *last_grow_index = i;
                return false;
            }
        }
        true
    }

    pub fn add_node(&mut self, node: u32) {
        debug_assert!(!self.inside.get(node));
        self.inside.set(node, true);
        self.inside_count += 1;
    }

    pub fn add_extra_node(&mut self, node: u32) {
        self.extra_nodes.push(node);
    }

    pub fn clear_extra_nodes(&mut self) {
        self.extra_nodes.clear();
    }

    pub fn extra_nodes(&self) -> &[u32] {
        &self.extra_nodes
    }

    /// Copies membership from `other`, keeping this set's own roots and
    /// cursor.
    pub fn copy_nodes_without_extra_nodes(&mut self, other: &BasicNodeSet) {
        self.inside_count = other.inside_count;
        self.inside.clone_from(&other.inside);
    }

    #[inline]
    pub fn contains(&self, node: u32) -> bool {
        self.inside.get(node)
    }

    pub fn inside_count(&self) -> u32 {
        self.inside_count
    }

    pub fn node_count(&self) -> u32 {
        self.inside.len() as u32
    }
}

/// Nodes committed to one side, plus the cut front: the flow-carrying arcs
/// leaving the side.
#[derive(Clone, Debug)]
pub struct AssimilatedNodeSet {
    node_set: BasicNodeSet,
    front: Vec<u32>,
}

impl AssimilatedNodeSet {
    pub fn new(node_count: u32) -> Self {
        Self {
            node_set: BasicNodeSet::new(node_count),
            front: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.node_set.clear();
        self.front.clear();
    }

    pub fn add_node(&mut self, node: u32) {
        self.node_set.add_node(node);
    }

    pub fn add_extra_node(&mut self, node: u32) {
        self.node_set.add_extra_node(node);
    }

    pub fn clear_extra_nodes(&mut self) {
        self.node_set.clear_extra_nodes();
    }

    pub fn extra_nodes(&self) -> &[u32] {
        self.node_set.extra_nodes()
    }

    pub fn can_grow(&self) -> bool {
        self.node_set.can_grow()
    }

    /// Grows the side and records every flow-carrying arc it touches into
    /// the cut front.
    pub fn grow<G, N, F, H>(
        &mut self,
        graph: &G,
        scratch: &mut ScratchSpace,
        search: SearchAlgorithm,
        on_new_node: N,
        should_follow_arc: F,
        mut has_flow: H,
    ) -> bool
    where
        G: FlowGraph,
        N: FnMut(u32) -> bool,
        F: FnMut(u32) -> bool,
        H: FnMut(u32) -> bool,
    {
        let front = &mut self.front;
        self.node_set.grow(
            graph,
            scratch,
            search,
            on_new_node,
            should_follow_arc,
            |xy| {
                if has_flow(xy) {
                    front.push(xy);
                }
            },
        )
    }

    #[inline]
    pub fn contains(&self, node: u32) -> bool {
        self.node_set.contains(node)
    }

    pub fn inside_count(&self) -> u32 {
        self.node_set.inside_count()
    }

    pub fn node_count(&self) -> u32 {
        self.node_set.node_count()
    }

    /// Drops front arcs whose head has since been assimilated.
    pub fn shrink_cut_front<G: FlowGraph>(&mut self, graph: &G) {
        let node_set = &self.node_set;
        self.front.retain(|&xy| !node_set.contains(graph.head(xy)));
    }

    pub fn cut_front(&self) -> &[u32] {
        &self.front
    }

    pub(crate) fn basic(&self) -> &BasicNodeSet {
        &self.node_set
    }
}

/// Nodes reachable from one assimilated side in the residual graph, with
/// predecessor arcs for augmenting-path extraction.
#[derive(Clone, Debug)]
pub struct ReachableNodeSet {
    node_set: BasicNodeSet,
    predecessor: Vec<u32>,
}

impl ReachableNodeSet {
    pub fn new(node_count: u32) -> Self {
        Self {
            node_set: BasicNodeSet::new(node_count),
            predecessor: vec![0; node_count as usize],
        }
    }

    /// Reinitializes to the assimilated membership. `keep_extra` preserves
    /// this set's own growth roots; otherwise the assimilated side's roots
    /// and cursor are adopted.
    pub fn reset(&mut self, other: &AssimilatedNodeSet, keep_extra: bool) {
        if keep_extra {
            self.node_set.copy_nodes_without_extra_nodes(other.basic());
        } else {
            self.node_set.clone_from(other.basic());
        }
    }

    pub fn clear(&mut self) {
        self.node_set.clear();
    }

    pub fn add_node(&mut self, node: u32) {
        self.node_set.add_node(node);
    }

    pub fn add_extra_node(&mut self, node: u32) {
        self.node_set.add_extra_node(node);
    }

    pub fn clear_extra_nodes(&mut self) {
        self.node_set.clear_extra_nodes();
    }

    pub fn can_grow(&self) -> bool {
        self.node_set.can_grow()
    }

    /// Grows the reachable set, recording the predecessor arc of every node
    /// the search considers following into.
    pub fn grow<G, N, F, A>(
        &mut self,
        graph: &G,
        scratch: &mut ScratchSpace,
        search: SearchAlgorithm,
        on_new_node: N,
        mut should_follow_arc: F,
        on_new_arc: A,
    ) -> bool
    where
        G: FlowGraph,
        N: FnMut(u32) -> bool,
        F: FnMut(u32) -> bool,
        A: FnMut(u32),
    {
        let predecessor = &mut self.predecessor;
        self.node_set.grow(
            graph,
            scratch,
            search,
            on_new_node,
            |xy| {
                predecessor[graph.head(xy) as usize] = xy;
                should_follow_arc(xy)
            },
            on_new_arc,
        )
    }

    #[inline]
    pub fn contains(&self, node: u32) -> bool {
        self.node_set.contains(node)
    }

    pub fn inside_count(&self) -> u32 {
        self.node_set.inside_count()
    }

    pub fn node_count(&self) -> u32 {
        self.node_set.node_count()
    }

    /// Walks the predecessor arcs from `target` back to the first node for
    /// which `is_source` holds, invoking `on_arc` on every traversed arc.
    pub fn for_arcs_in_path_to<G, S, A>(&self, graph: &G, is_source: S, target: u32, mut on_arc: A)
    where
        G: FlowGraph,
        S: Fn(u32) -> bool,
        A: FnMut(u32),
    {
        let mut x = target;
        while !is_source(x) {
            let arc = self.predecessor[x as usize];
            on_arc(arc);
            x = graph.tail(arc);
        }
    }
}
