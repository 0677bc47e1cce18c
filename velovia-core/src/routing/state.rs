//! Priority-queue entries for the graph searches.
//!
//! `std::collections::BinaryHeap` is a max-heap, so both orderings are
//! reversed to pop the cheapest entry first. Cost ties break toward
//! the smaller node index, which fixes the expansion order and makes
//! equal-cost searches reproducible across runs.

use std::cmp::Ordering;

use petgraph::graph::NodeIndex;

/// Frontier entry for Dijkstra
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SearchState {
    pub cost: f64,
    pub node: NodeIndex,
}

impl Eq for SearchState {}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Frontier entry for A*; ordered by `estimate` (cost so far plus the
/// admissible remainder bound), while `cost` carries the exact cost
/// from the source
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EstimatedState {
    pub estimate: f64,
    pub cost: f64,
    pub node: NodeIndex,
}

impl Eq for EstimatedState {}

impl Ord for EstimatedState {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

impl PartialOrd for EstimatedState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    #[test]
    fn heap_pops_cheapest_state_first() {
        let mut heap = BinaryHeap::new();
        heap.push(SearchState { cost: 5.0, node: NodeIndex::new(1) });
        heap.push(SearchState { cost: 1.0, node: NodeIndex::new(2) });
        heap.push(SearchState { cost: 3.0, node: NodeIndex::new(3) });

        assert_eq!(heap.pop().map(|s| s.cost), Some(1.0));
        assert_eq!(heap.pop().map(|s| s.cost), Some(3.0));
        assert_eq!(heap.pop().map(|s| s.cost), Some(5.0));
    }

    #[test]
    fn cost_ties_break_toward_smaller_node() {
        let mut heap = BinaryHeap::new();
        heap.push(SearchState { cost: 2.0, node: NodeIndex::new(9) });
        heap.push(SearchState { cost: 2.0, node: NodeIndex::new(4) });
        heap.push(SearchState { cost: 2.0, node: NodeIndex::new(7) });

        assert_eq!(heap.pop().map(|s| s.node.index()), Some(4));
        assert_eq!(heap.pop().map(|s| s.node.index()), Some(7));
        assert_eq!(heap.pop().map(|s| s.node.index()), Some(9));
    }

    #[test]
    fn estimate_orders_astar_states() {
        let mut heap = BinaryHeap::new();
        heap.push(EstimatedState { estimate: 8.0, cost: 1.0, node: NodeIndex::new(1) });
        heap.push(EstimatedState { estimate: 4.0, cost: 3.0, node: NodeIndex::new(2) });

        assert_eq!(heap.pop().map(|s| s.node.index()), Some(2));
    }
}
