//! Shared path-reconstruction plumbing for the searches

use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};

/// Raw result of a successful search, before reduction into a
/// client-facing route
#[derive(Debug, Clone)]
pub(crate) struct SearchOutcome {
    /// Path nodes from source to target inclusive
    pub nodes: Vec<NodeIndex>,
    /// Path edges, one fewer than `nodes`
    pub edges: Vec<EdgeIndex>,
    /// Total traversal cost under the variant's weighting
    pub cost: f64,
    /// Number of nodes settled during the search
    pub settled: usize,
}

/// Walk the predecessor chain back from the target. Only called once
/// the target has been settled, so the chain is complete and acyclic.
pub(crate) fn reconstruct(
    predecessors: &HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
    source: NodeIndex,
    target: NodeIndex,
    cost: f64,
    settled: usize,
) -> SearchOutcome {
    let mut nodes = vec![target];
    let mut edges = Vec::new();

    let mut current = target;
    while current != source {
        let (previous, edge) = predecessors[&current];
        nodes.push(previous);
        edges.push(edge);
        current = previous;
    }

    nodes.reverse();
    edges.reverse();

    SearchOutcome {
        nodes,
        edges,
        cost,
        settled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_is_rebuilt_in_forward_order() {
        let a = NodeIndex::new(0);
        let b = NodeIndex::new(1);
        let c = NodeIndex::new(2);

        let mut predecessors = HashMap::new();
        predecessors.insert(c, (b, EdgeIndex::new(1)));
        predecessors.insert(b, (a, EdgeIndex::new(0)));

        let outcome = reconstruct(&predecessors, a, c, 4.5, 3);

        assert_eq!(outcome.nodes, vec![a, b, c]);
        assert_eq!(outcome.edges, vec![EdgeIndex::new(0), EdgeIndex::new(1)]);
        assert_eq!(outcome.cost, 4.5);
        assert_eq!(outcome.settled, 3);
    }

    #[test]
    fn source_equal_to_target_yields_a_single_node() {
        let a = NodeIndex::new(3);
        let outcome = reconstruct(&HashMap::new(), a, a, 0.0, 1);

        assert_eq!(outcome.nodes, vec![a]);
        assert!(outcome.edges.is_empty());
    }
}
