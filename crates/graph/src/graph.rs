use crate::types::CodeGraph;
use context_code_parser::RelationshipType;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashSet, VecDeque};

impl CodeGraph {
    /// Nodes reachable within `max_depth` hops, following edges in both directions.
    /// Returns (NodeIndex, distance, relationship_path); distances are shortest paths.
    pub fn get_related_nodes(
        &self,
        node: NodeIndex,
        max_depth: usize,
    ) -> Vec<(NodeIndex, usize, Vec<RelationshipType>)> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::from([(node, 0usize, Vec::new())]);
        visited.insert(node);

        while let Some((current, depth, path)) = queue.pop_front() {
            if current != node {
                result.push((current, depth, path.clone()));
            }
            if depth >= max_depth {
                continue;
            }

            let outgoing = self
                .graph
                .edges_directed(current, Direction::Outgoing)
                .map(|e| (e.target(), e.weight().kind()));
            let incoming = self
                .graph
                .edges_directed(current, Direction::Incoming)
                .map(|e| (e.source(), e.weight().kind()));
            let mut neighbors: Vec<(NodeIndex, RelationshipType)> = outgoing.chain(incoming).collect();
            // Stable order independent of edge insertion
            neighbors.sort_by(|a, b| {
                self.graph[a.0]
                    .id()
                    .cmp(self.graph[b.0].id())
                    .then(a.1.cmp(&b.1))
            });

            for (next, kind) in neighbors {
                if visited.insert(next) {
                    let mut new_path = path.clone();
                    new_path.push(kind);
                    queue.push_back((next, depth + 1, new_path));
                }
            }
        }

        result
    }
}
