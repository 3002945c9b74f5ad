use context_code_parser::{Component, Relationship, RelationshipType};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node in the merged graph: one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub component: Component,
}

impl GraphNode {
    pub fn id(&self) -> &str {
        &self.component.id
    }
}

/// Edge in the merged graph: one resolved relationship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub relationship: Relationship,

    /// Confidence of the underlying relationship
    pub weight: f32,
}

impl GraphEdge {
    pub fn new(relationship: Relationship) -> Self {
        let weight = relationship.metadata.confidence;
        Self {
            relationship,
            weight,
        }
    }

    pub fn kind(&self) -> RelationshipType {
        self.relationship.relationship_type
    }
}

/// Outcome of phase-two resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionStats {
    pub files: usize,
    pub duplicate_components: usize,
    /// Pending edges rewritten to a component
    pub resolved: usize,
    /// Pending edges left as placeholders
    pub unresolved: usize,
}

/// Merged component graph with its unresolved placeholders
pub struct CodeGraph {
    /// Directed graph (component -> component with relationships)
    pub graph: DiGraph<GraphNode, GraphEdge>,

    /// Component id -> NodeIndex
    pub id_index: HashMap<String, NodeIndex>,

    /// Component name -> NodeIndex, in insertion order
    pub name_index: HashMap<String, Vec<NodeIndex>>,

    /// Edges whose target is still `Pending`
    pub unresolved: Vec<Relationship>,

    pub stats: ResolutionStats,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
            name_index: HashMap::new(),
            unresolved: Vec::new(),
            stats: ResolutionStats::default(),
        }
    }

    /// Add a component; an id already present keeps its first node
    pub fn add_node(&mut self, component: Component) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&component.id) {
            return idx;
        }
        let id = component.id.clone();
        let name = component.name.clone();

        let idx = self.graph.add_node(GraphNode { component });

        self.id_index.insert(id, idx);
        self.name_index.entry(name).or_default().push(idx);

        idx
    }

    /// Add a resolved relationship. Returns `false` when either endpoint is unknown
    /// or the target is still pending.
    pub fn add_relationship(&mut self, relationship: Relationship) -> bool {
        let Some(target_id) = relationship.target.resolved_id() else {
            return false;
        };
        let (Some(&from), Some(&to)) = (
            self.id_index.get(&relationship.source_id),
            self.id_index.get(target_id),
        ) else {
            return false;
        };
        self.graph.add_edge(from, to, GraphEdge::new(relationship));
        true
    }

    /// Find node by component id
    pub fn find_node(&self, id: &str) -> Option<NodeIndex> {
        self.id_index.get(id).copied()
    }

    /// Nodes whose component carries `name`
    pub fn find_by_name(&self, name: &str) -> Vec<NodeIndex> {
        self.name_index.get(name).cloned().unwrap_or_default()
    }

    pub fn get_node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    /// Every resolved relationship, in insertion order
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.graph.edge_weights().map(|edge| &edge.relationship)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for CodeGraph {
    fn default() -> Self {
        Self::new()
    }
}
