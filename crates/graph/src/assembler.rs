use crate::error::{GraphError, Result};
use crate::types::CodeGraph;
use context_code_parser::{Component, ComponentType, Relationship, RelationshipType};
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::HashSet;

/// Traversal depth accepted by [`ContextAssembler::assemble`]
pub const MAX_DEPTH: usize = 8;

/// Gathers the components around one entity, ranked by relevance
pub struct ContextAssembler {
    graph: CodeGraph,
}

/// Slice of the graph around one entity
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledContext {
    /// The requested component
    pub focus: Component,

    /// Related components, most relevant first
    pub related: Vec<RelatedComponent>,

    /// Resolved edges between included components, sorted by id
    pub relationships: Vec<Relationship>,

    /// Pending edges leaving included components
    pub unresolved: Vec<Relationship>,

    pub depth: usize,
}

impl AssembledContext {
    /// Focus first, then related components in rank order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        std::iter::once(&self.focus).chain(self.related.iter().map(|r| &r.component))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedComponent {
    pub component: Component,
    pub relationship: Vec<RelationshipType>,
    pub distance: usize,
    pub relevance_score: f32,
}

impl ContextAssembler {
    pub fn new(graph: CodeGraph) -> Self {
        Self { graph }
    }

    /// Resolve `entity` (component id, else component name) to a node.
    ///
    /// Names matching several components pick the first declaration by id, preferring
    /// declarations over imports and files.
    pub fn resolve_entity(&self, entity: &str) -> Result<NodeIndex> {
        let entity = entity.trim();
        if entity.is_empty() {
            return Err(GraphError::InvalidSymbol("empty entity".to_string()));
        }
        if let Some(idx) = self.graph.find_node(entity) {
            return Ok(idx);
        }

        let rank = |c: &Component| match c.component_type {
            ComponentType::Import => 2,
            ComponentType::File => 1,
            _ => 0,
        };
        self.graph
            .find_by_name(entity)
            .into_iter()
            .filter_map(|idx| self.graph.get_node(idx).map(|n| (idx, &n.component)))
            .min_by(|(_, a), (_, b)| rank(a).cmp(&rank(b)).then_with(|| a.id.cmp(&b.id)))
            .map(|(idx, _)| idx)
            .ok_or_else(|| GraphError::NodeNotFound(entity.to_string()))
    }

    /// Assemble the slice within `depth` hops of `entity`
    pub fn assemble(&self, entity: &str, depth: usize) -> Result<AssembledContext> {
        if depth > MAX_DEPTH {
            return Err(GraphError::TraversalError(format!(
                "depth {depth} exceeds the maximum of {MAX_DEPTH}"
            )));
        }
        let node = self.resolve_entity(entity)?;
        let focus = self
            .graph
            .get_node(node)
            .map(|n| n.component.clone())
            .ok_or_else(|| GraphError::NodeNotFound(entity.to_string()))?;

        let mut related = Vec::new();
        for (rel_node, distance, path) in self.graph.get_related_nodes(node, depth) {
            if let Some(node_data) = self.graph.get_node(rel_node) {
                related.push(RelatedComponent {
                    component: node_data.component.clone(),
                    relevance_score: calculate_relevance(distance, &path),
                    relationship: path,
                    distance,
                });
            }
        }

        // Sort by relevance, then distance, then id
        related.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.distance.cmp(&b.distance))
                .then_with(|| a.component.id.cmp(&b.component.id))
        });

        let included: HashSet<&str> = std::iter::once(focus.id.as_str())
            .chain(related.iter().map(|r| r.component.id.as_str()))
            .collect();
        let mut relationships: Vec<Relationship> = self
            .graph
            .relationships()
            .filter(|r| {
                included.contains(r.source_id.as_str())
                    && r.target.resolved_id().is_some_and(|t| included.contains(t))
            })
            .cloned()
            .collect();
        relationships.sort_by(|a, b| a.id.cmp(&b.id));
        let unresolved: Vec<Relationship> = self
            .graph
            .unresolved
            .iter()
            .filter(|r| included.contains(r.source_id.as_str()))
            .cloned()
            .collect();

        log::debug!(
            "assembled {} with {} related components, {} edges",
            focus.id,
            related.len(),
            relationships.len()
        );

        Ok(AssembledContext {
            focus,
            related,
            relationships,
            unresolved,
            depth,
        })
    }
}

/// Relevance of a node reached at `distance` along `path`
pub fn calculate_relevance(distance: usize, path: &[RelationshipType]) -> f32 {
    // Base score decreases with distance
    let distance_score = 1.0 / (distance as f32 + 1.0);

    let relationship_score: f32 = path
        .iter()
        .map(|rel| match rel {
            RelationshipType::Calls => 1.0,
            RelationshipType::Instantiates => 0.9,
            RelationshipType::Uses => 0.8,
            RelationshipType::Contains => 0.7,
            RelationshipType::Extends | RelationshipType::Implements => 0.6,
            RelationshipType::ImportsFrom | RelationshipType::Annotates => 0.5,
            RelationshipType::References => 0.45,
            RelationshipType::Exports | RelationshipType::ExportsFrom => 0.4,
        })
        .sum::<f32>()
        / path.len().max(1) as f32;

    distance_score * relationship_score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_relevance() {
        // Direct call (distance=1)
        let score1 = calculate_relevance(1, &[RelationshipType::Calls]);
        assert!(score1 > 0.4);

        // Distant relationship (distance=3)
        let score2 = calculate_relevance(
            3,
            &[
                RelationshipType::Calls,
                RelationshipType::Uses,
                RelationshipType::Calls,
            ],
        );
        assert!(score2 < score1);
        assert!(
            calculate_relevance(1, &[RelationshipType::Exports])
                < calculate_relevance(1, &[RelationshipType::Contains])
        );
    }

    #[test]
    fn unknown_and_empty_entities_are_errors() {
        let assembler = ContextAssembler::new(CodeGraph::new());
        assert!(matches!(assembler.assemble("nope", 1), Err(GraphError::NodeNotFound(_))));
        assert!(matches!(assembler.assemble("  ", 1), Err(GraphError::InvalidSymbol(_))));
        assert!(matches!(
            assembler.assemble("nope", MAX_DEPTH + 1),
            Err(GraphError::TraversalError(_))
        ));
    }
}
