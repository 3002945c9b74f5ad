use crate::error::{GraphError, Result};
use crate::resolver::Resolver;
use crate::types::{CodeGraph, ResolutionStats};
use context_code_parser::passes::RelationshipSet;
use context_code_parser::{Component, FileExtraction, Relationship};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Merges per-file extractions into one [`CodeGraph`].
///
/// Phase one (parsing) happens elsewhere and may run in any order; `build` sorts by id,
/// so the merged graph does not depend on the order extractions were added.
#[derive(Default)]
pub struct GraphBuilder {
    files: BTreeSet<String>,
    components: BTreeMap<String, Component>,
    relationships: RelationshipSet,
    duplicate_components: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one file's extraction. The same file path may only be added once.
    pub fn add_extraction(&mut self, extraction: FileExtraction) -> Result<()> {
        if !self.files.insert(extraction.file_path.clone()) {
            return Err(GraphError::BuildError(format!(
                "file added twice: {}",
                extraction.file_path
            )));
        }
        self.add_components(extraction.components);
        self.relationships.extend(extraction.relationships);
        Ok(())
    }

    /// Add components outside any extraction; an id already present keeps its first component
    pub fn add_components(&mut self, components: impl IntoIterator<Item = Component>) {
        for component in components {
            if self.components.contains_key(&component.id) {
                log::debug!("duplicate component id {}", component.id);
                self.duplicate_components += 1;
                continue;
            }
            self.components.insert(component.id.clone(), component);
        }
    }

    pub fn add_relationships(&mut self, relationships: impl IntoIterator<Item = Relationship>) {
        self.relationships.extend(relationships);
    }

    /// Resolve pending targets and assemble the graph
    pub fn build(self) -> CodeGraph {
        let components: Vec<Component> = self.components.into_values().collect();
        let mut relationships = self.relationships.into_vec();
        relationships.sort_by(|a, b| a.id.cmp(&b.id));

        let mut stats = ResolutionStats {
            files: components.iter().filter(|c| c.is_root()).count(),
            duplicate_components: self.duplicate_components,
            ..ResolutionStats::default()
        };

        // Phase two
        let mut merged = RelationshipSet::new();
        {
            let by_id: HashMap<&str, &Component> =
                components.iter().map(|c| (c.id.as_str(), c)).collect();
            let resolver = Resolver::new(&components);
            for mut relationship in relationships {
                if relationship.target.is_pending() {
                    let target = by_id
                        .get(relationship.source_id.as_str())
                        .and_then(|source| resolver.resolve(&relationship, source));
                    if let Some(target) = target {
                        log::trace!(
                            "resolved {} {} -> {target}",
                            relationship.relationship_type,
                            relationship.target_key()
                        );
                        relationship.resolve_to(target);
                        stats.resolved += 1;
                    }
                }
                merged.insert(relationship);
            }
        }

        let mut graph = CodeGraph::new();
        for component in components {
            graph.add_node(component);
        }
        let mut dangling = 0usize;
        for relationship in merged.into_vec() {
            if relationship.target.is_pending() {
                graph.unresolved.push(relationship);
            } else if !graph.add_relationship(relationship) {
                dangling += 1;
            }
        }
        if dangling > 0 {
            log::warn!("{dangling} relationships reference components outside the graph");
        }
        graph.unresolved.sort_by(|a, b| a.id.cmp(&b.id));
        stats.unresolved = graph.unresolved.len();
        graph.stats = stats;

        log::debug!(
            "graph: {} files, {} nodes, {} edges, {} resolved, {} pending",
            stats.files,
            graph.node_count(),
            graph.edge_count(),
            stats.resolved,
            stats.unresolved
        );
        graph
    }
}

/// Convenience for the common case of a finished batch of extractions
pub fn merge_extractions(extractions: impl IntoIterator<Item = FileExtraction>) -> Result<CodeGraph> {
    let mut builder = GraphBuilder::new();
    for extraction in extractions {
        builder.add_extraction(extraction)?;
    }
    Ok(builder.build())
}
