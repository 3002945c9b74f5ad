//! Relationship extraction passes shared by every parser.
//!
//! A pass reads `(components, content)` and writes edges into a [`RelationshipSet`]. Edge ids
//! are derived from `(source, target, type)`, so running a pass twice, or composing passes
//! from different parsers, never yields duplicates.

pub mod containment;
pub mod imports;
pub mod inheritance;
pub mod references;
pub mod usage;

use crate::error::Result;
use crate::types::{file_name, generate_component_id, Component, ComponentType, Relationship};
use std::collections::HashMap;

pub use containment::ContainmentPass;
pub use imports::ImportExportPass;
pub use inheritance::InheritancePass;
pub use references::ReferencePass;
pub use usage::UsagePass;

/// Edges keyed by relationship id, in first-discovery order
#[derive(Debug, Default, Clone)]
pub struct RelationshipSet {
    relationships: Vec<Relationship>,
    index: HashMap<String, usize>,
}

impl RelationshipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless an edge with the same id exists. Returns whether it was new.
    ///
    /// On collision the stronger confidence and the earliest line are kept.
    pub fn insert(&mut self, relationship: Relationship) -> bool {
        if let Some(&pos) = self.index.get(&relationship.id) {
            let existing = &mut self.relationships[pos];
            if relationship.metadata.confidence > existing.metadata.confidence {
                existing.metadata.confidence = relationship.metadata.confidence;
            }
            existing.metadata.line = match (existing.metadata.line, relationship.metadata.line) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            return false;
        }
        self.index
            .insert(relationship.id.clone(), self.relationships.len());
        self.relationships.push(relationship);
        true
    }

    pub fn extend(&mut self, relationships: impl IntoIterator<Item = Relationship>) {
        for relationship in relationships {
            self.insert(relationship);
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter()
    }

    pub fn into_vec(self) -> Vec<Relationship> {
        self.relationships
    }
}

/// Read-only view shared by all passes of one run
pub struct PassContext<'a> {
    pub components: &'a [Component],
    pub content: &'a str,
    lines: Vec<&'a str>,
    by_name: HashMap<&'a str, Vec<&'a Component>>,
}

impl<'a> PassContext<'a> {
    pub fn new(components: &'a [Component], content: &'a str) -> Self {
        let mut by_name: HashMap<&str, Vec<&Component>> = HashMap::new();
        for component in components {
            by_name
                .entry(component.name.as_str())
                .or_default()
                .push(component);
        }
        Self {
            components,
            content,
            lines: content.lines().collect(),
            by_name,
        }
    }

    /// 1-based line of the content (empty when out of range)
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&'a str> {
        line.checked_sub(1).and_then(|idx| self.lines.get(idx).copied())
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Best component named `name` accepted by `filter`: same file first, then lowest id
    #[must_use]
    pub fn find_named(
        &self,
        name: &str,
        file_path: &str,
        filter: impl Fn(&Component) -> bool,
    ) -> Option<&'a Component> {
        let candidates = self.by_name.get(name)?;
        candidates
            .iter()
            .copied()
            .filter(|c| filter(c))
            .min_by(|a, b| {
                let a_other = a.file_path != file_path;
                let b_other = b.file_path != file_path;
                a_other.cmp(&b_other).then_with(|| a.id.cmp(&b.id))
            })
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a Component> {
        self.components.iter().find(|c| c.id == id)
    }
}

/// Id of the synthetic file component for `file_path`, whether or not it is in the batch
#[must_use]
pub fn file_root_id(file_path: &str) -> String {
    generate_component_id(file_path, &file_name(file_path), ComponentType::File)
}

/// One composable extraction routine
pub trait RelationshipPass: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &PassContext<'_>, out: &mut RelationshipSet) -> Result<()>;
}

/// Passes every code parser runs, in order
#[must_use]
pub fn standard_passes() -> Vec<Box<dyn RelationshipPass>> {
    vec![
        Box::new(ContainmentPass),
        Box::new(ImportExportPass),
        Box::new(InheritancePass),
        Box::new(UsagePass),
        Box::new(ReferencePass),
    ]
}

/// Run passes in order. A failing pass is logged and the edges found so far are returned.
pub fn run_passes(
    passes: &[Box<dyn RelationshipPass>],
    components: &[Component],
    content: &str,
) -> Vec<Relationship> {
    let ctx = PassContext::new(components, content);
    let mut set = RelationshipSet::new();
    for pass in passes {
        if let Err(err) = pass.run(&ctx, &mut set) {
            log::warn!(
                "relationship pass '{}' failed, keeping {} edges: {err}",
                pass.name(),
                set.len()
            );
            break;
        }
    }
    set.into_vec()
}

/// Run [`standard_passes`]
pub fn run_standard_passes(components: &[Component], content: &str) -> Vec<Relationship> {
    run_passes(&standard_passes(), components, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParserError;
    use crate::types::RelationshipType;

    struct FailingPass;

    impl RelationshipPass for FailingPass {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn run(&self, _ctx: &PassContext<'_>, _out: &mut RelationshipSet) -> Result<()> {
            Err(ParserError::pass("failing", "boom"))
        }
    }

    #[test]
    fn set_dedupes_by_id_and_keeps_strongest() {
        let mut set = RelationshipSet::new();
        assert!(set.insert(Relationship::resolved("a", "b", RelationshipType::Calls).confidence(0.5)));
        assert!(!set.insert(
            Relationship::resolved("a", "b", RelationshipType::Calls)
                .confidence(0.9)
                .at_line(3)
        ));
        assert_eq!(set.len(), 1);
        let only = set.iter().next().cloned().expect("one edge");
        assert!((only.metadata.confidence - 0.9).abs() < f32::EPSILON);
        assert_eq!(only.metadata.line, Some(3));
    }

    #[test]
    fn failing_pass_keeps_partial_results() {
        let content = "class A {}\n";
        let mut root = Component::file_root("a.ts", crate::Language::TypeScript, content);
        root.parent_id = None;
        let mut child = root.clone();
        child.id = "a.ts::class::A".to_string();
        child.name = "A".to_string();
        child.component_type = ComponentType::Class;
        child.parent_id = Some(root.id.clone());
        let components = vec![root, child];

        let passes: Vec<Box<dyn RelationshipPass>> =
            vec![Box::new(ContainmentPass), Box::new(FailingPass), Box::new(UsagePass)];
        let relationships = run_passes(&passes, &components, content);
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].relationship_type, RelationshipType::Contains);
    }

    #[test]
    fn file_root_id_matches_component() {
        let root = Component::file_root("src/x.py", crate::Language::Python, "");
        assert_eq!(file_root_id("src/x.py"), root.id);
    }
}
