use super::{PassContext, RelationshipPass, RelationshipSet};
use crate::error::Result;
use crate::types::{Component, ComponentDetails, ComponentType, Relationship, RelationshipType};
use once_cell::sync::Lazy;
use regex::Regex;

static INDEX_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,4}\d+$").expect("valid index tag regex"));

/// Declarative edges: decorators/annotations (`ANNOTATES`) and documentation references
/// (`REFERENCES`) from narrative text and index entries.
pub struct ReferencePass;

impl RelationshipPass for ReferencePass {
    fn name(&self) -> &'static str {
        "references"
    }

    fn run(&self, ctx: &PassContext<'_>, out: &mut RelationshipSet) -> Result<()> {
        for component in ctx.components {
            match component.component_type {
                ComponentType::Decorator | ComponentType::Annotation => {
                    if let Some(target) = component.parent_id.as_deref() {
                        out.insert(
                            Relationship::resolved(&component.id, target, RelationshipType::Annotates)
                                .at_line(component.location.start_line),
                        );
                    }
                    continue;
                }
                _ => {}
            }

            match &component.metadata.details {
                ComponentDetails::Narrative {
                    references, links, ..
                } => {
                    for reference in references {
                        if let Some(rel) = reference_edge(ctx, component, reference) {
                            out.insert(rel);
                        }
                    }
                    for link in links {
                        if let Some(rel) = link_edge(ctx, component, link) {
                            out.insert(rel);
                        }
                    }
                }
                ComponentDetails::IndexEntry {
                    target: Some(target),
                    range,
                    ..
                } => {
                    let mut rel = match find_index_entry(ctx, component, target) {
                        Some(entry) => {
                            Relationship::resolved(&component.id, &entry.id, RelationshipType::References)
                        }
                        None => Relationship::pending(&component.id, target, RelationshipType::References)
                            .confidence(0.5),
                    };
                    if let Some((start, end)) = range {
                        rel.metadata
                            .extra
                            .insert("range".to_string(), format!("{start}-{end}").into());
                    }
                    out.insert(rel.at_line(component.location.start_line));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn find_index_entry<'a>(
    ctx: &PassContext<'a>,
    from: &Component,
    tag: &str,
) -> Option<&'a Component> {
    ctx.components
        .iter()
        .filter(|c| c.id != from.id && c.file_path == from.file_path)
        .find(|c| match &c.metadata.details {
            ComponentDetails::IndexEntry {
                tag: entry_tag,
                target: None,
                ..
            } => entry_tag == tag,
            _ => false,
        })
}

fn reference_edge(ctx: &PassContext<'_>, from: &Component, reference: &str) -> Option<Relationship> {
    let line = from.location.start_line;
    if let Some(entry) = find_index_entry(ctx, from, reference) {
        return Some(
            Relationship::resolved(&from.id, &entry.id, RelationshipType::References).at_line(line),
        );
    }
    if let Some(target) = ctx.find_named(reference, &from.file_path, |c| {
        !c.is_root() && !c.component_type.is_narrative() && !c.component_type.is_index()
    }) {
        return Some(
            Relationship::resolved(&from.id, &target.id, RelationshipType::References)
                .confidence(0.8)
                .at_line(line),
        );
    }
    INDEX_TAG.is_match(reference).then(|| {
        Relationship::pending(&from.id, reference, RelationshipType::References)
            .confidence(0.5)
            .at_line(line)
    })
}

fn link_edge(ctx: &PassContext<'_>, from: &Component, link: &str) -> Option<Relationship> {
    let line = from.location.start_line;
    let link = link.trim();
    if link.is_empty() || link.contains("://") || link.starts_with("mailto:") {
        return None;
    }
    if let Some(anchor) = link.strip_prefix('#') {
        let section = ctx.components.iter().find(|c| {
            c.file_path == from.file_path
                && matches!(&c.metadata.details, ComponentDetails::Section { anchor: a, .. } if a == anchor)
        });
        return Some(match section {
            Some(section) => {
                Relationship::resolved(&from.id, &section.id, RelationshipType::References)
            }
            None => Relationship::pending(&from.id, link, RelationshipType::References),
        }
        .at_line(line));
    }
    Some(Relationship::pending(&from.id, link, RelationshipType::References).at_line(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::types::RelationshipTarget;

    fn component(name: &str, ty: ComponentType, details: ComponentDetails) -> Component {
        let mut c = Component::file_root("README.md", Language::Markdown, "");
        c.id = format!("README.md::{}::{name}", ty.as_str());
        c.name = name.to_string();
        c.component_type = ty;
        c.parent_id = Some("README.md::file::README.md".to_string());
        c.metadata.details = details;
        c
    }

    #[test]
    fn narrative_references_resolve_to_index_entries_and_sections() {
        let entry = component(
            "Loader",
            ComponentType::IndexSystem,
            ComponentDetails::IndexEntry {
                tag: "S1".to_string(),
                section: "SYSTEMS".to_string(),
                description: None,
                parent_tag: None,
                target: None,
                range: None,
                fields: Vec::new(),
            },
        );
        let section = component(
            "Usage",
            ComponentType::Section,
            ComponentDetails::Section {
                level: 2,
                anchor: "usage".to_string(),
            },
        );
        let para = component(
            "para",
            ComponentType::Paragraph,
            ComponentDetails::Narrative {
                references: vec!["S1".to_string(), "S9".to_string()],
                links: vec!["#usage".to_string(), "https://example.com".to_string()],
                markers: Vec::new(),
            },
        );
        let components = vec![entry.clone(), section.clone(), para];
        let ctx = PassContext::new(&components, "");
        let mut set = RelationshipSet::new();
        ReferencePass.run(&ctx, &mut set).expect("pass");
        let targets: Vec<_> = set.iter().map(|r| r.target.clone()).collect();

        assert_eq!(
            targets,
            vec![
                RelationshipTarget::Resolved(entry.id),
                RelationshipTarget::Pending("S9".to_string()),
                RelationshipTarget::Resolved(section.id),
            ]
        );
    }

    #[test]
    fn decorators_annotate_their_parent() {
        let mut decorator = component("cached", ComponentType::Decorator, ComponentDetails::None);
        decorator.parent_id = Some("app.py::function::load".to_string());
        let components = vec![decorator];
        let ctx = PassContext::new(&components, "");
        let mut set = RelationshipSet::new();
        ReferencePass.run(&ctx, &mut set).expect("pass");
        let rel = set.iter().next().expect("edge");
        assert_eq!(rel.relationship_type, RelationshipType::Annotates);
        assert_eq!(rel.target.resolved_id(), Some("app.py::function::load"));
    }
}
