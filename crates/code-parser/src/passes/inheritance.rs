use super::{PassContext, RelationshipPass, RelationshipSet};
use crate::error::Result;
use crate::language::Language;
use crate::parsers::last_segment;
use crate::types::{Component, ComponentDetails, ComponentType, Relationship, RelationshipType};

/// `EXTENDS` / `IMPLEMENTS` from heritage clauses.
///
/// Names that match no known type still produce an edge to `Pending(<raw name>)`.
pub struct InheritancePass;

impl RelationshipPass for InheritancePass {
    fn name(&self) -> &'static str {
        "inheritance"
    }

    fn run(&self, ctx: &PassContext<'_>, out: &mut RelationshipSet) -> Result<()> {
        for component in ctx.components {
            let ComponentDetails::Type {
                superclass,
                interfaces,
                ..
            } = &component.metadata.details
            else {
                continue;
            };

            if let Some(superclass) = superclass {
                if let Some(rel) = edge(ctx, component, superclass, RelationshipType::Extends) {
                    out.insert(rel);
                }
            }

            // Interfaces extend interfaces; Python has only base classes
            let list_type = if component.component_type == ComponentType::Interface
                || component.language == Language::Python
            {
                RelationshipType::Extends
            } else {
                RelationshipType::Implements
            };
            for interface in interfaces {
                if let Some(rel) = edge(ctx, component, interface, list_type) {
                    out.insert(rel);
                }
            }
        }
        Ok(())
    }
}

fn edge(
    ctx: &PassContext<'_>,
    component: &Component,
    raw: &str,
    relationship_type: RelationshipType,
) -> Option<Relationship> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let name = last_segment(raw);
    let target = ctx.find_named(name, &component.file_path, |c| {
        c.component_type.is_type_like() && c.id != component.id
    });
    let rel = match target {
        Some(target) => {
            let confidence = if target.file_path == component.file_path {
                1.0
            } else {
                0.9
            };
            Relationship::resolved(&component.id, &target.id, relationship_type).confidence(confidence)
        }
        None => Relationship::pending(&component.id, raw, relationship_type).confidence(0.5),
    };
    Some(rel.at_line(component.location.start_line))
}
