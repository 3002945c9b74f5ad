use super::{PassContext, RelationshipPass, RelationshipSet};
use crate::error::Result;
use crate::types::{Relationship, RelationshipType};

/// `CONTAINS` from every parent to each child
pub struct ContainmentPass;

impl RelationshipPass for ContainmentPass {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn run(&self, ctx: &PassContext<'_>, out: &mut RelationshipSet) -> Result<()> {
        for component in ctx.components.iter().filter(|c| !c.is_root()) {
            let Some(parent_id) = component.parent_id.as_deref() else {
                continue;
            };
            if parent_id == component.id {
                continue;
            }
            out.insert(
                Relationship::resolved(parent_id, &component.id, RelationshipType::Contains)
                    .at_line(component.location.start_line),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::types::{Component, ComponentType};
    use std::collections::BTreeSet;

    fn components() -> Vec<Component> {
        let root = Component::file_root("doc.md", Language::Markdown, "# A\n## B\n");
        let mut a = root.clone();
        a.id = "doc.md::section::A".to_string();
        a.name = "A".to_string();
        a.component_type = ComponentType::Section;
        a.parent_id = Some(root.id.clone());
        let mut b = a.clone();
        b.id = "doc.md::section::B".to_string();
        b.name = "B".to_string();
        b.parent_id = Some(a.id.clone());
        vec![root, a, b]
    }

    #[test]
    fn repeated_runs_produce_the_same_id_set() {
        let components = components();
        let ctx = PassContext::new(&components, "# A\n## B\n");

        let mut once = RelationshipSet::new();
        ContainmentPass.run(&ctx, &mut once).expect("pass");
        let mut twice = RelationshipSet::new();
        ContainmentPass.run(&ctx, &mut twice).expect("pass");
        ContainmentPass.run(&ctx, &mut twice).expect("pass");

        let ids = |set: &RelationshipSet| set.iter().map(|r| r.id.clone()).collect::<BTreeSet<_>>();
        assert_eq!(once.len(), 2);
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn reversed_input_yields_same_edges() {
        let components = components();
        let mut reversed = components.clone();
        reversed.reverse();

        let mut forward = RelationshipSet::new();
        ContainmentPass
            .run(&PassContext::new(&components, ""), &mut forward)
            .expect("pass");
        let mut backward = RelationshipSet::new();
        ContainmentPass
            .run(&PassContext::new(&reversed, ""), &mut backward)
            .expect("pass");

        let ids = |set: &RelationshipSet| set.iter().map(|r| r.id.clone()).collect::<BTreeSet<_>>();
        assert_eq!(ids(&forward), ids(&backward));
    }
}
