use super::{file_root_id, PassContext, RelationshipPass, RelationshipSet};
use crate::error::Result;
use crate::types::{ComponentDetails, ComponentType, ImportedName, Relationship, RelationshipType};

/// Module-level import/export edges, all sourced at the file root.
///
/// - imports → `IMPORTS_FROM` to `Pending(specifier)`
/// - re-exports → `EXPORTS_FROM` to `Pending(specifier)`
/// - exported declarations → `EXPORTS` to the declaration
pub struct ImportExportPass;

impl RelationshipPass for ImportExportPass {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn run(&self, ctx: &PassContext<'_>, out: &mut RelationshipSet) -> Result<()> {
        for component in ctx.components {
            let root_id = file_root_id(&component.file_path);

            if let ComponentDetails::Import {
                specifier,
                imported_names,
                default_import,
                namespace_import,
                is_reexport,
                ..
            } = &component.metadata.details
            {
                if specifier.is_empty() {
                    continue;
                }
                let names = bound_names(imported_names, default_import, namespace_import);
                let relationship_type = if *is_reexport {
                    RelationshipType::ExportsFrom
                } else {
                    RelationshipType::ImportsFrom
                };
                out.insert(
                    Relationship::pending(&root_id, specifier, relationship_type)
                        .imported_names(names)
                        .at_line(component.location.start_line),
                );
                continue;
            }

            if component.metadata.is_exported
                && !component.is_root()
                && component.component_type != ComponentType::Import
            {
                let mut rel = Relationship::resolved(&root_id, &component.id, RelationshipType::Exports)
                    .at_line(component.location.start_line);
                if let Some(exported) = &component.metadata.exported_name {
                    if exported != &component.name {
                        rel.metadata
                            .extra
                            .insert("exportedName".to_string(), exported.clone().into());
                    }
                }
                out.insert(rel);
            }
        }
        Ok(())
    }
}

fn bound_names(
    imported: &[ImportedName],
    default_import: &Option<String>,
    namespace_import: &Option<String>,
) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(default) = default_import {
        names.push(default.clone());
    }
    if let Some(namespace) = namespace_import {
        names.push(format!("* as {namespace}"));
    }
    names.extend(imported.iter().map(|n| match &n.alias {
        Some(alias) => format!("{} as {alias}", n.name),
        None => n.name.clone(),
    }));
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::types::{Component, RelationshipTarget};

    fn import(specifier: &str, reexport: bool) -> Component {
        let mut c = Component::file_root("src/a.ts", Language::TypeScript, "");
        c.id = format!("src/a.ts::import::{specifier}");
        c.name = specifier.to_string();
        c.component_type = ComponentType::Import;
        c.parent_id = Some(file_root_id("src/a.ts"));
        c.metadata.details = ComponentDetails::Import {
            specifier: specifier.to_string(),
            imported_names: vec![ImportedName {
                name: "load".to_string(),
                alias: Some("read".to_string()),
            }],
            default_import: None,
            namespace_import: None,
            is_type_only: false,
            is_reexport: reexport,
        };
        c
    }

    #[test]
    fn imports_are_pending_from_file_root() {
        let components = vec![import("./store", false), import("./types", true)];
        let ctx = PassContext::new(&components, "");
        let mut set = RelationshipSet::new();
        ImportExportPass.run(&ctx, &mut set).expect("pass");
        let rels = set.into_vec();

        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].relationship_type, RelationshipType::ImportsFrom);
        assert_eq!(rels[0].source_id, file_root_id("src/a.ts"));
        assert_eq!(rels[0].target, RelationshipTarget::Pending("./store".to_string()));
        assert!(rels[0].metadata.needs_resolution);
        assert_eq!(rels[0].metadata.imported_names, vec!["load as read".to_string()]);
        assert_eq!(rels[1].relationship_type, RelationshipType::ExportsFrom);
    }

    #[test]
    fn exported_declarations_get_exports_edges() {
        let mut f = Component::file_root("src/a.ts", Language::TypeScript, "");
        f.id = "src/a.ts::function::load".to_string();
        f.name = "load".to_string();
        f.component_type = ComponentType::Function;
        f.parent_id = Some(file_root_id("src/a.ts"));
        f.metadata = f.metadata.exported("default");

        let components = vec![f.clone()];
        let ctx = PassContext::new(&components, "");
        let mut set = RelationshipSet::new();
        ImportExportPass.run(&ctx, &mut set).expect("pass");
        let rels = set.into_vec();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relationship_type, RelationshipType::Exports);
        assert_eq!(rels[0].target.resolved_id(), Some(f.id.as_str()));
        assert_eq!(
            rels[0].metadata.extra.get("exportedName"),
            Some(&serde_json::Value::from("default"))
        );
    }
}
