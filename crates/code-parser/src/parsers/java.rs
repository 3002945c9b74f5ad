//! Java.
//!
//! Metadata populated:
//! - `package` becomes a `Namespace` component that owns every top-level type of the file
//! - classes, records, interfaces, enums, annotation types: `Type { superclass, interfaces,
//!   type_parameters }`; records carry the `record` modifier, annotation types `annotation`
//! - methods and constructors: `Callable { parameters, return_type, calls }`; interface
//!   methods without a body are abstract
//! - fields: `Variable { value_type, is_const }`; `static final` fields are constants
//! - annotations: `decorators` on the annotated declaration plus `Annotation` child components
//! - imports: `Import { specifier, imported_names }`; `import static` sets `extra.static`
//! - public top-level types are exported

use super::{
    code, collect_calls, documentation, extract_with_tree_sitter, field_text, location, text,
    tree_sitter_diagnostics,
};
use crate::config::ParserConfig;
use crate::container::ComponentBatch;
use crate::contract::{LanguageParser, ParseError, ParserCapabilities, ParsingLevel};
use crate::language::Language;
use crate::passes;
use crate::types::{
    Component, ComponentDetails, ComponentMetadata, ComponentType, ImportedName, Parameter,
    Relationship,
};
use tree_sitter::Node;

/// Parser for Java sources
pub struct JavaParser {
    config: ParserConfig,
}

impl JavaParser {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for JavaParser {
    fn language(&self) -> Language {
        Language::Java
    }

    fn backend(&self) -> &'static str {
        "tree-sitter-java"
    }

    fn parsing_level(&self) -> ParsingLevel {
        ParsingLevel::Structural
    }

    fn capabilities(&self) -> ParserCapabilities {
        ParserCapabilities {
            symbols: true,
            relationships: true,
            ranges: true,
            types: true,
            control_flow: false,
            incremental: false,
        }
    }

    fn detect_components(&self, content: &str, file_path: &str) -> Vec<Component> {
        extract_with_tree_sitter(Language::Java, &self.config, content, file_path, |root, batch| {
            let mut walker = Walker::new(&self.config);
            walker.visit_children(root, batch);
            if walker.in_package {
                batch.stack.pop();
            }
            Ok(())
        })
    }

    fn detect_relationships(&self, components: &[Component], content: &str) -> Vec<Relationship> {
        passes::run_standard_passes(components, content)
    }

    fn validate_syntax(&self, content: &str) -> Vec<ParseError> {
        tree_sitter_diagnostics(Language::Java, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    File,
    Type { is_interface: bool },
    Callable,
}

struct Walker<'c> {
    config: &'c ParserConfig,
    scopes: Vec<Scope>,
    in_package: bool,
}

impl<'c> Walker<'c> {
    fn new(config: &'c ParserConfig) -> Self {
        Self {
            config,
            scopes: vec![Scope::File],
            in_package: false,
        }
    }

    fn scope(&self) -> Scope {
        self.scopes.last().copied().unwrap_or(Scope::File)
    }

    fn visit_children(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child, batch);
        }
    }

    fn visit(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        match node.kind() {
            "package_declaration" => self.package(node, batch),
            "import_declaration" => self.import(node, batch),
            "class_declaration" => self.type_declaration(node, batch, ComponentType::Class, None),
            "record_declaration" => {
                self.type_declaration(node, batch, ComponentType::Class, Some("record"));
            }
            "interface_declaration" => {
                self.type_declaration(node, batch, ComponentType::Interface, None);
            }
            "annotation_type_declaration" => {
                self.type_declaration(node, batch, ComponentType::Interface, Some("annotation"));
            }
            "enum_declaration" => self.type_declaration(node, batch, ComponentType::Enum, None),
            "method_declaration" | "annotation_type_element_declaration" => {
                self.method(node, batch, false);
            }
            "constructor_declaration" | "compact_constructor_declaration" => {
                self.method(node, batch, true);
            }
            "field_declaration" | "constant_declaration" => self.field(node, batch),
            "enum_constant" => self.enum_constant(node, batch),
            "line_comment" | "block_comment" => {}
            _ => self.visit_children(node, batch),
        }
    }

    fn package(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        if self.in_package {
            return;
        }
        let content = batch.content();
        let mut cursor = node.walk();
        let Some(name) = node
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
            .map(|c| text(c, content).to_string())
        else {
            return;
        };
        let code = code(node, batch, self.config);
        let id = batch.add(
            ComponentType::Namespace,
            &name,
            location(node),
            code,
            ComponentMetadata::default(),
        );
        batch.stack.push(id);
        self.in_package = true;
    }

    fn import(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        let Some(path) = children
            .iter()
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
            .map(|c| text(*c, content).to_string())
        else {
            return;
        };
        let is_static = children.iter().any(|c| c.kind() == "static");
        let wildcard = children.iter().any(|c| c.kind() == "asterisk");

        // `a.b.C` imports `C` from `a.b`; `a.b.*` imports everything from `a.b`
        let (specifier, imported) = if wildcard {
            (path.clone(), "*".to_string())
        } else {
            match path.rsplit_once('.') {
                Some((module, name)) => (module.to_string(), name.to_string()),
                None => (path.clone(), path.clone()),
            }
        };
        let details = ComponentDetails::Import {
            specifier: specifier.clone(),
            imported_names: vec![ImportedName {
                name: imported,
                alias: None,
            }],
            default_import: None,
            namespace_import: None,
            is_type_only: false,
            is_reexport: false,
        };
        let mut metadata = ComponentMetadata::with_details(details);
        if is_static {
            metadata = metadata.extra("static", true);
        }
        let code = code(node, batch, self.config);
        let name = if wildcard { format!("{path}.*") } else { path };
        batch.add(ComponentType::Import, &name, location(node), code, metadata);
    }

    fn type_declaration(
        &mut self,
        node: Node<'_>,
        batch: &mut ComponentBatch<'_>,
        component_type: ComponentType,
        kind_modifier: Option<&str>,
    ) {
        let content = batch.content();
        let name = field_text(node, "name", content).unwrap_or("anonymous").to_string();
        let (mut modifiers, annotations) = modifiers(node, content);
        if let Some(extra) = kind_modifier {
            modifiers.push(extra.to_string());
        }

        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|s| s.named_child(0))
            .map(|t| text(t, content).to_string());
        let mut interfaces = Vec::new();
        if let Some(list) = node.child_by_field_name("interfaces") {
            interfaces.extend(type_list(list, content));
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "extends_interfaces" {
                interfaces.extend(type_list(child, content));
            }
        }
        let type_parameters = node
            .child_by_field_name("type_parameters")
            .map(|params| {
                let mut cursor = params.walk();
                params
                    .named_children(&mut cursor)
                    .map(|p| {
                        let mut inner = p.walk();
                        let name = p
                            .named_children(&mut inner)
                            .find(|c| c.kind() == "type_identifier" || c.kind() == "identifier")
                            .map(|c| text(c, content).to_string());
                        name.unwrap_or_else(|| text(p, content).to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();

        let top_level = self.scope() == Scope::File;
        let is_public = modifiers.iter().any(|m| m == "public");
        let doc = documentation(node, batch, self.config, Language::Java);
        let mut metadata = ComponentMetadata::with_details(ComponentDetails::Type {
            superclass,
            interfaces,
            type_parameters,
        })
        .modifiers(modifiers)
        .decorators(annotations.iter().map(|a| annotation_name(*a, content)).collect())
        .documentation(doc);
        if top_level && is_public {
            metadata = metadata.exported(name.clone());
        }
        let code = code(node, batch, self.config);
        let id = batch.add(component_type, &name, location(node), code, metadata);

        batch.stack.push(id);
        self.add_annotations(&annotations, batch);
        if let Some(body) = node.child_by_field_name("body") {
            self.scopes.push(Scope::Type {
                is_interface: component_type == ComponentType::Interface,
            });
            self.visit_children(body, batch);
            self.scopes.pop();
        }
        batch.stack.pop();
    }

    fn method(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>, is_constructor: bool) {
        let content = batch.content();
        let name = field_text(node, "name", content).unwrap_or("anonymous").to_string();
        let (mut modifiers, annotations) = modifiers(node, content);
        let body = node.child_by_field_name("body");

        if let Scope::Type { is_interface: true } = self.scope() {
            let has = |mods: &[String], m: &str| mods.iter().any(|x| x == m);
            if body.is_none()
                && !has(&modifiers, "static")
                && !has(&modifiers, "default")
                && !has(&modifiers, "abstract")
            {
                modifiers.push("abstract".to_string());
            }
            if !has(&modifiers, "private") && !has(&modifiers, "public") {
                modifiers.push("public".to_string());
            }
        }
        if !self.config.include_private_members
            && modifiers.iter().any(|m| m == "private" || m == "protected")
        {
            return;
        }

        let component_type = if is_constructor {
            ComponentType::Constructor
        } else {
            ComponentType::method_for(&modifiers)
        };
        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| {
                let mut cursor = params.walk();
                params
                    .named_children(&mut cursor)
                    .filter_map(|p| parameter(p, content))
                    .collect()
            })
            .unwrap_or_default();
        let calls = body
            .map(|b| {
                collect_calls(
                    b,
                    content,
                    &|n| n.kind() == "method_invocation",
                    &|n, src| field_text(n, "name", src).map(str::to_string),
                    &is_component_scope,
                )
            })
            .unwrap_or_default();
        let details = ComponentDetails::Callable {
            parameters,
            return_type: field_text(node, "type", content).map(str::to_string),
            is_async: false,
            is_generator: false,
            calls,
        };
        let doc = documentation(node, batch, self.config, Language::Java);
        let metadata = ComponentMetadata::with_details(details)
            .modifiers(modifiers)
            .decorators(annotations.iter().map(|a| annotation_name(*a, content)).collect())
            .documentation(doc);
        let code = code(node, batch, self.config);
        let id = batch.add(component_type, &name, location(node), code, metadata);

        batch.stack.push(id);
        self.add_annotations(&annotations, batch);
        if let Some(body) = body {
            self.scopes.push(Scope::Callable);
            self.visit_children(body, batch);
            self.scopes.pop();
        }
        batch.stack.pop();
    }

    fn field(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        if self.scope() == Scope::Callable {
            return;
        }
        let content = batch.content();
        let (mut modifiers, annotations) = modifiers(node, content);
        if node.kind() == "constant_declaration" {
            for implied in ["public", "static", "final"] {
                if !modifiers.iter().any(|m| m == implied) {
                    modifiers.push(implied.to_string());
                }
            }
        }
        if !self.config.include_private_members
            && modifiers.iter().any(|m| m == "private" || m == "protected")
        {
            return;
        }
        let value_type = field_text(node, "type", content).map(str::to_string);
        let is_const = modifiers.iter().any(|m| m == "static")
            && modifiers.iter().any(|m| m == "final");
        let component_type = if is_const {
            ComponentType::Constant
        } else {
            ComponentType::property_for(&modifiers)
        };

        let mut cursor = node.walk();
        let declarators: Vec<_> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        let single = declarators.len() == 1;
        let doc = documentation(node, batch, self.config, Language::Java);
        for declarator in declarators {
            let Some(name) = field_text(declarator, "name", content) else {
                continue;
            };
            let span = if single { node } else { declarator };
            let metadata = ComponentMetadata::with_details(ComponentDetails::Variable {
                value_type: value_type.clone(),
                is_const,
            })
            .modifiers(modifiers.clone())
            .decorators(annotations.iter().map(|a| annotation_name(*a, content)).collect())
            .documentation(doc.clone());
            let code = code(span, batch, self.config);
            let id = batch.add(component_type, name, location(span), code, metadata);
            batch.stack.push(id);
            self.add_annotations(&annotations, batch);
            batch.stack.pop();
        }
    }

    fn enum_constant(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(name) = field_text(node, "name", content) else {
            return;
        };
        let metadata = ComponentMetadata::with_details(ComponentDetails::Variable {
            value_type: None,
            is_const: true,
        })
        .modifiers(vec!["public".to_string(), "static".to_string(), "final".to_string()]);
        let code = code(node, batch, self.config);
        let id = batch.add(ComponentType::Constant, name, location(node), code, metadata);
        // Constant-specific class bodies
        if let Some(body) = node.child_by_field_name("body") {
            batch.stack.push(id);
            self.scopes.push(Scope::Type { is_interface: false });
            self.visit_children(body, batch);
            self.scopes.pop();
            batch.stack.pop();
        }
    }

    fn add_annotations(&self, annotations: &[Node<'_>], batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        for annotation in annotations {
            let name = annotation_name(*annotation, content);
            let code = code(*annotation, batch, self.config);
            batch.add(
                ComponentType::Annotation,
                &name,
                location(*annotation),
                code,
                ComponentMetadata::default(),
            );
        }
    }
}

/// Keyword modifiers and annotation nodes of a declaration
fn modifiers<'t>(node: Node<'t>, content: &str) -> (Vec<String>, Vec<Node<'t>>) {
    let mut keywords = Vec::new();
    let mut annotations = Vec::new();
    let mut cursor = node.walk();
    let Some(mods) = node
        .children(&mut cursor)
        .find(|c| c.kind() == "modifiers")
    else {
        return (keywords, annotations);
    };
    let mut cursor = mods.walk();
    for child in mods.children(&mut cursor) {
        if child.kind().contains("annotation") {
            annotations.push(child);
        } else {
            let value = text(child, content).trim();
            if !value.is_empty() {
                keywords.push(value.to_string());
            }
        }
    }
    (keywords, annotations)
}

fn annotation_name(node: Node<'_>, content: &str) -> String {
    node.child_by_field_name("name")
        .map(|n| text(n, content))
        .unwrap_or_else(|| text(node, content))
        .trim_start_matches('@')
        .to_string()
}

fn type_list(node: Node<'_>, content: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let list = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "type_list")
        .unwrap_or(node);
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .map(|t| text(t, content).to_string())
        .collect()
}

fn parameter(node: Node<'_>, content: &str) -> Option<Parameter> {
    match node.kind() {
        "formal_parameter" => Some(Parameter {
            name: field_text(node, "name", content)?.to_string(),
            type_annotation: field_text(node, "type", content).map(str::to_string),
            default_value: None,
        }),
        "spread_parameter" => {
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            let name = children
                .iter()
                .find(|c| c.kind() == "variable_declarator")
                .and_then(|d| field_text(*d, "name", content))
                .unwrap_or("args");
            let type_annotation = children
                .iter()
                .find(|c| c.kind() != "variable_declarator" && c.kind() != "modifiers")
                .map(|t| format!("{}...", text(*t, content)));
            Some(Parameter {
                name: name.to_string(),
                type_annotation,
                default_value: None,
            })
        }
        _ => None,
    }
}

fn is_component_scope(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "method_declaration"
            | "constructor_declaration"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RelationshipTarget, RelationshipType};
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"package com.example.store;

import java.util.List;
import java.util.concurrent.*;
import static java.util.Objects.requireNonNull;

/**
 * Stores records.
 */
@Service
public class RecordStore extends BaseStore implements Store, AutoCloseable {
    public static final int MAX = 10;
    private final List<String> items;

    public RecordStore(List<String> items) {
        this.items = requireNonNull(items);
    }

    @Override
    public void save(String record, String... tags) {
        validate(record);
        items.add(record);
    }

    private void validate(String record) {}

    protected static RecordStore create() {
        return new RecordStore(List.of());
    }
}

interface Store {
    void save(String record, String... tags);
    default void flush() {}
}
"#;

    fn parse() -> Vec<Component> {
        JavaParser::new().detect_components(SOURCE, "src/RecordStore.java")
    }

    fn find<'a>(components: &'a [Component], name: &str) -> &'a Component {
        components
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("missing component {name}"))
    }

    #[test]
    fn package_owns_top_level_types() {
        let components = parse();
        let package = find(&components, "com.example.store");
        assert_eq!(package.component_type, ComponentType::Namespace);
        let store = find(&components, "RecordStore");
        assert_eq!(store.parent_id.as_deref(), Some(package.id.as_str()));
        assert!(store.metadata.is_exported);
        assert_eq!(store.metadata.documentation.as_deref().map(|d| d.contains("Stores records.")), Some(true));
        assert_eq!(store.metadata.decorators, vec!["Service".to_string()]);
        assert!(!find(&components, "Store").metadata.is_exported);
    }

    #[test]
    fn members_use_modifier_variants() {
        let components = parse();
        let ty = |name: &str, parent: &str| {
            let parent_id = find(&components, parent).id.clone();
            components
                .iter()
                .find(|c| c.name == name && c.parent_id.as_deref() == Some(parent_id.as_str()))
                .map(|c| c.component_type)
                .unwrap_or_else(|| panic!("missing {name} in {parent}"))
        };
        assert_eq!(ty("MAX", "RecordStore"), ComponentType::Constant);
        assert_eq!(ty("items", "RecordStore"), ComponentType::PrivateProperty);
        assert_eq!(ty("RecordStore", "RecordStore"), ComponentType::Constructor);
        assert_eq!(ty("save", "RecordStore"), ComponentType::PublicMethod);
        assert_eq!(ty("validate", "RecordStore"), ComponentType::PrivateMethod);
        assert_eq!(ty("create", "RecordStore"), ComponentType::StaticMethod);
        assert_eq!(ty("save", "Store"), ComponentType::AbstractMethod);
        assert_eq!(ty("flush", "Store"), ComponentType::PublicMethod);
        assert_eq!(ty("Override", "save"), ComponentType::Annotation);
    }

    #[test]
    fn method_details() {
        let components = parse();
        let save = components
            .iter()
            .find(|c| c.name == "save" && c.component_type == ComponentType::PublicMethod)
            .expect("save");
        match &save.metadata.details {
            ComponentDetails::Callable {
                parameters,
                return_type,
                calls,
                ..
            } => {
                assert_eq!(parameters.len(), 2);
                assert_eq!(parameters[1].name, "tags");
                assert_eq!(parameters[1].type_annotation.as_deref(), Some("String..."));
                assert_eq!(return_type.as_deref(), Some("void"));
                assert_eq!(calls, &vec!["validate".to_string(), "add".to_string()]);
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn relationships() {
        let parser = JavaParser::new();
        let components = parser.detect_components(SOURCE, "src/RecordStore.java");
        let rels = parser.detect_relationships(&components, SOURCE);
        let record_store = find(&components, "RecordStore").id.clone();
        let has = |ty: RelationshipType, target: RelationshipTarget| {
            rels.iter().any(|r| r.relationship_type == ty && r.target == target)
        };

        assert!(has(
            RelationshipType::ImportsFrom,
            RelationshipTarget::Pending("java.util".to_string())
        ));
        assert!(has(
            RelationshipType::ImportsFrom,
            RelationshipTarget::Pending("java.util.concurrent".to_string())
        ));
        assert!(has(
            RelationshipType::Extends,
            RelationshipTarget::Pending("BaseStore".to_string())
        ));
        assert!(has(
            RelationshipType::Implements,
            RelationshipTarget::Resolved(find(&components, "Store").id.clone())
        ));
        assert!(has(
            RelationshipType::Instantiates,
            RelationshipTarget::Resolved(record_store.clone())
        ));
        assert!(has(
            RelationshipType::Calls,
            RelationshipTarget::Pending("java.util.Objects#requireNonNull".to_string())
        ));
        assert!(has(RelationshipType::Exports, RelationshipTarget::Resolved(record_store)));
    }
}
