//! Rust.
//!
//! Metadata populated:
//! - `fn` items: `Callable { parameters, return_type, is_async, calls }`; associated functions
//!   without a `self` receiver are `static`, `fn new` in an impl is the constructor
//! - structs, unions, enums, traits: `Type { interfaces, type_parameters }`. Trait impls push
//!   the trait into the implementing type's `interfaces`; supertraits land in the trait's
//! - impl members are parented to the implemented type when it is declared in the same file
//! - `#[...]` attributes: `decorators` on the item plus `Annotation` child components
//! - `use` declarations: one `Import` per path prefix; `pub use` is a re-export
//! - `pub` items at file level are exported

use super::{
    code, collect_calls, documentation, extract_with_tree_sitter, field_text, last_segment,
    location, text, tree_sitter_diagnostics,
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

/// Parser for Rust sources
pub struct RustParser {
    config: ParserConfig,
}

impl RustParser {
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

impl Default for RustParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for RustParser {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn backend(&self) -> &'static str {
        "tree-sitter-rust"
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
        extract_with_tree_sitter(Language::Rust, &self.config, content, file_path, |root, batch| {
            let mut walker = Walker::new(&self.config);
            walker.visit_items(root, batch);
            Ok(())
        })
    }

    fn detect_relationships(&self, components: &[Component], content: &str) -> Vec<Relationship> {
        passes::run_standard_passes(components, content)
    }

    fn validate_syntax(&self, content: &str) -> Vec<ParseError> {
        tree_sitter_diagnostics(Language::Rust, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    File,
    Module,
    Impl { trait_impl: bool },
    Trait,
    Callable,
}

struct Walker<'c> {
    config: &'c ParserConfig,
    scopes: Vec<Scope>,
}

impl<'c> Walker<'c> {
    fn new(config: &'c ParserConfig) -> Self {
        Self {
            config,
            scopes: vec![Scope::File],
        }
    }

    fn scope(&self) -> Scope {
        self.scopes.last().copied().unwrap_or(Scope::File)
    }

    /// Visit a sequence of items, attaching preceding `#[...]` attributes to the next item
    fn visit_items<'t>(&mut self, node: Node<'t>, batch: &mut ComponentBatch<'_>) {
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        let mut attributes: Vec<Node<'t>> = Vec::new();
        for child in children {
            match child.kind() {
                "attribute_item" => attributes.push(child),
                "line_comment" | "block_comment" | "inner_attribute_item" => {}
                _ => {
                    let pending = std::mem::take(&mut attributes);
                    self.visit(child, &pending, batch);
                }
            }
        }
    }

    fn visit(&mut self, node: Node<'_>, attributes: &[Node<'_>], batch: &mut ComponentBatch<'_>) {
        match node.kind() {
            "use_declaration" => self.use_declaration(node, batch),
            "function_item" | "function_signature_item" => self.function(node, attributes, batch),
            "struct_item" | "union_item" => {
                self.type_item(node, attributes, batch, ComponentType::Class);
            }
            "enum_item" => self.type_item(node, attributes, batch, ComponentType::Enum),
            "trait_item" => self.type_item(node, attributes, batch, ComponentType::Interface),
            "impl_item" => self.impl_item(node, batch),
            "mod_item" => self.module(node, attributes, batch),
            "type_item" => self.simple_item(node, attributes, batch, ComponentType::TypeAlias),
            "const_item" => self.simple_item(node, attributes, batch, ComponentType::Constant),
            "static_item" => self.simple_item(node, attributes, batch, ComponentType::Variable),
            "macro_definition" => self.macro_definition(node, batch),
            "field_declaration" => self.field(node, attributes, batch),
            "enum_variant" => self.variant(node, batch),
            "declaration_list" | "field_declaration_list" | "enum_variant_list" | "block" => {
                self.visit_items(node, batch);
            }
            _ => {
                let mut cursor = node.walk();
                let children: Vec<_> = node.named_children(&mut cursor).collect();
                for child in children {
                    self.visit(child, &[], batch);
                }
            }
        }
    }

    fn use_declaration(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(argument) = node.child_by_field_name("argument") else {
            return;
        };
        let mut paths = Vec::new();
        use_paths(argument, "", content, &mut paths);
        let is_reexport = visibility(node, content).is_some();

        // Group by specifier, first appearance order
        let mut groups: Vec<(String, Vec<ImportedName>)> = Vec::new();
        for (specifier, name) in paths {
            match groups.iter_mut().find(|(s, _)| *s == specifier) {
                Some((_, names)) => names.push(name),
                None => groups.push((specifier, vec![name])),
            }
        }
        for (specifier, imported_names) in groups {
            let details = ComponentDetails::Import {
                specifier: specifier.clone(),
                imported_names,
                default_import: None,
                namespace_import: None,
                is_type_only: false,
                is_reexport,
            };
            let code = code(node, batch, self.config);
            batch.add(
                ComponentType::Import,
                &specifier,
                location(node),
                code,
                ComponentMetadata::with_details(details),
            );
        }
    }

    fn function(&mut self, node: Node<'_>, attributes: &[Node<'_>], batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(name) = field_text(node, "name", content).map(str::to_string) else {
            return;
        };
        let scope = self.scope();
        let mut modifiers = Vec::new();
        match visibility(node, content) {
            Some(vis) => modifiers.extend(vis),
            None if matches!(scope, Scope::Trait | Scope::Impl { trait_impl: true }) => {
                modifiers.push("public".to_string());
            }
            None if matches!(scope, Scope::Impl { .. }) => modifiers.push("private".to_string()),
            None => {}
        }
        let qualifiers = function_qualifiers(node, content);
        let is_async = qualifiers.iter().any(|q| q == "async");
        modifiers.extend(qualifiers);

        let parameters_node = node.child_by_field_name("parameters");
        let has_receiver = parameters_node.is_some_and(|params| {
            let mut cursor = params.walk();
            let found = params
                .named_children(&mut cursor)
                .any(|p| p.kind() == "self_parameter");
            found
        });
        let body = node.child_by_field_name("body");

        let component_type = match scope {
            Scope::Impl { .. } | Scope::Trait => {
                if !has_receiver {
                    modifiers.push("static".to_string());
                }
                if body.is_none() {
                    modifiers.push("abstract".to_string());
                }
                if name == "new" && !has_receiver && matches!(scope, Scope::Impl { .. }) {
                    ComponentType::Constructor
                } else if body.is_none() {
                    ComponentType::AbstractMethod
                } else {
                    ComponentType::method_for(&modifiers)
                }
            }
            _ => ComponentType::Function,
        };
        if !self.config.include_private_members
            && component_type.is_method()
            && modifiers.iter().any(|m| m == "private")
        {
            return;
        }

        let parameters = parameters_node
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
                    &|n| n.kind() == "call_expression",
                    &|n, src| n.child_by_field_name("function").and_then(|f| callee(f, src)),
                    &is_component_scope,
                )
            })
            .unwrap_or_default();
        let details = ComponentDetails::Callable {
            parameters,
            return_type: field_text(node, "return_type", content).map(str::to_string),
            is_async,
            is_generator: false,
            calls,
        };

        let doc = documentation(node, batch, self.config, Language::Rust);
        let mut metadata = ComponentMetadata::with_details(details)
            .modifiers(modifiers)
            .decorators(attribute_names(attributes, content))
            .documentation(doc);
        if scope == Scope::File && visibility(node, content).is_some() {
            metadata = metadata.exported(name.clone());
        }
        let code = code(node, batch, self.config);
        let id = batch.add(component_type, &name, location(node), code, metadata);

        batch.stack.push(id);
        self.add_attributes(attributes, batch);
        if let Some(body) = body {
            self.scopes.push(Scope::Callable);
            self.visit_items(body, batch);
            self.scopes.pop();
        }
        batch.stack.pop();
    }

    fn type_item(
        &mut self,
        node: Node<'_>,
        attributes: &[Node<'_>],
        batch: &mut ComponentBatch<'_>,
        component_type: ComponentType,
    ) {
        let content = batch.content();
        let Some(name) = field_text(node, "name", content).map(str::to_string) else {
            return;
        };
        let modifiers: Vec<String> = visibility(node, content).unwrap_or_default();
        let type_parameters = node
            .child_by_field_name("type_parameters")
            .map(|params| type_parameter_names(params, content))
            .unwrap_or_default();
        // Supertraits
        let interfaces = node
            .child_by_field_name("bounds")
            .map(|bounds| {
                let mut cursor = bounds.walk();
                bounds
                    .named_children(&mut cursor)
                    .filter(|b| b.kind() != "lifetime")
                    .map(|b| text(b, content).to_string())
                    .collect()
            })
            .unwrap_or_default();

        let doc = documentation(node, batch, self.config, Language::Rust);
        let mut metadata = ComponentMetadata::with_details(ComponentDetails::Type {
            superclass: None,
            interfaces,
            type_parameters,
        })
        .modifiers(modifiers)
        .decorators(attribute_names(attributes, content))
        .documentation(doc);
        if self.scope() == Scope::File && visibility(node, content).is_some() {
            metadata = metadata.exported(name.clone());
        }
        let code = code(node, batch, self.config);
        let id = batch.add(component_type, &name, location(node), code, metadata);

        batch.stack.push(id);
        self.add_attributes(attributes, batch);
        if let Some(body) = node.child_by_field_name("body") {
            let scope = if component_type == ComponentType::Interface {
                Scope::Trait
            } else {
                Scope::Module
            };
            self.scopes.push(scope);
            self.visit_items(body, batch);
            self.scopes.pop();
        }
        batch.stack.pop();
    }

    fn impl_item(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let target_name = node
            .child_by_field_name("type")
            .map(|t| last_segment(text(t, content)).to_string());
        let trait_name = node
            .child_by_field_name("trait")
            .map(|t| text(t, content).to_string());

        let target = target_name
            .as_deref()
            .and_then(|name| batch.find_by_name(name, ComponentType::is_type_like));
        if let (Some(target), Some(trait_name)) = (&target, &trait_name) {
            if let Some(component) = batch.get_mut(target) {
                if let ComponentDetails::Type { interfaces, .. } = &mut component.metadata.details {
                    if !interfaces.contains(trait_name) {
                        interfaces.push(trait_name.clone());
                    }
                }
            }
        }
        if target.is_none() {
            log::trace!(
                "{}: impl target {:?} not declared in this file",
                batch.file_path(),
                target_name
            );
        }

        if let Some(target) = &target {
            batch.stack.push(target.clone());
        }
        self.scopes.push(Scope::Impl {
            trait_impl: trait_name.is_some(),
        });
        self.visit_items(body, batch);
        self.scopes.pop();
        if target.is_some() {
            batch.stack.pop();
        }
    }

    fn module(&mut self, node: Node<'_>, attributes: &[Node<'_>], batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(name) = field_text(node, "name", content).map(str::to_string) else {
            return;
        };
        let doc = documentation(node, batch, self.config, Language::Rust);
        let mut metadata = ComponentMetadata::default()
            .modifiers(visibility(node, content).unwrap_or_default())
            .decorators(attribute_names(attributes, content))
            .documentation(doc);
        if self.scope() == Scope::File && visibility(node, content).is_some() {
            metadata = metadata.exported(name.clone());
        }
        let code = code(node, batch, self.config);
        let id = batch.add(ComponentType::Module, &name, location(node), code, metadata);

        batch.stack.push(id);
        self.add_attributes(attributes, batch);
        if let Some(body) = node.child_by_field_name("body") {
            self.scopes.push(Scope::Module);
            self.visit_items(body, batch);
            self.scopes.pop();
        }
        batch.stack.pop();
    }

    fn simple_item(
        &mut self,
        node: Node<'_>,
        attributes: &[Node<'_>],
        batch: &mut ComponentBatch<'_>,
        component_type: ComponentType,
    ) {
        if self.scope() == Scope::Callable {
            return;
        }
        let content = batch.content();
        let Some(name) = field_text(node, "name", content).map(str::to_string) else {
            return;
        };
        let details = match component_type {
            ComponentType::TypeAlias => ComponentDetails::Type {
                superclass: None,
                interfaces: Vec::new(),
                type_parameters: node
                    .child_by_field_name("type_parameters")
                    .map(|params| type_parameter_names(params, content))
                    .unwrap_or_default(),
            },
            _ => ComponentDetails::Variable {
                value_type: field_text(node, "type", content).map(str::to_string),
                is_const: component_type == ComponentType::Constant,
            },
        };
        let mut modifiers = visibility(node, content).unwrap_or_default();
        if node.kind() == "static_item" {
            modifiers.push("static".to_string());
            let mut cursor = node.walk();
            if node
                .children(&mut cursor)
                .any(|c| c.kind() == "mutable_specifier")
            {
                modifiers.push("mut".to_string());
            }
        }
        let doc = documentation(node, batch, self.config, Language::Rust);
        let mut metadata = ComponentMetadata::with_details(details)
            .modifiers(modifiers)
            .decorators(attribute_names(attributes, content))
            .documentation(doc);
        if self.scope() == Scope::File && visibility(node, content).is_some() {
            metadata = metadata.exported(name.clone());
        }
        let code = code(node, batch, self.config);
        let id = batch.add(component_type, &name, location(node), code, metadata);
        batch.stack.push(id);
        self.add_attributes(attributes, batch);
        batch.stack.pop();
    }

    fn macro_definition(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(name) = field_text(node, "name", content).map(str::to_string) else {
            return;
        };
        let doc = documentation(node, batch, self.config, Language::Rust);
        let metadata = ComponentMetadata::with_details(ComponentDetails::Callable {
            parameters: Vec::new(),
            return_type: None,
            is_async: false,
            is_generator: false,
            calls: Vec::new(),
        })
        .modifiers(vec!["macro".to_string()])
        .documentation(doc);
        let code = code(node, batch, self.config);
        batch.add(ComponentType::Function, &name, location(node), code, metadata);
    }

    fn field(&mut self, node: Node<'_>, attributes: &[Node<'_>], batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(name) = field_text(node, "name", content).map(str::to_string) else {
            return;
        };
        let modifiers = visibility(node, content).unwrap_or_else(|| vec!["private".to_string()]);
        let component_type = ComponentType::property_for(&modifiers);
        if !self.config.include_private_members && component_type == ComponentType::PrivateProperty {
            return;
        }
        let doc = documentation(node, batch, self.config, Language::Rust);
        let metadata = ComponentMetadata::with_details(ComponentDetails::Variable {
            value_type: field_text(node, "type", content).map(str::to_string),
            is_const: false,
        })
        .modifiers(modifiers)
        .decorators(attribute_names(attributes, content))
        .documentation(doc);
        let code = code(node, batch, self.config);
        let id = batch.add(component_type, &name, location(node), code, metadata);
        batch.stack.push(id);
        self.add_attributes(attributes, batch);
        batch.stack.pop();
    }

    fn variant(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(name) = field_text(node, "name", content).map(str::to_string) else {
            return;
        };
        let metadata = ComponentMetadata::with_details(ComponentDetails::Variable {
            value_type: None,
            is_const: true,
        });
        let code = code(node, batch, self.config);
        batch.add(ComponentType::Constant, &name, location(node), code, metadata);
    }

    fn add_attributes(&self, attributes: &[Node<'_>], batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        for attribute in attributes {
            let Some(name) = attribute_name(*attribute, content) else {
                continue;
            };
            let code = code(*attribute, batch, self.config);
            batch.add(
                ComponentType::Annotation,
                &name,
                location(*attribute),
                code,
                ComponentMetadata::default(),
            );
        }
    }
}

/// `pub` → `["public"]`, `pub(crate)` → `["public", "crate"]`, none → `None`
fn visibility(node: Node<'_>, content: &str) -> Option<Vec<String>> {
    let mut cursor = node.walk();
    let vis = node
        .children(&mut cursor)
        .find(|c| c.kind() == "visibility_modifier")?;
    let raw = text(vis, content);
    let mut modifiers = vec!["public".to_string()];
    if let Some(scope) = raw
        .strip_prefix("pub(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        modifiers.push(scope.trim().trim_start_matches("in ").to_string());
    }
    Some(modifiers)
}

fn function_qualifiers(node: Node<'_>, content: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let Some(qualifiers) = node
        .children(&mut cursor)
        .find(|c| c.kind() == "function_modifiers")
    else {
        return Vec::new();
    };
    let mut cursor = qualifiers.walk();
    qualifiers
        .children(&mut cursor)
        .map(|q| text(q, content).to_string())
        .filter(|q| matches!(q.as_str(), "async" | "const" | "unsafe"))
        .collect()
}

fn parameter(node: Node<'_>, content: &str) -> Option<Parameter> {
    match node.kind() {
        "parameter" => Some(Parameter {
            name: field_text(node, "pattern", content)?.to_string(),
            type_annotation: field_text(node, "type", content).map(str::to_string),
            default_value: None,
        }),
        "self_parameter" => Some(Parameter {
            name: "self".to_string(),
            type_annotation: Some(text(node, content).to_string()),
            default_value: None,
        }),
        _ => None,
    }
}

fn type_parameter_names(params: Node<'_>, content: &str) -> Vec<String> {
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|p| p.kind() != "lifetime" && p.kind() != "lifetime_parameter")
        .map(|p| {
            field_text(p, "name", content)
                .unwrap_or_else(|| text(p, content))
                .to_string()
        })
        .collect()
}

/// Name of the function being called
fn callee(function: Node<'_>, content: &str) -> Option<String> {
    match function.kind() {
        "identifier" => Some(text(function, content).to_string()),
        "field_expression" => field_text(function, "field", content).map(str::to_string),
        "scoped_identifier" => field_text(function, "name", content).map(str::to_string),
        "generic_function" => function
            .child_by_field_name("function")
            .and_then(|f| callee(f, content)),
        _ => None,
    }
}

fn is_component_scope(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "function_item" | "impl_item" | "trait_item" | "mod_item"
    )
}

/// Attribute path of `#[path(...)]`
fn attribute_name(node: Node<'_>, content: &str) -> Option<String> {
    let mut cursor = node.walk();
    let attribute = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "attribute")?;
    let mut cursor = attribute.walk();
    let path = attribute
        .named_children(&mut cursor)
        .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))?;
    Some(text(path, content).to_string())
}

fn attribute_names(attributes: &[Node<'_>], content: &str) -> Vec<String> {
    attributes
        .iter()
        .filter_map(|a| attribute_name(*a, content))
        .collect()
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}::{segment}")
    }
}

fn split_path(full: &str) -> (String, String) {
    match full.rsplit_once("::") {
        Some((specifier, name)) => (specifier.to_string(), name.to_string()),
        None => (full.to_string(), full.to_string()),
    }
}

/// Flatten a use tree into `(specifier, name)` pairs
fn use_paths(node: Node<'_>, prefix: &str, content: &str, out: &mut Vec<(String, ImportedName)>) {
    match node.kind() {
        "use_as_clause" => {
            let Some(path) = field_text(node, "path", content) else {
                return;
            };
            let full = join_path(prefix, path);
            let (specifier, name) = split_path(&full);
            out.push((
                specifier,
                ImportedName {
                    name,
                    alias: field_text(node, "alias", content).map(str::to_string),
                },
            ));
        }
        "use_wildcard" => {
            let path = text(node, content).trim_end_matches('*').trim_end_matches("::");
            let specifier = if path.is_empty() {
                prefix.to_string()
            } else {
                join_path(prefix, path)
            };
            out.push((
                specifier,
                ImportedName {
                    name: "*".to_string(),
                    alias: None,
                },
            ));
        }
        "scoped_use_list" => {
            let next = match field_text(node, "path", content) {
                Some(path) => join_path(prefix, path),
                None => prefix.to_string(),
            };
            if let Some(list) = node.child_by_field_name("list") {
                use_paths(list, &next, content, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            let items: Vec<_> = node.named_children(&mut cursor).collect();
            for item in items {
                use_paths(item, prefix, content, out);
            }
        }
        "self" => {
            let (specifier, name) = split_path(prefix);
            out.push((specifier, ImportedName { name, alias: None }));
        }
        "identifier" | "scoped_identifier" | "crate" | "super" => {
            let full = join_path(prefix, text(node, content));
            let (specifier, name) = split_path(&full);
            out.push((specifier, ImportedName { name, alias: None }));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RelationshipTarget, RelationshipType};
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"use crate::store::{load, Record as Row};
use std::collections::HashMap;
pub use crate::api::*;

/// Keeps records in memory.
#[derive(Debug, Clone)]
pub struct Cache {
    pub capacity: usize,
    entries: HashMap<String, Row>,
}

pub trait Store: Send {
    fn get(&self, key: &str) -> Option<Row>;
    fn len(&self) -> usize {
        0
    }
}

impl Cache {
    pub fn new(capacity: usize) -> Self {
        Cache { capacity, entries: HashMap::new() }
    }

    fn warm(&mut self) {
        let rows = load();
        self.fill(rows);
    }

    fn fill(&mut self, rows: Vec<Row>) {}
}

impl Store for Cache {
    fn get(&self, key: &str) -> Option<Row> {
        self.entries.get(key).cloned()
    }
}

pub async fn build() -> Cache {
    Cache::new(8)
}

const LIMIT: usize = 10;

#[cfg(test)]
mod tests {
    #[test]
    fn works() {}
}
"#;

    fn parse() -> Vec<Component> {
        RustParser::new().detect_components(SOURCE, "src/cache.rs")
    }

    fn find<'a>(components: &'a [Component], ty: ComponentType, name: &str) -> &'a Component {
        components
            .iter()
            .find(|c| c.component_type == ty && c.name == name)
            .unwrap_or_else(|| panic!("missing {ty} {name}"))
    }

    #[test]
    fn impl_members_are_parented_to_their_type() {
        let components = parse();
        let cache = find(&components, ComponentType::Class, "Cache");
        let store = find(&components, ComponentType::Interface, "Store");

        let new = find(&components, ComponentType::Constructor, "new");
        assert_eq!(new.parent_id.as_deref(), Some(cache.id.as_str()));
        let warm = find(&components, ComponentType::PrivateMethod, "warm");
        assert_eq!(warm.parent_id.as_deref(), Some(cache.id.as_str()));

        let abstract_get = find(&components, ComponentType::AbstractMethod, "get");
        assert_eq!(abstract_get.parent_id.as_deref(), Some(store.id.as_str()));
        let impl_get = find(&components, ComponentType::PublicMethod, "get");
        assert_eq!(impl_get.parent_id.as_deref(), Some(cache.id.as_str()));

        let capacity = find(&components, ComponentType::PublicProperty, "capacity");
        assert_eq!(capacity.parent_id.as_deref(), Some(cache.id.as_str()));
        find(&components, ComponentType::PrivateProperty, "entries");

        match &cache.metadata.details {
            ComponentDetails::Type { interfaces, .. } => {
                assert_eq!(interfaces, &vec!["Store".to_string()]);
            }
            other => panic!("unexpected details {other:?}"),
        }
        match &store.metadata.details {
            ComponentDetails::Type { interfaces, .. } => {
                assert_eq!(interfaces, &vec!["Send".to_string()]);
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn attributes_docs_and_exports() {
        let components = parse();
        let cache = find(&components, ComponentType::Class, "Cache");
        assert_eq!(cache.metadata.decorators, vec!["derive".to_string()]);
        assert_eq!(
            cache.metadata.documentation.as_deref(),
            Some("/// Keeps records in memory.")
        );
        assert!(cache.metadata.is_exported);
        let derive = find(&components, ComponentType::Annotation, "derive");
        assert_eq!(derive.parent_id.as_deref(), Some(cache.id.as_str()));

        let build = find(&components, ComponentType::Function, "build");
        assert!(build.metadata.is_exported);
        assert!(build.metadata.has_modifier("async"));
        assert!(!find(&components, ComponentType::Constant, "LIMIT").metadata.is_exported);

        let tests = find(&components, ComponentType::Module, "tests");
        assert_eq!(tests.metadata.decorators, vec!["cfg".to_string()]);
        let works = find(&components, ComponentType::Function, "works");
        assert_eq!(works.parent_id.as_deref(), Some(tests.id.as_str()));
    }

    #[test]
    fn use_trees_are_flattened_by_prefix() {
        let components = parse();
        let imports: Vec<_> = components
            .iter()
            .filter_map(|c| match &c.metadata.details {
                ComponentDetails::Import {
                    specifier,
                    imported_names,
                    is_reexport,
                    ..
                } => Some((
                    specifier.as_str(),
                    imported_names
                        .iter()
                        .map(|n| n.local_name().to_string())
                        .collect::<Vec<_>>(),
                    *is_reexport,
                )),
                _ => None,
            })
            .collect();
        assert_eq!(
            imports,
            vec![
                ("crate::store", vec!["load".to_string(), "Row".to_string()], false),
                ("std::collections", vec!["HashMap".to_string()], false),
                ("crate::api", vec!["*".to_string()], true),
            ]
        );
    }

    #[test]
    fn relationships() {
        let parser = RustParser::new();
        let components = parser.detect_components(SOURCE, "src/cache.rs");
        let rels = parser.detect_relationships(&components, SOURCE);
        let id = |ty, name| find(&components, ty, name).id.clone();
        let has = |source: &str, ty: RelationshipType, target: RelationshipTarget| {
            rels.iter()
                .any(|r| r.source_id == source && r.relationship_type == ty && r.target == target)
        };

        let cache = id(ComponentType::Class, "Cache");
        let warm = id(ComponentType::PrivateMethod, "warm");
        assert!(has(
            &cache,
            RelationshipType::Implements,
            RelationshipTarget::Resolved(id(ComponentType::Interface, "Store"))
        ));
        assert!(has(
            &warm,
            RelationshipType::Calls,
            RelationshipTarget::Pending("crate::store#load".to_string())
        ));
        assert!(has(
            &warm,
            RelationshipType::Calls,
            RelationshipTarget::Resolved(id(ComponentType::PrivateMethod, "fill"))
        ));
        assert!(has(
            &id(ComponentType::Function, "build"),
            RelationshipType::Calls,
            RelationshipTarget::Resolved(id(ComponentType::Constructor, "new"))
        ));
        assert!(has(
            &id(ComponentType::Module, "tests"),
            RelationshipType::Contains,
            RelationshipTarget::Resolved(id(ComponentType::Function, "works"))
        ));
        assert!(rels.iter().any(|r| r.relationship_type == RelationshipType::ExportsFrom
            && r.target == RelationshipTarget::Pending("crate::api".to_string())));
    }

    #[test]
    fn private_members_can_be_skipped() {
        let components = RustParser::new()
            .with_config(ParserConfig::minimal())
            .detect_components(SOURCE, "src/cache.rs");
        assert!(!components.iter().any(|c| c.name == "warm" || c.name == "entries"));
        assert!(components.iter().any(|c| c.name == "capacity"));
    }
}
