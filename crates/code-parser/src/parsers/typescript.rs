//! TypeScript, TSX and JavaScript.
//!
//! Metadata populated:
//! - functions, methods, arrow-function constants: `Callable { parameters, return_type,
//!   is_async, is_generator, calls }`; modifiers from `static`, `abstract`, `readonly`,
//!   `async`, `get`/`set`, `override` and accessibility keywords (`#name` counts as private)
//! - classes and interfaces: `Type { superclass, interfaces, type_parameters }`, `decorators`
//! - `const`/`let`/`var`: `Variable { value_type, is_const }`
//! - `import`, `export ... from` and `require()`: `Import { .. }`
//! - exported declarations: `is_exported`, `exported_name` (`default` for default exports)

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

const MEMBER_KEYWORDS: &[&str] = &[
    "static", "abstract", "readonly", "async", "get", "set", "declare",
];

/// Parser for the TypeScript family (TS, TSX, JS/JSX)
pub struct TypeScriptParser {
    language: Language,
    config: ParserConfig,
}

impl TypeScriptParser {
    /// `language` must be one of TypeScript, Tsx or JavaScript; anything else parses as
    /// TypeScript.
    pub fn new(language: Language) -> Self {
        let language = match language {
            Language::JavaScript | Language::Tsx => language,
            _ => Language::TypeScript,
        };
        Self {
            language,
            config: ParserConfig::default(),
        }
    }

    pub fn typescript() -> Self {
        Self::new(Language::TypeScript)
    }

    pub fn tsx() -> Self {
        Self::new(Language::Tsx)
    }

    pub fn javascript() -> Self {
        Self::new(Language::JavaScript)
    }

    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl LanguageParser for TypeScriptParser {
    fn language(&self) -> Language {
        self.language
    }

    fn backend(&self) -> &'static str {
        match self.language {
            Language::JavaScript => "tree-sitter-javascript",
            _ => "tree-sitter-typescript",
        }
    }

    fn parsing_level(&self) -> ParsingLevel {
        ParsingLevel::Structural
    }

    fn capabilities(&self) -> ParserCapabilities {
        ParserCapabilities {
            symbols: true,
            relationships: true,
            ranges: true,
            types: self.language != Language::JavaScript,
            control_flow: false,
            incremental: false,
        }
    }

    fn detect_components(&self, content: &str, file_path: &str) -> Vec<Component> {
        extract_with_tree_sitter(self.language, &self.config, content, file_path, |root, batch| {
            let mut walker = Walker::new(&self.config, self.language);
            walker.visit_children(root, batch);
            walker.apply_local_exports(batch);
            Ok(())
        })
    }

    fn detect_relationships(&self, components: &[Component], content: &str) -> Vec<Relationship> {
        passes::run_standard_passes(components, content)
    }

    fn validate_syntax(&self, content: &str) -> Vec<ParseError> {
        tree_sitter_diagnostics(self.language, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Export {
    No,
    Named,
    Default,
}

impl Export {
    fn apply(self, metadata: ComponentMetadata, name: &str) -> ComponentMetadata {
        match self {
            Export::No => metadata,
            Export::Named => metadata.exported(name),
            Export::Default => metadata.exported("default"),
        }
    }
}

struct Walker<'c> {
    config: &'c ParserConfig,
    language: Language,
    callable_depth: usize,
    /// `export { a as b }` pairs, applied once every declaration is known
    local_exports: Vec<(String, String)>,
}

impl<'c> Walker<'c> {
    fn new(config: &'c ParserConfig, language: Language) -> Self {
        Self {
            config,
            language,
            callable_depth: 0,
            local_exports: Vec::new(),
        }
    }

    fn visit_children(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child, batch, Export::No);
        }
    }

    fn visit(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>, export: Export) {
        match node.kind() {
            "import_statement" => self.import(node, batch),
            "export_statement" => self.export(node, batch),
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                self.function(node, batch, export);
            }
            "class_declaration" | "abstract_class_declaration" => self.class(node, batch, export),
            "interface_declaration" => self.interface(node, batch, export),
            "enum_declaration" => self.named_type(node, batch, ComponentType::Enum, export),
            "type_alias_declaration" => {
                self.named_type(node, batch, ComponentType::TypeAlias, export);
            }
            "lexical_declaration" | "variable_declaration" => self.variables(node, batch, export),
            "internal_module" | "module" => self.namespace(node, batch, export),
            "comment" => {}
            _ => self.visit_children(node, batch),
        }
    }

    fn apply_local_exports(&self, batch: &mut ComponentBatch<'_>) {
        for (local, exported) in &self.local_exports {
            if !batch.mark_exported(local, exported) {
                log::debug!(
                    "{}: export of '{local}' has no local declaration",
                    batch.file_path()
                );
            }
        }
    }

    fn import(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(specifier) = node.child_by_field_name("source").map(|s| unquote(text(s, content)))
        else {
            return;
        };

        let mut default_import = None;
        let mut namespace_import = None;
        let mut imported_names = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for part in child.children(&mut clause_cursor) {
                match part.kind() {
                    "identifier" => default_import = Some(text(part, content).to_string()),
                    "namespace_import" => {
                        namespace_import = first_identifier(part, content);
                    }
                    "named_imports" => imported_names.extend(specifiers(part, content)),
                    _ => {}
                }
            }
        }
        let is_type_only = has_keyword(node, content, "type");

        let details = ComponentDetails::Import {
            specifier: specifier.clone(),
            imported_names,
            default_import,
            namespace_import,
            is_type_only,
            is_reexport: false,
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

    fn export(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let is_default = has_keyword(node, content, "default");

        if let Some(declaration) = node.child_by_field_name("declaration") {
            let export = if is_default {
                Export::Default
            } else {
                Export::Named
            };
            self.visit(declaration, batch, export);
            return;
        }

        if let Some(source) = node.child_by_field_name("source") {
            let specifier = unquote(text(source, content));
            let mut imported_names = Vec::new();
            let mut namespace_import = None;
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "export_clause" => imported_names.extend(specifiers(child, content)),
                    "namespace_export" => namespace_import = first_identifier(child, content),
                    "*" => imported_names.push(ImportedName {
                        name: "*".to_string(),
                        alias: None,
                    }),
                    _ => {}
                }
            }
            let details = ComponentDetails::Import {
                specifier: specifier.clone(),
                imported_names,
                default_import: None,
                namespace_import,
                is_type_only: has_keyword(node, content, "type"),
                is_reexport: true,
            };
            let code = code(node, batch, self.config);
            batch.add(
                ComponentType::Import,
                &specifier,
                location(node),
                code,
                ComponentMetadata::with_details(details),
            );
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "export_clause" {
                for name in specifiers(child, content) {
                    let exported = name.alias.clone().unwrap_or_else(|| name.name.clone());
                    self.local_exports.push((name.name, exported));
                }
            }
        }

        if let Some(value) = node.child_by_field_name("value") {
            match value.kind() {
                "identifier" => self
                    .local_exports
                    .push((text(value, content).to_string(), "default".to_string())),
                "class" => self.class(value, batch, Export::Default),
                kind if is_function_kind(kind) => self.function(value, batch, Export::Default),
                _ => {}
            }
        }
    }

    fn function(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>, export: Export) {
        let content = batch.content();
        let name = field_text(node, "name", content)
            .map(str::to_string)
            .unwrap_or_else(|| anonymous_name(export));
        let details = callable_details(node, content);
        let modifiers = keywords(node, content, &["async", "declare"]);
        let doc = documentation(node, batch, self.config, self.language);
        let metadata = export.apply(
            ComponentMetadata::with_details(details)
                .modifiers(modifiers)
                .documentation(doc),
            &name,
        );
        let code = code(node, batch, self.config);
        let id = batch.add(ComponentType::Function, &name, location(node), code, metadata);
        self.enter_callable(node.child_by_field_name("body"), id, batch);
    }

    fn enter_callable(&mut self, body: Option<Node<'_>>, id: String, batch: &mut ComponentBatch<'_>) {
        let Some(body) = body else {
            return;
        };
        batch.stack.push(id);
        self.callable_depth += 1;
        self.visit_children(body, batch);
        self.callable_depth -= 1;
        batch.stack.pop();
    }

    fn class(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>, export: Export) {
        let content = batch.content();
        let name = field_text(node, "name", content)
            .map(str::to_string)
            .unwrap_or_else(|| anonymous_name(export));
        let (superclass, interfaces) = heritage(node, content);
        let mut modifiers = Vec::new();
        if node.kind() == "abstract_class_declaration" {
            modifiers.push("abstract".to_string());
        }
        let details = ComponentDetails::Type {
            superclass,
            interfaces,
            type_parameters: type_parameters(node, content),
        };
        let decorator_nodes = children_of_kind(node, "decorator");
        let doc = documentation(node, batch, self.config, self.language);
        let metadata = export.apply(
            ComponentMetadata::with_details(details)
                .modifiers(modifiers)
                .decorators(decorator_nodes.iter().map(|d| decorator_name(*d, content)).collect())
                .documentation(doc),
            &name,
        );
        let code = code(node, batch, self.config);
        let id = batch.add(ComponentType::Class, &name, location(node), code, metadata);

        batch.stack.push(id);
        self.add_decorators(&decorator_nodes, batch);
        if let Some(body) = node.child_by_field_name("body") {
            self.class_body(body, batch);
        }
        batch.stack.pop();
    }

    fn class_body(&mut self, body: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let mut pending_decorators = Vec::new();
        let mut cursor = body.walk();
        let members: Vec<_> = body.named_children(&mut cursor).collect();
        for member in members {
            match member.kind() {
                "decorator" => pending_decorators.push(member),
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    let mut decorators = std::mem::take(&mut pending_decorators);
                    decorators.extend(children_of_kind(member, "decorator"));
                    self.method(member, batch, &decorators, false);
                }
                "public_field_definition" | "field_definition" | "property_signature" => {
                    let mut decorators = std::mem::take(&mut pending_decorators);
                    decorators.extend(children_of_kind(member, "decorator"));
                    self.property(member, batch, &decorators);
                }
                "comment" => {}
                _ => pending_decorators.clear(),
            }
        }
    }

    fn method(
        &mut self,
        node: Node<'_>,
        batch: &mut ComponentBatch<'_>,
        decorators: &[Node<'_>],
        force_abstract: bool,
    ) {
        let content = batch.content();
        let name = field_text(node, "name", content).unwrap_or("anonymous").to_string();
        let mut modifiers = member_modifiers(node, content);
        if name.starts_with('#') && !modifiers.iter().any(|m| m == "private") {
            modifiers.push("private".to_string());
        }
        if (force_abstract || node.kind() == "abstract_method_signature")
            && !modifiers.iter().any(|m| m == "abstract")
        {
            modifiers.push("abstract".to_string());
        }
        if !self.keeps_member(&modifiers) {
            return;
        }

        let component_type = if name == "constructor" {
            ComponentType::Constructor
        } else {
            ComponentType::method_for(&modifiers)
        };
        let details = callable_details(node, content);
        let doc = documentation(node, batch, self.config, self.language);
        let metadata = ComponentMetadata::with_details(details)
            .modifiers(modifiers)
            .decorators(decorators.iter().map(|d| decorator_name(*d, content)).collect())
            .documentation(doc);
        let code = code(node, batch, self.config);
        let id = batch.add(component_type, &name, location(node), code, metadata);

        batch.stack.push(id.clone());
        self.add_decorators(decorators, batch);
        batch.stack.pop();
        self.enter_callable(node.child_by_field_name("body"), id, batch);
    }

    fn property(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>, decorators: &[Node<'_>]) {
        let content = batch.content();
        let name_node = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("property"));
        let name = name_node
            .map(|n| text(n, content))
            .unwrap_or("anonymous")
            .to_string();
        let mut modifiers = member_modifiers(node, content);
        if name.starts_with('#') && !modifiers.iter().any(|m| m == "private") {
            modifiers.push("private".to_string());
        }
        if !self.keeps_member(&modifiers) {
            return;
        }

        let value = node.child_by_field_name("value");
        let doc = documentation(node, batch, self.config, self.language);
        let decorator_names = decorators.iter().map(|d| decorator_name(*d, content)).collect();

        // `handler = () => {}` behaves like a method
        if let Some(function) = value.filter(|v| is_function_kind(v.kind())) {
            let metadata = ComponentMetadata::with_details(callable_details(function, content))
                .modifiers(modifiers.clone())
                .decorators(decorator_names)
                .documentation(doc);
            let code = code(node, batch, self.config);
            let id = batch.add(
                ComponentType::method_for(&modifiers),
                &name,
                location(node),
                code,
                metadata,
            );
            batch.stack.push(id.clone());
            self.add_decorators(decorators, batch);
            batch.stack.pop();
            self.enter_callable(function.child_by_field_name("body"), id, batch);
            return;
        }

        let details = ComponentDetails::Variable {
            value_type: field_text(node, "type", content).map(type_text),
            is_const: modifiers.iter().any(|m| m == "readonly"),
        };
        let metadata = ComponentMetadata::with_details(details)
            .modifiers(modifiers.clone())
            .decorators(decorator_names)
            .documentation(doc);
        let code = code(node, batch, self.config);
        let id = batch.add(
            ComponentType::property_for(&modifiers),
            &name,
            location(node),
            code,
            metadata,
        );
        batch.stack.push(id);
        self.add_decorators(decorators, batch);
        batch.stack.pop();
    }

    fn interface(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>, export: Export) {
        let content = batch.content();
        let name = field_text(node, "name", content).unwrap_or("anonymous").to_string();
        let mut interfaces = Vec::new();
        for clause in children_of_kind(node, "extends_type_clause") {
            let mut cursor = clause.walk();
            interfaces.extend(clause.named_children(&mut cursor).map(|t| text(t, content).to_string()));
        }
        let details = ComponentDetails::Type {
            superclass: None,
            interfaces,
            type_parameters: type_parameters(node, content),
        };
        let doc = documentation(node, batch, self.config, self.language);
        let metadata = export.apply(
            ComponentMetadata::with_details(details).documentation(doc),
            &name,
        );
        let code = code(node, batch, self.config);
        let id = batch.add(ComponentType::Interface, &name, location(node), code, metadata);

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        batch.stack.push(id);
        let mut cursor = body.walk();
        let members: Vec<_> = body.named_children(&mut cursor).collect();
        for member in members {
            match member.kind() {
                "method_signature" => self.method(member, batch, &[], true),
                "property_signature" => self.property(member, batch, &[]),
                _ => {}
            }
        }
        batch.stack.pop();
    }

    fn named_type(
        &mut self,
        node: Node<'_>,
        batch: &mut ComponentBatch<'_>,
        component_type: ComponentType,
        export: Export,
    ) {
        let content = batch.content();
        let name = field_text(node, "name", content).unwrap_or("anonymous").to_string();
        let details = ComponentDetails::Type {
            superclass: None,
            interfaces: Vec::new(),
            type_parameters: type_parameters(node, content),
        };
        let doc = documentation(node, batch, self.config, self.language);
        let metadata = export.apply(
            ComponentMetadata::with_details(details).documentation(doc),
            &name,
        );
        let code = code(node, batch, self.config);
        batch.add(component_type, &name, location(node), code, metadata);
    }

    fn namespace(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>, export: Export) {
        let content = batch.content();
        let name = field_text(node, "name", content)
            .map(unquote)
            .unwrap_or_else(|| "anonymous".to_string());
        let doc = documentation(node, batch, self.config, self.language);
        let metadata = export.apply(ComponentMetadata::default().documentation(doc), &name);
        let code = code(node, batch, self.config);
        let id = batch.add(ComponentType::Namespace, &name, location(node), code, metadata);
        if let Some(body) = node.child_by_field_name("body") {
            batch.stack.push(id);
            self.visit_children(body, batch);
            batch.stack.pop();
        }
    }

    fn variables(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>, export: Export) {
        let content = batch.content();
        let is_const = node
            .child(0)
            .is_some_and(|first| text(first, content) == "const");
        let mut cursor = node.walk();
        let declarators: Vec<_> = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .collect();
        let single = declarators.len() == 1;

        for declarator in declarators {
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            let span = if single { node } else { declarator };
            let value = declarator.child_by_field_name("value");

            if let Some(specifier) = value.and_then(|v| require_specifier(v, content)) {
                self.require_import(span, name_node, specifier, batch);
                continue;
            }

            if let Some(function) = value.filter(|v| is_function_kind(v.kind())) {
                let name = text(name_node, content).to_string();
                let mut modifiers = keywords(function, content, &["async"]);
                if is_const {
                    modifiers.insert(0, "const".to_string());
                }
                let doc = documentation(span, batch, self.config, self.language);
                let metadata = export.apply(
                    ComponentMetadata::with_details(callable_details(function, content))
                        .modifiers(modifiers)
                        .documentation(doc),
                    &name,
                );
                let code = code(span, batch, self.config);
                let id = batch.add(ComponentType::Function, &name, location(span), code, metadata);
                self.enter_callable(function.child_by_field_name("body"), id, batch);
                continue;
            }

            // Locals inside callables are not part of the graph
            if self.callable_depth > 0 {
                if let Some(value) = value {
                    self.visit(value, batch, Export::No);
                }
                continue;
            }

            let name = text(name_node, content).to_string();
            let component_type = if is_const && is_constant_name(&name) {
                ComponentType::Constant
            } else {
                ComponentType::Variable
            };
            let details = ComponentDetails::Variable {
                value_type: field_text(declarator, "type", content).map(type_text),
                is_const,
            };
            let doc = documentation(span, batch, self.config, self.language);
            let metadata = export.apply(
                ComponentMetadata::with_details(details).documentation(doc),
                &name,
            );
            let code = code(span, batch, self.config);
            batch.add(component_type, &name, location(span), code, metadata);
        }
    }

    fn require_import(
        &mut self,
        span: Node<'_>,
        name_node: Node<'_>,
        specifier: String,
        batch: &mut ComponentBatch<'_>,
    ) {
        let content = batch.content();
        let mut default_import = None;
        let mut imported_names = Vec::new();
        if name_node.kind() == "object_pattern" {
            let mut cursor = name_node.walk();
            for prop in name_node.named_children(&mut cursor) {
                match prop.kind() {
                    "shorthand_property_identifier_pattern" => imported_names.push(ImportedName {
                        name: text(prop, content).to_string(),
                        alias: None,
                    }),
                    "pair_pattern" => {
                        if let Some(key) = field_text(prop, "key", content) {
                            imported_names.push(ImportedName {
                                name: key.to_string(),
                                alias: field_text(prop, "value", content).map(str::to_string),
                            });
                        }
                    }
                    _ => {}
                }
            }
        } else {
            default_import = Some(text(name_node, content).to_string());
        }
        let details = ComponentDetails::Import {
            specifier: specifier.clone(),
            imported_names,
            default_import,
            namespace_import: None,
            is_type_only: false,
            is_reexport: false,
        };
        let code = code(span, batch, self.config);
        batch.add(
            ComponentType::Import,
            &specifier,
            location(span),
            code,
            ComponentMetadata::with_details(details).extra("commonjs", true),
        );
    }

    fn add_decorators(&self, decorators: &[Node<'_>], batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        for decorator in decorators {
            let name = decorator_name(*decorator, content);
            let code = code(*decorator, batch, self.config);
            batch.add(
                ComponentType::Decorator,
                &name,
                location(*decorator),
                code,
                ComponentMetadata::default(),
            );
        }
    }

    fn keeps_member(&self, modifiers: &[String]) -> bool {
        self.config.include_private_members
            || !modifiers.iter().any(|m| m == "private" || m == "protected")
    }
}

fn callable_details(node: Node<'_>, content: &str) -> ComponentDetails {
    let parameters = match node.child_by_field_name("parameters") {
        Some(params) => {
            let mut cursor = params.walk();
            params
                .named_children(&mut cursor)
                .filter_map(|p| parameter(p, content))
                .collect()
        }
        None => node
            .child_by_field_name("parameter")
            .map(|p| vec![Parameter::named(text(p, content))])
            .unwrap_or_default(),
    };
    let calls = node
        .child_by_field_name("body")
        .map(|body| {
            collect_calls(
                body,
                content,
                &|n| n.kind() == "call_expression",
                &callee,
                &is_component_scope,
            )
        })
        .unwrap_or_default();
    let mut cursor = node.walk();
    let is_generator = node.kind().contains("generator")
        || node.children(&mut cursor).any(|c| c.kind() == "*");

    ComponentDetails::Callable {
        parameters,
        return_type: field_text(node, "return_type", content).map(type_text),
        is_async: has_keyword(node, content, "async"),
        is_generator,
        calls,
    }
}

fn parameter(node: Node<'_>, content: &str) -> Option<Parameter> {
    match node.kind() {
        "required_parameter" | "optional_parameter" => {
            let name = field_text(node, "pattern", content)?;
            Some(Parameter {
                name: name.to_string(),
                type_annotation: field_text(node, "type", content).map(type_text),
                default_value: field_text(node, "value", content).map(str::to_string),
            })
        }
        "assignment_pattern" => Some(Parameter {
            name: field_text(node, "left", content)?.to_string(),
            type_annotation: None,
            default_value: field_text(node, "right", content).map(str::to_string),
        }),
        "comment" => None,
        _ => Some(Parameter::named(text(node, content))),
    }
}

fn callee(call: Node<'_>, content: &str) -> Option<String> {
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some(text(function, content).to_string()),
        "member_expression" => field_text(function, "property", content).map(str::to_string),
        _ => None,
    }
}

/// Nodes that become components of their own and therefore own their calls
fn is_component_scope(node: Node<'_>) -> bool {
    match node.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "class_declaration"
        | "abstract_class_declaration"
        | "method_definition" => true,
        "variable_declarator" | "public_field_definition" | "field_definition" => node
            .child_by_field_name("value")
            .is_some_and(|v| is_function_kind(v.kind())),
        _ => false,
    }
}

fn is_function_kind(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn heritage(node: Node<'_>, content: &str) -> (Option<String>, Vec<String>) {
    let mut superclass = None;
    let mut interfaces = Vec::new();
    for clause in children_of_kind(node, "class_heritage") {
        let mut cursor = clause.walk();
        for part in clause.children(&mut cursor) {
            match part.kind() {
                "extends_clause" => {
                    superclass = part
                        .child_by_field_name("value")
                        .or_else(|| part.named_child(0))
                        .map(|v| text(v, content).to_string());
                }
                "implements_clause" => {
                    let mut inner = part.walk();
                    interfaces.extend(
                        part.named_children(&mut inner)
                            .map(|t| text(t, content).to_string()),
                    );
                }
                // JavaScript: `extends <expression>` directly under the heritage node
                _ if part.is_named() && superclass.is_none() => {
                    superclass = Some(text(part, content).to_string());
                }
                _ => {}
            }
        }
    }
    (superclass, interfaces)
}

fn type_parameters(node: Node<'_>, content: &str) -> Vec<String> {
    let Some(params) = node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .map(|p| {
            field_text(p, "name", content)
                .unwrap_or_else(|| text(p, content))
                .to_string()
        })
        .collect()
}

fn member_modifiers(node: Node<'_>, content: &str) -> Vec<String> {
    let mut modifiers = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "accessibility_modifier" => modifiers.push(text(child, content).to_string()),
            "override_modifier" => modifiers.push("override".to_string()),
            _ => {
                let value = text(child, content);
                if !child.is_named() && MEMBER_KEYWORDS.contains(&value) {
                    modifiers.push(value.to_string());
                }
            }
        }
    }
    modifiers
}

fn keywords(node: Node<'_>, content: &str, wanted: &[&str]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| !c.is_named())
        .map(|c| text(c, content))
        .filter(|t| wanted.contains(t))
        .map(str::to_string)
        .collect()
}

fn has_keyword(node: Node<'_>, content: &str, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && text(c, content) == keyword);
    found
}

fn children_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == kind)
        .collect()
}

fn specifiers(node: Node<'_>, content: &str) -> Vec<ImportedName> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() == "import_specifier" || c.kind() == "export_specifier")
        .filter_map(|spec| {
            let name = field_text(spec, "name", content)?;
            Some(ImportedName {
                name: name.to_string(),
                alias: field_text(spec, "alias", content).map(str::to_string),
            })
        })
        .collect()
}

fn first_identifier(node: Node<'_>, content: &str) -> Option<String> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "identifier")
        .map(|c| text(c, content).to_string());
    found
}

fn decorator_name(node: Node<'_>, content: &str) -> String {
    let inner = node.named_child(0);
    let name = match inner {
        Some(call) if call.kind() == "call_expression" => call
            .child_by_field_name("function")
            .map(|f| text(f, content))
            .unwrap_or_else(|| text(call, content)),
        Some(other) => text(other, content),
        None => text(node, content),
    };
    name.trim_start_matches('@').to_string()
}

fn require_specifier(value: Node<'_>, content: &str) -> Option<String> {
    if value.kind() != "call_expression" {
        return None;
    }
    let function = value.child_by_field_name("function")?;
    if text(function, content) != "require" {
        return None;
    }
    let arguments = value.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    (first.kind() == "string").then(|| unquote(text(first, content)))
}

fn anonymous_name(export: Export) -> String {
    if export == Export::Default {
        "default".to_string()
    } else {
        "anonymous".to_string()
    }
}

fn unquote(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '\'' || c == '"' || c == '`')
        .to_string()
}

fn type_text(annotation: &str) -> String {
    annotation.trim().trim_start_matches(':').trim().to_string()
}

fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
