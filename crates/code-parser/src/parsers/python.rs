//! Python.
//!
//! Metadata populated:
//! - functions and methods: `Callable { parameters, return_type, is_async, is_generator,
//!   calls }`; `__init__` is the constructor, `@staticmethod`/`@classmethod` count as `static`,
//!   `@abstractmethod` as `abstract`, `__name` as private and `_name` as protected
//! - classes: `Type { superclass, interfaces }` where `superclass` is the first base and
//!   `interfaces` holds the remaining bases (`metaclass=` keywords are ignored)
//! - module and class assignments: `Variable { value_type, is_const }`; UPPER_CASE module
//!   names are constants
//! - `import` / `from ... import`: `Import { .. }`; relative levels stay in the specifier
//! - exports: names listed in `__all__`, or every public top-level def/class without it
//! - `documentation`: the docstring, else `#` comments directly above

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

/// Parser for Python sources
pub struct PythonParser {
    config: ParserConfig,
}

impl PythonParser {
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

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn backend(&self) -> &'static str {
        "tree-sitter-python"
    }

    fn parsing_level(&self) -> ParsingLevel {
        ParsingLevel::Structural
    }

    fn capabilities(&self) -> ParserCapabilities {
        ParserCapabilities {
            symbols: true,
            relationships: true,
            ranges: true,
            types: false,
            control_flow: false,
            incremental: false,
        }
    }

    fn detect_components(&self, content: &str, file_path: &str) -> Vec<Component> {
        extract_with_tree_sitter(Language::Python, &self.config, content, file_path, |root, batch| {
            let mut walker = Walker::new(&self.config);
            walker.visit_children(root, batch);
            walker.apply_exports(batch);
            Ok(())
        })
    }

    fn detect_relationships(&self, components: &[Component], content: &str) -> Vec<Relationship> {
        passes::run_standard_passes(components, content)
    }

    fn validate_syntax(&self, content: &str) -> Vec<ParseError> {
        tree_sitter_diagnostics(Language::Python, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Module,
    Class,
    Callable,
}

struct Walker<'c> {
    config: &'c ParserConfig,
    scopes: Vec<Scope>,
    /// Contents of `__all__`, if the module declares it
    explicit_exports: Option<Vec<String>>,
    top_level_names: Vec<String>,
}

impl<'c> Walker<'c> {
    fn new(config: &'c ParserConfig) -> Self {
        Self {
            config,
            scopes: vec![Scope::Module],
            explicit_exports: None,
            top_level_names: Vec::new(),
        }
    }

    fn scope(&self) -> Scope {
        self.scopes.last().copied().unwrap_or(Scope::Module)
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
            "import_statement" => self.import(node, batch),
            "import_from_statement" => self.import_from(node, batch),
            "function_definition" => self.function(node, node, &[], batch),
            "class_definition" => self.class(node, node, &[], batch),
            "decorated_definition" => {
                let decorators = decorator_nodes(node);
                match node.child_by_field_name("definition") {
                    Some(def) if def.kind() == "function_definition" => {
                        self.function(def, node, &decorators, batch);
                    }
                    Some(def) if def.kind() == "class_definition" => {
                        self.class(def, node, &decorators, batch);
                    }
                    _ => self.visit_children(node, batch),
                }
            }
            "expression_statement" if self.scope() != Scope::Callable => {
                let mut cursor = node.walk();
                let assignments: Vec<_> = node
                    .named_children(&mut cursor)
                    .filter(|c| c.kind() == "assignment")
                    .collect();
                for assignment in assignments {
                    self.assignment(assignment, node, batch);
                }
            }
            "comment" => {}
            _ => self.visit_children(node, batch),
        }
    }

    fn apply_exports(&self, batch: &mut ComponentBatch<'_>) {
        match &self.explicit_exports {
            Some(names) => {
                for name in names {
                    if !batch.mark_exported(name, name) {
                        log::debug!("{}: __all__ names unknown '{name}'", batch.file_path());
                    }
                }
            }
            None => {
                for name in self.top_level_names.iter().filter(|n| !n.starts_with('_')) {
                    batch.mark_exported(name, name);
                }
            }
        }
    }

    fn import(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let mut cursor = node.walk();
        let names: Vec<_> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let (module, alias) = match name.kind() {
                "aliased_import" => (
                    field_text(name, "name", content).unwrap_or_default().to_string(),
                    field_text(name, "alias", content).map(str::to_string),
                ),
                _ => (text(name, content).to_string(), None),
            };
            if module.is_empty() {
                continue;
            }
            // `import a.b` binds `a`; `import a.b as c` binds `c`
            let binding = alias.unwrap_or_else(|| module.split('.').next().unwrap_or(&module).to_string());
            let details = ComponentDetails::Import {
                specifier: module.clone(),
                imported_names: Vec::new(),
                default_import: None,
                namespace_import: Some(binding),
                is_type_only: false,
                is_reexport: false,
            };
            let code = code(node, batch, self.config);
            batch.add(
                ComponentType::Import,
                &module,
                location(node),
                code,
                ComponentMetadata::with_details(details),
            );
        }
    }

    fn import_from(&mut self, node: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(module) = field_text(node, "module_name", content).map(str::to_string) else {
            return;
        };
        let mut imported_names = Vec::new();
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            match name.kind() {
                "aliased_import" => {
                    if let Some(original) = field_text(name, "name", content) {
                        imported_names.push(ImportedName {
                            name: original.to_string(),
                            alias: field_text(name, "alias", content).map(str::to_string),
                        });
                    }
                }
                _ => imported_names.push(ImportedName {
                    name: text(name, content).to_string(),
                    alias: None,
                }),
            }
        }
        let mut cursor = node.walk();
        if node
            .named_children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import")
        {
            imported_names.push(ImportedName {
                name: "*".to_string(),
                alias: None,
            });
        }

        let details = ComponentDetails::Import {
            specifier: module.clone(),
            imported_names,
            default_import: None,
            namespace_import: None,
            is_type_only: false,
            is_reexport: false,
        };
        let code = code(node, batch, self.config);
        batch.add(
            ComponentType::Import,
            &module,
            location(node),
            code,
            ComponentMetadata::with_details(details),
        );
    }

    fn function(
        &mut self,
        node: Node<'_>,
        span: Node<'_>,
        decorators: &[Node<'_>],
        batch: &mut ComponentBatch<'_>,
    ) {
        let content = batch.content();
        let name = field_text(node, "name", content).unwrap_or("anonymous").to_string();
        let decorator_names: Vec<String> =
            decorators.iter().map(|d| decorator_name(*d, content)).collect();
        let in_class = self.scope() == Scope::Class;

        let mut modifiers = Vec::new();
        if has_keyword(node, content, "async") {
            modifiers.push("async".to_string());
        }
        let component_type = if in_class {
            for decorator in &decorator_names {
                match decorator.as_str() {
                    "staticmethod" | "classmethod" => modifiers.push("static".to_string()),
                    "abstractmethod" | "abc.abstractmethod" => modifiers.push("abstract".to_string()),
                    "property" => modifiers.push("property".to_string()),
                    _ => {}
                }
            }
            modifiers.extend(visibility(&name));
            if !self.keeps_member(&modifiers) {
                return;
            }
            if name == "__init__" {
                ComponentType::Constructor
            } else {
                ComponentType::method_for(&modifiers)
            }
        } else {
            ComponentType::Function
        };

        let doc = docstring(node, content).or_else(|| documentation(span, batch, self.config, Language::Python));
        let metadata = ComponentMetadata::with_details(callable_details(node, content))
            .modifiers(modifiers)
            .decorators(decorator_names)
            .documentation(doc);
        let code = code(span, batch, self.config);
        let id = batch.add(component_type, &name, location(span), code, metadata);
        if self.scope() == Scope::Module {
            self.top_level_names.push(name);
        }

        batch.stack.push(id);
        self.add_decorators(decorators, batch);
        if let Some(body) = node.child_by_field_name("body") {
            self.scopes.push(Scope::Callable);
            self.visit_children(body, batch);
            self.scopes.pop();
        }
        batch.stack.pop();
    }

    fn class(
        &mut self,
        node: Node<'_>,
        span: Node<'_>,
        decorators: &[Node<'_>],
        batch: &mut ComponentBatch<'_>,
    ) {
        let content = batch.content();
        let name = field_text(node, "name", content).unwrap_or("anonymous").to_string();
        let mut bases = Vec::new();
        if let Some(args) = node.child_by_field_name("superclasses") {
            let mut cursor = args.walk();
            bases.extend(
                args.named_children(&mut cursor)
                    .filter(|a| a.kind() != "keyword_argument" && a.kind() != "comment")
                    .map(|a| text(a, content).to_string()),
            );
        }
        let mut bases = bases.into_iter();
        let details = ComponentDetails::Type {
            superclass: bases.next(),
            interfaces: bases.collect(),
            type_parameters: Vec::new(),
        };
        let decorator_names = decorators.iter().map(|d| decorator_name(*d, content)).collect();
        let doc = docstring(node, content).or_else(|| documentation(span, batch, self.config, Language::Python));
        let metadata = ComponentMetadata::with_details(details)
            .decorators(decorator_names)
            .documentation(doc);
        let code = code(span, batch, self.config);
        let id = batch.add(ComponentType::Class, &name, location(span), code, metadata);
        if self.scope() == Scope::Module {
            self.top_level_names.push(name);
        }

        batch.stack.push(id);
        self.add_decorators(decorators, batch);
        if let Some(body) = node.child_by_field_name("body") {
            self.scopes.push(Scope::Class);
            self.visit_children(body, batch);
            self.scopes.pop();
        }
        batch.stack.pop();
    }

    fn assignment(&mut self, node: Node<'_>, span: Node<'_>, batch: &mut ComponentBatch<'_>) {
        let content = batch.content();
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let name = text(left, content).to_string();
        let scope = self.scope();

        if scope == Scope::Module && name == "__all__" {
            if let Some(right) = node.child_by_field_name("right") {
                self.explicit_exports = Some(string_items(right, content));
            }
            return;
        }

        let value_type = field_text(node, "type", content).map(str::to_string);
        let is_const = is_constant_name(&name);
        let (component_type, modifiers) = match scope {
            Scope::Class => {
                let modifiers = visibility(&name);
                if !self.keeps_member(&modifiers) {
                    return;
                }
                (ComponentType::property_for(&modifiers), modifiers)
            }
            _ if is_const => (ComponentType::Constant, Vec::new()),
            _ => (ComponentType::Variable, Vec::new()),
        };
        let metadata = ComponentMetadata::with_details(ComponentDetails::Variable {
            value_type,
            is_const,
        })
        .modifiers(modifiers);
        let code = code(span, batch, self.config);
        batch.add(component_type, &name, location(span), code, metadata);
        if scope == Scope::Module {
            self.top_level_names.push(name);
        }
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
    let body = node.child_by_field_name("body");
    let calls = body
        .map(|body| {
            collect_calls(
                body,
                content,
                &|n| n.kind() == "call",
                &callee,
                &is_component_scope,
            )
        })
        .unwrap_or_default();
    let is_generator = body.is_some_and(|b| contains_yield(b));

    ComponentDetails::Callable {
        parameters,
        return_type: field_text(node, "return_type", content).map(str::to_string),
        is_async: has_keyword(node, content, "async"),
        is_generator,
        calls,
    }
}

fn parameter(node: Node<'_>, content: &str) -> Option<Parameter> {
    match node.kind() {
        "identifier" => Some(Parameter::named(text(node, content))),
        "typed_parameter" => {
            let mut cursor = node.walk();
            let name = node
                .named_children(&mut cursor)
                .find(|c| c.kind() != "type")
                .map(|c| text(c, content).to_string())?;
            Some(Parameter {
                name,
                type_annotation: field_text(node, "type", content).map(str::to_string),
                default_value: None,
            })
        }
        "default_parameter" | "typed_default_parameter" => Some(Parameter {
            name: field_text(node, "name", content)?.to_string(),
            type_annotation: field_text(node, "type", content).map(str::to_string),
            default_value: field_text(node, "value", content).map(str::to_string),
        }),
        "list_splat_pattern" | "dictionary_splat_pattern" => Some(Parameter::named(text(node, content))),
        _ => None,
    }
}

fn callee(call: Node<'_>, content: &str) -> Option<String> {
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some(text(function, content).to_string()),
        "attribute" => field_text(function, "attribute", content).map(str::to_string),
        _ => None,
    }
}

fn is_component_scope(node: Node<'_>) -> bool {
    matches!(node.kind(), "function_definition" | "class_definition")
}

fn contains_yield(body: Node<'_>) -> bool {
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if node.kind() == "yield" {
            return true;
        }
        if node.id() != body.id() && is_component_scope(node) {
            continue;
        }
        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
    false
}

/// First statement string literal of a def/class body
fn docstring(node: Node<'_>, content: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }
    let raw = text(literal, content);
    let trimmed = raw
        .trim_start_matches(['r', 'R', 'u', 'U', 'b', 'B'])
        .trim_start_matches("\"\"\"")
        .trim_start_matches("'''")
        .trim_end_matches("\"\"\"")
        .trim_end_matches("'''")
        .trim_matches(['"', '\''])
        .trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn decorator_nodes<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .collect()
}

fn decorator_name(node: Node<'_>, content: &str) -> String {
    let name = match node.named_child(0) {
        Some(call) if call.kind() == "call" => call
            .child_by_field_name("function")
            .map(|f| text(f, content))
            .unwrap_or_else(|| text(call, content)),
        Some(expr) => text(expr, content),
        None => text(node, content),
    };
    name.trim_start_matches('@').trim().to_string()
}

fn has_keyword(node: Node<'_>, content: &str, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && text(c, content) == keyword);
    found
}

fn visibility(name: &str) -> Vec<String> {
    if name.starts_with("__") && !name.ends_with("__") {
        vec!["private".to_string()]
    } else if name.starts_with('_') && !name.starts_with("__") {
        vec!["protected".to_string()]
    } else {
        Vec::new()
    }
}

fn string_items(node: Node<'_>, content: &str) -> Vec<String> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() == "string")
        .map(|c| text(c, content).trim_matches(['"', '\'']).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RelationshipTarget, RelationshipType};
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"import os.path as osp
from ..store import Store, load as load_all
from typing import *

MAX_RETRIES = 3


class Repository(Base, Mixin):
    """Persists records."""

    table: str = "records"
    _cache = {}

    def __init__(self, path: str = "db"):
        self.path = path

    @staticmethod
    def create(name):
        return Repository(name)

    def __secret(self):
        pass

    async def fetch(self, key, *args, **kwargs) -> dict:
        items = load_all(key)
        for item in items:
            yield helper(item)


def helper(value):
    def inner():
        return value
    return inner()


def _private():
    pass
"#;

    fn parse() -> Vec<Component> {
        PythonParser::new().detect_components(SOURCE, "pkg/repo.py")
    }

    fn find<'a>(components: &'a [Component], name: &str) -> &'a Component {
        components
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("missing component {name}"))
    }

    #[test]
    fn extracts_classes_methods_and_members() {
        let components = parse();
        let repo = find(&components, "Repository");
        assert_eq!(repo.component_type, ComponentType::Class);
        assert_eq!(repo.metadata.documentation.as_deref(), Some("Persists records."));
        assert!(matches!(
            &repo.metadata.details,
            ComponentDetails::Type { superclass: Some(s), interfaces, .. }
                if s == "Base" && interfaces == &vec!["Mixin".to_string()]
        ));

        let ty = |name: &str| find(&components, name).component_type;
        assert_eq!(ty("__init__"), ComponentType::Constructor);
        assert_eq!(ty("create"), ComponentType::StaticMethod);
        assert_eq!(ty("__secret"), ComponentType::PrivateMethod);
        assert_eq!(ty("fetch"), ComponentType::Method);
        assert_eq!(ty("table"), ComponentType::Property);
        assert_eq!(ty("_cache"), ComponentType::ProtectedProperty);
        assert_eq!(ty("MAX_RETRIES"), ComponentType::Constant);
        assert_eq!(ty("staticmethod"), ComponentType::Decorator);
        assert_eq!(
            find(&components, "inner").parent_id,
            Some(find(&components, "helper").id.clone())
        );
        assert!(components.iter().all(|c| c.name != "path" && c.name != "items"));
    }

    #[test]
    fn callable_details_and_exports() {
        let components = parse();
        match &find(&components, "fetch").metadata.details {
            ComponentDetails::Callable {
                parameters,
                return_type,
                is_async,
                is_generator,
                calls,
            } => {
                let names: Vec<_> = parameters.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["self", "key", "*args", "**kwargs"]);
                assert_eq!(return_type.as_deref(), Some("dict"));
                assert!(is_async);
                assert!(is_generator);
                assert_eq!(calls, &vec!["load_all".to_string(), "helper".to_string()]);
            }
            other => panic!("unexpected details {other:?}"),
        }
        assert!(find(&components, "helper").metadata.is_exported);
        assert!(find(&components, "Repository").metadata.is_exported);
        assert!(!find(&components, "_private").metadata.is_exported);
    }

    #[test]
    fn all_restricts_exports() {
        let source = "__all__ = ['b']\n\ndef a():\n    pass\n\ndef b():\n    pass\n";
        let components = PythonParser::new().detect_components(source, "m.py");
        assert!(!find(&components, "a").metadata.is_exported);
        assert!(find(&components, "b").metadata.is_exported);
    }

    #[test]
    fn relationships() {
        let parser = PythonParser::new();
        let components = parser.detect_components(SOURCE, "pkg/repo.py");
        let rels = parser.detect_relationships(&components, SOURCE);
        let has = |ty: RelationshipType, target: RelationshipTarget| {
            rels.iter().any(|r| r.relationship_type == ty && r.target == target)
        };
        let fetch = find(&components, "fetch").id.clone();

        assert!(has(
            RelationshipType::ImportsFrom,
            RelationshipTarget::Pending("..store".to_string())
        ));
        assert!(has(
            RelationshipType::Extends,
            RelationshipTarget::Pending("Mixin".to_string())
        ));
        assert!(rels.iter().any(|r| r.source_id == fetch
            && r.relationship_type == RelationshipType::Calls
            && r.target == RelationshipTarget::Pending("..store#load".to_string())));
        assert!(rels.iter().any(|r| r.source_id == fetch
            && r.relationship_type == RelationshipType::Calls
            && r.target.resolved_id() == Some(find(&components, "helper").id.as_str())));
        assert!(has(
            RelationshipType::Instantiates,
            RelationshipTarget::Resolved(find(&components, "Repository").id.clone())
        ));
        assert!(has(
            RelationshipType::Annotates,
            RelationshipTarget::Resolved(find(&components, "create").id.clone())
        ));
    }

    #[test]
    fn syntax_errors_are_reported_without_blocking() {
        let parser = PythonParser::new();
        let broken = "def ok():\n    pass\n\ndef broken(:\n";
        assert!(!parser.validate_syntax(broken).is_empty());
        let components = parser.detect_components(broken, "b.py");
        assert!(components.iter().any(Component::is_root));
    }
}
