use crate::language::Language;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Stable id for a component: `<file_path>::<type>::<name>`.
///
/// Pure function of its inputs; repeated runs over unchanged input produce identical ids.
#[must_use]
pub fn generate_component_id(file_path: &str, name: &str, component_type: ComponentType) -> String {
    format!("{file_path}::{}::{name}", component_type.as_str())
}

/// Stable id for a relationship, derived from `(source, target, type)`.
///
/// Passes that discover the same edge independently produce the same id, which is what
/// callers deduplicate on.
#[must_use]
pub fn generate_relationship_id(
    source_id: &str,
    target_key: &str,
    relationship_type: RelationshipType,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(relationship_type.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(target_key.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("rel_{hex}")
}

/// Closed 1-based line range (optionally with 1-based columns) over the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub start_line: usize,
    pub end_line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
}

impl Location {
    #[must_use]
    pub const fn lines(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
            start_column: None,
            end_column: None,
        }
    }

    #[must_use]
    pub const fn with_columns(mut self, start_column: usize, end_column: usize) -> Self {
        self.start_column = Some(start_column);
        self.end_column = Some(end_column);
        self
    }

    /// Same range moved down by `offset` lines
    #[must_use]
    pub const fn shifted(self, offset: usize) -> Self {
        Self {
            start_line: self.start_line + offset,
            end_line: self.end_line + offset,
            start_column: self.start_column,
            end_column: self.end_column,
        }
    }

    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Whether `other` lies entirely inside this range
    #[must_use]
    pub const fn encloses(&self, other: &Location) -> bool {
        self.start_line <= other.start_line && other.end_line <= self.end_line
    }
}

/// Kind of structural unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    File,
    Namespace,
    Module,
    Class,
    Interface,
    Enum,
    TypeAlias,
    Function,
    Method,
    PublicMethod,
    PrivateMethod,
    ProtectedMethod,
    StaticMethod,
    AbstractMethod,
    Constructor,
    Property,
    PublicProperty,
    PrivateProperty,
    ProtectedProperty,
    StaticProperty,
    Variable,
    Constant,
    Section,
    CodeBlock,
    Paragraph,
    BlockQuote,
    ListItem,
    Table,
    Annotation,
    Decorator,
    Import,
    Comment,
    IndexBlock,
    IndexSection,
    IndexFile,
    IndexSystem,
    IndexFlow,
    IndexLink,
    IndexEntry,
}

impl ComponentType {
    pub const ALL: [ComponentType; 39] = [
        Self::File,
        Self::Namespace,
        Self::Module,
        Self::Class,
        Self::Interface,
        Self::Enum,
        Self::TypeAlias,
        Self::Function,
        Self::Method,
        Self::PublicMethod,
        Self::PrivateMethod,
        Self::ProtectedMethod,
        Self::StaticMethod,
        Self::AbstractMethod,
        Self::Constructor,
        Self::Property,
        Self::PublicProperty,
        Self::PrivateProperty,
        Self::ProtectedProperty,
        Self::StaticProperty,
        Self::Variable,
        Self::Constant,
        Self::Section,
        Self::CodeBlock,
        Self::Paragraph,
        Self::BlockQuote,
        Self::ListItem,
        Self::Table,
        Self::Annotation,
        Self::Decorator,
        Self::Import,
        Self::Comment,
        Self::IndexBlock,
        Self::IndexSection,
        Self::IndexFile,
        Self::IndexSystem,
        Self::IndexFlow,
        Self::IndexLink,
        Self::IndexEntry,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Namespace => "namespace",
            Self::Module => "module",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::TypeAlias => "type_alias",
            Self::Function => "function",
            Self::Method => "method",
            Self::PublicMethod => "public_method",
            Self::PrivateMethod => "private_method",
            Self::ProtectedMethod => "protected_method",
            Self::StaticMethod => "static_method",
            Self::AbstractMethod => "abstract_method",
            Self::Constructor => "constructor",
            Self::Property => "property",
            Self::PublicProperty => "public_property",
            Self::PrivateProperty => "private_property",
            Self::ProtectedProperty => "protected_property",
            Self::StaticProperty => "static_property",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Section => "section",
            Self::CodeBlock => "code_block",
            Self::Paragraph => "paragraph",
            Self::BlockQuote => "block_quote",
            Self::ListItem => "list_item",
            Self::Table => "table",
            Self::Annotation => "annotation",
            Self::Decorator => "decorator",
            Self::Import => "import",
            Self::Comment => "comment",
            Self::IndexBlock => "index_block",
            Self::IndexSection => "index_section",
            Self::IndexFile => "index_file",
            Self::IndexSystem => "index_system",
            Self::IndexFlow => "index_flow",
            Self::IndexLink => "index_link",
            Self::IndexEntry => "index_entry",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.as_str() == value)
    }

    /// Pick the method variant for a set of modifiers.
    ///
    /// Precedence: static > abstract > private > protected > public > plain.
    #[must_use]
    pub fn method_for(modifiers: &[String]) -> Self {
        let has = |m: &str| modifiers.iter().any(|x| x == m);
        if has("static") {
            Self::StaticMethod
        } else if has("abstract") {
            Self::AbstractMethod
        } else if has("private") {
            Self::PrivateMethod
        } else if has("protected") {
            Self::ProtectedMethod
        } else if has("public") {
            Self::PublicMethod
        } else {
            Self::Method
        }
    }

    /// Pick the property variant for a set of modifiers (same precedence as methods).
    #[must_use]
    pub fn property_for(modifiers: &[String]) -> Self {
        let has = |m: &str| modifiers.iter().any(|x| x == m);
        if has("static") {
            Self::StaticProperty
        } else if has("private") {
            Self::PrivateProperty
        } else if has("protected") {
            Self::ProtectedProperty
        } else if has("public") {
            Self::PublicProperty
        } else {
            Self::Property
        }
    }

    #[must_use]
    pub const fn is_callable(self) -> bool {
        matches!(
            self,
            Self::Function
                | Self::Method
                | Self::PublicMethod
                | Self::PrivateMethod
                | Self::ProtectedMethod
                | Self::StaticMethod
                | Self::AbstractMethod
                | Self::Constructor
        )
    }

    #[must_use]
    pub const fn is_method(self) -> bool {
        self.is_callable() && !matches!(self, Self::Function)
    }

    #[must_use]
    pub const fn is_property(self) -> bool {
        matches!(
            self,
            Self::Property
                | Self::PublicProperty
                | Self::PrivateProperty
                | Self::ProtectedProperty
                | Self::StaticProperty
        )
    }

    /// Types other code can extend, implement or mention
    #[must_use]
    pub const fn is_type_like(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Interface | Self::Enum | Self::TypeAlias
        )
    }

    #[must_use]
    pub const fn is_narrative(self) -> bool {
        matches!(self, Self::Paragraph | Self::BlockQuote | Self::ListItem)
    }

    #[must_use]
    pub const fn is_index(self) -> bool {
        matches!(
            self,
            Self::IndexBlock
                | Self::IndexSection
                | Self::IndexFile
                | Self::IndexSystem
                | Self::IndexFlow
                | Self::IndexLink
                | Self::IndexEntry
        )
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function or method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_annotation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Parameter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_annotation: None,
            default_value: None,
        }
    }
}

/// One name bound by an import statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedName {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ImportedName {
    /// The local binding introduced by this import
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Kind-specific metadata. Which variant a parser fills is documented per parser module.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentDetails {
    #[default]
    None,
    Callable {
        #[serde(default)]
        parameters: Vec<Parameter>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_type: Option<String>,
        #[serde(default)]
        is_async: bool,
        #[serde(default)]
        is_generator: bool,
        /// Callee names seen in the body, in source order
        #[serde(default)]
        calls: Vec<String>,
    },
    Type {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        superclass: Option<String>,
        #[serde(default)]
        interfaces: Vec<String>,
        #[serde(default)]
        type_parameters: Vec<String>,
    },
    Variable {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_type: Option<String>,
        #[serde(default)]
        is_const: bool,
    },
    Section {
        level: u8,
        anchor: String,
    },
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        line_count: usize,
    },
    Import {
        specifier: String,
        #[serde(default)]
        imported_names: Vec<ImportedName>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_import: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace_import: Option<String>,
        #[serde(default)]
        is_type_only: bool,
        /// `export ... from` rather than `import`
        #[serde(default)]
        is_reexport: bool,
    },
    Narrative {
        #[serde(default)]
        references: Vec<String>,
        #[serde(default)]
        links: Vec<String>,
        #[serde(default)]
        markers: Vec<String>,
    },
    IndexEntry {
        tag: String,
        section: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tag: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<(usize, usize)>,
        #[serde(default)]
        fields: Vec<String>,
    },
}

/// Open attribute bag attached to every component
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub is_exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default)]
    pub details: ComponentDetails,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ComponentMetadata {
    pub fn with_details(details: ComponentDetails) -> Self {
        Self {
            details,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn modifiers(mut self, modifiers: Vec<String>) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn decorators(mut self, decorators: Vec<String>) -> Self {
        self.decorators = decorators;
        self
    }

    #[must_use]
    pub fn exported(mut self, exported_name: impl Into<String>) -> Self {
        self.is_exported = true;
        self.exported_name = Some(exported_name.into());
        self
    }

    #[must_use]
    pub fn documentation(mut self, doc: Option<String>) -> Self {
        self.documentation = doc.filter(|d| !d.trim().is_empty());
        self
    }

    #[must_use]
    pub fn extra(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

/// A structural unit discovered in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub language: Language,
    pub file_path: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub metadata: ComponentMetadata,
    pub code: String,
}

impl Component {
    /// Synthetic root component for a file
    #[must_use]
    pub fn file_root(file_path: &str, language: Language, content: &str) -> Self {
        let name = file_name(file_path);
        let line_count = content.lines().count().max(1);
        Self {
            id: generate_component_id(file_path, &name, ComponentType::File),
            name,
            component_type: ComponentType::File,
            language,
            file_path: file_path.to_string(),
            location: Location::lines(1, line_count),
            parent_id: None,
            metadata: ComponentMetadata::default(),
            code: content.to_string(),
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.component_type == ComponentType::File
    }

    /// Human-oriented signature (`name(a: T, b): R`) for callables, the name otherwise
    #[must_use]
    pub fn signature(&self) -> String {
        match &self.metadata.details {
            ComponentDetails::Callable {
                parameters,
                return_type,
                is_async,
                ..
            } => {
                let params = parameters
                    .iter()
                    .map(|p| match &p.type_annotation {
                        Some(ty) => format!("{}: {ty}", p.name),
                        None => p.name.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let prefix = if *is_async { "async " } else { "" };
                match return_type {
                    Some(ret) => format!("{prefix}{}({params}): {ret}", self.name),
                    None => format!("{prefix}{}({params})", self.name),
                }
            }
            ComponentDetails::Type {
                superclass,
                interfaces,
                ..
            } => {
                let mut sig = self.name.clone();
                if let Some(sup) = superclass {
                    sig.push_str(&format!(" extends {sup}"));
                }
                if !interfaces.is_empty() {
                    sig.push_str(&format!(" implements {}", interfaces.join(", ")));
                }
                sig
            }
            ComponentDetails::Variable {
                value_type: Some(ty),
                ..
            } => format!("{}: {ty}", self.name),
            ComponentDetails::Import { specifier, .. } => format!("{} <- {specifier}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// Last path segment of `file_path`
#[must_use]
pub fn file_name(file_path: &str) -> String {
    file_path
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(file_path)
        .to_string()
}

/// Directed edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Calls,
    ImportsFrom,
    Exports,
    ExportsFrom,
    Extends,
    Implements,
    Contains,
    References,
    Uses,
    Instantiates,
    Annotates,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 11] = [
        Self::Calls,
        Self::ImportsFrom,
        Self::Exports,
        Self::ExportsFrom,
        Self::Extends,
        Self::Implements,
        Self::Contains,
        Self::References,
        Self::Uses,
        Self::Instantiates,
        Self::Annotates,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calls => "CALLS",
            Self::ImportsFrom => "IMPORTS_FROM",
            Self::Exports => "EXPORTS",
            Self::ExportsFrom => "EXPORTS_FROM",
            Self::Extends => "EXTENDS",
            Self::Implements => "IMPLEMENTS",
            Self::Contains => "CONTAINS",
            Self::References => "REFERENCES",
            Self::Uses => "USES",
            Self::Instantiates => "INSTANTIATES",
            Self::Annotates => "ANNOTATES",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.trim().to_ascii_uppercase();
        Self::ALL.iter().copied().find(|ty| ty.as_str() == upper)
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of an edge: a known component or a specifier awaiting phase-two resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RelationshipTarget {
    Resolved(String),
    Pending(String),
}

impl RelationshipTarget {
    /// Key used for id generation and display. Pending targets carry a `pending:` prefix
    /// so they never collide with a component id.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Resolved(id) => id.clone(),
            Self::Pending(spec) => format!("pending:{spec}"),
        }
    }

    #[must_use]
    pub fn resolved_id(&self) -> Option<&str> {
        match self {
            Self::Resolved(id) => Some(id),
            Self::Pending(_) => None,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Provenance attached to an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 0.0..=1.0
    pub confidence: f32,
    #[serde(default)]
    pub needs_resolution: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imported_names: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for RelationshipMetadata {
    fn default() -> Self {
        Self {
            line: None,
            confidence: 1.0,
            needs_resolution: false,
            specifier: None,
            imported_names: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// A typed, directed edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub source_id: String,
    pub target: RelationshipTarget,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    #[serde(default)]
    pub metadata: RelationshipMetadata,
}

impl Relationship {
    /// Edge to a known component
    pub fn resolved(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self::new(
            source_id.into(),
            RelationshipTarget::Resolved(target_id.into()),
            relationship_type,
        )
    }

    /// Edge whose target is a placeholder; `needs_resolution` is set
    pub fn pending(
        source_id: impl Into<String>,
        specifier: impl Into<String>,
        relationship_type: RelationshipType,
    ) -> Self {
        let specifier = specifier.into();
        let mut rel = Self::new(
            source_id.into(),
            RelationshipTarget::Pending(specifier.clone()),
            relationship_type,
        );
        rel.metadata.needs_resolution = true;
        rel.metadata.specifier = Some(specifier);
        rel
    }

    fn new(source_id: String, target: RelationshipTarget, relationship_type: RelationshipType) -> Self {
        let id = generate_relationship_id(&source_id, &target.key(), relationship_type);
        Self {
            id,
            source_id,
            target,
            relationship_type,
            metadata: RelationshipMetadata::default(),
        }
    }

    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.metadata.line = Some(line);
        self
    }

    #[must_use]
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.metadata.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn imported_names(mut self, names: Vec<String>) -> Self {
        self.metadata.imported_names = names;
        self
    }

    /// Phase-two transition: rewrite a pending target to a concrete component id.
    ///
    /// The id is recomputed from the new target, so an edge resolved here dedupes against
    /// the same edge discovered directly elsewhere. The specifier stays in metadata.
    pub fn resolve_to(&mut self, target_id: impl Into<String>) {
        self.target = RelationshipTarget::Resolved(target_id.into());
        self.id = generate_relationship_id(&self.source_id, &self.target.key(), self.relationship_type);
        self.metadata.needs_resolution = false;
    }

    /// Key of the target (component id, or `pending:<specifier>`)
    #[must_use]
    pub fn target_key(&self) -> String {
        self.target.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_ids_are_deterministic() {
        let a = generate_component_id("src/a.ts", "load", ComponentType::Function);
        let b = generate_component_id("src/a.ts", "load", ComponentType::Function);
        assert_eq!(a, b);
        assert_eq!(a, "src/a.ts::function::load");
        assert_ne!(
            a,
            generate_component_id("src/a.ts", "load", ComponentType::Method)
        );
    }

    #[test]
    fn relationship_ids_depend_on_all_inputs() {
        let base = generate_relationship_id("a", "b", RelationshipType::Calls);
        assert_eq!(base, generate_relationship_id("a", "b", RelationshipType::Calls));
        assert_ne!(base, generate_relationship_id("b", "a", RelationshipType::Calls));
        assert_ne!(base, generate_relationship_id("a", "b", RelationshipType::Uses));
        assert!(base.starts_with("rel_"));
        assert_eq!(base.len(), 4 + 16);
    }

    #[test]
    fn pending_and_resolved_targets_never_share_ids() {
        let resolved = Relationship::resolved("a", "./x", RelationshipType::ImportsFrom);
        let pending = Relationship::pending("a", "./x", RelationshipType::ImportsFrom);
        assert_ne!(resolved.id, pending.id);
        assert!(pending.metadata.needs_resolution);
        assert_eq!(pending.metadata.specifier.as_deref(), Some("./x"));
    }

    #[test]
    fn resolve_to_clears_needs_resolution() {
        let mut rel = Relationship::pending("a", "./x", RelationshipType::ImportsFrom);
        rel.resolve_to("src/x.ts::file::x.ts");
        assert_eq!(rel.target.resolved_id(), Some("src/x.ts::file::x.ts"));
        assert!(!rel.metadata.needs_resolution);
        assert_eq!(rel.metadata.specifier.as_deref(), Some("./x"));
        assert_eq!(
            rel.id,
            Relationship::resolved("a", "src/x.ts::file::x.ts", RelationshipType::ImportsFrom).id
        );
    }

    #[test]
    fn method_variant_precedence() {
        let mods = |m: &[&str]| m.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            ComponentType::method_for(&mods(&["public", "static"])),
            ComponentType::StaticMethod
        );
        assert_eq!(
            ComponentType::method_for(&mods(&["abstract", "protected"])),
            ComponentType::AbstractMethod
        );
        assert_eq!(
            ComponentType::method_for(&mods(&["private"])),
            ComponentType::PrivateMethod
        );
        assert_eq!(ComponentType::method_for(&[]), ComponentType::Method);
        assert_eq!(
            ComponentType::property_for(&mods(&["readonly", "protected"])),
            ComponentType::ProtectedProperty
        );
    }

    #[test]
    fn component_type_names_round_trip() {
        for ty in ComponentType::ALL {
            assert_eq!(ComponentType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(RelationshipType::parse("imports_from"), Some(RelationshipType::ImportsFrom));
    }

    #[test]
    fn location_shift_and_containment() {
        let loc = Location::lines(3, 7);
        assert_eq!(loc.shifted(9), Location::lines(12, 16));
        assert_eq!(loc.line_count(), 5);
        assert!(loc.contains_line(7));
        assert!(!loc.contains_line(8));
        assert!(Location::lines(1, 10).encloses(&loc));
    }

    #[test]
    fn callable_signature_renders_parameters() {
        let mut component = Component::file_root("a.ts", Language::TypeScript, "");
        component.name = "load".to_string();
        component.metadata.details = ComponentDetails::Callable {
            parameters: vec![Parameter {
                name: "path".to_string(),
                type_annotation: Some("string".to_string()),
                default_value: None,
            }],
            return_type: Some("Promise<void>".to_string()),
            is_async: true,
            is_generator: false,
            calls: Vec::new(),
        };
        assert_eq!(component.signature(), "async load(path: string): Promise<void>");
    }

    #[test]
    fn file_name_handles_separators() {
        assert_eq!(file_name("src/app/main.ts"), "main.ts");
        assert_eq!(file_name("C:\\repo\\x.py"), "x.py");
        assert_eq!(file_name("plain.rs"), "plain.rs");
    }
}
