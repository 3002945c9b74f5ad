//! # Context Code Parser
//!
//! Structural indexing of source files into a graph of components and relationships.
//!
//! ## Architecture
//!
//! ```text
//! (content, file_path)
//!     │
//!     ├──> Language detection (extension / fence tag)
//!     │
//!     ├──> Structural parser
//!     │    ├─> tree-sitter walk (TypeScript, JavaScript, Python, Java, Rust)
//!     │    └─> line scanner (Markdown + index blocks)
//!     │         └─> container/heading stack assigns parent ids
//!     │
//!     └──> Relationship passes over (components, content)
//!          ├─> containment, import/export, inheritance
//!          ├─> usage (calls, instantiations, type mentions)
//!          └─> references (annotations, documentation links, index ranges)
//! ```
//!
//! Cross-file edges are emitted as [`RelationshipTarget::Pending`] placeholders; resolving
//! them against other files is the caller's job.
//!
//! ## Example
//!
//! ```rust
//! use context_code_parser::{ComponentType, ParserRegistry};
//!
//! let registry = ParserRegistry::default();
//! let extraction = registry
//!     .parse_file("export function greet(name: string) { return name; }\n", "src/greet.ts")
//!     .unwrap();
//!
//! let greet = extraction
//!     .components
//!     .iter()
//!     .find(|c| c.component_type == ComponentType::Function)
//!     .unwrap();
//! assert!(greet.metadata.is_exported);
//! ```

mod config;
mod container;
mod contract;
mod error;
mod language;
pub mod parsers;
pub mod passes;
mod registry;
mod types;

pub use config::ParserConfig;
pub use container::{repair_hierarchy, ComponentBatch, ContainerStack};
pub use contract::{
    BlockParseMetadata, BlockParseOptions, BlockParseResult, CodeBlock, LanguageParser,
    ParseError, ParserCapabilities, ParsingLevel, Severity,
};
pub use error::{ParserError, Result};
pub use language::Language;
pub use parsers::{JavaParser, MarkdownParser, PythonParser, RustParser, TypeScriptParser};
pub use registry::{FileExtraction, ParserRegistry};
pub use types::{
    file_name, generate_component_id, generate_relationship_id, Component, ComponentDetails,
    ComponentMetadata, ComponentType, ImportedName, Location, Parameter, Relationship,
    RelationshipMetadata, RelationshipTarget, RelationshipType,
};
