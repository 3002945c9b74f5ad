//! Capability interface every language parser implements.

use crate::language::Language;
use crate::types::{Component, Relationship};
use serde::{Deserialize, Serialize};

/// Diagnostic severity. Only affects how callers surface a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Syntax diagnostic produced by [`LanguageParser::validate_syntax`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub severity: Severity,
}

impl ParseError {
    pub fn error(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column: None,
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column: None,
            severity: Severity::Warning,
        }
    }

    #[must_use]
    pub fn at_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

/// How deep a backend goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingLevel {
    /// Line scanning without a grammar
    Basic,
    /// Full syntax tree
    Structural,
}

/// What a parser backend can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserCapabilities {
    pub symbols: bool,
    pub relationships: bool,
    pub ranges: bool,
    pub types: bool,
    pub control_flow: bool,
    pub incremental: bool,
}

/// An isolated slice of a larger file (e.g. a fenced snippet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    pub content: String,
    /// 1-based line of the block's first content line in the host file
    pub start_line: usize,
    pub end_line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl CodeBlock {
    pub fn new(content: impl Into<String>, start_line: usize) -> Self {
        let content = content.into();
        let lines = content.lines().count().max(1);
        Self {
            content,
            start_line: start_line.max(1),
            end_line: start_line.max(1) + lines - 1,
            language: None,
        }
    }

    /// Lines to add to block-relative locations
    #[must_use]
    pub const fn line_offset(&self) -> usize {
        self.start_line.saturating_sub(1)
    }
}

/// Options for [`LanguageParser::parse_code_block`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockParseOptions {
    /// Parent for the block's top-level components (defaults to the host file root)
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Keep the synthetic file component produced for the block
    #[serde(default)]
    pub include_file_root: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockParseMetadata {
    pub parsing_level: ParsingLevel,
    pub backend: String,
    pub capabilities: ParserCapabilities,
    pub line_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockParseResult {
    pub components: Vec<Component>,
    pub relationships: Vec<Relationship>,
    pub metadata: BlockParseMetadata,
}

/// The four operations every language parser exposes.
///
/// Implementations are stateless and `Send + Sync`; a parse call takes only its inputs and
/// returns fresh data, so the orchestrator may run any number of them concurrently.
pub trait LanguageParser: Send + Sync {
    fn language(&self) -> Language;

    /// Backend identifier (`tree-sitter-typescript`, `markdown-scanner`, ...)
    fn backend(&self) -> &'static str;

    fn parsing_level(&self) -> ParsingLevel;

    fn capabilities(&self) -> ParserCapabilities;

    /// Components of a file. Never fails: on internal error the list still holds the file
    /// root component.
    fn detect_components(&self, content: &str, file_path: &str) -> Vec<Component>;

    /// Edges among `components`. Pure function of its inputs; a failing pass keeps what
    /// was extracted before it.
    fn detect_relationships(&self, components: &[Component], content: &str) -> Vec<Relationship>;

    /// Diagnostics only; never blocks extraction.
    fn validate_syntax(&self, content: &str) -> Vec<ParseError>;

    /// Parse an isolated block and rewrite every location to host-file line numbers.
    fn parse_code_block(
        &self,
        block: &CodeBlock,
        full_content: &str,
        file_path: &str,
        options: &BlockParseOptions,
    ) -> BlockParseResult {
        let offset = block.line_offset();
        let mut components = self.detect_components(&block.content, file_path);
        let block_root = components
            .iter()
            .find(|c| c.is_root())
            .map(|c| c.id.clone());

        for component in &mut components {
            component.location = component.location.shifted(offset);
        }

        if !options.include_file_root {
            components.retain(|c| !c.is_root());
            if let (Some(root), Some(parent)) = (&block_root, &options.parent_id) {
                for component in &mut components {
                    if component.parent_id.as_deref() == Some(root.as_str()) {
                        component.parent_id = Some(parent.clone());
                    }
                }
            }
        }

        let relationships = self.detect_relationships(&components, full_content);

        log::debug!(
            "parsed block {}:{}-{} ({} components, {} relationships)",
            file_path,
            block.start_line,
            block.end_line,
            components.len(),
            relationships.len()
        );

        BlockParseResult {
            components,
            relationships,
            metadata: BlockParseMetadata {
                parsing_level: self.parsing_level(),
                backend: self.backend().to_string(),
                capabilities: self.capabilities(),
                line_offset: offset,
            },
        }
    }
}
