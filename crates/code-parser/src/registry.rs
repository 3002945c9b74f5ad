//! Language → parser dispatch and the one-call file extraction entry point.

use crate::config::ParserConfig;
use crate::contract::{LanguageParser, ParseError};
use crate::error::{ParserError, Result};
use crate::language::Language;
use crate::parsers::{JavaParser, MarkdownParser, PythonParser, RustParser, TypeScriptParser};
use crate::types::{Component, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Everything one parse produces for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExtraction {
    pub file_path: String,
    pub language: Language,
    pub components: Vec<Component>,
    pub relationships: Vec<Relationship>,
    pub diagnostics: Vec<ParseError>,
}

impl FileExtraction {
    /// The synthetic file component
    #[must_use]
    pub fn root(&self) -> Option<&Component> {
        self.components.iter().find(|c| c.is_root())
    }
}

/// Code parser for a grammar-backed language (used for fenced code inside documents)
pub(crate) fn code_parser_for(
    language: Language,
    config: &ParserConfig,
) -> Option<Box<dyn LanguageParser>> {
    let config = config.clone();
    let parser: Box<dyn LanguageParser> = match language {
        Language::TypeScript => Box::new(TypeScriptParser::typescript().with_config(config)),
        Language::Tsx => Box::new(TypeScriptParser::tsx().with_config(config)),
        Language::JavaScript => Box::new(TypeScriptParser::javascript().with_config(config)),
        Language::Python => Box::new(PythonParser::new().with_config(config)),
        Language::Java => Box::new(JavaParser::new().with_config(config)),
        Language::Rust => Box::new(RustParser::new().with_config(config)),
        Language::Markdown | Language::Unknown => return None,
    };
    Some(parser)
}

/// Registered parsers, keyed by language
pub struct ParserRegistry {
    parsers: BTreeMap<Language, Arc<dyn LanguageParser>>,
}

impl ParserRegistry {
    /// Registry with every built-in parser sharing `config`
    pub fn new(config: ParserConfig) -> Result<Self> {
        config.validate().map_err(ParserError::invalid_config)?;
        Ok(Self::with_builtin(config))
    }

    fn with_builtin(config: ParserConfig) -> Self {
        let mut registry = Self {
            parsers: BTreeMap::new(),
        };
        for language in [
            Language::TypeScript,
            Language::Tsx,
            Language::JavaScript,
            Language::Python,
            Language::Java,
            Language::Rust,
        ] {
            if let Some(parser) = code_parser_for(language, &config) {
                registry.parsers.insert(language, Arc::from(parser));
            }
        }
        registry.register(Arc::new(MarkdownParser::new().with_config(config)));
        registry
    }

    /// Replace (or add) the parser for its language
    pub fn register(&mut self, parser: Arc<dyn LanguageParser>) {
        self.parsers.insert(parser.language(), parser);
    }

    #[must_use]
    pub fn get(&self, language: Language) -> Option<Arc<dyn LanguageParser>> {
        self.parsers.get(&language).cloned()
    }

    #[must_use]
    pub fn languages(&self) -> Vec<Language> {
        self.parsers.keys().copied().collect()
    }

    #[must_use]
    pub fn supports_path(&self, path: impl AsRef<Path>) -> bool {
        self.parsers.contains_key(&Language::from_path(path))
    }

    /// Components, relationships and diagnostics for one file.
    ///
    /// Fails only when no parser handles the file's extension.
    pub fn parse_file(&self, content: &str, file_path: &str) -> Result<FileExtraction> {
        let language = Language::from_path(file_path);
        let parser = self
            .get(language)
            .ok_or_else(|| ParserError::unsupported_language(file_path))?;

        let components = parser.detect_components(content, file_path);
        let relationships = parser.detect_relationships(&components, content);
        let diagnostics = parser.validate_syntax(content);
        log::debug!(
            "{file_path}: {} components, {} relationships, {} diagnostics via {}",
            components.len(),
            relationships.len(),
            diagnostics.len(),
            parser.backend()
        );

        Ok(FileExtraction {
            file_path: file_path.to_string(),
            language,
            components,
            relationships,
            diagnostics,
        })
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_builtin(ParserConfig::default())
    }
}
