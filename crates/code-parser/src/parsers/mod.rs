//! Concrete language parsers and the tree-sitter plumbing they share.

pub mod java;
pub mod markdown;
pub mod python;
pub mod rust;
pub mod typescript;

use crate::config::ParserConfig;
use crate::container::ComponentBatch;
use crate::contract::ParseError;
use crate::error::{ParserError, Result};
use crate::language::Language;
use crate::types::{Component, ComponentMetadata, ComponentType, Location};
use tree_sitter::Node;

pub use java::JavaParser;
pub use markdown::MarkdownParser;
pub use python::PythonParser;
pub use rust::RustParser;
pub use typescript::TypeScriptParser;

/// Run a tree-sitter walk over `content` and collect the resulting batch.
///
/// Any failure (oversized input, grammar error, walker error) degrades to the file root
/// alone so callers can always rely on one component per file.
pub(crate) fn extract_with_tree_sitter<F>(
    language: Language,
    config: &ParserConfig,
    content: &str,
    file_path: &str,
    walk: F,
) -> Vec<Component>
where
    F: FnOnce(Node<'_>, &mut ComponentBatch<'_>) -> Result<()>,
{
    let mut batch = ComponentBatch::new(file_path, language, content);

    if config.max_file_bytes > 0 && content.len() > config.max_file_bytes {
        let err = ParserError::ContentTooLarge {
            size: content.len(),
            limit: config.max_file_bytes,
        };
        log::warn!("{file_path}: {err}; keeping file component only");
        return batch.into_root_only();
    }

    let outcome = language.new_ts_parser().and_then(|mut parser| {
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ParserError::tree_sitter("Failed to parse source code"))?;
        walk(tree.root_node(), &mut batch)
    });

    match outcome {
        Ok(()) => {
            let components = batch.finish();
            log::debug!(
                "{file_path}: {} components ({})",
                components.len(),
                language.as_str()
            );
            components
        }
        Err(err) => {
            log::warn!("{file_path}: component extraction failed: {err}");
            batch.into_root_only()
        }
    }
}

/// Collect ERROR / MISSING nodes as diagnostics
pub(crate) fn tree_sitter_diagnostics(language: Language, content: &str) -> Vec<ParseError> {
    let mut parser = match language.new_ts_parser() {
        Ok(parser) => parser,
        Err(err) => return vec![ParseError::warning(err.to_string(), 1)],
    };
    let Some(tree) = parser.parse(content, None) else {
        return vec![ParseError::error("Failed to parse source code", 1)];
    };

    let mut diagnostics = Vec::new();
    let root = tree.root_node();
    if root.has_error() {
        collect_error_nodes(root, content, &mut diagnostics);
    }
    diagnostics
}

fn collect_error_nodes(node: Node<'_>, content: &str, out: &mut Vec<ParseError>) {
    if node.is_missing() {
        let pos = node.start_position();
        out.push(
            ParseError::error(format!("Missing '{}'", node.kind()), pos.row + 1)
                .at_column(pos.column + 1),
        );
        return;
    }
    if node.is_error() {
        let pos = node.start_position();
        let snippet: String = text(node, content).chars().take(40).collect();
        out.push(
            ParseError::error(format!("Unexpected syntax: {}", snippet.trim()), pos.row + 1)
                .at_column(pos.column + 1),
        );
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, content, out);
    }
}

/// Source text of a node
pub(crate) fn text<'s>(node: Node<'_>, content: &'s str) -> &'s str {
    node.utf8_text(content.as_bytes()).unwrap_or("")
}

/// Text of a named field, if present
pub(crate) fn field_text<'s>(node: Node<'_>, field: &str, content: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field)
        .map(|child| text(child, content))
        .filter(|s| !s.is_empty())
}

/// 1-based closed location of a node
pub(crate) fn location(node: Node<'_>) -> Location {
    let start = node.start_position();
    let end = node.end_position();
    Location::lines(start.row + 1, end.row + 1).with_columns(start.column + 1, end.column + 1)
}

/// Exact code of a node, clipped per config
pub(crate) fn code(node: Node<'_>, batch: &ComponentBatch<'_>, config: &ParserConfig) -> String {
    config.clip_code(batch.slice(node.start_byte(), node.end_byte()))
}

/// Anonymous keyword children (`static`, `async`, `public`, ...) of a node
pub(crate) fn keyword_children(node: Node<'_>, content: &str, keywords: &[&str]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter_map(|child| {
            let value = text(child, content);
            keywords.contains(&value).then(|| value.to_string())
        })
        .collect()
}

/// A doc comment found directly above a declaration
pub(crate) struct DocComment {
    pub text: String,
    pub location: Location,
}

/// Doc comment lines directly above a node (text scan; comments are not tree children
/// in every grammar)
pub(crate) fn leading_doc_comment(content: &str, node: Node<'_>, language: Language) -> Option<DocComment> {
    let node_start_line = node.start_position().row;
    let lines: Vec<&str> = content.lines().collect();
    if node_start_line == 0 || node_start_line > lines.len() {
        return None;
    }

    let mut doc_lines = Vec::new();
    let mut first_idx = node_start_line;
    let mut last_idx = None;
    let mut line_idx = node_start_line;
    while line_idx > 0 {
        line_idx -= 1;
        let line = lines[line_idx].trim();
        let is_doc = match language {
            Language::Rust => line.starts_with("///") || line.starts_with("//!"),
            Language::Python => line.starts_with('#'),
            Language::JavaScript | Language::TypeScript | Language::Tsx | Language::Java => {
                line.starts_with("/**")
                    || line.starts_with('*')
                    || line.starts_with("*/")
                    || line.starts_with("//")
            }
            _ => false,
        };
        // Decorators/annotations sit between a doc comment and its declaration
        let is_attribute = line.starts_with('@') || line.starts_with("#[");
        if is_doc {
            doc_lines.push(lines[line_idx]);
            first_idx = line_idx;
            last_idx.get_or_insert(line_idx);
        } else if is_attribute && doc_lines.is_empty() {
            continue;
        } else {
            break;
        }
    }

    let last_idx = last_idx?;
    doc_lines.reverse();
    Some(DocComment {
        text: doc_lines.join("\n"),
        location: Location::lines(first_idx + 1, last_idx + 1),
    })
}

/// Documentation for a declaration. With `include_comments` the comment also becomes a
/// `Comment` component under the current parent.
pub(crate) fn documentation(
    node: Node<'_>,
    batch: &mut ComponentBatch<'_>,
    config: &ParserConfig,
    language: Language,
) -> Option<String> {
    let doc = leading_doc_comment(batch.content(), node, language)?;
    if config.include_comments {
        let code = batch.lines_text(doc.location.start_line, doc.location.end_line);
        batch.add(
            ComponentType::Comment,
            &format!("doc@{}", doc.location.start_line),
            doc.location,
            code,
            ComponentMetadata::default(),
        );
    }
    Some(doc.text)
}

/// Names of callees inside `node`, in source order, without descending into nested
/// callables (they own their own calls)
pub(crate) fn collect_calls(
    node: Node<'_>,
    content: &str,
    is_call: &dyn Fn(Node<'_>) -> bool,
    callee_name: &dyn Fn(Node<'_>, &str) -> Option<String>,
    is_nested_scope: &dyn Fn(Node<'_>) -> bool,
) -> Vec<String> {
    let mut calls = Vec::new();
    let mut stack = vec![node];
    let mut ordered = Vec::new();
    while let Some(current) = stack.pop() {
        if current.id() != node.id() && is_nested_scope(current) {
            continue;
        }
        if is_call(current) {
            if let Some(name) = callee_name(current, content) {
                ordered.push((current.start_byte(), name));
            }
        }
        let mut cursor = current.walk();
        let children: Vec<_> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    ordered.sort_by_key(|(pos, _)| *pos);
    for (_, name) in ordered {
        if !calls.contains(&name) {
            calls.push(name);
        }
    }
    calls
}

/// Last identifier segment of a dotted/scoped name (`a.b.c` → `c`, `x::y` → `y`)
pub(crate) fn last_segment(name: &str) -> &str {
    let name = name.trim();
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit(['.', ':'])
        .find(|s| !s.is_empty())
        .unwrap_or(name)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_segment_strips_qualifiers_and_generics() {
        assert_eq!(last_segment("a.b.Base"), "Base");
        assert_eq!(last_segment("crate::store::Store"), "Store");
        assert_eq!(last_segment("List<String>"), "List");
        assert_eq!(last_segment("Plain"), "Plain");
    }

    #[test]
    fn diagnostics_report_errors() {
        let diagnostics = tree_sitter_diagnostics(Language::Python, "def broken(:\n    pass\n");
        assert!(!diagnostics.is_empty());
        assert!(diagnostics
            .iter()
            .all(|d| d.severity == crate::contract::Severity::Error));
    }

    #[test]
    fn clean_source_has_no_diagnostics() {
        let diagnostics = tree_sitter_diagnostics(Language::Rust, "fn main() {}\n");
        assert!(diagnostics.is_empty());
    }
}
