//! Markdown.
//!
//! A line scanner, no grammar. Metadata populated:
//! - headings: `Section { level, anchor }`; sections span up to the next heading of the same
//!   or a higher level and are nested by a heading stack
//! - fenced code: `CodeBlock { language, line_count }`; bodies in a language with a code
//!   parser are parsed in place and their components hang under the block
//! - paragraphs, quotes, list items: `Narrative { references, links, markers }`, emitted only
//!   when one of those lists is non-empty. Index tags count as references when bare with a
//!   one-letter prefix (`S12`) or bracketed with up to four letters (`[SEC4]`)
//! - tables: always emitted, named after their header row
//! - index fences (`codeindex`, `aiccl-index` by default): `IndexBlock` → `IndexSection` →
//!   entries carrying `IndexEntry { tag, section, .. }`; see [`index_block`]

pub mod index_block;

use crate::config::ParserConfig;
use crate::container::ComponentBatch;
use crate::contract::{
    BlockParseOptions, CodeBlock, LanguageParser, ParseError, ParserCapabilities, ParsingLevel,
};
use crate::error::ParserError;
use crate::language::Language;
use crate::passes;
use crate::registry;
use crate::types::{
    Component, ComponentDetails, ComponentMetadata, ComponentType, Location, Relationship,
};
use index_block::{IndexBlock, IndexLine};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$").expect("valid heading regex")
});
static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})[ \t]*([^`\s]*)").expect("valid fence regex"));
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+").expect("valid list regex"));
static TABLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\|?\s*:?-{2,}:?\s*(?:\|\s*:?-{2,}:?\s*)*\|?\s*$").expect("valid table regex")
});
static INDEX_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([A-Z]{1,4}\d+)\]|\b([A-Z][1-9]\d{0,3})\b").expect("valid reference regex")
});
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)[^)]*\)").expect("valid link regex"));
static CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("valid code span regex"));
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][\w.:]*$").expect("valid identifier regex"));

const NAME_CHARS: usize = 60;

/// Parser for Markdown documents
pub struct MarkdownParser {
    config: ParserConfig,
    parse_embedded_code: bool,
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
            parse_embedded_code: true,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Toggle parsing of fenced code in supported languages
    #[must_use]
    pub fn with_embedded_code(mut self, enabled: bool) -> Self {
        self.parse_embedded_code = enabled;
        self
    }

    fn is_index_tag(&self, tag: &str) -> bool {
        self.config.is_index_tag(tag)
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind of a scanned block
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Heading { level: u8, text: String },
    Fence { info: String, closed: bool },
    Quote,
    ListItem,
    Table,
    Paragraph,
}

/// A block with its closed 1-based line range
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block {
    pub kind: BlockKind,
    pub start: usize,
    pub end: usize,
}

/// Split a document into blocks. Blank lines separate blocks and belong to none.
pub(crate) fn scan_blocks(lines: &[&str]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let line_no = i + 1;

        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        if let Some(caps) = FENCE.captures(line) {
            let marker = &caps[1];
            let fence_char = marker.chars().next().unwrap_or('`');
            let close = lines[i + 1..].iter().position(|l| {
                let t = l.trim();
                t.len() >= marker.len() && t.chars().all(|c| c == fence_char)
            });
            let (end, closed) = match close {
                Some(pos) => (i + 1 + pos, true),
                None => (lines.len() - 1, false),
            };
            blocks.push(Block {
                kind: BlockKind::Fence {
                    info: caps[2].to_string(),
                    closed,
                },
                start: line_no,
                end: end + 1,
            });
            i = end + 1;
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            blocks.push(Block {
                kind: BlockKind::Heading {
                    level: caps[1].len() as u8,
                    text: caps.get(2).map(|m| m.as_str().trim()).unwrap_or("").to_string(),
                },
                start: line_no,
                end: line_no,
            });
            i += 1;
            continue;
        }

        if line.trim_start().starts_with('>') {
            let end = extend_while(lines, i, |l| l.trim_start().starts_with('>'));
            blocks.push(Block {
                kind: BlockKind::Quote,
                start: line_no,
                end: end + 1,
            });
            i = end + 1;
            continue;
        }

        if line.trim_start().starts_with('|')
            && lines.get(i + 1).is_some_and(|l| TABLE_SEPARATOR.is_match(l))
        {
            let end = extend_while(lines, i, |l| l.contains('|') && !l.trim().is_empty());
            blocks.push(Block {
                kind: BlockKind::Table,
                start: line_no,
                end: end + 1,
            });
            i = end + 1;
            continue;
        }

        if LIST_ITEM.is_match(line) {
            // Continuation lines are indented and do not start another item
            let end = extend_while(lines, i, |l| {
                !l.trim().is_empty()
                    && l.starts_with(char::is_whitespace)
                    && !LIST_ITEM.is_match(l)
            });
            blocks.push(Block {
                kind: BlockKind::ListItem,
                start: line_no,
                end: end + 1,
            });
            i = end + 1;
            continue;
        }

        let end = extend_while(lines, i, |l| {
            !l.trim().is_empty()
                && !HEADING.is_match(l)
                && !FENCE.is_match(l)
                && !LIST_ITEM.is_match(l)
                && !l.trim_start().starts_with('>')
        });
        blocks.push(Block {
            kind: BlockKind::Paragraph,
            start: line_no,
            end: end + 1,
        });
        i = end + 1;
    }
    blocks
}

/// Last index `j >= start` such that every line in `start+1..=j` satisfies `pred`
fn extend_while(lines: &[&str], start: usize, pred: impl Fn(&str) -> bool) -> usize {
    let mut end = start;
    while end + 1 < lines.len() && pred(lines[end + 1]) {
        end += 1;
    }
    end
}

/// GitHub-style heading anchor
pub fn anchor(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() {
            out.push('-');
        }
    }
    out
}

fn summary(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= NAME_CHARS {
        return collapsed;
    }
    let mut name: String = collapsed.chars().take(NAME_CHARS).collect();
    name.push_str("...");
    name
}

/// Signals that make a prose element worth a component
fn narrative_signals(text: &str, markers: &[String]) -> ComponentDetails {
    let mut references = Vec::new();
    let mut links = Vec::new();
    let mut found_markers = Vec::new();

    let without_code = CODE_SPAN.replace_all(text, " ");
    for caps in LINK.captures_iter(&without_code) {
        let target = caps[2].to_string();
        if !links.contains(&target) {
            links.push(target);
        }
    }
    let plain = LINK.replace_all(&without_code, "$1");
    for caps in INDEX_REF.captures_iter(&plain) {
        let Some(tag) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let tag = tag.as_str().to_string();
        if !references.contains(&tag) {
            references.push(tag);
        }
    }
    for caps in CODE_SPAN.captures_iter(text) {
        let span = caps[1].trim().trim_end_matches("()");
        if IDENTIFIER.is_match(span) {
            let name = span.rsplit(['.', ':']).next().unwrap_or(span).to_string();
            if !name.is_empty() && !references.contains(&name) {
                references.push(name);
            }
        }
    }
    for marker in markers {
        let hit = if marker.chars().all(|c| c.is_ascii_alphanumeric()) {
            plain
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|word| word == marker)
        } else {
            plain.contains(marker.as_str())
        };
        if hit {
            found_markers.push(marker.clone());
        }
    }

    ComponentDetails::Narrative {
        references,
        links,
        markers: found_markers,
    }
}

fn has_signal(details: &ComponentDetails) -> bool {
    matches!(details, ComponentDetails::Narrative { references, links, markers }
        if !references.is_empty() || !links.is_empty() || !markers.is_empty())
}

impl LanguageParser for MarkdownParser {
    fn language(&self) -> Language {
        Language::Markdown
    }

    fn backend(&self) -> &'static str {
        "markdown-scanner"
    }

    fn parsing_level(&self) -> ParsingLevel {
        ParsingLevel::Basic
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
        let mut batch = ComponentBatch::new(file_path, Language::Markdown, content);
        if self.config.max_file_bytes > 0 && content.len() > self.config.max_file_bytes {
            let err = ParserError::ContentTooLarge {
                size: content.len(),
                limit: self.config.max_file_bytes,
            };
            log::warn!("{file_path}: {err}; keeping file component only");
            return batch.into_root_only();
        }

        let lines: Vec<&str> = content.lines().collect();
        let blocks = scan_blocks(&lines);
        let mut headings: Vec<u8> = Vec::new();

        for (idx, block) in blocks.iter().enumerate() {
            match &block.kind {
                BlockKind::Heading { level, text } => {
                    while headings.last().is_some_and(|top| top >= level) {
                        headings.pop();
                        batch.stack.pop();
                    }
                    let end = section_end(&blocks, idx, *level, block.start);
                    let name = if text.is_empty() { "untitled" } else { text.as_str() };
                    let details = ComponentDetails::Section {
                        level: *level,
                        anchor: anchor(text),
                    };
                    let code = batch.lines_text(block.start, end);
                    let id = batch.add(
                        ComponentType::Section,
                        name,
                        Location::lines(block.start, end),
                        code,
                        ComponentMetadata::with_details(details),
                    );
                    headings.push(*level);
                    batch.stack.push(id);
                }
                BlockKind::Fence { info, closed } => {
                    self.fence(&mut batch, &lines, block, info, *closed);
                }
                BlockKind::Table => {
                    let header = lines[block.start - 1]
                        .trim()
                        .trim_matches('|')
                        .split('|')
                        .map(str::trim)
                        .collect::<Vec<_>>()
                        .join(", ");
                    let code = batch.lines_text(block.start, block.end);
                    batch.add(
                        ComponentType::Table,
                        &summary(&header),
                        Location::lines(block.start, block.end),
                        code,
                        ComponentMetadata::default().extra("rows", block.end - block.start - 1),
                    );
                }
                BlockKind::Quote | BlockKind::ListItem | BlockKind::Paragraph => {
                    let code = batch.lines_text(block.start, block.end);
                    let details = narrative_signals(&code, &self.config.narrative_markers);
                    if !has_signal(&details) {
                        continue;
                    }
                    let (component_type, stripped) = match block.kind {
                        BlockKind::Quote => (
                            ComponentType::BlockQuote,
                            code.lines()
                                .map(|l| l.trim_start().trim_start_matches('>'))
                                .collect::<Vec<_>>()
                                .join(" "),
                        ),
                        BlockKind::ListItem => (
                            ComponentType::ListItem,
                            LIST_ITEM.replace(&code, "").into_owned(),
                        ),
                        _ => (ComponentType::Paragraph, code.clone()),
                    };
                    batch.add(
                        component_type,
                        &summary(&stripped),
                        Location::lines(block.start, block.end),
                        code,
                        ComponentMetadata::with_details(details),
                    );
                }
            }
        }

        let components = batch.finish();
        log::debug!("{file_path}: {} components (markdown)", components.len());
        components
    }

    fn detect_relationships(&self, components: &[Component], content: &str) -> Vec<Relationship> {
        passes::run_standard_passes(components, content)
    }

    fn validate_syntax(&self, content: &str) -> Vec<ParseError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut diagnostics = Vec::new();
        let mut previous_level: Option<u8> = None;

        for block in scan_blocks(&lines) {
            match &block.kind {
                BlockKind::Fence { closed: false, .. } => {
                    diagnostics.push(ParseError::error("Unclosed code fence", block.start));
                }
                BlockKind::Fence { info, closed: true } if self.is_index_tag(info) => {
                    let body = &lines[block.start..block.end - 1];
                    for (line, text) in IndexBlock::parse(body, block.start + 1).malformed {
                        diagnostics.push(ParseError::warning(
                            format!("Malformed index line: {text}"),
                            line,
                        ));
                    }
                }
                BlockKind::Heading { level, .. } => {
                    if let Some(prev) = previous_level {
                        if *level > prev + 1 {
                            diagnostics.push(ParseError::warning(
                                format!("Heading level jumps from {prev} to {level}"),
                                block.start,
                            ));
                        }
                    }
                    previous_level = Some(*level);
                }
                _ => {}
            }
        }
        diagnostics
    }
}

/// Last line of the section opened by `blocks[idx]`
fn section_end(blocks: &[Block], idx: usize, level: u8, start: usize) -> usize {
    let mut end = start;
    for block in &blocks[idx + 1..] {
        if let BlockKind::Heading { level: next, .. } = block.kind {
            if next <= level {
                break;
            }
        }
        end = block.end;
    }
    end
}

impl MarkdownParser {
    fn fence(
        &self,
        batch: &mut ComponentBatch<'_>,
        lines: &[&str],
        block: &Block,
        info: &str,
        closed: bool,
    ) {
        // Body lines exclude the fences
        let body_start = block.start + 1;
        let body_end = if closed { block.end - 1 } else { block.end };
        let body: &[&str] = if body_end >= body_start {
            &lines[body_start - 1..body_end]
        } else {
            &[]
        };
        let code = batch.lines_text(block.start, block.end);
        let location = Location::lines(block.start, block.end);
        let details = ComponentDetails::CodeBlock {
            language: (!info.is_empty()).then(|| info.to_string()),
            line_count: body.len(),
        };

        if self.is_index_tag(info) {
            let id = batch.add(
                ComponentType::IndexBlock,
                info,
                location,
                code,
                ComponentMetadata::with_details(details),
            );
            self.index_block(batch, &id, body, body_start);
            return;
        }

        let name = if info.is_empty() { "code" } else { info };
        let id = batch.add(
            ComponentType::CodeBlock,
            name,
            location,
            code,
            ComponentMetadata::with_details(details),
        );

        let language = Language::from_tag(info);
        if !self.parse_embedded_code || body.is_empty() || !language.supports_ast() {
            return;
        }
        let Some(parser) = registry::code_parser_for(language, &self.config) else {
            return;
        };
        let mut embedded = CodeBlock::new(body.join("\n"), body_start);
        embedded.language = Some(language);
        let result = parser.parse_code_block(
            &embedded,
            batch.content(),
            batch.file_path(),
            &BlockParseOptions {
                parent_id: Some(id),
                include_file_root: false,
            },
        );
        log::trace!(
            "{}: embedded {} block at line {} yielded {} components",
            batch.file_path(),
            language,
            block.start,
            result.components.len()
        );
        batch.adopt(result.components);
    }

    fn index_block(&self, batch: &mut ComponentBatch<'_>, block_id: &str, body: &[&str], first_line: usize) {
        let parsed = IndexBlock::parse(body, first_line);
        for (line, text) in &parsed.malformed {
            log::debug!("{}:{line}: skipping malformed index line '{text}'", batch.file_path());
        }

        for section in &parsed.sections {
            let section_name = if section.name.is_empty() {
                "MAIN"
            } else {
                section.name.as_str()
            };
            let code = batch.lines_text(section.start_line, section.end_line);
            let section_id = batch.add_with_parent(
                ComponentType::IndexSection,
                section_name,
                Location::lines(section.start_line, section.end_line),
                code,
                ComponentMetadata::default(),
                block_id.to_string(),
            );

            // tag → entry component id within this section
            let mut entries: Vec<(String, String)> = Vec::new();
            for item in &section.items {
                let code = batch.lines_text(item.line, item.line);
                let location = Location::lines(item.line, item.line);
                match &item.parsed {
                    IndexLine::Entry(entry) => {
                        let details = ComponentDetails::IndexEntry {
                            tag: entry.tag.clone(),
                            section: section_name.to_string(),
                            description: entry.description.clone(),
                            parent_tag: None,
                            target: None,
                            range: None,
                            fields: entry.fields.clone(),
                        };
                        let id = batch.add_with_parent(
                            section.entry_type(),
                            &entry.name,
                            location,
                            code,
                            ComponentMetadata::with_details(details),
                            section_id.clone(),
                        );
                        entries.push((entry.tag.clone(), id));
                    }
                    IndexLine::Reference(reference) => {
                        let parent = entries
                            .iter()
                            .rev()
                            .find(|(tag, _)| *tag == reference.tag)
                            .map(|(_, id)| id.clone())
                            .or_else(|| {
                                batch.find_where(|c| {
                                    matches!(&c.metadata.details,
                                        ComponentDetails::IndexEntry { tag, target: None, .. }
                                            if *tag == reference.tag)
                                })
                            })
                            .unwrap_or_else(|| section_id.clone());
                        let details = ComponentDetails::IndexEntry {
                            tag: reference.tag.clone(),
                            section: section_name.to_string(),
                            description: reference.description.clone(),
                            parent_tag: Some(reference.tag.clone()),
                            target: Some(reference.target.clone()),
                            range: reference.range,
                            fields: Vec::new(),
                        };
                        let name = match reference.range {
                            Some((start, end)) => {
                                format!("{}>{}@{start}-{end}", reference.tag, reference.target)
                            }
                            None => format!("{}>{}", reference.tag, reference.target),
                        };
                        batch.add_with_parent(
                            ComponentType::IndexLink,
                            &name,
                            location,
                            code,
                            ComponentMetadata::with_details(details),
                            parent,
                        );
                    }
                }
            }
        }
    }
}
