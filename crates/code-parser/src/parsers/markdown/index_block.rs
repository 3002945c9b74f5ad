//! The index micro-language embedded in documentation fences.
//!
//! ```text
//! # FILES
//! F1:src/store.ts|persistence layer|
//! # SYSTEMS
//! S1:Store|caches records|core
//! S1>F1@10-42:implementation
//! ```
//!
//! Sections start with `# NAME`. Entry lines are `ID:NAME|description|extra...`; reference
//! lines are `ID>range:description` where `range` is a target id or `fileId@start-end`.

use crate::types::ComponentType;
use once_cell::sync::Lazy;
use regex::Regex;

static ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{1,4}\d+):([^|]*)(?:\|(.*))?$").expect("valid index entry regex")
});
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{1,4}\d+)>([A-Z]{1,4}\d+)(?:@(\d+)-(\d+))?(?::(.*))?$")
        .expect("valid index reference regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntryLine {
    pub tag: String,
    pub name: String,
    pub description: Option<String>,
    /// Pipe-separated fields after the description
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReferenceLine {
    /// Tag of the entry this line belongs to
    pub tag: String,
    pub target: String,
    pub range: Option<(usize, usize)>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLine {
    Entry(IndexEntryLine),
    Reference(IndexReferenceLine),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexItem {
    /// 1-based host-file line
    pub line: usize,
    pub text: String,
    pub parsed: IndexLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSection {
    /// Header name; empty for lines that precede the first header
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub items: Vec<IndexItem>,
}

impl IndexSection {
    /// Component type for the entries of this section
    #[must_use]
    pub fn entry_type(&self) -> ComponentType {
        match self.name.to_ascii_uppercase().as_str() {
            "FILES" | "FILE_PATHS" => ComponentType::IndexFile,
            "SYSTEMS" | "COMPONENTS" => ComponentType::IndexSystem,
            "FLOWS" => ComponentType::IndexFlow,
            "LINKS" | "REFERENCES" => ComponentType::IndexLink,
            _ => ComponentType::IndexEntry,
        }
    }
}

/// Parsed index block with the lines that matched neither grammar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexBlock {
    pub sections: Vec<IndexSection>,
    pub malformed: Vec<(usize, String)>,
}

impl IndexBlock {
    /// Parse the body lines of an index fence. `first_line` is the host line of `lines[0]`.
    pub fn parse(lines: &[&str], first_line: usize) -> Self {
        let mut block = IndexBlock::default();
        for (offset, raw) in lines.iter().enumerate() {
            let line_no = first_line + offset;
            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if let Some(header) = line.strip_prefix('#') {
                let name = header.trim_start_matches('#').trim();
                block.sections.push(IndexSection {
                    name: name.to_string(),
                    start_line: line_no,
                    end_line: line_no,
                    items: Vec::new(),
                });
                continue;
            }
            let Some(parsed) = parse_line(line) else {
                block.malformed.push((line_no, line.to_string()));
                continue;
            };
            if block.sections.is_empty() {
                block.sections.push(IndexSection {
                    name: String::new(),
                    start_line: line_no,
                    end_line: line_no,
                    items: Vec::new(),
                });
            }
            if let Some(section) = block.sections.last_mut() {
                section.end_line = line_no;
                section.items.push(IndexItem {
                    line: line_no,
                    text: line.to_string(),
                    parsed,
                });
            }
        }
        block
    }
}

/// One entry or reference line
pub fn parse_line(line: &str) -> Option<IndexLine> {
    if let Some(caps) = REFERENCE.captures(line) {
        let range = match (caps.get(3), caps.get(4)) {
            (Some(start), Some(end)) => {
                let start = start.as_str().parse().ok()?;
                let end = end.as_str().parse().ok()?;
                Some((start, end))
            }
            _ => None,
        };
        return Some(IndexLine::Reference(IndexReferenceLine {
            tag: caps[1].to_string(),
            target: caps[2].to_string(),
            range,
            description: non_empty(caps.get(5).map(|m| m.as_str())),
        }));
    }

    let caps = ENTRY.captures(line)?;
    let name = caps[2].trim().to_string();
    let mut rest = caps
        .get(3)
        .map(|m| m.as_str().split('|').map(str::trim).collect::<Vec<_>>())
        .unwrap_or_default();
    // A trailing `|` closes the line rather than opening an empty field
    if rest.last().is_some_and(|f| f.is_empty()) {
        rest.pop();
    }
    let description = non_empty(rest.first().copied());
    let fields = rest
        .iter()
        .skip(1)
        .filter(|f| !f.is_empty())
        .map(|f| (*f).to_string())
        .collect();
    Some(IndexLine::Entry(IndexEntryLine {
        tag: caps[1].to_string(),
        name: if name.is_empty() { caps[1].to_string() } else { name },
        description,
        fields,
    }))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
