use super::vocab::{CompressionMap, Expansion};
use super::{is_word_char, parse_percent, split_once_unescaped, split_unescaped, SECTIONS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static FILE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^F\d+$").expect("valid file id regex"));
static SYSTEM_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^S\d+$").expect("valid system id regex"));
static RULE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^R\d+$").expect("valid rule id regex"));
static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)-(\d+)$").expect("valid line range regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedFile {
    pub id: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedSystem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<(usize, usize)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(default)]
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedRelationship {
    /// `S<n>` or `?<specifier>`
    pub source_ref: String,
    pub target_ref: String,
    /// System name, or the raw specifier for pending refs
    pub source: String,
    pub target: String,
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedRule {
    pub id: String,
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedFlow {
    pub name: String,
    /// Step system names (raw text for unknown refs)
    pub steps: Vec<String>,
}

/// Structured re-expansion of an AICCL document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedDocument {
    pub files: Vec<ExpandedFile>,
    pub mappings: CompressionMap,
    pub systems: Vec<ExpandedSystem>,
    pub relationships: Vec<ExpandedRelationship>,
    pub rules: Vec<ExpandedRule>,
    pub flows: Vec<ExpandedFlow>,
    /// Skipped lines and unknown references
    pub warnings: Vec<String>,
}

impl ExpandedDocument {
    pub fn system(&self, id: &str) -> Option<&ExpandedSystem> {
        self.systems.iter().find(|s| s.id == id)
    }

    pub fn system_named(&self, name: &str) -> Option<&ExpandedSystem> {
        self.systems.iter().find(|s| s.name == name)
    }
}

/// Decode with default settings
pub fn decode(text: &str) -> ExpandedDocument {
    AicclDecoder.decode(text)
}

/// AICCL reader. Never fails: malformed lines are skipped with a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct AicclDecoder;

struct Line<'t> {
    number: usize,
    text: &'t str,
}

impl AicclDecoder {
    pub fn decode(&self, text: &str) -> ExpandedDocument {
        let mut doc = ExpandedDocument::default();
        let sections = split_sections(text, &mut doc.warnings);

        // The map is needed by every other section, wherever it appears
        for line in sections.get("COMPRESSION_MAP").into_iter().flatten() {
            parse_map_line(line, &mut doc);
        }
        let mappings = doc.mappings.clone();
        let expansion = mappings.expansion_table();

        for line in sections.get("FILE_PATHS").into_iter().flatten() {
            match split_once_unescaped(line.text, ':') {
                Some((id, path)) if FILE_ID.is_match(id.trim()) => doc.files.push(ExpandedFile {
                    id: id.trim().to_string(),
                    path: unescape(path),
                }),
                _ => warn_line(&mut doc, "FILE_PATHS", line),
            }
        }

        for line in sections.get("SYSTEMS").into_iter().flatten() {
            parse_system_line(line, &expansion, &mut doc);
        }
        for line in sections.get("COMPRESSED_CODE").into_iter().flatten() {
            parse_code_line(line, &expansion, &mut doc);
        }
        for line in sections.get("RELATIONSHIPS").into_iter().flatten() {
            parse_relationship_line(line, &mut doc);
        }
        for line in sections.get("RULES").into_iter().flatten() {
            parse_rule_line(line, &expansion, &mut doc);
        }
        for line in sections.get("FLOWS").into_iter().flatten() {
            parse_flow_line(line, &expansion, &mut doc);
        }

        for warning in &doc.warnings {
            log::warn!("aiccl: {warning}");
        }
        doc
    }
}

fn split_sections<'t>(text: &'t str, warnings: &mut Vec<String>) -> HashMap<&'static str, Vec<Line<'t>>> {
    let mut sections: HashMap<&'static str, Vec<Line<'t>>> = HashMap::new();
    let mut current: Option<&'static str> = None;
    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            let name = header.trim();
            current = SECTIONS.iter().copied().find(|s| *s == name);
            if current.is_none() {
                warnings.push(format!("line {number}: unknown section '{name}'"));
            }
            continue;
        }
        match current {
            Some(section) => sections.entry(section).or_default().push(Line { number, text: line }),
            None => warnings.push(format!("line {number}: outside any known section")),
        }
    }
    sections
}

fn warn_line(doc: &mut ExpandedDocument, section: &str, line: &Line<'_>) {
    doc.warnings
        .push(format!("line {}: malformed {section} line: {}", line.number, line.text));
}

fn parse_map_line(line: &Line<'_>, doc: &mut ExpandedDocument) {
    for entry in split_unescaped(line.text, '|') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let valid = entry
            .split_once('=')
            .filter(|(short, full)| is_word(short) && is_word(full));
        match valid {
            Some((short, full)) => {
                if !doc.mappings.insert(short, full) {
                    doc.warnings.push(format!(
                        "line {}: duplicate code '{short}' ignored",
                        line.number
                    ));
                }
            }
            None => doc.warnings.push(format!(
                "line {}: malformed COMPRESSION_MAP entry: {entry}",
                line.number
            )),
        }
    }
}

fn is_word(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_word_char)
}

fn parse_system_line(line: &Line<'_>, expansion: &Expansion<'_>, doc: &mut ExpandedDocument) {
    let text = line.text;
    if let Some((id, rest)) = split_once_unescaped(text, ':') {
        if SYSTEM_ID.is_match(id.trim()) {
            let fields = split_unescaped(rest, '|');
            let mut fields: Vec<&str> = fields.into_iter().collect();
            let relevance = match fields.last() {
                Some(last) if fields.len() > 1 => parse_percent(last),
                _ => None,
            };
            if relevance.is_some() {
                fields.pop();
            }
            let name = fields.first().map(|f| expand(f, expansion)).unwrap_or_default();
            if name.is_empty() {
                warn_line(doc, "SYSTEMS", line);
                return;
            }
            let summary = fields
                .get(1..)
                .filter(|rest| !rest.is_empty())
                .map(|rest| expand(&rest.join("|"), expansion))
                .filter(|s| !s.is_empty());
            doc.systems.push(ExpandedSystem {
                id: id.trim().to_string(),
                name,
                summary,
                relevance,
                file: None,
                lines: None,
                component_type: None,
                signature: String::new(),
                code: None,
            });
            return;
        }
    }

    // Detail line for the latest header: `F1>3-10:f{sig}`
    let Some((location, kind)) = split_once_unescaped(text, ':') else {
        warn_line(doc, "SYSTEMS", line);
        return;
    };
    let mut location_parts = split_unescaped(location, '>').into_iter();
    let file_id = location_parts.next().unwrap_or_default().trim();
    if file_id != "?" && !FILE_ID.is_match(file_id) {
        warn_line(doc, "SYSTEMS", line);
        return;
    }
    let lines = location_parts.next().and_then(|range| {
        let caps = RANGE.captures(range.trim())?;
        Some((caps[1].parse::<usize>().ok()?, caps[2].parse::<usize>().ok()?))
    });
    let (code, signature) = match (kind.find('{'), kind.rfind('}')) {
        (Some(open), Some(close)) if close > open => (&kind[..open], &kind[open + 1..close]),
        _ => (kind, ""),
    };
    let file = doc
        .files
        .iter()
        .find(|f| f.id == file_id)
        .map(|f| f.path.clone());
    let component_type = expansion
        .word(code.trim())
        .map(str::to_string)
        .or_else(|| (!code.trim().is_empty()).then(|| code.trim().to_string()));
    let signature = expand(signature, expansion);

    if doc.systems.is_empty() {
        warn_line(doc, "SYSTEMS", line);
        return;
    }
    if file.is_none() && file_id != "?" {
        let warning = format!("line {}: unknown file id {file_id}", line.number);
        doc.warnings.push(warning);
    }
    let Some(system) = doc.systems.last_mut() else {
        return;
    };
    system.file = file;
    system.lines = lines;
    system.component_type = component_type;
    system.signature = signature;
}

fn parse_code_line(line: &Line<'_>, expansion: &Expansion<'_>, doc: &mut ExpandedDocument) {
    let parsed = split_once_unescaped(line.text, '>').and_then(|(file_id, rest)| {
        let (name, code) = split_once_unescaped(rest, ':')?;
        Some((file_id.trim(), expand(name, expansion), expand(code, expansion)))
    });
    let Some((file_id, name, code)) = parsed else {
        warn_line(doc, "COMPRESSED_CODE", line);
        return;
    };
    let path = doc
        .files
        .iter()
        .find(|f| f.id == file_id)
        .map(|f| f.path.clone());
    let target = doc
        .systems
        .iter_mut()
        .find(|s| s.name == name && s.code.is_none() && (file_id == "?" || s.file == path));
    match target {
        Some(system) => system.code = Some(code),
        None => doc.warnings.push(format!(
            "line {}: code for unknown component {file_id}>{name}",
            line.number
        )),
    }
}

fn parse_relationship_line(line: &Line<'_>, doc: &mut ExpandedDocument) {
    let parsed = split_once_unescaped(line.text, ':').and_then(|(refs, rest)| {
        let refs = split_unescaped(refs, '>');
        let [source, target] = refs.as_slice() else {
            return None;
        };
        let fields = split_unescaped(rest, '|');
        let relationship_type = fields.first()?.trim().to_string();
        if relationship_type.is_empty() {
            return None;
        }
        let confidence = fields.get(1).and_then(|f| parse_percent(f));
        Some((source.trim().to_string(), target.trim().to_string(), relationship_type, confidence))
    });
    let Some((source_ref, target_ref, relationship_type, confidence)) = parsed else {
        warn_line(doc, "RELATIONSHIPS", line);
        return;
    };
    let (Some(source), Some(target)) = (
        resolve_ref(&source_ref, doc),
        resolve_ref(&target_ref, doc),
    ) else {
        doc.warnings.push(format!(
            "line {}: relationship references unknown system: {}",
            line.number, line.text
        ));
        return;
    };
    doc.relationships.push(ExpandedRelationship {
        source_ref,
        target_ref,
        source,
        target,
        relationship_type,
        confidence,
    });
}

/// `S<n>` -> system name; `?spec` -> spec
fn resolve_ref(reference: &str, doc: &ExpandedDocument) -> Option<String> {
    if let Some(spec) = reference.strip_prefix('?') {
        return Some(unescape(spec));
    }
    doc.system(reference).map(|s| s.name.clone())
}

fn parse_rule_line(line: &Line<'_>, expansion: &Expansion<'_>, doc: &mut ExpandedDocument) {
    let Some((id, rest)) = split_once_unescaped(line.text, ':').filter(|(id, _)| RULE_ID.is_match(id.trim()))
    else {
        warn_line(doc, "RULES", line);
        return;
    };
    let fields = split_unescaped(rest, '|');
    let rule_type = unescape(fields[0]).trim().to_string();
    if rule_type.is_empty() {
        warn_line(doc, "RULES", line);
        return;
    }
    let mut rest = fields[1..].iter();
    let mut confidence = None;
    let mut next = rest.next();
    if let Some(field) = next {
        if field.trim().is_empty() || parse_percent(field).is_some() {
            confidence = parse_percent(field);
            next = rest.next();
        }
    }
    let guidance = next.map(|g| expand(g, expansion)).filter(|g| !g.is_empty());
    let why = rest.next().map(|w| expand(w, expansion)).filter(|w| !w.is_empty());
    doc.rules.push(ExpandedRule {
        id: id.trim().to_string(),
        rule_type,
        confidence,
        guidance,
        why,
    });
}

fn parse_flow_line(line: &Line<'_>, expansion: &Expansion<'_>, doc: &mut ExpandedDocument) {
    let Some((name, steps)) = split_once_unescaped(line.text, ':') else {
        warn_line(doc, "FLOWS", line);
        return;
    };
    let name = expand(name, expansion).trim().to_string();
    let mut resolved = Vec::new();
    for step in split_unescaped(steps, '>') {
        let step = step.trim();
        if step.is_empty() {
            continue;
        }
        match resolve_ref(step, doc) {
            Some(step_name) => resolved.push(step_name),
            None => {
                doc.warnings.push(format!(
                    "line {}: flow '{name}' references unknown step {step}",
                    line.number
                ));
                resolved.push(step.to_string());
            }
        }
    }
    if name.is_empty() || resolved.is_empty() {
        warn_line(doc, "FLOWS", line);
        return;
    }
    doc.flows.push(ExpandedFlow {
        name,
        steps: resolved,
    });
}

/// Undo escapes without expanding words
fn unescape(field: &str) -> String {
    expand(field, &Expansion::empty())
}

/// Undo escapes and expand every whole word not marked literal with `\=`
pub(crate) fn expand(field: &str, expansion: &Expansion<'_>) -> String {
    let mut out = String::with_capacity(field.len() * 2);
    let mut word = String::new();
    let mut literal = false;
    let mut chars = field.chars();

    let flush = |out: &mut String, word: &mut String, literal: &mut bool| {
        if !word.is_empty() {
            let text = if *literal {
                word.as_str()
            } else {
                expansion.word(word.as_str()).unwrap_or(word.as_str())
            };
            out.push_str(text);
            word.clear();
        }
        *literal = false;
    };

    while let Some(c) = chars.next() {
        if c == '\\' {
            flush(&mut out, &mut word, &mut literal);
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('=') => literal = true,
                Some(other @ ('\\' | '|' | ':' | '>' | '#')) => out.push(other),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
            continue;
        }
        if is_word_char(c) {
            word.push(c);
            continue;
        }
        flush(&mut out, &mut word, &mut literal);
        out.push(c);
    }
    flush(&mut out, &mut word, &mut literal);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_and_literals() {
        let mut map = CompressionMap::new();
        map.insert("e", "export");
        map.insert("ret", "return");
        let expansion = map.expansion_table();
        assert_eq!(expand(r"e fn() { ret \=e; }", &expansion), "export fn() { return e; }");
        assert_eq!(expand(r"a\|b\:c\>d\\e\nf", &expansion), "a|b:c>d\\export\nf");
        assert_eq!(unescape(r"src\\e.ts"), r"src\e.ts");
        assert_eq!(unescape(r"\#hot\r\npath"), "#hot\r\npath");
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let text = "\
stray line
# FILE_PATHS
F1:src/a.ts
nonsense
# SYSTEMS
S1:load|90%
F1>1-3:f{load()}
# RELATIONSHIPS
S1>S9:CALLS|50%
S1
# NOPE
x
";
        let doc = decode(text);
        assert_eq!(doc.files.len(), 1);
        assert_eq!(doc.systems.len(), 1);
        assert_eq!(doc.systems[0].lines, Some((1, 3)));
        assert_eq!(doc.systems[0].file.as_deref(), Some("src/a.ts"));
        assert!(doc.relationships.is_empty());
        assert_eq!(doc.warnings.len(), 6, "{:?}", doc.warnings);
    }

    #[test]
    fn rules_read_optional_confidence() {
        let text = "# RULES\nR1:naming|90%|use verbs|clarity\nR2:style|keep short\nR3:limits||80%\n";
        let doc = decode(text);
        assert_eq!(doc.rules.len(), 3);
        assert_eq!(doc.rules[0].confidence, Some(90));
        assert_eq!(doc.rules[0].why.as_deref(), Some("clarity"));
        assert_eq!(doc.rules[1].confidence, None);
        assert_eq!(doc.rules[1].guidance.as_deref(), Some("keep short"));
        assert_eq!(doc.rules[2].confidence, None);
        assert_eq!(doc.rules[2].guidance.as_deref(), Some("80%"));
    }

    #[test]
    fn flows_resolve_step_names() {
        let text = "# SYSTEMS\nS1:load|90%\nS2:save|80%\n# FLOWS\nsync: S1>S2>?external\n";
        let doc = decode(text);
        assert_eq!(
            doc.flows,
            vec![ExpandedFlow {
                name: "sync".to_string(),
                steps: vec!["load".to_string(), "save".to_string(), "external".to_string()],
            }]
        );
    }
}
