//! AICCL: line-oriented, section-based compressed context.
//!
//! ```text
//! # FILE_PATHS
//! F1:src/store.ts
//! # COMPRESSION_MAP
//! c=class|f=function|ret=return|q1=records
//! # SYSTEMS
//! S1:Store|caches q1|100%
//! F1>3-12:c{Store}
//! S2:load|85%
//! F1>5-7:f{load(): sg[]}
//! # COMPRESSED_CODE
//! F1>load:load() {\n  ret this.q1;\n}
//! # RELATIONSHIPS
//! S1>S2:CONTAINS|100%
//! S2>?./api#fetchAll:CALLS|70%
//! # RULES
//! R1:naming|90%|use verbs for functions
//! # FLOWS
//! startup: S1>S2
//! ```
//!
//! Free-text fields (names, summaries, signatures, code, rule text, flow names) are
//! abbreviated word by word through the compression map and escaped:
//! `\\` backslash, `\n` newline, `\r` carriage return, `\|` `\:` `\>` literal
//! separators, `\=word` a literal word that would otherwise expand. A flow name starting
//! with `#` is written `\#` so it cannot read as a section header.

mod decoder;
mod encoder;
mod report;
mod vocab;

pub use decoder::{
    decode, AicclDecoder, ExpandedDocument, ExpandedFile, ExpandedFlow, ExpandedRelationship,
    ExpandedRule, ExpandedSystem,
};
pub use encoder::AicclEncoder;
pub use report::render_report;
pub use vocab::{bucket_of, Bucket, CompressionMap, OP_CODES, TYPE_CODES};

/// Sections in canonical order
pub const SECTIONS: [&str; 7] = [
    "FILE_PATHS",
    "COMPRESSION_MAP",
    "SYSTEMS",
    "COMPRESSED_CODE",
    "RELATIONSHIPS",
    "RULES",
    "FLOWS",
];

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escape separators and control characters without abbreviating
pub(crate) fn escape_raw(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

pub(crate) fn push_escaped(out: &mut String, c: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '|' => out.push_str("\\|"),
        ':' => out.push_str("\\:"),
        '>' => out.push_str("\\>"),
        other => out.push(other),
    }
}

/// Escape a leading `#` so an encoded line never reads as a section header
pub(crate) fn escape_line_start(text: String) -> String {
    if text.starts_with('#') {
        format!("\\{text}")
    } else {
        text
    }
}

/// Byte offsets of `sep` not preceded by an escaping backslash
fn unescaped_positions(line: &str, sep: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            positions.push(idx);
        }
    }
    positions
}

pub(crate) fn split_unescaped(line: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for idx in unescaped_positions(line, sep) {
        parts.push(&line[start..idx]);
        start = idx + sep.len_utf8();
    }
    parts.push(&line[start..]);
    parts
}

pub(crate) fn split_once_unescaped(line: &str, sep: char) -> Option<(&str, &str)> {
    let idx = unescaped_positions(line, sep).into_iter().next()?;
    Some((&line[..idx], &line[idx + sep.len_utf8()..]))
}

/// `0.8` -> `80%` (nearest integer percent)
pub(crate) fn percent(value: f32) -> String {
    format!("{}%", to_percent(value))
}

pub(crate) fn to_percent(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// `80%` -> `80`
pub(crate) fn parse_percent(field: &str) -> Option<u8> {
    let digits = field.trim().strip_suffix('%')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u8>().ok().filter(|v| *v <= 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitting_respects_escapes() {
        assert_eq!(split_unescaped(r"a|b\|c|d", '|'), vec!["a", r"b\|c", "d"]);
        assert_eq!(split_unescaped(r"a\\|b", '|'), vec![r"a\\", "b"]);
        assert_eq!(split_once_unescaped(r"x\:y:z", ':'), Some((r"x\:y", "z")));
        assert_eq!(split_once_unescaped("none", ':'), None);
    }

    #[test]
    fn percents_are_integers() {
        assert_eq!(percent(0.8), "80%");
        assert_eq!(percent(0.666), "67%");
        assert_eq!(percent(1.7), "100%");
        assert_eq!(parse_percent("80%"), Some(80));
        assert_eq!(parse_percent("80"), None);
        assert_eq!(parse_percent("180%"), None);
        assert_eq!(parse_percent("%"), None);
    }

    #[test]
    fn raw_escape_covers_separators() {
        assert_eq!(escape_raw("a|b:c>d\\e\r\nf"), r"a\|b\:c\>d\\e\r\nf");
        assert_eq!(escape_line_start("#hot path".to_string()), r"\#hot path");
        assert_eq!(escape_line_start("warm #2".to_string()), "warm #2");
    }
}
