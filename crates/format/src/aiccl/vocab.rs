//! Fixed code tables and the per-document compression map.
//!
//! Membership decides the bucket of a `short=full` entry: codes listed in [`TYPE_CODES`]
//! are types, codes listed in [`OP_CODES`] are operations, anything else is a pattern.
//! Expansion works on whole words, so a short code never matches inside a longer token
//! (`exp` is looked up as `exp`, never as `e` + `xp`).

use super::is_word_char;
use context_code_parser::ComponentType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Component kinds: single letters for structural kinds, two letters for variants
pub const TYPE_CODES: &[(&str, ComponentType)] = &[
    ("r", ComponentType::File),
    ("w", ComponentType::Namespace),
    ("u", ComponentType::Module),
    ("c", ComponentType::Class),
    ("i", ComponentType::Interface),
    ("n", ComponentType::Enum),
    ("t", ComponentType::TypeAlias),
    ("f", ComponentType::Function),
    ("m", ComponentType::Method),
    ("p", ComponentType::Property),
    ("v", ComponentType::Variable),
    ("k", ComponentType::Constant),
    ("s", ComponentType::Section),
    ("b", ComponentType::CodeBlock),
    ("a", ComponentType::Annotation),
    ("d", ComponentType::Decorator),
    ("mp", ComponentType::PublicMethod),
    ("mv", ComponentType::PrivateMethod),
    ("mt", ComponentType::ProtectedMethod),
    ("ms", ComponentType::StaticMethod),
    ("ma", ComponentType::AbstractMethod),
    ("mc", ComponentType::Constructor),
    ("pp", ComponentType::PublicProperty),
    ("pv", ComponentType::PrivateProperty),
    ("pt", ComponentType::ProtectedProperty),
    ("ps", ComponentType::StaticProperty),
    ("pg", ComponentType::Paragraph),
    ("bq", ComponentType::BlockQuote),
    ("li", ComponentType::ListItem),
    ("tb", ComponentType::Table),
    ("im", ComponentType::Import),
    ("cm", ComponentType::Comment),
    ("xb", ComponentType::IndexBlock),
    ("xs", ComponentType::IndexSection),
    ("xf", ComponentType::IndexFile),
    ("xy", ComponentType::IndexSystem),
    ("xw", ComponentType::IndexFlow),
    ("xl", ComponentType::IndexLink),
    ("xe", ComponentType::IndexEntry),
];

/// Frequent keywords and verbs
pub const OP_CODES: &[(&str, &str)] = &[
    ("ret", "return"),
    ("asy", "async"),
    ("aw", "await"),
    ("e", "export"),
    ("imp", "import"),
    ("fr", "from"),
    ("cn", "const"),
    ("lt", "let"),
    ("fn", "function"),
    ("df", "def"),
    ("cls", "class"),
    ("ifc", "interface"),
    ("pub", "public"),
    ("prv", "private"),
    ("prt", "protected"),
    ("sta", "static"),
    ("abs", "abstract"),
    ("nw", "new"),
    ("thr", "throw"),
    ("th", "this"),
    ("sf", "self"),
    ("ext", "extends"),
    ("impl", "implements"),
    ("sg", "string"),
    ("num", "number"),
    ("bln", "boolean"),
    ("und", "undefined"),
    ("nul", "null"),
    ("vd", "void"),
    ("yld", "yield"),
    ("els", "else"),
    ("wh", "while"),
    ("cnt", "continue"),
    ("brk", "break"),
    ("dflt", "default"),
    ("fls", "false"),
    ("tru", "true"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Types,
    Operations,
    Patterns,
}

/// Bucket a short code belongs to by fixed membership
pub fn bucket_of(short: &str) -> Bucket {
    if TYPE_CODES.iter().any(|(code, _)| *code == short) {
        Bucket::Types
    } else if OP_CODES.iter().any(|(code, _)| *code == short) {
        Bucket::Operations
    } else {
        Bucket::Patterns
    }
}

pub(crate) fn type_code(component_type: ComponentType) -> Option<&'static str> {
    TYPE_CODES
        .iter()
        .find(|(_, ty)| *ty == component_type)
        .map(|(code, _)| *code)
}

/// Bucketed `short -> full` entries of one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionMap {
    pub types: BTreeMap<String, String>,
    pub operations: BTreeMap<String, String>,
    pub patterns: BTreeMap<String, String>,
}

impl CompressionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert into the bucket chosen by membership. Returns `false` when the short code
    /// is already mapped (the first mapping stays).
    pub fn insert(&mut self, short: &str, full: &str) -> bool {
        if self.get(short).is_some() {
            return false;
        }
        let bucket = match bucket_of(short) {
            Bucket::Types => &mut self.types,
            Bucket::Operations => &mut self.operations,
            Bucket::Patterns => &mut self.patterns,
        };
        bucket.insert(short.to_string(), full.to_string());
        true
    }

    /// Full word for `short`, searching types, then operations, then patterns
    pub fn get(&self, short: &str) -> Option<&str> {
        self.types
            .get(short)
            .or_else(|| self.operations.get(short))
            .or_else(|| self.patterns.get(short))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len() + self.operations.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in wire order: types, operations, then patterns by code number
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut patterns: Vec<(&str, &str)> = self
            .patterns
            .iter()
            .map(|(s, f)| (s.as_str(), f.as_str()))
            .collect();
        patterns.sort_by_key(|(short, _)| pattern_number(short));
        self.types
            .iter()
            .chain(self.operations.iter())
            .map(|(s, f)| (s.as_str(), f.as_str()))
            .chain(patterns)
            .collect()
    }

    /// Union lookup table, longest codes first
    pub fn expansion_table(&self) -> Expansion<'_> {
        let mut entries: Vec<(&str, &str)> = self.entries();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        let mut by_short = HashMap::new();
        for (short, full) in &entries {
            by_short.entry(*short).or_insert(*full);
        }
        Expansion { by_short }
    }

    /// Expand every whole word of `text` (no escape handling)
    pub fn expand(&self, text: &str) -> String {
        self.expansion_table().expand_words(text)
    }
}

fn pattern_number(short: &str) -> (usize, String) {
    match short.strip_prefix('q').and_then(|n| n.parse::<usize>().ok()) {
        Some(n) => (n, String::new()),
        None => (usize::MAX, short.to_string()),
    }
}

/// Read-only view of a map for decoding
pub struct Expansion<'a> {
    by_short: HashMap<&'a str, &'a str>,
}

impl<'a> Expansion<'a> {
    pub fn empty() -> Self {
        Self {
            by_short: HashMap::new(),
        }
    }

    pub fn word(&self, word: &str) -> Option<&'a str> {
        self.by_short.get(word).copied()
    }

    pub fn expand_words(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word = String::new();
        for c in text.chars() {
            if is_word_char(c) {
                word.push(c);
                continue;
            }
            self.flush(&mut out, &mut word);
            out.push(c);
        }
        self.flush(&mut out, &mut word);
        out
    }

    fn flush(&self, out: &mut String, word: &mut String) {
        if word.is_empty() {
            return;
        }
        let expanded = self.word(word.as_str()).unwrap_or(word.as_str());
        out.push_str(expanded);
        word.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_decides_the_bucket() {
        let mut map = CompressionMap::new();
        assert!(map.insert("f", "function"));
        assert!(map.insert("ret", "return"));
        assert!(map.insert("q1", "repository"));
        assert!(!map.insert("f", "field"));
        assert_eq!(map.types.len(), 1);
        assert_eq!(map.operations.len(), 1);
        assert_eq!(map.patterns.len(), 1);
        assert_eq!(map.get("f"), Some("function"));
    }

    #[test]
    fn longest_match_never_splits_words() {
        let mut map = CompressionMap::new();
        map.insert("e", "export");
        map.insert("exp", "expression");
        assert_eq!(map.expand("exp"), "expression");
        assert_eq!(map.expand("e exp"), "export expression");
        assert_eq!(map.expand("expr e.x"), "expr export.x");
    }

    #[test]
    fn entries_keep_wire_order() {
        let mut map = CompressionMap::new();
        map.insert("q10", "tenth");
        map.insert("q2", "second");
        map.insert("ret", "return");
        map.insert("c", "class");
        let shorts: Vec<&str> = map.entries().into_iter().map(|(s, _)| s).collect();
        assert_eq!(shorts, vec!["c", "ret", "q2", "q10"]);
    }

    #[test]
    fn every_component_type_has_a_code() {
        for ty in ComponentType::ALL {
            assert!(type_code(ty).is_some(), "{ty:?}");
        }
        let mut shorts: Vec<&str> = TYPE_CODES.iter().map(|(s, _)| *s).collect();
        shorts.extend(OP_CODES.iter().map(|(s, _)| *s));
        let total = shorts.len();
        shorts.sort_unstable();
        shorts.dedup();
        assert_eq!(shorts.len(), total, "codes must be unique across tables");
    }
}
