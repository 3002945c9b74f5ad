use super::vocab::{type_code, CompressionMap, OP_CODES};
use super::{escape_line_start, escape_raw, is_word_char, parse_percent, percent, push_escaped};
use crate::config::FormatConfig;
use crate::request::{ContextData, ScoredComponent};
use context_code_parser::{Component, ComponentDetails, ComponentType, RelationshipTarget};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Deterministic AICCL writer
#[derive(Debug, Clone)]
pub struct AicclEncoder {
    pattern_min_occurrences: usize,
    pattern_min_length: usize,
}

impl Default for AicclEncoder {
    fn default() -> Self {
        Self::new(&FormatConfig::default())
    }
}

/// Word-level abbreviation for one document
struct Abbreviator {
    short_for: HashMap<String, String>,
    shorts: HashSet<String>,
}

impl Abbreviator {
    fn new(map: &CompressionMap) -> Self {
        let short_for = map
            .operations
            .iter()
            .chain(map.patterns.iter())
            .map(|(short, full)| (full.clone(), short.clone()))
            .collect();
        let shorts = map.entries().into_iter().map(|(s, _)| s.to_string()).collect();
        Self { short_for, shorts }
    }

    fn encode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word = String::new();
        for c in text.chars() {
            if is_word_char(c) {
                word.push(c);
                continue;
            }
            self.flush(&mut out, &mut word);
            push_escaped(&mut out, c);
        }
        self.flush(&mut out, &mut word);
        out
    }

    fn flush(&self, out: &mut String, word: &mut String) {
        if word.is_empty() {
            return;
        }
        if let Some(short) = self.short_for.get(word.as_str()) {
            out.push_str(short);
        } else if self.shorts.contains(word.as_str()) {
            out.push_str("\\=");
            out.push_str(word);
        } else {
            out.push_str(word);
        }
        word.clear();
    }
}

impl AicclEncoder {
    pub fn new(config: &FormatConfig) -> Self {
        Self {
            pattern_min_occurrences: config.pattern_min_occurrences,
            pattern_min_length: config.pattern_min_length,
        }
    }

    /// Encode a context slice. Sections without content are omitted.
    pub fn encode(&self, data: &ContextData) -> String {
        let files: Vec<&str> = data.files();
        let file_ids: HashMap<&str, String> = files
            .iter()
            .enumerate()
            .map(|(i, path)| (*path, format!("F{}", i + 1)))
            .collect();
        let system_ids: HashMap<&str, String> = data
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.component.id.as_str(), format!("S{}", i + 1)))
            .collect();

        let map = self.build_map(data);
        let abbreviator = Abbreviator::new(&map);
        let mut out = String::new();

        if !files.is_empty() {
            out.push_str("# FILE_PATHS\n");
            for path in &files {
                let id = file_ids.get(path).map(String::as_str).unwrap_or_default();
                out.push_str(&format!("{id}:{}\n", escape_raw(path)));
            }
        }

        if !map.is_empty() {
            out.push_str("# COMPRESSION_MAP\n");
            let entries: Vec<String> = map
                .entries()
                .into_iter()
                .map(|(short, full)| format!("{short}={full}"))
                .collect();
            out.push_str(&entries.join("|"));
            out.push('\n');
        }

        if !data.components.is_empty() {
            out.push_str("# SYSTEMS\n");
            for (idx, scored) in data.components.iter().enumerate() {
                let component = &scored.component;
                let file_id = file_ids
                    .get(component.file_path.as_str())
                    .map(String::as_str)
                    .unwrap_or("?");
                out.push_str(&self.system_lines(idx + 1, scored, file_id, &abbreviator));
            }
        }

        let code_lines: Vec<String> = data
            .components
            .iter()
            .map(|c| &c.component)
            .filter(|c| !c.is_root() && !c.code.trim().is_empty())
            .map(|c| {
                let file_id = file_ids
                    .get(c.file_path.as_str())
                    .map(String::as_str)
                    .unwrap_or("?");
                format!(
                    "{file_id}>{}:{}\n",
                    abbreviator.encode(&c.name),
                    abbreviator.encode(c.code.trim_end())
                )
            })
            .collect();
        if !code_lines.is_empty() {
            out.push_str("# COMPRESSED_CODE\n");
            out.extend(code_lines);
        }

        let mut relationship_lines = Vec::new();
        for rel in data.relationships.iter().chain(data.unresolved.iter()) {
            let Some(source) = system_ids.get(rel.source_id.as_str()) else {
                continue;
            };
            let target = match &rel.target {
                RelationshipTarget::Resolved(id) => match system_ids.get(id.as_str()) {
                    Some(target) => target.clone(),
                    None => continue,
                },
                RelationshipTarget::Pending(spec) => format!("?{}", escape_raw(spec)),
            };
            relationship_lines.push(format!(
                "{source}>{target}:{}|{}\n",
                rel.relationship_type,
                percent(rel.metadata.confidence)
            ));
        }
        if !relationship_lines.is_empty() {
            out.push_str("# RELATIONSHIPS\n");
            out.extend(relationship_lines);
        }

        if !data.rules.is_empty() {
            out.push_str("# RULES\n");
            for (idx, rule) in data.rules.iter().enumerate() {
                let confidence = rule.confidence.map(percent);
                let guidance = rule
                    .guidance
                    .as_deref()
                    .filter(|g| !g.is_empty())
                    .map(|g| abbreviator.encode(g));
                let why = rule
                    .why
                    .as_deref()
                    .filter(|w| !w.is_empty())
                    .map(|w| abbreviator.encode(w));

                let mut fields = vec![escape_raw(&rule.rule_type)];
                // An empty slot keeps a percent-looking guidance from reading as confidence
                let needs_slot = match &guidance {
                    Some(g) => parse_percent(g).is_some(),
                    None => why.is_some(),
                };
                if confidence.is_some() || needs_slot {
                    fields.push(confidence.unwrap_or_default());
                }
                if guidance.is_some() || why.is_some() {
                    fields.push(guidance.unwrap_or_default());
                }
                if let Some(why) = why {
                    fields.push(why);
                }
                out.push_str(&format!("R{}:{}\n", idx + 1, fields.join("|")));
            }
        }

        if !data.flows.is_empty() {
            out.push_str("# FLOWS\n");
            for flow in &data.flows {
                let steps: Vec<String> = flow
                    .steps
                    .iter()
                    .map(|step| {
                        data.step_component(step)
                            .and_then(|c| system_ids.get(c.id.as_str()).cloned())
                            .unwrap_or_else(|| format!("?{}", escape_raw(step)))
                    })
                    .collect();
                out.push_str(&format!(
                    "{}: {}\n",
                    escape_line_start(abbreviator.encode(&flow.name)),
                    steps.join(">")
                ));
            }
        }

        out
    }

    fn system_lines(
        &self,
        number: usize,
        scored: &ScoredComponent,
        file_id: &str,
        abbreviator: &Abbreviator,
    ) -> String {
        let component = &scored.component;
        let mut header = format!("S{number}:{}", abbreviator.encode(&component.name));
        if let Some(summary) = summary_of(component) {
            header.push('|');
            header.push_str(&abbreviator.encode(&summary));
        }
        header.push('|');
        header.push_str(&percent(scored.relevance));

        let code = type_code(component.component_type).unwrap_or(component.component_type.as_str());
        let signature = if component.is_root() {
            String::new()
        } else {
            abbreviator.encode(&component.signature())
        };
        format!(
            "{header}\n{file_id}>{}-{}:{code}{{{signature}}}\n",
            component.location.start_line, component.location.end_line
        )
    }

    fn build_map(&self, data: &ContextData) -> CompressionMap {
        let mut map = CompressionMap::new();

        let mut seen_types = HashSet::new();
        for scored in &data.components {
            let ty = scored.component.component_type;
            if seen_types.insert(ty) {
                if let Some(code) = type_code(ty) {
                    map.insert(code, ty.as_str());
                }
            }
        }

        let counts = word_counts(&free_texts(data));
        for (short, full) in OP_CODES {
            if counts.contains_key(*full) {
                map.insert(short, full);
            }
        }

        let op_fulls: HashSet<&str> = OP_CODES.iter().map(|(_, full)| *full).collect();
        let mut candidates: Vec<(&str, usize)> = counts
            .iter()
            .filter(|(word, count)| {
                **count >= self.pattern_min_occurrences
                    && word.chars().count() >= self.pattern_min_length
                    && !op_fulls.contains(word.as_str())
            })
            .map(|(word, count)| (word.as_str(), *count))
            .collect();
        candidates.sort_by(|a, b| {
            let saving = |(word, count): &(&str, usize)| word.len() * count;
            saving(b).cmp(&saving(a)).then(a.0.cmp(b.0))
        });

        let mut next = 1usize;
        for (word, count) in candidates {
            let short = format!("q{next}");
            let gain = count * word.len().saturating_sub(short.len());
            let cost = short.len() + word.len() + 2;
            if gain <= cost {
                continue;
            }
            if map.insert(&short, word) {
                next += 1;
            }
        }
        map
    }
}

fn summary_of(component: &Component) -> Option<String> {
    let text = match &component.metadata.details {
        ComponentDetails::IndexEntry {
            description: Some(description),
            ..
        } => Some(description.as_str()),
        _ => component.metadata.documentation.as_deref(),
    }?;
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

fn free_texts(data: &ContextData) -> Vec<String> {
    let mut texts = Vec::new();
    for scored in &data.components {
        let component = &scored.component;
        texts.push(component.name.clone());
        texts.extend(summary_of(component));
        if component.component_type != ComponentType::File {
            texts.push(component.signature());
            texts.push(component.code.clone());
        }
    }
    for rule in &data.rules {
        texts.extend(rule.guidance.clone());
        texts.extend(rule.why.clone());
    }
    texts.extend(data.flows.iter().map(|f| f.name.clone()));
    texts
}

fn word_counts(texts: &[String]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for text in texts {
        for word in text.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty()) {
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ScoredComponent;
    use context_code_parser::{Component, Language, Location, Relationship, RelationshipType};

    fn function(name: &str, line: usize, code: &str) -> ScoredComponent {
        let mut component = Component::file_root("src/store.ts", Language::TypeScript, "");
        component.id = format!("src/store.ts::function::{name}");
        component.name = name.to_string();
        component.component_type = ComponentType::Function;
        component.location = Location::lines(line, line + 2);
        component.code = code.to_string();
        ScoredComponent {
            component,
            relevance: 0.8,
        }
    }

    #[test]
    fn words_that_look_like_codes_are_escaped() {
        let data = ContextData {
            focus_id: "src/store.ts::function::load".to_string(),
            components: vec![function("load", 1, "function load(f) {\n  return f;\n}")],
            ..ContextData::default()
        };
        let text = AicclEncoder::default().encode(&data);
        assert!(text.contains("# COMPRESSION_MAP\nf=function|fn=function|ret=return\n"), "{text}");
        assert!(text.contains(r"F1>load:fn load(\=f) {\n  ret \=f;\n}"), "{text}");
    }

    #[test]
    fn repeated_long_words_become_patterns() {
        let body = "repository repository repository repository";
        let data = ContextData {
            focus_id: "src/store.ts::function::load".to_string(),
            components: vec![function("load", 1, body)],
            ..ContextData::default()
        };
        let text = AicclEncoder::default().encode(&data);
        assert!(text.contains("q1=repository"), "{text}");
        assert!(text.contains("F1>load:q1 q1 q1 q1"), "{text}");
    }

    #[test]
    fn pending_targets_use_question_refs() {
        let load = function("load", 1, "");
        let mut data = ContextData {
            focus_id: load.component.id.clone(),
            components: vec![load],
            ..ContextData::default()
        };
        data.unresolved.push(
            Relationship::pending("src/store.ts::function::load", "./api#fetchAll", RelationshipType::Calls)
                .confidence(0.7),
        );
        let text = AicclEncoder::default().encode(&data);
        assert!(text.contains("# RELATIONSHIPS\nS1>?./api#fetchAll:CALLS|70%\n"), "{text}");
    }
}
