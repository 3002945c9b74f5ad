use super::{location_label, FormatAdapter};
use crate::error::Result;
use crate::request::{ContextData, ContextRequest};
use context_code_parser::{Relationship, RelationshipTarget};
use serde_json::{json, Map, Value};

/// JSON output. The compact variant uses short keys, drops code and is not pretty-printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAdapter {
    compact: bool,
}

impl JsonAdapter {
    pub fn full() -> Self {
        Self { compact: false }
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }

    fn render_full(&self, data: &ContextData, request: &ContextRequest) -> Result<String> {
        let options = &request.options;
        let components: Vec<Value> = data
            .components
            .iter()
            .map(|scored| {
                let c = &scored.component;
                let mut entry = Map::new();
                entry.insert("id".into(), json!(c.id));
                entry.insert("name".into(), json!(c.name));
                entry.insert("type".into(), json!(c.component_type.as_str()));
                entry.insert("language".into(), json!(c.language.as_str()));
                entry.insert("file".into(), json!(c.file_path));
                entry.insert(
                    "lines".into(),
                    json!([c.location.start_line, c.location.end_line]),
                );
                entry.insert("relevance".into(), json!(round2(scored.relevance)));
                entry.insert("signature".into(), json!(c.signature()));
                if let Some(parent) = &c.parent_id {
                    entry.insert("parent".into(), json!(parent));
                }
                if let Some(doc) = &c.metadata.documentation {
                    entry.insert("documentation".into(), json!(doc));
                }
                if options.include_metadata {
                    entry.insert("metadata".into(), json!(c.metadata));
                }
                if options.include_source && !c.is_root() && !c.code.is_empty() {
                    entry.insert("code".into(), json!(c.code));
                }
                Value::Object(entry)
            })
            .collect();

        let relationships: Vec<Value> = data
            .relationships
            .iter()
            .chain(data.unresolved.iter())
            .map(relationship_value)
            .collect();

        let document = json!({
            "entity": request.entity_id,
            "focus": data.focus_id,
            "depth": request.depth,
            "files": data.files(),
            "components": components,
            "relationships": relationships,
            "rules": data.rules,
            "flows": data.flows,
            "notes": data.notes,
            "tasks": data.tasks,
        });
        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn render_compact(&self, data: &ContextData) -> Result<String> {
        let components: Vec<Value> = data
            .components
            .iter()
            .map(|scored| {
                let c = &scored.component;
                json!({
                    "n": c.name,
                    "t": c.component_type.as_str(),
                    "l": location_label(c),
                    "r": round2(scored.relevance),
                })
            })
            .collect();

        // Edges by component index; pending targets keep their specifier
        let index_of = |id: &str| data.components.iter().position(|c| c.component.id == id);
        let relationships: Vec<Value> = data
            .relationships
            .iter()
            .chain(data.unresolved.iter())
            .filter_map(|rel| {
                let source = index_of(&rel.source_id)?;
                let target = match &rel.target {
                    RelationshipTarget::Resolved(id) => json!(index_of(id)?),
                    RelationshipTarget::Pending(spec) => json!(format!("?{spec}")),
                };
                Some(json!([source, target, rel.relationship_type.to_string()]))
            })
            .collect();

        let mut document = Map::new();
        document.insert("f".into(), json!(data.focus_id));
        document.insert("c".into(), Value::Array(components));
        if !relationships.is_empty() {
            document.insert("r".into(), Value::Array(relationships));
        }
        if !data.rules.is_empty() {
            let rules: Vec<Value> = data
                .rules
                .iter()
                .map(|r| json!([r.rule_type, r.guidance]))
                .collect();
            document.insert("rl".into(), Value::Array(rules));
        }
        if !data.flows.is_empty() {
            let flows: Vec<Value> = data
                .flows
                .iter()
                .map(|f| json!([f.name, f.steps]))
                .collect();
            document.insert("fl".into(), Value::Array(flows));
        }
        if !data.tasks.is_empty() {
            let tasks: Vec<&str> = data.tasks.iter().map(|t| t.title.as_str()).collect();
            document.insert("tk".into(), json!(tasks));
        }
        if !data.notes.is_empty() {
            let notes: Vec<&str> = data.notes.iter().map(|n| n.text.as_str()).collect();
            document.insert("nt".into(), json!(notes));
        }
        Ok(serde_json::to_string(&Value::Object(document))?)
    }
}

fn relationship_value(rel: &Relationship) -> Value {
    let mut entry = json!({
        "source": rel.source_id,
        "type": rel.relationship_type.to_string(),
        "confidence": round2(rel.metadata.confidence),
    });
    match &rel.target {
        RelationshipTarget::Resolved(id) => entry["target"] = json!(id),
        RelationshipTarget::Pending(spec) => {
            entry["target"] = json!(spec);
            entry["pending"] = json!(true);
        }
    }
    entry
}

fn round2(value: f32) -> f64 {
    (f64::from(value) * 100.0).round() / 100.0
}

impl FormatAdapter for JsonAdapter {
    fn name(&self) -> &'static str {
        if self.compact {
            "json-compact"
        } else {
            "json"
        }
    }

    fn description(&self) -> &'static str {
        if self.compact {
            "Minified JSON with short keys and no source"
        } else {
            "Pretty-printed JSON with every field"
        }
    }

    fn is_structured(&self) -> bool {
        true
    }

    fn render(&self, data: &ContextData, request: &ContextRequest) -> Result<String> {
        if self.compact {
            self.render_compact(data)
        } else {
            self.render_full(data, request)
        }
    }
}
