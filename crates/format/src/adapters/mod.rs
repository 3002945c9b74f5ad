//! Output adapters. Each adapter turns a [`ContextData`] slice into text.

mod aiccl;
mod aiccl_expand;
mod json;
mod markdown;
mod text;

pub use aiccl::AicclAdapter;
pub use aiccl_expand::{expand, AicclExpandAdapter};
pub use json::JsonAdapter;
pub use markdown::MarkdownAdapter;
pub use text::TextAdapter;

use crate::error::Result;
use crate::request::{ContextData, ContextRequest};
use context_code_parser::{Component, Relationship, RelationshipTarget};

/// A named output format
pub trait FormatAdapter: Send + Sync {
    /// Registry name (`markdown`, `json-compact`, ...)
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Structured adapters also return components and relationships in the response
    fn is_structured(&self) -> bool {
        false
    }

    fn render(&self, data: &ContextData, request: &ContextRequest) -> Result<String>;
}

/// `path:start-end`
pub(crate) fn location_label(component: &Component) -> String {
    format!(
        "{}:{}-{}",
        component.file_path, component.location.start_line, component.location.end_line
    )
}

/// Display name of an edge endpoint: the component name when it is in the slice
pub(crate) fn endpoint_label(data: &ContextData, id: &str) -> String {
    data.component(id)
        .map(|c| c.component.name.clone())
        .unwrap_or_else(|| id.to_string())
}

pub(crate) fn target_label(data: &ContextData, rel: &Relationship) -> String {
    match &rel.target {
        RelationshipTarget::Resolved(id) => endpoint_label(data, id),
        RelationshipTarget::Pending(spec) => format!("?{spec}"),
    }
}

/// Relevance as an integer percent
pub(crate) fn relevance_label(relevance: f32) -> String {
    crate::aiccl::percent(relevance)
}

/// Steps of a flow, named by the components they point at when known
pub(crate) fn flow_steps(data: &ContextData, steps: &[String]) -> Vec<String> {
    steps
        .iter()
        .map(|step| {
            data.step_component(step)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| step.clone())
        })
        .collect()
}

/// Modifiers, decorators and export info as one line
pub(crate) fn metadata_line(component: &Component) -> Option<String> {
    let metadata = &component.metadata;
    let mut parts: Vec<String> = Vec::new();
    if !metadata.modifiers.is_empty() {
        parts.push(format!("modifiers: {}", metadata.modifiers.join(" ")));
    }
    if !metadata.decorators.is_empty() {
        parts.push(format!("decorators: {}", metadata.decorators.join(", ")));
    }
    if metadata.is_exported {
        match &metadata.exported_name {
            Some(name) if *name != component.name => parts.push(format!("exported as {name}")),
            _ => parts.push("exported".to_string()),
        }
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::request::{ContextData, Flow, Rule, ScoredComponent, Task};
    use context_code_parser::{
        generate_component_id, Component, ComponentDetails, ComponentMetadata, ComponentType,
        Language, Location, Parameter, Relationship, RelationshipType,
    };

    pub(crate) fn function(name: &str, start: usize, code: &str, relevance: f32) -> ScoredComponent {
        let path = "src/store.ts";
        let mut component = Component::file_root(path, Language::TypeScript, "");
        component.id = generate_component_id(path, name, ComponentType::Function);
        component.name = name.to_string();
        component.component_type = ComponentType::Function;
        component.location = Location::lines(start, start + code.lines().count().max(1) - 1);
        component.parent_id = Some(generate_component_id(path, "store.ts", ComponentType::File));
        component.metadata = ComponentMetadata::with_details(ComponentDetails::Callable {
            parameters: vec![Parameter::named("id")],
            return_type: None,
            is_async: false,
            is_generator: false,
            calls: Vec::new(),
        })
        .documentation(Some(format!("Handles {name}.")));
        component.code = code.to_string();
        ScoredComponent {
            component,
            relevance,
        }
    }

    /// `load` calls `save` and an unresolved `./api#fetchAll`
    pub(crate) fn sample() -> ContextData {
        let load = function("load", 1, "function load(id) {\n  return save(id);\n}", 1.0);
        let save = function("save", 5, "function save(id) {\n  return id;\n}", 0.5);
        let load_id = load.component.id.clone();
        let save_id = save.component.id.clone();
        ContextData {
            focus_id: load_id.clone(),
            components: vec![load, save],
            relationships: vec![
                Relationship::resolved(&load_id, &save_id, RelationshipType::Calls).confidence(0.8),
            ],
            unresolved: vec![
                Relationship::pending(&load_id, "./api#fetchAll", RelationshipType::Calls)
                    .confidence(0.7),
            ],
            rules: vec![Rule {
                rule_type: "naming".to_string(),
                confidence: Some(0.9),
                guidance: Some("use verbs for functions".to_string()),
                why: None,
            }],
            flows: vec![Flow {
                name: "persist".to_string(),
                steps: vec!["load".to_string(), "save".to_string()],
            }],
            notes: Vec::new(),
            tasks: vec![Task {
                title: "cache reads".to_string(),
                status: "open".to_string(),
                component_id: None,
            }],
        }
    }
}
