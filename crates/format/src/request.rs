//! Request/response envelope and the data every adapter renders.

use context_code_parser::{Component, ComponentDetails, Relationship};
use context_graph::AssembledContext;
use serde::{Deserialize, Serialize};

/// Feature flags of a context request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextOptions {
    pub include_source: bool,
    pub include_relationships: bool,
    pub include_documentation: bool,
    pub include_metadata: bool,
    pub include_notes: bool,
    pub include_rules: bool,
    pub include_tasks: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            include_source: true,
            include_relationships: true,
            include_documentation: true,
            include_metadata: false,
            include_notes: true,
            include_rules: true,
            include_tasks: true,
        }
    }
}

/// What the caller asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRequest {
    pub entity_id: String,
    pub depth: usize,
    pub token_budget: usize,
    #[serde(default)]
    pub options: ContextOptions,
    pub format: String,
}

impl ContextRequest {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            depth: 2,
            token_budget: 8000,
            options: ContextOptions::default(),
            format: "markdown".to_string(),
        }
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn token_budget(mut self, token_budget: usize) -> Self {
        self.token_budget = token_budget;
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn options(mut self, options: ContextOptions) -> Self {
        self.options = options;
        self
    }
}

/// Counts reported with every response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStats {
    pub components: usize,
    pub relationships: usize,
    pub unresolved: usize,
    pub files: usize,
    pub rules: usize,
    pub flows: usize,
    /// Related components left out to meet the token budget
    pub dropped_components: usize,
    /// Components whose code was cut to the line limit
    pub truncated_components: usize,
}

/// Rendered context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    pub content: String,
    /// Adapter actually used (may be a compact substitute of the requested one)
    pub format: String,
    pub stats: ResponseStats,
    pub token_count: usize,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<Relationship>>,
}

/// Component with its rank in the slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredComponent {
    pub component: Component,
    /// 0.0..=1.0; the focus is 1.0
    pub relevance: f32,
}

/// Coding rule attached to a context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub guidance: Option<String>,
    #[serde(default)]
    pub why: Option<String>,
}

/// Named execution flow; steps are component ids or names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub name: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub title: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
}

/// Everything an adapter renders: the graph slice plus attached knowledge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextData {
    pub focus_id: String,
    /// Focus first, then by descending relevance
    pub components: Vec<ScoredComponent>,
    pub relationships: Vec<Relationship>,
    pub unresolved: Vec<Relationship>,
    pub rules: Vec<Rule>,
    pub flows: Vec<Flow>,
    pub notes: Vec<Note>,
    pub tasks: Vec<Task>,
}

impl ContextData {
    /// Slice of an assembled context. Narrative components carrying `TODO`/`FIXME` become
    /// tasks; other markers become notes.
    pub fn from_assembled(context: &AssembledContext) -> Self {
        let mut components = vec![ScoredComponent {
            component: context.focus.clone(),
            relevance: 1.0,
        }];
        components.extend(context.related.iter().map(|r| ScoredComponent {
            component: r.component.clone(),
            relevance: r.relevance_score,
        }));

        let mut data = Self {
            focus_id: context.focus.id.clone(),
            components,
            relationships: context.relationships.clone(),
            unresolved: context.unresolved.clone(),
            ..Self::default()
        };
        data.collect_markers();
        data
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_flows(mut self, flows: Vec<Flow>) -> Self {
        self.flows = flows;
        self
    }

    pub fn focus(&self) -> Option<&Component> {
        self.components
            .iter()
            .map(|c| &c.component)
            .find(|c| c.id == self.focus_id)
    }

    pub fn component(&self, id: &str) -> Option<&ScoredComponent> {
        self.components.iter().find(|c| c.component.id == id)
    }

    /// Distinct file paths in first-appearance order
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for scored in &self.components {
            if !files.contains(&scored.component.file_path.as_str()) {
                files.push(&scored.component.file_path);
            }
        }
        files
    }

    /// Id of the component a flow step names (id first, then name)
    pub fn step_component(&self, step: &str) -> Option<&Component> {
        self.component(step).map(|c| &c.component).or_else(|| {
            self.components
                .iter()
                .map(|c| &c.component)
                .find(|c| c.name == step)
        })
    }

    fn collect_markers(&mut self) {
        for scored in &self.components {
            let component = &scored.component;
            let ComponentDetails::Narrative { markers, .. } = &component.metadata.details else {
                continue;
            };
            let text = first_line(&component.code);
            if markers.iter().any(|m| m == "TODO" || m == "FIXME") {
                self.tasks.push(Task {
                    title: text,
                    status: "open".to_string(),
                    component_id: Some(component.id.clone()),
                });
            } else if !markers.is_empty() {
                self.notes.push(Note {
                    text,
                    component_id: Some(component.id.clone()),
                });
            }
        }
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .trim_start_matches(['-', '*', '>', ' '])
        .to_string()
}
