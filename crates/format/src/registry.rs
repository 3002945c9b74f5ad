//! Format name -> adapter factory map and the shared response pipeline.

use crate::adapters::{
    AicclAdapter, AicclExpandAdapter, FormatAdapter, JsonAdapter, MarkdownAdapter, TextAdapter,
};
use crate::budget::{estimate_tokens, truncate_code};
use crate::config::FormatConfig;
use crate::error::{FormatError, Result};
use crate::request::{ContextData, ContextOptions, ContextRequest, ContextResponse, ResponseStats};
use std::collections::{BTreeMap, HashSet};

/// Builds an adapter from the registry configuration
pub type AdapterFactory = fn(&FormatConfig) -> Box<dyn FormatAdapter>;

/// Full formats that have a compact variant
const COMPACT_VARIANTS: &[(&str, &str)] = &[("json", "json-compact"), ("markdown", "markdown-compact")];

fn json_full(_: &FormatConfig) -> Box<dyn FormatAdapter> {
    Box::new(JsonAdapter::full())
}

fn json_compact(_: &FormatConfig) -> Box<dyn FormatAdapter> {
    Box::new(JsonAdapter::compact())
}

fn markdown_full(_: &FormatConfig) -> Box<dyn FormatAdapter> {
    Box::new(MarkdownAdapter::full())
}

fn markdown_compact(_: &FormatConfig) -> Box<dyn FormatAdapter> {
    Box::new(MarkdownAdapter::compact())
}

fn text(_: &FormatConfig) -> Box<dyn FormatAdapter> {
    Box::new(TextAdapter)
}

fn aiccl(config: &FormatConfig) -> Box<dyn FormatAdapter> {
    Box::new(AicclAdapter::new(config))
}

fn aiccl_expand(config: &FormatConfig) -> Box<dyn FormatAdapter> {
    Box::new(AicclExpandAdapter::new(config))
}

/// Registry of output formats.
///
/// [`select`](Self::select) swaps `json`/`markdown` for their compact variants when the
/// token budget is below `compact_threshold_tokens`; [`create`](Self::create) always
/// returns exactly the named adapter.
pub struct AdapterRegistry {
    factories: BTreeMap<String, AdapterFactory>,
    config: FormatConfig,
}

impl AdapterRegistry {
    /// Registry with every built-in format
    pub fn new(config: FormatConfig) -> Result<Self> {
        config.validate().map_err(FormatError::invalid_config)?;
        Ok(Self::with_builtins(config))
    }

    fn with_builtins(config: FormatConfig) -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
            config,
        };
        registry.register("json", json_full);
        registry.register("json-compact", json_compact);
        registry.register("markdown", markdown_full);
        registry.register("markdown-compact", markdown_compact);
        registry.register("text", text);
        registry.register("aiccl", aiccl);
        registry.register("aiccl-expand", aiccl_expand);
        registry
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Add or replace a format
    pub fn register(&mut self, name: impl Into<String>, factory: AdapterFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Registered format names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, format: &str) -> bool {
        self.factories.contains_key(format)
    }

    /// Exactly the named adapter
    pub fn create(&self, format: &str) -> Result<Box<dyn FormatAdapter>> {
        let factory = self
            .factories
            .get(format)
            .ok_or_else(|| FormatError::unknown_format(format))?;
        Ok(factory(&self.config))
    }

    /// Adapter for a budget: small budgets get the compact variant when one exists
    pub fn select(&self, format: &str, token_budget: usize) -> Result<Box<dyn FormatAdapter>> {
        if !self.contains(format) {
            return Err(FormatError::unknown_format(format));
        }
        let compact = COMPACT_VARIANTS
            .iter()
            .find(|(full, _)| *full == format)
            .map(|(_, compact)| *compact)
            .filter(|compact| self.contains(compact));
        match compact {
            Some(compact) if token_budget < self.config.compact_threshold_tokens => {
                log::debug!(
                    "budget {token_budget} < {}: using {compact} instead of {format}",
                    self.config.compact_threshold_tokens
                );
                self.create(compact)
            }
            _ => self.create(format),
        }
    }

    /// Render through [`select`](Self::select)
    pub fn render(&self, request: &ContextRequest, data: &ContextData) -> Result<ContextResponse> {
        let adapter = self.select(&request.format, request.token_budget)?;
        self.respond(adapter.as_ref(), request, data)
    }

    /// Render through [`create`](Self::create): no compact substitution
    pub fn render_exact(&self, request: &ContextRequest, data: &ContextData) -> Result<ContextResponse> {
        let adapter = self.create(&request.format)?;
        self.respond(adapter.as_ref(), request, data)
    }

    fn respond(
        &self,
        adapter: &dyn FormatAdapter,
        request: &ContextRequest,
        data: &ContextData,
    ) -> Result<ContextResponse> {
        let mut warnings = Vec::new();
        let (prepared, truncated) =
            apply_options(data, &request.options, self.config.max_code_lines_per_component);

        let related = prepared
            .components
            .iter()
            .filter(|c| c.component.id != prepared.focus_id)
            .count();

        let mut slice = prepared.clone();
        let mut content = adapter.render(&slice, request)?;
        let mut kept = related;
        if estimate_tokens(&content) > request.token_budget {
            // Largest prefix of related components that fits
            let (mut low, mut high) = (0usize, related);
            let mut best: Option<(ContextData, String)> = None;
            while low < high {
                let mid = (low + high).div_ceil(2);
                let candidate = keep_related(&prepared, mid);
                let rendered = adapter.render(&candidate, request)?;
                if estimate_tokens(&rendered) <= request.token_budget {
                    low = mid;
                    best = Some((candidate, rendered));
                } else {
                    high = mid - 1;
                }
            }
            kept = low;
            match best {
                Some((candidate, rendered)) => {
                    slice = candidate;
                    content = rendered;
                }
                None => {
                    slice = keep_related(&prepared, 0);
                    content = adapter.render(&slice, request)?;
                }
            }
            if kept < related {
                warnings.push(format!(
                    "dropped {} of {related} related components to fit the token budget of {}",
                    related - kept,
                    request.token_budget
                ));
            }
            if estimate_tokens(&content) > request.token_budget {
                warnings.push(format!(
                    "content exceeds the token budget of {} even with only the focus",
                    request.token_budget
                ));
            }
        }
        if truncated > 0 {
            warnings.push(format!(
                "code of {truncated} components cut to {} lines",
                self.config.max_code_lines_per_component
            ));
        }

        let stats = ResponseStats {
            components: slice.components.len(),
            relationships: slice.relationships.len(),
            unresolved: slice.unresolved.len(),
            files: slice.files().len(),
            rules: slice.rules.len(),
            flows: slice.flows.len(),
            dropped_components: related - kept,
            truncated_components: truncated,
        };
        log::debug!(
            "rendered {} as {}: {} components, {} tokens",
            request.entity_id,
            adapter.name(),
            stats.components,
            estimate_tokens(&content)
        );

        let (components, relationships) = if adapter.is_structured() {
            let components = slice.components.iter().map(|c| c.component.clone()).collect();
            let relationships = slice
                .relationships
                .iter()
                .chain(slice.unresolved.iter())
                .cloned()
                .collect();
            (Some(components), Some(relationships))
        } else {
            (None, None)
        };

        Ok(ContextResponse {
            token_count: estimate_tokens(&content),
            content,
            format: adapter.name().to_string(),
            stats,
            warnings,
            components,
            relationships,
        })
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtins(FormatConfig::default())
    }
}

/// Apply request flags and the code line limit. Returns the number of truncated components.
fn apply_options(
    data: &ContextData,
    options: &ContextOptions,
    max_code_lines: usize,
) -> (ContextData, usize) {
    let mut prepared = data.clone();
    let mut truncated = 0;
    for scored in &mut prepared.components {
        let component = &mut scored.component;
        if !options.include_source {
            component.code.clear();
        } else if !component.is_root() {
            let (code, cut) = truncate_code(&component.code, max_code_lines);
            if cut {
                component.code = code;
                truncated += 1;
            }
        }
        if !options.include_documentation {
            component.metadata.documentation = None;
        }
    }
    if !options.include_relationships {
        prepared.relationships.clear();
        prepared.unresolved.clear();
    }
    if !options.include_rules {
        prepared.rules.clear();
    }
    if !options.include_notes {
        prepared.notes.clear();
    }
    if !options.include_tasks {
        prepared.tasks.clear();
    }
    (prepared, truncated)
}

/// Focus plus the first `keep` related components, with edges among them
fn keep_related(data: &ContextData, keep: usize) -> ContextData {
    let mut related = 0;
    let components: Vec<_> = data
        .components
        .iter()
        .filter(|c| {
            if c.component.id == data.focus_id {
                return true;
            }
            related += 1;
            related <= keep
        })
        .cloned()
        .collect();
    let ids: HashSet<&str> = components.iter().map(|c| c.component.id.as_str()).collect();
    let relationships = data
        .relationships
        .iter()
        .filter(|r| {
            ids.contains(r.source_id.as_str())
                && r.target.resolved_id().is_some_and(|t| ids.contains(t))
        })
        .cloned()
        .collect();
    let unresolved = data
        .unresolved
        .iter()
        .filter(|r| ids.contains(r.source_id.as_str()))
        .cloned()
        .collect();
    let component_ids: HashSet<String> = ids.iter().map(|id| id.to_string()).collect();
    let notes = data
        .notes
        .iter()
        .filter(|n| n.component_id.as_ref().map_or(true, |id| component_ids.contains(id)))
        .cloned()
        .collect();
    let tasks = data
        .tasks
        .iter()
        .filter(|t| t.component_id.as_ref().map_or(true, |id| component_ids.contains(id)))
        .cloned()
        .collect();
    ContextData {
        focus_id: data.focus_id.clone(),
        components,
        relationships,
        unresolved,
        rules: data.rules.clone(),
        flows: data.flows.clone(),
        notes,
        tasks,
    }
}
