use super::{
    endpoint_label, flow_steps, location_label, metadata_line, relevance_label, target_label,
    FormatAdapter,
};
use crate::error::Result;
use crate::request::{ContextData, ContextRequest};
use context_code_parser::Language;
use std::fmt::Write;

/// Markdown output. The compact variant keeps one line per component and no code fences.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownAdapter {
    compact: bool,
}

impl MarkdownAdapter {
    pub fn full() -> Self {
        Self { compact: false }
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }
}

fn fence_tag(language: Language) -> &'static str {
    match language {
        Language::Unknown => "",
        other => other.as_str(),
    }
}

impl FormatAdapter for MarkdownAdapter {
    fn name(&self) -> &'static str {
        if self.compact {
            "markdown-compact"
        } else {
            "markdown"
        }
    }

    fn description(&self) -> &'static str {
        if self.compact {
            "Markdown outline with signatures only"
        } else {
            "Markdown with documentation and code blocks"
        }
    }

    fn render(&self, data: &ContextData, request: &ContextRequest) -> Result<String> {
        let mut out = String::new();
        let title = data
            .focus()
            .map(|f| f.name.as_str())
            .unwrap_or(request.entity_id.as_str());
        let _ = writeln!(out, "# Context: {title}\n");

        if let Some(focus) = data.focus() {
            let _ = writeln!(
                out,
                "`{}` in `{}`\n",
                focus.component_type,
                location_label(focus)
            );
        }

        let _ = writeln!(out, "## Components\n");
        for scored in &data.components {
            let c = &scored.component;
            if self.compact {
                let _ = writeln!(
                    out,
                    "- **{}** ({}, {}) `{}` {}",
                    c.name,
                    c.component_type,
                    relevance_label(scored.relevance),
                    location_label(c),
                    c.signature()
                );
                continue;
            }

            let _ = writeln!(
                out,
                "### {} (`{}`, relevance {})\n",
                c.name,
                c.component_type,
                relevance_label(scored.relevance)
            );
            let _ = writeln!(out, "`{}`\n", location_label(c));
            if let Some(doc) = &c.metadata.documentation {
                let _ = writeln!(out, "{doc}\n");
            }
            if request.options.include_metadata {
                if let Some(line) = metadata_line(c) {
                    let _ = writeln!(out, "_{line}_\n");
                }
            }
            if !c.is_root() && !c.code.is_empty() {
                let _ = writeln!(out, "```{}\n{}\n```\n", fence_tag(c.language), c.code.trim_end());
            }
        }

        if !data.relationships.is_empty() || !data.unresolved.is_empty() {
            let _ = writeln!(out, "\n## Relationships\n");
            for rel in data.relationships.iter().chain(data.unresolved.iter()) {
                let source = endpoint_label(data, &rel.source_id);
                let target = target_label(data, rel);
                if self.compact {
                    let _ = writeln!(out, "- {source} -{}-> {target}", rel.relationship_type);
                } else {
                    let _ = writeln!(
                        out,
                        "- `{source}` {} `{target}` ({})",
                        rel.relationship_type,
                        relevance_label(rel.metadata.confidence)
                    );
                }
            }
        }

        if !data.rules.is_empty() {
            let _ = writeln!(out, "\n## Rules\n");
            for rule in &data.rules {
                let _ = write!(out, "- **{}**", rule.rule_type);
                if let Some(guidance) = &rule.guidance {
                    let _ = write!(out, ": {guidance}");
                }
                if !self.compact {
                    if let Some(why) = &rule.why {
                        let _ = write!(out, " (why: {why})");
                    }
                }
                out.push('\n');
            }
        }

        if !data.flows.is_empty() {
            let _ = writeln!(out, "\n## Flows\n");
            for flow in &data.flows {
                let _ = writeln!(
                    out,
                    "- **{}**: {}",
                    flow.name,
                    flow_steps(data, &flow.steps).join(" → ")
                );
            }
        }

        if !data.notes.is_empty() {
            let _ = writeln!(out, "\n## Notes\n");
            for note in &data.notes {
                let _ = writeln!(out, "- {}", note.text);
            }
        }

        if !data.tasks.is_empty() {
            let _ = writeln!(out, "\n## Tasks\n");
            for task in &data.tasks {
                let mark = if task.status == "done" { "x" } else { " " };
                let _ = writeln!(out, "- [{mark}] {}", task.title);
            }
        }

        Ok(out.trim_end().to_string() + "\n")
    }
}
