use super::{endpoint_label, flow_steps, location_label, relevance_label, target_label, FormatAdapter};
use crate::error::Result;
use crate::request::{ContextData, ContextRequest};
use std::fmt::Write;

/// Plain text for terminals
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAdapter;

impl FormatAdapter for TextAdapter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn description(&self) -> &'static str {
        "Plain text with indented code"
    }

    fn render(&self, data: &ContextData, request: &ContextRequest) -> Result<String> {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "CONTEXT {} (depth {}, {} components)",
            request.entity_id,
            request.depth,
            data.components.len()
        );

        for scored in &data.components {
            let c = &scored.component;
            let marker = if c.id == data.focus_id { "*" } else { "-" };
            let _ = writeln!(
                out,
                "\n{marker} {} [{}] {} {}",
                c.name,
                c.component_type,
                location_label(c),
                relevance_label(scored.relevance)
            );
            if let Some(doc) = &c.metadata.documentation {
                for line in doc.lines() {
                    let _ = writeln!(out, "  # {line}");
                }
            }
            if !c.is_root() {
                for line in c.code.lines() {
                    let _ = writeln!(out, "    {line}");
                }
            }
        }

        if !data.relationships.is_empty() || !data.unresolved.is_empty() {
            let _ = writeln!(out, "\nRELATIONSHIPS");
            for rel in data.relationships.iter().chain(data.unresolved.iter()) {
                let _ = writeln!(
                    out,
                    "  {} {} {} {}",
                    endpoint_label(data, &rel.source_id),
                    rel.relationship_type,
                    target_label(data, rel),
                    relevance_label(rel.metadata.confidence)
                );
            }
        }

        if !data.rules.is_empty() {
            let _ = writeln!(out, "\nRULES");
            for rule in &data.rules {
                let guidance = rule.guidance.as_deref().unwrap_or_default();
                let _ = writeln!(out, "  {}: {guidance}", rule.rule_type);
            }
        }

        if !data.flows.is_empty() {
            let _ = writeln!(out, "\nFLOWS");
            for flow in &data.flows {
                let _ = writeln!(out, "  {}: {}", flow.name, flow_steps(data, &flow.steps).join(" -> "));
            }
        }

        if !data.notes.is_empty() || !data.tasks.is_empty() {
            let _ = writeln!(out, "\nNOTES");
            for note in &data.notes {
                let _ = writeln!(out, "  note: {}", note.text);
            }
            for task in &data.tasks {
                let _ = writeln!(out, "  {}: {}", task.status, task.title);
            }
        }

        Ok(out)
    }
}
