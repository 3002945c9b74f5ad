use super::decoder::ExpandedDocument;
use std::fmt::Write;

/// Human-readable report of a decoded document
pub fn render_report(doc: &ExpandedDocument) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== AICCL CONTEXT ===");
    let _ = writeln!(
        out,
        "files: {}  systems: {}  relationships: {}  rules: {}  flows: {}",
        doc.files.len(),
        doc.systems.len(),
        doc.relationships.len(),
        doc.rules.len(),
        doc.flows.len()
    );

    if !doc.mappings.is_empty() {
        let _ = writeln!(out, "\n--- Mappings ---");
        for (short, full) in doc.mappings.entries() {
            let _ = writeln!(out, "{short:>6} = {full}");
        }
    }

    if !doc.systems.is_empty() {
        let _ = writeln!(out, "\n--- Components ---");
        for system in &doc.systems {
            let kind = system.component_type.as_deref().unwrap_or("component");
            let _ = write!(out, "\n[{}] {} ({kind})", system.id, system.name);
            if let Some(relevance) = system.relevance {
                let _ = write!(out, " relevance {relevance}%");
            }
            out.push('\n');
            if let Some(file) = &system.file {
                match system.lines {
                    Some((start, end)) => {
                        let _ = writeln!(out, "  at {file}:{start}-{end}");
                    }
                    None => {
                        let _ = writeln!(out, "  at {file}");
                    }
                }
            }
            if let Some(summary) = &system.summary {
                let _ = writeln!(out, "  {summary}");
            }
            if !system.signature.is_empty() {
                let _ = writeln!(out, "  signature: {}", system.signature);
            }
            if let Some(code) = &system.code {
                let _ = writeln!(out, "  code:");
                for line in code.lines() {
                    let _ = writeln!(out, "    {line}");
                }
            }
        }
    }

    if !doc.relationships.is_empty() {
        let _ = writeln!(out, "\n--- Relationships ---");
        for rel in &doc.relationships {
            let _ = write!(
                out,
                "{} --{}--> {}",
                rel.source, rel.relationship_type, rel.target
            );
            if let Some(confidence) = rel.confidence {
                let _ = write!(out, " ({confidence}%)");
            }
            if rel.target_ref.starts_with('?') {
                out.push_str(" [unresolved]");
            }
            out.push('\n');
        }
    }

    if !doc.rules.is_empty() {
        let _ = writeln!(out, "\n--- Rules ---");
        for rule in &doc.rules {
            let _ = write!(out, "{} {}", rule.id, rule.rule_type);
            if let Some(confidence) = rule.confidence {
                let _ = write!(out, " ({confidence}%)");
            }
            out.push('\n');
            if let Some(guidance) = &rule.guidance {
                let _ = writeln!(out, "  {guidance}");
            }
            if let Some(why) = &rule.why {
                let _ = writeln!(out, "  why: {why}");
            }
        }
    }

    if !doc.flows.is_empty() {
        let _ = writeln!(out, "\n--- Flows ---");
        for flow in &doc.flows {
            let _ = writeln!(out, "{}: {}", flow.name, flow.steps.join(" -> "));
        }
    }

    if !doc.warnings.is_empty() {
        let _ = writeln!(out, "\n--- Warnings ---");
        for warning in &doc.warnings {
            let _ = writeln!(out, "- {warning}");
        }
    }

    out
}
