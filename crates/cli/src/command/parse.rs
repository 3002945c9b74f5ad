use super::display_path;
use crate::config::AppConfig;
use crate::ParseArgs;
use anyhow::{Context, Result};
use context_code_parser::{Component, FileExtraction, ParserRegistry, RelationshipTarget, Severity};
use std::collections::HashMap;
use std::fmt::Write;
use std::fs;

pub(crate) fn run_parse(args: ParseArgs, config: &AppConfig) -> Result<()> {
    let parsers = ParserRegistry::new(config.parser.clone())?;
    let content = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let file_path = display_path(&args.file);
    let extraction = parsers
        .parse_file(&content, &file_path)
        .with_context(|| format!("Cannot parse {file_path}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
    } else {
        print!("{}", render_extraction(&extraction));
    }
    Ok(())
}

fn render_extraction(extraction: &FileExtraction) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}): {} components, {} relationships, {} diagnostics",
        extraction.file_path,
        extraction.language,
        extraction.components.len(),
        extraction.relationships.len(),
        extraction.diagnostics.len()
    );

    let by_id: HashMap<&str, &Component> = extraction
        .components
        .iter()
        .map(|c| (c.id.as_str(), c))
        .collect();
    let depth_of = |component: &Component| {
        let mut depth = 0;
        let mut parent = component.parent_id.as_deref();
        while let Some(id) = parent {
            depth += 1;
            parent = by_id.get(id).and_then(|p| p.parent_id.as_deref());
            if depth > extraction.components.len() {
                break;
            }
        }
        depth
    };

    let _ = writeln!(out, "\nComponents");
    for component in &extraction.components {
        let _ = writeln!(
            out,
            "{}{} {} [{}-{}]",
            "  ".repeat(depth_of(component) + 1),
            component.component_type,
            component.name,
            component.location.start_line,
            component.location.end_line
        );
    }

    if !extraction.relationships.is_empty() {
        let _ = writeln!(out, "\nRelationships");
        let name_of = |id: &str| by_id.get(id).map_or(id.to_string(), |c| c.name.clone());
        for rel in &extraction.relationships {
            let target = match &rel.target {
                RelationshipTarget::Resolved(id) => name_of(id),
                RelationshipTarget::Pending(spec) => format!("?{spec}"),
            };
            let _ = writeln!(
                out,
                "  {} {} {}",
                name_of(&rel.source_id),
                rel.relationship_type,
                target
            );
        }
    }

    if !extraction.diagnostics.is_empty() {
        let _ = writeln!(out, "\nDiagnostics");
        for diagnostic in &extraction.diagnostics {
            let severity = match diagnostic.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            let _ = writeln!(out, "  {severity} line {}: {}", diagnostic.line, diagnostic.message);
        }
    }
    out
}
