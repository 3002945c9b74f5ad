use super::display_path;
use crate::config::AppConfig;
use crate::scanner::FileScanner;
use crate::ContextArgs;
use anyhow::{Context, Result};
use context_code_parser::{FileExtraction, ParserRegistry};
use context_format::{AdapterRegistry, ContextData, ContextOptions, ContextRequest};
use context_graph::{merge_extractions, ContextAssembler};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) fn run_context(args: ContextArgs, config: &AppConfig) -> Result<()> {
    let parsers = ParserRegistry::new(config.parser.clone())?;
    let formats = AdapterRegistry::new(config.format.clone())?;

    let extractions = collect_extractions(&args.paths, &parsers, config)?;
    if extractions.is_empty() {
        anyhow::bail!("No supported source files found");
    }
    let graph = merge_extractions(extractions)?;
    log::info!(
        "Graph: {} components, {} edges, {} unresolved",
        graph.node_count(),
        graph.edge_count(),
        graph.unresolved.len()
    );

    let assembler = ContextAssembler::new(graph);
    let assembled = assembler
        .assemble(&args.entity, args.depth)
        .with_context(|| format!("Cannot build context for '{}'", args.entity))?;
    let data = ContextData::from_assembled(&assembled)
        .with_rules(config.rules.clone())
        .with_flows(config.flows.clone());

    let options = ContextOptions {
        include_source: !args.no_source,
        include_relationships: !args.no_relationships,
        include_metadata: args.metadata,
        ..ContextOptions::default()
    };
    let request = ContextRequest::new(args.entity.clone())
        .depth(args.depth)
        .token_budget(args.budget.unwrap_or(config.format.default_token_budget))
        .format(
            args.format
                .clone()
                .unwrap_or_else(|| config.format.default_format.clone()),
        )
        .options(options);

    let response = if args.verbose_format {
        formats.render_exact(&request, &data)?
    } else {
        formats.render(&request, &data)?
    };
    for warning in &response.warnings {
        log::warn!("{warning}");
    }
    log::info!(
        "Rendered {} components as {} (~{} tokens)",
        response.stats.components,
        response.format,
        response.token_count
    );

    print!("{}", response.content);
    if !response.content.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Parse every supported file under `paths`. Directory entries are named relative to the
/// directory; file arguments keep the path as given.
fn collect_extractions(
    paths: &[PathBuf],
    parsers: &ParserRegistry,
    config: &AppConfig,
) -> Result<Vec<FileExtraction>> {
    let mut files: Vec<(PathBuf, String)> = Vec::new();
    for path in paths {
        if path.is_dir() {
            let scanned = FileScanner::new(path, parsers)
                .max_file_bytes(config.parser.max_file_bytes)
                .scan();
            for file in scanned {
                let relative = file.strip_prefix(path).unwrap_or(&file).to_path_buf();
                let name = display_path(&relative);
                files.push((file, name));
            }
        } else if path.is_file() {
            files.push((path.clone(), display_path(path)));
        } else {
            anyhow::bail!("Path not found: {}", path.display());
        }
    }

    let mut seen = HashSet::new();
    let mut extractions = Vec::with_capacity(files.len());
    for (file, name) in files {
        if !seen.insert(name.clone()) {
            log::debug!("{name} listed twice, parsing once");
            continue;
        }
        if !parsers.supports_path(&file) {
            log::warn!("Skipping unsupported file {}", file.display());
            continue;
        }
        match read_and_parse(&file, &name, parsers) {
            Ok(extraction) => extractions.push(extraction),
            Err(e) => log::warn!("Skipping {}: {e:#}", file.display()),
        }
    }
    Ok(extractions)
}

fn read_and_parse(file: &Path, name: &str, parsers: &ParserRegistry) -> Result<FileExtraction> {
    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    Ok(parsers.parse_file(&content, name)?)
}
