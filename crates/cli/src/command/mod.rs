mod context;
mod expand;
mod parse;

pub(crate) use context::run_context;
pub(crate) use expand::run_expand;
pub(crate) use parse::run_parse;

use crate::config::AppConfig;
use anyhow::Result;
use context_format::AdapterRegistry;
use std::path::Path;

pub(crate) fn run_formats(config: &AppConfig) -> Result<()> {
    let registry = AdapterRegistry::new(config.format.clone())?;
    for name in registry.names() {
        let adapter = registry.create(name)?;
        println!("{name:<18} {}", adapter.description());
    }
    Ok(())
}

/// Forward-slash path string for component ids
pub(crate) fn display_path(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    text.strip_prefix("./").map(str::to_string).unwrap_or(text)
}
