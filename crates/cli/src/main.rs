use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use config::AppConfig;
use std::path::PathBuf;

mod command;
mod config;
mod scanner;

#[derive(Parser)]
#[command(name = "context-map")]
#[command(about = "Structural code index and context rendering for AI agents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (default: ./context-map.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one file and print its components, relationships and diagnostics
    Parse(ParseArgs),

    /// Build the graph for files/directories and render the context of one entity
    Context(ContextArgs),

    /// Expand an AICCL document into a readable report
    Expand(ExpandArgs),

    /// List output formats
    Formats,
}

#[derive(Args)]
pub(crate) struct ParseArgs {
    /// File to parse
    pub file: PathBuf,

    /// Output JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct ContextArgs {
    /// Files or directories to index
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Component id or name to center the context on
    #[arg(long, short = 'e')]
    pub entity: String,

    /// Traversal depth
    #[arg(long, short = 'd', default_value_t = 2)]
    pub depth: usize,

    /// Token budget (default: from config)
    #[arg(long, short = 'b')]
    pub budget: Option<usize>,

    /// Output format (default: from config)
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Leave component source out
    #[arg(long)]
    pub no_source: bool,

    /// Leave relationships out
    #[arg(long)]
    pub no_relationships: bool,

    /// Include modifiers, decorators and export info
    #[arg(long)]
    pub metadata: bool,

    /// Use exactly the requested format, even under a small budget
    #[arg(long)]
    pub verbose_format: bool,
}

#[derive(Args)]
pub(crate) struct ExpandArgs {
    /// AICCL file (`-` for stdin)
    pub file: PathBuf,

    /// Output the decoded document as JSON
    #[arg(long)]
    pub json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse(args) => command::run_parse(args, &config)?,
        Commands::Context(args) => command::run_context(args, &config)?,
        Commands::Expand(args) => command::run_expand(args)?,
        Commands::Formats => command::run_formats(&config)?,
    }

    Ok(())
}
