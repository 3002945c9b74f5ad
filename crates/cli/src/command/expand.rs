use crate::ExpandArgs;
use anyhow::{Context, Result};
use context_format::aiccl::{decode, render_report};
use std::fs;
use std::io::{self, Read};

pub(crate) fn run_expand(args: ExpandArgs) -> Result<()> {
    let text = if args.file.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read AICCL from stdin")?;
        buffer
    } else {
        fs::read_to_string(&args.file)
            .with_context(|| format!("Failed to read {}", args.file.display()))?
    };
    if text.trim().is_empty() {
        anyhow::bail!("AICCL document is empty");
    }

    let document = decode(&text);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print!("{}", render_report(&document));
    }
    Ok(())
}
