use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use ta_config::Config;
use ta_core::RedactionStatistics;
use ta_engine::{Pipeline, RedactionOutcome};

use super::format_statistics;
use crate::cli::RedactArgs;

#[derive(Serialize)]
struct RedactionJson<'a> {
    source: &'a str,
    pages: usize,
    text: &'a str,
    statistics: &'a RedactionStatistics,
    total: usize,
}

pub async fn handle(args: RedactArgs, config: &Config) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let outcome = pipeline.redact_file(&args.file).await?;

    if let Some(out) = &args.out {
        write_output(out, &outcome.redacted.text)?;
        eprintln!("✓ Redacted text written to {}", out.display());
    }

    if args.copy {
        copy_to_clipboard(&outcome.redacted.text)?;
        eprintln!("✓ Redacted text copied to clipboard");
    }

    if args.json {
        println!("{}", to_json(&outcome)?);
    } else if args.out.is_none() && !args.copy {
        print!("{}", outcome.redacted.text);
        if !outcome.redacted.text.ends_with('\n') {
            println!();
        }
    }

    if args.stats && !args.json {
        eprintln!(
            "\nRedactions for {} ({} pages):",
            outcome.source.path, outcome.source.page_count
        );
        eprint!("{}", format_statistics(&outcome.redacted.statistics));
    }

    Ok(())
}

fn to_json(outcome: &RedactionOutcome) -> Result<String> {
    let json = RedactionJson {
        source: &outcome.source.path,
        pages: outcome.source.page_count,
        text: &outcome.redacted.text,
        statistics: &outcome.redacted.statistics,
        total: outcome.redacted.total_redactions(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("copying to clipboard")
}
