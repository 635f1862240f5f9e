use anyhow::Result;
use ta_config::Config;
use ta_engine::{build_auditor, BatchOptions, FileOutcome, Pipeline};

use crate::cli::BatchArgs;

pub async fn handle(args: BatchArgs, config: &Config) -> Result<()> {
    let mut pipeline = if args.no_cache {
        let mut uncached = config.clone();
        uncached.ai.enable_caching = false;
        Pipeline::from_config(&uncached)?
    } else {
        Pipeline::from_config(config)?
    };
    if args.audit {
        let provider = args.provider.unwrap_or(config.ai.provider);
        pipeline = pipeline.with_auditor(build_auditor(config, provider, None)?);
    }

    let options = BatchOptions {
        pattern: args.pattern,
        recursive: args.recursive,
        out_dir: args.out_dir,
        audit: args.audit,
    };
    let summary = pipeline.redact_dir(&args.dir, &options).await?;

    for file in &summary.files {
        match file {
            FileOutcome::Processed {
                path,
                statistics,
                score,
                ..
            } => {
                let score = score.map(|s| format!(", score {s}%")).unwrap_or_default();
                println!(
                    "✓ {} ({} redactions{score})",
                    path.display(),
                    statistics.total()
                );
            }
            FileOutcome::Failed { path, error } => println!("✗ {}: {error}", path.display()),
        }
    }

    println!(
        "\n{} processed, {} failed, {} redactions in {:.1}s",
        summary.succeeded(),
        summary.failed(),
        summary.totals.total(),
        summary.elapsed.as_secs_f64()
    );
    if let Some(avg) = summary.average_score() {
        println!("Average score: {avg:.1}%");
    }
    for issue in summary.common_issues() {
        println!("! {issue}");
    }

    Ok(())
}
