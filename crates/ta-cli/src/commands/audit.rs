use anyhow::Result;
use ta_auditor::{render_text, AuditError, ReportWriter};
use ta_config::Config;
use ta_engine::{build_auditor, Pipeline};

use crate::cli::AuditArgs;

pub async fn handle(args: AuditArgs, config: &Config) -> Result<()> {
    let provider = args.provider.unwrap_or(config.ai.provider);
    let auditor = build_auditor(config, provider, args.model.as_deref())?;
    let pipeline = if args.no_cache {
        let mut uncached = config.clone();
        uncached.ai.enable_caching = false;
        Pipeline::from_config(&uncached)?
    } else {
        Pipeline::from_config(config)?
    }
    .with_auditor(auditor);

    let report = match pipeline.audit_file(&args.file).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(audit_error) = e.downcast_ref::<AuditError>() {
                eprintln!("✗ {audit_error}");
                eprintln!("  Hint: {}", audit_error.hint());
            }
            return Err(e);
        }
    };

    let saved = if args.save {
        let writer = ReportWriter::new(&config.paths.reports_dir);
        let prefix = format!("{provider}_audit");
        let path = if args.json {
            writer.save_json(&report, &prefix)?
        } else {
            writer.save_text(&report, &prefix)?
        };
        Some(path)
    } else {
        None
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report, saved.as_deref()));
    }

    if report.prompt_truncated {
        eprintln!("! Ticket text was truncated to fit the {} token budget", report.model);
    }

    Ok(())
}
