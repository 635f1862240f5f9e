//! Saved audit reports

use std::path::{Path, PathBuf};

use ta_core::{AuditReport, Result};
use time::macros::format_description;

const RULE_WIDTH: usize = 60;

/// Writes reports into one directory as `{prefix}_{YYYYmmdd_HHMMSS}.txt`
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn stamp(report: &AuditReport) -> String {
        report
            .created_at
            .format(format_description!("[year][month][day]_[hour][minute][second]"))
            .unwrap_or_else(|_| report.created_at.unix_timestamp().to_string())
    }

    /// First free `{prefix}_{stamp}[_n].{ext}` in the directory
    fn target(&self, prefix: &str, stamp: &str, ext: &str) -> PathBuf {
        let mut path = self.dir.join(format!("{prefix}_{stamp}.{ext}"));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{prefix}_{stamp}_{n}.{ext}"));
            n += 1;
        }
        path
    }

    pub fn save_text(&self, report: &AuditReport, prefix: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.target(prefix, &Self::stamp(report), "txt");
        std::fs::write(&path, render_text(report, Some(&path)))?;
        tracing::info!(path = %path.display(), "Saved audit report");
        Ok(path)
    }

    pub fn save_json(&self, report: &AuditReport, prefix: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.target(prefix, &Self::stamp(report), "json");
        std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
        tracing::info!(path = %path.display(), "Saved audit report");
        Ok(path)
    }
}

/// Score line in the `passed/applicable (pct%)` form
pub fn score_line(report: &AuditReport) -> String {
    let summary = &report.summary;
    match summary.compliance_percent() {
        Some(pct) => format!(
            "{}/{} ({}%), {} N/A",
            summary.passed,
            summary.passed + summary.failed,
            pct,
            summary.not_applicable
        ),
        None => "Score not available".to_string(),
    }
}

/// Plain-text report: header, timestamp, provider, body
pub fn render_text(report: &AuditReport, saved_to: Option<&Path>) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let generated = report
        .created_at
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC"))
        .unwrap_or_default();

    let mut out = String::new();
    out.push_str("=== INCIDENT AUDIT REPORT (16-QUESTION FRAMEWORK) ===\n");
    out.push_str(&format!("Generated: {generated}\n"));
    out.push_str(&format!(
        "Audit Type: {}\n",
        report.provider.to_uppercase()
    ));
    out.push_str(&format!("Model: {}\n", report.model));
    out.push_str(&format!("Source: {}\n", report.source_path));
    out.push_str(&format!(
        "Redactions: {} ({})\n",
        report.redaction.total(),
        report
            .redaction
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(c, n)| format!("{c}={n}"))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    if report.prompt_truncated {
        out.push_str("Prompt: truncated to fit the model's token budget\n");
    }
    out.push_str(&format!("Score: {}\n", score_line(report)));
    out.push_str(&rule);
    out.push_str("\n\n");
    out.push_str(report.raw_response.trim_end());
    out.push_str("\n\n");
    out.push_str(&rule);
    out.push('\n');
    if let Some(path) = saved_to {
        out.push_str(&format!("Report saved to: {}\n", path.display()));
    }
    out
}
