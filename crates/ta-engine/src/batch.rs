//! Directory batch runs

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ta_auditor::render_text;
use ta_core::{audit, AuditStatus, RedactionStatistics};
use ta_sources::collect_files;

use crate::Pipeline;

const SUMMARY_FILE: &str = "batch_summary.txt";
const DEFAULT_OUT_DIR: &str = "redacted";
const REDACTED_PREFIX: &str = "redacted_";
const AUDIT_PREFIX: &str = "audit_";

/// Share of audited files a question must fail in to count as common
const COMMON_ISSUE_PERCENT: u32 = 20;
const MAX_COMMON_ISSUES: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// File-name glob, e.g. `INC*.pdf`
    pub pattern: Option<String>,
    pub recursive: bool,
    /// Defaults to `redacted/` under the input directory
    pub out_dir: Option<PathBuf>,
    /// Also audit every redacted file; needs an auditor on the pipeline
    pub audit: bool,
}

#[derive(Debug, Clone)]
pub enum FileOutcome {
    Processed {
        path: PathBuf,
        redacted_to: PathBuf,
        statistics: RedactionStatistics,
        audit_to: Option<PathBuf>,
        score: Option<u32>,
        /// Question numbers the audit answered FAIL
        failed_questions: Vec<u8>,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Processed { path, .. } | FileOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FileOutcome::Processed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub files: Vec<FileOutcome>,
    pub totals: RedactionStatistics,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    /// Mean compliance percentage over audited files
    pub fn average_score(&self) -> Option<f64> {
        let scores: Vec<u32> = self
            .files
            .iter()
            .filter_map(|f| match f {
                FileOutcome::Processed { score, .. } => *score,
                FileOutcome::Failed { .. } => None,
            })
            .collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64)
    }

    /// Questions failing in at least 20% of audited files, worst first, at most three
    pub fn common_issues(&self) -> Vec<String> {
        let mut audited = 0u32;
        let mut fail_counts: BTreeMap<u8, u32> = BTreeMap::new();
        for file in &self.files {
            if let FileOutcome::Processed {
                audit_to: Some(_),
                failed_questions,
                ..
            } = file
            {
                audited += 1;
                for &number in failed_questions {
                    *fail_counts.entry(number).or_default() += 1;
                }
            }
        }
        if audited == 0 {
            return Vec::new();
        }

        let mut issues: Vec<(u8, u32)> = fail_counts
            .into_iter()
            .map(|(number, count)| {
                let pct = (f64::from(count) / f64::from(audited) * 100.0).round() as u32;
                (number, pct)
            })
            .filter(|&(_, pct)| pct >= COMMON_ISSUE_PERCENT)
            .collect();
        // Stable sort keeps question order among ties
        issues.sort_by(|a, b| b.1.cmp(&a.1));
        issues
            .into_iter()
            .take(MAX_COMMON_ISSUES)
            .map(|(number, pct)| {
                let title = audit::question(number)
                    .map(|q| q.title.to_string())
                    .unwrap_or_else(|| format!("Question {number}"));
                format!("{title} failing in {pct}% of files")
            })
            .collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("BATCH PROCESSING SUMMARY\n========================\n\n");
        out.push_str(&format!("Total Files: {}\n", self.files.len()));
        out.push_str(&format!("Successful: {}\n", self.succeeded()));
        out.push_str(&format!("Failed: {}\n", self.failed()));
        out.push_str(&format!("Total Redactions: {}\n", self.totals.total()));
        if let Some(avg) = self.average_score() {
            out.push_str(&format!("Average Score: {avg:.1}%\n"));
        }
        out.push_str(&format!(
            "Processing Time: {:.1} seconds\n\nCOMMON ISSUES:\n",
            self.elapsed.as_secs_f64()
        ));
        let issues = self.common_issues();
        if issues.is_empty() {
            out.push_str("- No common issues identified\n");
        }
        for issue in issues {
            out.push_str(&format!("- {issue}\n"));
        }
        out.push_str(&format!("\nFILE DETAILS:\n{}\n", "=".repeat(50)));

        for file in &self.files {
            out.push_str(&format!("\nFile: {}\n", file.path().display()));
            match file {
                FileOutcome::Processed {
                    statistics, score, ..
                } => {
                    out.push_str("Status: SUCCESS\n");
                    out.push_str(&format!("Redactions: {}\n", statistics.total()));
                    if let Some(score) = score {
                        out.push_str(&format!("Score: {score}%\n"));
                    }
                }
                FileOutcome::Failed { error, .. } => {
                    out.push_str("Status: ERROR\n");
                    out.push_str(&format!("Error: {error}\n"));
                }
            }
        }
        out
    }
}

impl Pipeline {
    /// Redact (and optionally audit) every supported file under `dir`.
    ///
    /// Writes `redacted_{stem}.txt`, `audit_{stem}.txt` when auditing, and a
    /// `batch_summary.txt`. Stems repeated within a run get a `_n` suffix.
    /// Files the batch itself wrote into the output directory are not inputs.
    /// A failing file is recorded and the run continues.
    pub async fn redact_dir(&self, dir: &Path, options: &BatchOptions) -> Result<BatchSummary> {
        let start = Instant::now();
        if options.audit && self.auditor.is_none() {
            anyhow::bail!("batch audit requested but no auditor is configured");
        }

        let out_dir = options
            .out_dir
            .clone()
            .unwrap_or_else(|| dir.join(DEFAULT_OUT_DIR));
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("creating {}", out_dir.display()))?;

        let files: Vec<PathBuf> =
            collect_files(dir, self.registry(), options.pattern.as_deref(), options.recursive)
                .with_context(|| format!("listing {}", dir.display()))?
                .into_iter()
                .filter(|path| !is_batch_output(path, &out_dir))
                .collect();

        tracing::info!(dir = %dir.display(), files = files.len(), "Starting batch");

        let mut summary = BatchSummary {
            totals: RedactionStatistics::for_categories(self.redactor().enabled_categories()),
            ..Default::default()
        };
        let mut taken = HashSet::new();
        for path in files {
            let stem = claim_stem(&path, &mut taken);
            match self.process_one(&path, &stem, &out_dir, options.audit).await {
                Ok(outcome) => {
                    if let FileOutcome::Processed { statistics, .. } = &outcome {
                        summary.totals.merge(statistics);
                    }
                    summary.files.push(outcome);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping file");
                    summary.files.push(FileOutcome::Failed {
                        path,
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        summary.elapsed = start.elapsed();
        std::fs::write(out_dir.join(SUMMARY_FILE), summary.render())?;
        tracing::info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            redactions = summary.totals.total(),
            "Batch finished"
        );
        Ok(summary)
    }

    async fn process_one(
        &self,
        path: &Path,
        stem: &str,
        out_dir: &Path,
        audit: bool,
    ) -> Result<FileOutcome> {
        let outcome = self.redact_file(path).await?;

        let redacted_to = out_dir.join(format!("{REDACTED_PREFIX}{stem}.txt"));
        std::fs::write(&redacted_to, &outcome.redacted.text)
            .with_context(|| format!("writing {}", redacted_to.display()))?;

        let (audit_to, score, failed_questions) = if audit {
            let report = self.audit(&outcome).await?;
            let target = out_dir.join(format!("{AUDIT_PREFIX}{stem}.txt"));
            std::fs::write(&target, render_text(&report, Some(&target)))?;
            let failed = report
                .results
                .iter()
                .filter(|r| r.status == AuditStatus::Fail)
                .map(|r| r.number)
                .collect();
            (Some(target), report.summary.compliance_percent(), failed)
        } else {
            (None, None, Vec::new())
        };

        Ok(FileOutcome::Processed {
            path: path.to_path_buf(),
            redacted_to,
            statistics: outcome.redacted.statistics,
            audit_to,
            score,
            failed_questions,
        })
    }
}

/// First unused `{stem}[_n]` for `path` within this run
fn claim_stem(path: &Path, taken: &mut HashSet<String>) -> String {
    let base = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let mut stem = base.clone();
    let mut n = 1;
    while taken.contains(&stem) {
        stem = format!("{base}_{n}");
        n += 1;
    }
    taken.insert(stem.clone());
    stem
}

/// A redacted copy, audit or summary previously written into `out_dir`
fn is_batch_output(path: &Path, out_dir: &Path) -> bool {
    let canonical = |p: &Path| std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    let in_out_dir = path
        .parent()
        .is_some_and(|parent| canonical(parent) == canonical(out_dir));
    if !in_out_dir {
        return false;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| {
            name == SUMMARY_FILE
                || name.starts_with(REDACTED_PREFIX)
                || name.starts_with(AUDIT_PREFIX)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ta_auditor::PromptAssembler;
    use ta_core::Category;
    use ta_security::Redactor;
    use ta_sources::ExtractorRegistry;

    fn pipeline() -> Pipeline {
        Pipeline::new(
            ExtractorRegistry::default(),
            Redactor::new(),
            PromptAssembler::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_redact_dir_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Call 555-123-4567").unwrap();
        std::fs::write(dir.path().join("b.txt"), "Mail jane@example.com or 555-987-6543").unwrap();
        std::fs::write(dir.path().join("broken.pdf"), "not a pdf").unwrap();
        std::fs::write(dir.path().join("notes.csv"), "ignored").unwrap();

        let out = dir.path().join("out");
        let options = BatchOptions {
            out_dir: Some(out.clone()),
            ..Default::default()
        };
        let summary = pipeline().redact_dir(dir.path(), &options).await.unwrap();

        assert_eq!(summary.files.len(), 3);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.totals.get(Category::Phone), 2);
        assert_eq!(summary.totals.get(Category::Email), 1);
        assert_eq!(summary.average_score(), None);

        let a = std::fs::read_to_string(out.join("redacted_a.txt")).unwrap();
        assert_eq!(a, "Call [REDACTED PHONE]");
        let report = std::fs::read_to_string(out.join(SUMMARY_FILE)).unwrap();
        assert!(report.contains("Successful: 2\n"));
        assert!(report.contains("Status: ERROR"));
    }

    #[tokio::test]
    async fn test_audit_needs_auditor() {
        let dir = tempfile::tempdir().unwrap();
        let options = BatchOptions {
            audit: true,
            ..Default::default()
        };
        assert!(pipeline().redact_dir(dir.path(), &options).await.is_err());
    }

    #[tokio::test]
    async fn test_pattern_filters_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("INC1.txt"), "John Smith").unwrap();
        std::fs::write(dir.path().join("other.txt"), "John Smith").unwrap();

        let options = BatchOptions {
            pattern: Some("INC*".to_string()),
            ..Default::default()
        };
        let summary = pipeline().redact_dir(dir.path(), &options).await.unwrap();
        assert_eq!(summary.files.len(), 1);
        let out = dir.path().join(DEFAULT_OUT_DIR);
        assert!(out.join("redacted_INC1.txt").exists());
        assert!(!out.join("redacted_other.txt").exists());
        assert!(!dir.path().join("redacted_INC1.txt").exists());
    }

    #[tokio::test]
    async fn test_same_stem_gets_distinct_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("INC1.txt"), "Call 555-123-4567").unwrap();
        std::fs::write(dir.path().join("INC1.md"), "Mail jane@example.com").unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();
        std::fs::write(dir.path().join("archive").join("INC1.txt"), "Plain note").unwrap();

        let options = BatchOptions {
            recursive: true,
            ..Default::default()
        };
        let summary = pipeline().redact_dir(dir.path(), &options).await.unwrap();
        assert_eq!(summary.succeeded(), 3);

        let targets: HashSet<PathBuf> = summary
            .files
            .iter()
            .filter_map(|f| match f {
                FileOutcome::Processed { redacted_to, .. } => Some(redacted_to.clone()),
                FileOutcome::Failed { .. } => None,
            })
            .collect();
        assert_eq!(targets.len(), 3);

        let out = dir.path().join(DEFAULT_OUT_DIR);
        let mut bodies: Vec<String> = ["redacted_INC1.txt", "redacted_INC1_1.txt", "redacted_INC1_2.txt"]
            .iter()
            .map(|name| std::fs::read_to_string(out.join(name)).unwrap())
            .collect();
        bodies.sort();
        assert_eq!(
            bodies,
            vec!["Call [REDACTED PHONE]", "Mail [REDACTED EMAIL]", "Plain note"]
        );
    }

    #[tokio::test]
    async fn test_rerun_skips_own_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("INC1.txt"), "Call 555-123-4567").unwrap();

        let recursive = BatchOptions {
            recursive: true,
            ..Default::default()
        };
        let first = pipeline().redact_dir(dir.path(), &recursive).await.unwrap();
        assert_eq!(first.files.len(), 1);
        let second = pipeline().redact_dir(dir.path(), &recursive).await.unwrap();
        assert_eq!(second.files.len(), 1);
        assert_eq!(second.files[0].path(), dir.path().join("INC1.txt").as_path());

        // Writing next to the inputs
        let in_place = BatchOptions {
            out_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        pipeline().redact_dir(dir.path(), &in_place).await.unwrap();
        let again = pipeline().redact_dir(dir.path(), &in_place).await.unwrap();
        assert_eq!(again.files.len(), 1);
        assert!(!dir.path().join("redacted_redacted_INC1.txt").exists());
        assert!(!dir.path().join("redacted_batch_summary.txt").exists());
    }

    fn audited(path: &str, failed_questions: Vec<u8>) -> FileOutcome {
        FileOutcome::Processed {
            path: PathBuf::from(path),
            redacted_to: PathBuf::from(format!("redacted_{path}")),
            statistics: RedactionStatistics::default(),
            audit_to: Some(PathBuf::from(format!("audit_{path}"))),
            score: Some(50),
            failed_questions,
        }
    }

    #[test]
    fn test_common_issues() {
        let mut summary = BatchSummary::default();
        for i in 0..10 {
            let failed = match i {
                0..=5 => vec![3, 9, 12],
                6 => vec![9, 5],
                7 => vec![7],
                _ => vec![],
            };
            summary.files.push(audited(&format!("INC{i}.txt"), failed));
        }
        summary.files.push(FileOutcome::Failed {
            path: PathBuf::from("broken.pdf"),
            error: "no text".to_string(),
        });

        let title = |n: u8| audit::question(n).unwrap().title;
        let issues = summary.common_issues();
        assert_eq!(
            issues,
            vec![
                format!("{} failing in 70% of files", title(9)),
                format!("{} failing in 60% of files", title(3)),
                format!("{} failing in 60% of files", title(12)),
            ]
        );

        let rendered = summary.render();
        assert!(rendered.contains(&format!("COMMON ISSUES:\n- {}\n", issues[0])));
    }

    #[test]
    fn test_common_issues_threshold() {
        let mut summary = BatchSummary::default();
        for i in 0..10 {
            let failed = if i < 2 { vec![4] } else if i == 2 { vec![6] } else { vec![] };
            summary.files.push(audited(&format!("INC{i}.txt"), failed));
        }
        let issues = summary.common_issues();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].ends_with("failing in 20% of files"));

        let unaudited = BatchSummary::default();
        assert!(unaudited.common_issues().is_empty());
        assert!(unaudited.render().contains("- No common issues identified\n"));
    }
}
