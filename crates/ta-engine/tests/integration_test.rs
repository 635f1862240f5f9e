use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use ta_auditor::{Auditor, ReportWriter};
use ta_config::Config;
use ta_core::{AuditStatus, Category, Provider};
use ta_engine::{BatchOptions, Pipeline};

const TICKET: &str = "\
Number: INC12345678
Caller: John Smith
Category: Security Device Management
Service Offering: Network Services
Configuration item: PRNFSPA-TowerFW01
Work Notes: called John Smith at 555-123-4567 (jane@example.com).
Case#5551234567 linked. Portal https://portal.example.com/ticket/99 checked.
";

const RESPONSE: &str = "\
**QUESTION 1: Incident Number**
**STATUS**: INC12345678

**QUESTION 2: Heading Fields**
**STATUS**: ✅ PASS
**EVIDENCE**: Category and service offering filled in

**QUESTION 3: First Access**
**STATUS**: ❌ FAIL
**ANALYSIS**: No first access note

**QUESTION 4: Client Hold**
**STATUS**: ⚠️ N/A
";

struct ScriptedAuditor;

#[async_trait]
impl Auditor for ScriptedAuditor {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    fn model(&self) -> &str {
        "claude-3-5-sonnet-20241022"
    }

    async fn complete(&self, prompt: &str) -> ta_auditor::Result<String> {
        assert!(!prompt.contains("555-123-4567"));
        assert!(!prompt.contains("jane@example.com"));
        Ok(RESPONSE.to_string())
    }
}

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ticket-audit-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.paths.procedures_file = dir.join("procedures.txt");
    config.paths.reports_dir = dir.join("reports");
    config.paths.cache_dir = dir.join("cache");
    config
}

#[tokio::test]
async fn test_redact_ticket_file() {
    let dir = temp_dir();
    let ticket = dir.join("INC12345678.txt");
    std::fs::write(&ticket, TICKET).unwrap();

    let pipeline = Pipeline::from_config(&config(&dir)).unwrap();
    let outcome = pipeline.redact_file(&ticket).await.unwrap();
    let text = &outcome.redacted.text;

    assert!(text.contains("Number: INC12345678\n"));
    assert!(text.contains("Caller: John S.\n"));
    assert!(text.contains("Category: Security Device Management\n"));
    assert!(text.contains("Configuration item: PRNFSPA-TowerFW01\n"));
    assert!(text.contains("[REDACTED PHONE]"));
    assert!(text.contains("[REDACTED EMAIL]"));
    assert!(text.contains("[REDACTED URL]"));
    assert!(text.contains("Case#5551234567"));
    assert_eq!(text.lines().count(), TICKET.lines().count());
    assert_eq!(outcome.redacted.statistics.get(Category::Phone), 1);

    // A second pass finds nothing left to redact
    let again = pipeline.redactor().redact(text);
    assert_eq!(&again.text, text);
    assert_eq!(again.total_redactions(), 0);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_disabled_categories_from_config() {
    let dir = temp_dir();
    let ticket = dir.join("ticket.txt");
    std::fs::write(&ticket, TICKET).unwrap();

    let mut config = config(&dir);
    config
        .apply_env(|key| (key == "TICKET_AUDIT_DISABLED_CATEGORIES").then(|| "phone,names".to_string()))
        .unwrap();

    let pipeline = Pipeline::from_config(&config).unwrap();
    let outcome = pipeline.redact_file(&ticket).await.unwrap();

    assert!(outcome.redacted.text.contains("555-123-4567"));
    assert!(outcome.redacted.text.contains("Caller: John Smith"));
    assert!(outcome.redacted.text.contains("[REDACTED EMAIL]"));
    assert_eq!(outcome.redacted.statistics.get(Category::Phone), 0);
    assert!(outcome.redacted.statistics.iter().all(|(c, _)| c != Category::Name));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_audit_and_save_report() {
    let dir = temp_dir();
    let config = config(&dir);
    std::fs::write(&config.paths.procedures_file, "All tickets are acknowledged within 15 minutes.").unwrap();
    let ticket = dir.join("INC12345678.txt");
    std::fs::write(&ticket, TICKET).unwrap();

    let pipeline = Pipeline::from_config(&config)
        .unwrap()
        .with_auditor(Arc::new(ScriptedAuditor));
    let report = pipeline.audit_file(&ticket).await.unwrap();

    assert_eq!(report.provider, "claude");
    assert_eq!(report.results.len(), 4);
    assert_eq!(report.results[0].status, AuditStatus::Informational);
    assert_eq!(report.results[1].status, AuditStatus::Pass);
    assert_eq!(report.results[2].status, AuditStatus::Fail);
    assert_eq!(report.results[3].status, AuditStatus::NotApplicable);
    assert_eq!(report.summary.passed, 1);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.not_applicable, 1);

    let writer = ReportWriter::new(&config.paths.reports_dir);
    let saved = writer.save_text(&report, "claude_audit").unwrap();
    let content = std::fs::read_to_string(&saved).unwrap();
    assert!(content.contains("Audit Type: CLAUDE\n"));
    assert!(content.contains("Score: 1/2 (50%), 1 N/A\n"));
    assert!(content.contains("**QUESTION 3: First Access**"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_batch_audit() {
    let dir = temp_dir();
    let input = dir.join("tickets");
    std::fs::create_dir_all(input.join("nested")).unwrap();
    std::fs::write(input.join("INC1.txt"), TICKET).unwrap();
    std::fs::write(input.join("nested/INC2.md"), TICKET).unwrap();

    let pipeline = Pipeline::from_config(&config(&dir))
        .unwrap()
        .with_auditor(Arc::new(ScriptedAuditor));
    let out = dir.join("out");
    let options = BatchOptions {
        recursive: true,
        out_dir: Some(out.clone()),
        audit: true,
        ..Default::default()
    };
    let summary = pipeline.redact_dir(&input, &options).await.unwrap();

    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.totals.get(Category::Phone), 2);
    assert_eq!(summary.average_score(), Some(50.0));
    assert!(out.join("redacted_INC1.txt").exists());
    assert!(out.join("audit_INC2.txt").exists());
    assert!(out.join("batch_summary.txt").exists());
    let summary_text = std::fs::read_to_string(out.join("batch_summary.txt")).unwrap();
    assert!(summary_text.contains("COMMON ISSUES:\n- First Access Verification failing in 100% of files\n"));
    // Both tickets share one prompt, so one cache entry
    assert_eq!(std::fs::read_dir(dir.join("cache")).unwrap().count(), 1);

    std::fs::remove_dir_all(&dir).unwrap();
}
