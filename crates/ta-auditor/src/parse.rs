//! Splitting a model response into per-question results

use lazy_static::lazy_static;
use regex::Regex;
use ta_core::{audit::question, AuditStatus, AuditSummary, QuestionResult};

lazy_static! {
    /// `**QUESTION 3: ...**`, `### Question 3 -`, `QUESTION 12`
    static ref HEADING: Regex =
        Regex::new(r"(?im)^[ \t#*>_-]*QUESTION[ \t]+(\d{1,2})\b[^\n]*$").expect("heading pattern");

    static ref STATUS: Regex =
        Regex::new(r"(?im)^[ \t*_]*STATUS[*_ \t]*:[*_ \t]*(.*)$").expect("status pattern");

    static ref EVIDENCE: Regex = Regex::new(
        r"(?is)\bEVIDENCE[*_ \t]*:[*_ \t]*(.*?)(?:\n[ \t*_]*(?:ANALYSIS|PROCEDURE REFERENCE|WHAT TO DO NEXT)\b|\n[ \t]*---|\z)"
    )
    .expect("evidence pattern");

    static ref ANALYSIS: Regex = Regex::new(
        r"(?is)\bANALYSIS[*_ \t]*:[*_ \t]*(.*?)(?:\n[ \t*_]*(?:PROCEDURE REFERENCE|WHAT TO DO NEXT)\b|\n[ \t]*---|\z)"
    )
    .expect("analysis pattern");

    static ref PASS_MARK: Regex = Regex::new(r"(?i)✅\s*PASS").expect("pass pattern");
    static ref FAIL_MARK: Regex = Regex::new(r"(?i)❌\s*FAIL").expect("fail pattern");
    static ref NA_MARK: Regex = Regex::new(r"⚠️?\s*N/A").expect("n/a pattern");
}

fn classify(status_line: &str) -> AuditStatus {
    let upper = status_line.to_uppercase();
    if upper.contains("N/A") {
        AuditStatus::NotApplicable
    } else if upper.contains("FAIL") || status_line.contains('❌') {
        AuditStatus::Fail
    } else if upper.contains("PASS") || status_line.contains('✅') {
        AuditStatus::Pass
    } else {
        AuditStatus::Unknown
    }
}

fn clean(capture: &str) -> Option<String> {
    let text = capture.trim().trim_matches('*').trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn parse_section(number: u8, heading: &str, body: &str) -> QuestionResult {
    let entry = question(number);
    let status_line = STATUS
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("");

    let status = match entry {
        Some(q) if !q.scored => AuditStatus::Informational,
        _ => classify(status_line),
    };

    let title = entry.map_or_else(
        || heading.trim().trim_matches(['*', '#']).trim().to_string(),
        |q| q.title.to_string(),
    );

    QuestionResult {
        number,
        title,
        status,
        evidence: EVIDENCE
            .captures(body)
            .and_then(|c| c.get(1))
            .and_then(|m| clean(m.as_str())),
        analysis: ANALYSIS
            .captures(body)
            .and_then(|c| c.get(1))
            .and_then(|m| clean(m.as_str())),
        raw: body.trim().to_string(),
    }
}

/// One result per `QUESTION n` heading, in response order.
///
/// A repeated number keeps its first section.
pub fn parse_response(raw: &str) -> Vec<QuestionResult> {
    let headings: Vec<(usize, usize, u8)> = HEADING
        .captures_iter(raw)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let number = c.get(1)?.as_str().parse::<u8>().ok()?;
            Some((whole.start(), whole.end(), number))
        })
        .collect();

    let mut results: Vec<QuestionResult> = Vec::with_capacity(headings.len());
    for (i, &(start, end, number)) in headings.iter().enumerate() {
        if results.iter().any(|r| r.number == number) {
            continue;
        }
        let next = headings.get(i + 1).map_or(raw.len(), |h| h.0);
        let result = parse_section(number, &raw[start..end], &raw[start..next]);
        results.push(result);
    }

    tracing::debug!(sections = results.len(), "Parsed audit response");
    results
}

/// Totals from parsed sections; falls back to counting status marks when
/// the response has no recognisable headings
pub fn summarize(raw: &str, results: &[QuestionResult]) -> AuditSummary {
    if !results.is_empty() {
        return AuditSummary::from_results(results);
    }

    let passed = PASS_MARK.find_iter(raw).count();
    let failed = FAIL_MARK.find_iter(raw).count();
    let not_applicable = NA_MARK.find_iter(raw).count();
    AuditSummary {
        answered: passed + failed + not_applicable,
        passed,
        failed,
        not_applicable,
    }
}
