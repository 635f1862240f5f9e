//! Audit question table and report model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::RedactionStatistics;

/// Hosted model provider that performs the audit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[serde(alias = "open_ai")]
    OpenAi,
    #[serde(alias = "anthropic")]
    Claude,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Claude => "claude-3-5-sonnet-20241022",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Claude => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => f.write_str("openai"),
            Provider::Claude => f.write_str("claude"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" | "gpt" => Ok(Provider::OpenAi),
            "claude" | "anthropic" => Ok(Provider::Claude),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// One entry of the fixed compliance questionnaire.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AuditQuestion {
    pub number: u8,
    pub title: &'static str,
    pub question: &'static str,
    pub standard: &'static str,
    /// N/A is an acceptable answer
    pub allows_na: bool,
    /// Counted towards PASS/FAIL totals
    pub scored: bool,
}

pub const QUESTIONS: [AuditQuestion; 16] = [
    AuditQuestion {
        number: 1,
        title: "Incident Number Identification",
        question: "Identify and display the INC######## number from the ticket",
        standard: "Simply identify the incident number for reference",
        allows_na: false,
        scored: false,
    },
    AuditQuestion {
        number: 2,
        title: "Heading Fields Documentation",
        question: "Are CI/Location, State/Pending, Service Offering/Category properly populated?",
        standard: "Configuration Item, CI Location, Service Offering/Category must be verified for accuracy",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 3,
        title: "First Access Verification",
        question: "Was First Access properly checked/marked when first accessing device or contacting client?",
        standard: "First access should be checked when logging into device/contacting client",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 4,
        title: "Engineer Ownership Acknowledgment",
        question: "Did engineer acknowledge ownership to customer with ticket summary?",
        standard: "Engineer should acknowledge ownership with update to client including ticket summary",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 5,
        title: "Event Date Management",
        question: "Are Event Dates used accurately for next follow-up scheduling?",
        standard: "Event Date should accurately reflect the time for next follow up",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 6,
        title: "Pending Code Usage",
        question: "Are Pending Codes used correctly per team procedures?",
        standard: "Correct usage of Pending Codes (Client Action Required, Client Hold, RMA, Carrier, etc.)",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 7,
        title: "Status Field Updates",
        question: "Are Current Status/Next Steps updated appropriately?",
        standard: "Any change in current status or next steps requires documentation",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 8,
        title: "Client Communication Quality",
        question: "Are detailed, professional updates provided to client?",
        standard: "All client facing updates must be professional, detailed, and proofread",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 9,
        title: "Troubleshooting Documentation",
        question: "Are troubleshooting steps documented thoroughly with evidence?",
        standard: "Troubleshooting steps must be documented with evidence and explanations",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 10,
        title: "Timely Update Compliance",
        question: "Were updates provided per priority standards?",
        standard: "P1/P2: hourly updates, P3: every 2 days, P4: every 3 days",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 11,
        title: "Procedure Following",
        question: "Were team procedures and templates followed correctly?",
        standard: "Must follow Ticket Acceptance/Update Templates and the manual email process",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 12,
        title: "Task Management",
        question: "Were necessary Activity & Change tasks opened appropriately?",
        standard: "Proper Activity and Change task creation when required",
        allows_na: true,
        scored: true,
    },
    AuditQuestion {
        number: 13,
        title: "Time Tracking Accuracy",
        question: "Is Time Worked accurately documented for cost tracking?",
        standard: "Time Worked field must be populated accurately for cost evaluation",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 14,
        title: "Resolution Documentation",
        question: "Do Close Notes reflect work done with evidence of resolution?",
        standard: "Close notes should include issue summary, steps taken, and resolution evidence",
        allows_na: true,
        scored: true,
    },
    AuditQuestion {
        number: 15,
        title: "Overall Performance Assessment",
        question: "Rate overall engineer performance on this incident (1-10 scale)",
        standard: "Overall compliance with incident management procedures",
        allows_na: false,
        scored: true,
    },
    AuditQuestion {
        number: 16,
        title: "Audit Notes",
        question: "Write a concise 2-3 sentence audit note for the engineer",
        standard: "Reference one strength and one area to improve",
        allows_na: false,
        scored: false,
    },
];

/// Look up a question by its 1-based number
pub fn question(number: u8) -> Option<&'static AuditQuestion> {
    QUESTIONS.iter().find(|q| q.number == number)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "N/A")]
    NotApplicable,
    /// Informational answer (incident number, notes)
    #[serde(rename = "INFO")]
    Informational,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl AuditStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            AuditStatus::Pass => "✅ PASS",
            AuditStatus::Fail => "❌ FAIL",
            AuditStatus::NotApplicable => "⚠️ N/A",
            AuditStatus::Informational => "ℹ️ INFO",
            AuditStatus::Unknown => "? UNKNOWN",
        }
    }
}

/// Parsed answer to one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub number: u8,
    pub title: String,
    pub status: AuditStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub answered: usize,
    pub passed: usize,
    pub failed: usize,
    pub not_applicable: usize,
}

impl AuditSummary {
    pub fn from_results(results: &[QuestionResult]) -> Self {
        let mut summary = AuditSummary {
            answered: results.len(),
            ..Default::default()
        };
        for result in results {
            let scored = question(result.number).is_none_or(|q| q.scored);
            if !scored {
                continue;
            }
            match result.status {
                AuditStatus::Pass => summary.passed += 1,
                AuditStatus::Fail => summary.failed += 1,
                AuditStatus::NotApplicable => summary.not_applicable += 1,
                AuditStatus::Informational | AuditStatus::Unknown => {}
            }
        }
        summary
    }

    /// Share of PASS among PASS/FAIL answers, rounded
    pub fn compliance_percent(&self) -> Option<u32> {
        let applicable = self.passed + self.failed;
        if applicable == 0 {
            return None;
        }
        Some(((self.passed as f64 / applicable as f64) * 100.0).round() as u32)
    }
}

/// Complete result of auditing one ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub id: String,
    pub provider: String,
    pub model: String,
    pub source_path: String,
    pub document_hash: String,
    pub redaction: RedactionStatistics,
    pub prompt_truncated: bool,
    pub raw_response: String,
    pub results: Vec<QuestionResult>,
    pub summary: AuditSummary,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}
