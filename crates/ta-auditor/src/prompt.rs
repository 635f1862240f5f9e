//! Audit prompt assembly

use std::fmt::Write as _;
use std::path::Path;

use ta_core::{AuditQuestion, QUESTIONS};

/// Characters of the procedures document quoted in each prompt
pub const PROCEDURE_EXCERPT_CHARS: usize = 2000;

pub const SYSTEM_PROMPT: &str =
    "You are a Network Team incident auditor. Provide concise, structured audit responses.";

const INSTRUCTIONS: &str = "\
**CRITICAL INSTRUCTIONS**:
- Question 1: Simply identify and display the INC number (not a compliance check)
- Only use N/A for questions 12 and 14 when truly not applicable
- Questions 2-11, 13 and 15 must always be answered PASS or FAIL
- If you cannot find evidence, answer FAIL and explain what is missing
- Accept common abbreviations: \"Client H.\" = \"Client Hold\", \"CAR\" = \"Client Action Required\"
- Minor variations in wording or format should not automatically fail compliance
- Personal data has been redacted: placeholders such as [REDACTED PHONE] and shortened names (\"John S.\") are expected

**RESPONSE FORMAT**: for every question write

---

**QUESTION [NUMBER]: [FULL QUESTION TEXT]**

**STATUS**: ✅ PASS or ❌ FAIL (or ⚠️ N/A only for questions 12 and 14)

**EVIDENCE**: Quote the ticket text that supports your answer

**ANALYSIS**: Explain what you looked for and your reasoning

---

For question 1 the STATUS line carries the incident number. For question 16 write the audit note in place of EVIDENCE and ANALYSIS: \
address the engineer by the name shown in the ticket, name one strength and one area to improve, and keep a supportive tone.
When a question FAILS, add a PROCEDURE REFERENCE quoting the relevant procedure and a WHAT TO DO NEXT line with one actionable step.
";

/// Builds the single prompt sent to the auditor
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    procedures: Option<String>,
}

impl PromptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_procedures(procedures: impl Into<String>) -> Self {
        let procedures = procedures.into();
        Self {
            procedures: (!procedures.trim().is_empty()).then_some(procedures),
        }
    }

    /// Reads the procedures document; a missing file leaves the prompt
    /// without a reference section
    pub fn from_procedures_file(path: &Path) -> std::io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::with_procedures(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Procedures file not found");
                Ok(Self::new())
            }
            Err(e) => Err(e),
        }
    }

    pub fn has_procedures(&self) -> bool {
        self.procedures.is_some()
    }

    /// Leading part of the procedures document, by characters
    fn procedure_excerpt(&self) -> Option<String> {
        self.procedures.as_ref().map(|text| {
            let mut excerpt: String = text.chars().take(PROCEDURE_EXCERPT_CHARS).collect();
            if text.chars().nth(PROCEDURE_EXCERPT_CHARS).is_some() {
                excerpt.push_str("...");
            }
            excerpt
        })
    }

    pub fn assemble(&self, redacted_text: &str) -> String {
        let mut prompt = String::with_capacity(8 * 1024 + redacted_text.len());

        prompt.push_str("**NETWORK TEAM INCIDENT AUDIT**\n\n");
        prompt.push_str(
            "**COMPLIANCE STANDARD**: All questions are evaluated against Network Team \
             Incident Management Documentation.\n\n",
        );
        if let Some(excerpt) = self.procedure_excerpt() {
            let _ = write!(prompt, "**NETWORK TEAM PROCEDURES (Reference):**\n{excerpt}\n\n");
        }
        prompt.push_str(INSTRUCTIONS);
        prompt.push_str("\n---\n\n");

        for question in &QUESTIONS {
            write_question(&mut prompt, question);
        }

        prompt.push_str("---\n\nINCIDENT TEXT TO ANALYZE:\n");
        prompt.push_str(redacted_text);
        prompt.push('\n');
        prompt
    }
}

fn write_question(out: &mut String, question: &AuditQuestion) {
    let answer = if !question.scored {
        "Informational (not scored)"
    } else if question.allows_na {
        "✅ PASS / ❌ FAIL / ⚠️ N/A"
    } else {
        "✅ PASS / ❌ FAIL (N/A not allowed)"
    };
    let _ = write!(
        out,
        "**{}. {}**\n**Question**: {}\n**Answer Required**: {}\n**Standard**: {}\n\n",
        question.number, question.title, question.question, answer, question.standard
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_every_question() {
        let prompt = PromptAssembler::new().assemble("Caller: John S.");
        for question in &QUESTIONS {
            assert!(prompt.contains(&format!("**{}. {}**", question.number, question.title)));
        }
        assert!(prompt.ends_with("INCIDENT TEXT TO ANALYZE:\nCaller: John S.\n"));
        assert!(!prompt.contains("PROCEDURES (Reference)"));
    }

    #[test]
    fn test_procedures_excerpt_is_bounded() {
        let procedures = "θ".repeat(PROCEDURE_EXCERPT_CHARS + 500);
        let assembler = PromptAssembler::with_procedures(procedures);
        let prompt = assembler.assemble("ticket");

        let excerpt = format!("{}...", "θ".repeat(PROCEDURE_EXCERPT_CHARS));
        assert!(prompt.contains(&excerpt));
        assert!(!prompt.contains(&"θ".repeat(PROCEDURE_EXCERPT_CHARS + 1)));
    }

    #[test]
    fn test_short_procedures_not_marked() {
        let assembler = PromptAssembler::with_procedures("Acknowledge within 15 minutes.");
        let prompt = assembler.assemble("ticket");
        assert!(prompt.contains("Acknowledge within 15 minutes.\n"));
        assert!(!prompt.contains("minutes...."));
    }

    #[test]
    fn test_procedures_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = PromptAssembler::from_procedures_file(&dir.path().join("none.txt")).unwrap();
        assert!(!missing.has_procedures());

        let path = dir.path().join("procedures.txt");
        std::fs::write(&path, "Use the Ticket Acceptance Template.").unwrap();
        let loaded = PromptAssembler::from_procedures_file(&path).unwrap();
        assert!(loaded.has_procedures());

        std::fs::write(&path, "  \n").unwrap();
        let blank = PromptAssembler::from_procedures_file(&path).unwrap();
        assert!(!blank.has_procedures());
    }

    #[test]
    fn test_answer_rules() {
        let prompt = PromptAssembler::new().assemble("");
        assert!(prompt.contains(
            "**12. Task Management**\n**Question**: Were necessary Activity & Change tasks opened appropriately?\n**Answer Required**: ✅ PASS / ❌ FAIL / ⚠️ N/A"
        ));
        assert!(prompt.contains("**16. Audit Notes**"));
    }
}
