//! Context-aware PII redaction for ticket text
//!
//! Rules run in a fixed priority order against the progressively redacted
//! text. Each rule may carry an exception that exempts a match based on
//! the surrounding text (case numbers, hostnames, business vocabulary).

mod context;
pub mod lexicon;
pub mod rules;

use std::collections::BTreeSet;

use regex::Captures;
use ta_core::{Category, RedactedDocument, RedactionStatistics};
use tracing::{debug, trace, warn};

use context::{line_prefix, ProtectedSpans};
pub use lexicon::{BusinessLexicon, BUILTIN_LEXICON_VERSION};
use lexicon::CompiledLexicon;
pub use rules::{rules, Exception, RedactionRule, Replacement};
use rules::{NAME_FIRST, NAME_LAST, NAME_SEPARATOR, NEXT_INITIAL, NEXT_WORD};

/// Which categories run and which vocabulary is preserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionSettings {
    pub enabled: BTreeSet<Category>,
    pub lexicon: BusinessLexicon,
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self {
            enabled: Category::ALL.into_iter().collect(),
            lexicon: BusinessLexicon::default(),
        }
    }
}

impl RedactionSettings {
    pub fn without(mut self, category: Category) -> Self {
        self.enabled.remove(&category);
        self
    }
}

/// Redaction engine. Immutable once built and safe to share across threads.
#[derive(Debug)]
pub struct Redactor {
    enabled: BTreeSet<Category>,
    lexicon: CompiledLexicon,
}

impl Redactor {
    pub fn new() -> Self {
        Self::with_settings(RedactionSettings::default())
    }

    pub fn with_settings(settings: RedactionSettings) -> Self {
        Self {
            enabled: settings.enabled,
            lexicon: CompiledLexicon::new(&settings.lexicon),
        }
    }

    /// Enabled categories in rule order
    pub fn enabled_categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.enabled.iter().copied()
    }

    pub fn lexicon_version(&self) -> &str {
        self.lexicon.version()
    }

    /// Redact PII from text
    pub fn redact(&self, text: &str) -> RedactedDocument {
        let mut statistics = RedactionStatistics::for_categories(self.enabled_categories());
        if text.trim().is_empty() {
            return RedactedDocument::new(text.to_string(), statistics);
        }

        let mut current = text.to_string();
        for rule in rules().iter().filter(|r| self.enabled.contains(&r.category)) {
            let (next, count) = self.apply(rule, &current);
            statistics.record(rule.category, count);
            if count > 0 {
                trace!(category = %rule.category, count, "Rule applied");
                current = next;
            }
        }

        debug!(
            bytes = text.len(),
            total = statistics.total(),
            "Redacted document"
        );
        RedactedDocument::new(current, statistics)
    }

    /// Redact raw bytes. Non-UTF-8 input yields an empty document.
    pub fn redact_bytes(&self, bytes: &[u8]) -> RedactedDocument {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.redact(text),
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "Input is not text, nothing redacted");
                RedactedDocument::empty(self.enabled_categories())
            }
        }
    }

    fn apply(&self, rule: &RedactionRule, text: &str) -> (String, usize) {
        let spans = match rule.exception {
            Some(Exception::ProtectedSpan) => ProtectedSpans::scan(text, None),
            Some(Exception::BusinessTerm) => ProtectedSpans::scan(text, self.lexicon.phrases()),
            Some(Exception::InvalidAddress) | None => ProtectedSpans::default(),
        };

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut pos = 0;
        let mut count = 0;

        while let Some(caps) = rule.pattern.captures_at(text, pos) {
            let Some(m) = caps.get(0) else { break };

            if self.is_exempt(rule, text, &caps, &spans) {
                trace!(category = %rule.category, candidate = m.as_str(), "Kept");
                // A rejected name pair may still start a new pair at its second word
                pos = match rule.replacement {
                    Replacement::Initial => caps.get(NAME_LAST).map_or(m.end(), |w| w.start()),
                    Replacement::Placeholder(_) => m.end(),
                };
                continue;
            }
            // In a run like "Mary Ann Lee" only the last pair is initialized
            if rule.replacement == Replacement::Initial && self.run_continues(text, &caps, &spans) {
                pos = caps.get(NAME_LAST).map_or(m.end(), |w| w.start());
                continue;
            }

            out.push_str(&text[last..m.start()]);
            match rule.replacement {
                Replacement::Placeholder(token) => out.push_str(token),
                Replacement::Initial => out.push_str(&initialize(&caps)),
            }
            count += 1;
            last = m.end();
            pos = m.end();
        }

        out.push_str(&text[last..]);
        (out, count)
    }

    fn is_exempt(
        &self,
        rule: &RedactionRule,
        text: &str,
        caps: &Captures<'_>,
        spans: &ProtectedSpans,
    ) -> bool {
        let Some(m) = caps.get(0) else { return true };
        match rule.exception {
            None => false,
            Some(Exception::ProtectedSpan) => spans.overlaps(&m.range()),
            Some(Exception::InvalidAddress) => !m.as_str().split('.').all(|o| o.parse::<u8>().is_ok()),
            Some(Exception::BusinessTerm) => {
                if spans.overlaps(&m.range()) {
                    return true;
                }
                let first = caps.get(NAME_FIRST).map_or("", |w| w.as_str());
                let last = caps.get(NAME_LAST).map_or("", |w| w.as_str());
                self.lexicon.is_business_pair(first, last)
                    || self.lexicon.follows_label(line_prefix(text, m.start()))
                    || NEXT_INITIAL.is_match(&text[m.end()..])
            }
        }
    }

    /// Another capitalized, unprotected, non-business word follows the pair
    fn run_continues(&self, text: &str, caps: &Captures<'_>, spans: &ProtectedSpans) -> bool {
        let (Some(m), Some(last)) = (caps.get(0), caps.get(NAME_LAST)) else {
            return false;
        };
        NEXT_WORD
            .captures(&text[m.end()..])
            .and_then(|c| c.get(1))
            .is_some_and(|next| {
                let range = m.end() + next.start()..m.end() + next.end();
                !spans.overlaps(&range) && !self.lexicon.is_business_pair(last.as_str(), next.as_str())
            })
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

/// "John" + " " + "Smith" -> "John S."
fn initialize(caps: &Captures<'_>) -> String {
    let first = caps.get(NAME_FIRST).map_or("", |w| w.as_str());
    let separator = caps.get(NAME_SEPARATOR).map_or(" ", |w| w.as_str());
    let initial = caps
        .get(NAME_LAST)
        .and_then(|w| w.as_str().chars().next())
        .map(String::from)
        .unwrap_or_default();
    format!("{first}{separator}{initial}.")
}
