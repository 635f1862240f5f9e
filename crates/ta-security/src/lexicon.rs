//! Business vocabulary that must survive name redaction
//!
//! The lexicon is versioned configuration: the built-in set below can be
//! replaced wholesale from the config file without touching the rules.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const BUILTIN_LEXICON_VERSION: &str = "2025.08.2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessLexicon {
    pub version: String,
    /// Multi-word phrases preserved verbatim (case-insensitive)
    pub phrases: Vec<String>,
    /// Single words that mark a capitalized pair as business vocabulary
    pub words: Vec<String>,
    /// Endings of the second word that mark a business term
    pub suffixes: Vec<String>,
    /// Substrings of either word that mark infrastructure vocabulary
    pub fragments: Vec<String>,
    /// Field labels whose values are never personal names
    pub labels: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for BusinessLexicon {
    fn default() -> Self {
        Self {
            version: BUILTIN_LEXICON_VERSION.to_string(),
            phrases: strings(&[
                "Security Device Management",
                "Network Management and Monitoring",
                "Network Services",
                "Client Hold",
                "Client Action Required",
                "Service Offering",
                "Configuration Item",
                "Assignment Group",
                "Integration User",
                "First Access",
                "Current Status",
                "Next Steps",
                "Event Date",
                "Time Worked",
                "Close Notes",
                "Work Notes",
                "Additional Comments",
                "Dear Team",
                "Activity Task",
                "Change Request",
                "Run By",
                "Opened By",
                "Updated By",
                "Resolved By",
                "Closed By",
                "Created By",
                "Eastern Daylight Time",
                "Eastern Standard Time",
                "Central Daylight Time",
                "Central Standard Time",
                "Mountain Daylight Time",
                "Mountain Standard Time",
                "Pacific Daylight Time",
                "Pacific Standard Time",
            ]),
            words: strings(&[
                "security", "service", "services", "management", "client", "customer",
                "activity", "change", "incident", "request", "access", "event", "status",
                "pending", "hold", "dear", "first", "next", "current", "follow", "time",
                "close", "network", "system", "device", "configuration", "team", "offering",
                "task", "notes", "steps", "date", "worked", "report", "details", "impact",
                "urgency", "priority", "state", "category", "subcategory", "description",
                "resolution", "resolved", "closed", "opened", "updated", "assigned",
                "additional", "company", "companies", "group", "engineer", "support",
                "operations", "integration", "monitoring", "contact", "email", "phone",
                "address", "title", "caller", "user", "number", "code", "type", "item",
                "hello", "hi", "thanks", "thank",
                "regards", "please", "best", "kind", "eastern", "central", "mountain",
                "pacific", "daylight", "standard", "monday", "tuesday", "wednesday",
                "thursday", "friday", "saturday", "sunday", "january", "february", "march",
                "april", "june", "july", "august", "september", "october", "november",
                "december", "sincerely", "cheers", "called", "reported", "confirmed",
                "requested", "stated", "advised",
            ]),
            suffixes: strings(&[
                "management", "services", "access", "hold", "team", "client", "device",
                "tower", "offering", "request", "task", "notes", "steps", "status", "date",
                "worked",
            ]),
            fragments: strings(&[
                "fw", "server", "router", "switch", "tower", "device", "system", "network",
                "config",
            ]),
            labels: strings(&[
                "CI",
                "CI Location",
                "Configuration item",
                "Device",
                "Hostname",
                "Host",
                "Server",
                "Firewall",
                "Router",
                "Switch",
                "Network",
                "Location",
                "Company",
                "Category",
                "Subcategory",
                "Service Offering",
                "Assignment group",
                "Site",
                "Vendor",
                "Carrier",
                "Product",
                "Model",
            ]),
        }
    }
}

/// Regex source for a phrase: escaped words joined by horizontal whitespace
fn phrase_pattern(phrase: &str) -> Option<String> {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(r"[ \t]+"))
    }
}

fn alternation(items: &[String]) -> Option<String> {
    let mut patterns: Vec<String> = items.iter().filter_map(|p| phrase_pattern(p)).collect();
    if patterns.is_empty() {
        return None;
    }
    // Longest first so "CI Location" wins over "CI"
    patterns.sort_by_key(|p| std::cmp::Reverse(p.len()));
    patterns.dedup();
    Some(patterns.join("|"))
}

fn compile(pattern: &str, what: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(kind = what, error = %e, "Invalid lexicon pattern, entries ignored");
            None
        }
    }
}

/// Lexicon compiled for matching
#[derive(Debug)]
pub(crate) struct CompiledLexicon {
    version: String,
    phrases: Option<Regex>,
    labels: Option<Regex>,
    words: HashSet<String>,
    suffixes: Vec<String>,
    fragments: Vec<String>,
}

impl CompiledLexicon {
    pub(crate) fn new(lexicon: &BusinessLexicon) -> Self {
        let phrases = alternation(&lexicon.phrases)
            .and_then(|alt| compile(&format!(r"(?i)\b(?:{alt})\b"), "phrases"));

        // Label and separator directly before the candidate
        let labels = alternation(&lexicon.labels)
            .and_then(|alt| compile(&format!(r"(?i)\b(?:{alt})[ \t]*[:#][ \t]*$"), "labels"));

        let lower = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };

        Self {
            version: lexicon.version.clone(),
            phrases,
            labels,
            words: lower(&lexicon.words).into_iter().collect(),
            suffixes: lower(&lexicon.suffixes),
            fragments: lower(&lexicon.fragments),
        }
    }

    pub(crate) fn version(&self) -> &str {
        &self.version
    }

    pub(crate) fn phrases(&self) -> Option<&Regex> {
        self.phrases.as_ref()
    }

    /// Either word alone marks the pair as business vocabulary
    pub(crate) fn is_business_pair(&self, first: &str, second: &str) -> bool {
        let first = first.to_lowercase();
        let second = second.to_lowercase();

        if self.words.contains(&first) || self.words.contains(&second) {
            return true;
        }
        if self.suffixes.iter().any(|s| second.ends_with(s.as_str())) {
            return true;
        }
        self.fragments
            .iter()
            .any(|f| first.contains(f.as_str()) || second.contains(f.as_str()))
    }

    /// `prefix` is the text of the line before the candidate
    pub(crate) fn follows_label(&self, prefix: &str) -> bool {
        self.labels.as_ref().is_some_and(|re| re.is_match(prefix))
    }
}
