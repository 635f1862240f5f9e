//! Built-in redaction rule table

use lazy_static::lazy_static;
use regex::Regex;
use ta_core::Category;

/// What an accepted match is replaced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// Fixed category token
    Placeholder(&'static str),
    /// "First Last" becomes "First L."
    Initial,
}

/// Contextual check that exempts a match from replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    /// Match overlaps a case number or technical hostname
    ProtectedSpan,
    /// Dotted quad with an octet above 255
    InvalidAddress,
    /// Capitalized pair that is business vocabulary, not a person
    BusinessTerm,
}

#[derive(Debug)]
pub struct RedactionRule {
    pub category: Category,
    pub pattern: Regex,
    pub replacement: Replacement,
    pub exception: Option<Exception>,
}

impl RedactionRule {
    fn new(
        category: Category,
        pattern: &str,
        replacement: Replacement,
        exception: Option<Exception>,
    ) -> Self {
        Self {
            category,
            pattern: Regex::new(pattern).expect("built-in redaction pattern"),
            replacement,
            exception,
        }
    }
}

// Capture groups of the NAME pattern
pub(crate) const NAME_FIRST: usize = 1;
pub(crate) const NAME_SEPARATOR: usize = 2;
pub(crate) const NAME_LAST: usize = 3;

lazy_static! {
    /// Rules in application order (more specific first).
    static ref RULES: Vec<RedactionRule> = vec![
        RedactionRule::new(
            Category::Url,
            r#"https?://[^\s<>"']*[^\s<>"'.,;:)\]]"#,
            Replacement::Placeholder("[REDACTED URL]"),
            None,
        ),
        RedactionRule::new(
            Category::Email,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            Replacement::Placeholder("[REDACTED EMAIL]"),
            None,
        ),
        RedactionRule::new(
            Category::Ip,
            r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
            Replacement::Placeholder("[REDACTED IP]"),
            Some(Exception::InvalidAddress),
        ),
        RedactionRule::new(
            Category::Mac,
            r"\b(?:[0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}\b",
            Replacement::Placeholder("[REDACTED MAC]"),
            None,
        ),
        RedactionRule::new(
            Category::EmployeeId,
            r"\bEVE\d{8}\b",
            Replacement::Placeholder("[REDACTED EMPLOYEE ID]"),
            None,
        ),
        RedactionRule::new(
            Category::Imei,
            r"\bIMEI[#: \t]*\d+\b",
            Replacement::Placeholder("IMEI#[REDACTED]"),
            None,
        ),
        RedactionRule::new(
            Category::Account,
            r"\b[Aa]ccount[ \t]*[#:]?[ \t]*\d{8,}(?:-\d+)?\b",
            Replacement::Placeholder("Account [REDACTED]"),
            None,
        ),
        // Must run after ACCOUNT/IMEI and consult case numbers, which share its digit lengths
        RedactionRule::new(
            Category::Phone,
            r"(?:\+1[-. ]?(?:\(\d{3}\)[ ]?|\d{3}[-. ]?)|\(\d{3}\)[ ]?|\b\d{3}[-. ]?)\d{3}[-. ]?\d{4}(?:[ \t]*(?:[xX]|[eE]xt\.?)[ \t]*\d{1,5})?\b",
            Replacement::Placeholder("[REDACTED PHONE]"),
            Some(Exception::ProtectedSpan),
        ),
        RedactionRule::new(
            Category::Name,
            r"\b([A-Z][a-z]+)([ \t]+)([A-Z][a-z]+)\b",
            Replacement::Initial,
            Some(Exception::BusinessTerm),
        ),
    ];

    /// Ticket identifiers: INC12345678, RITM0012345, CHG0099999
    pub(crate) static ref CASE_NUMBER: Regex =
        Regex::new(r"\b(?:INC|RITM|REQ|CHG|PRB|TASK|SCTASK|CS)\d{5,}\b")
            .expect("case number pattern");

    /// Labeled case numbers: Case#12345678, Case #6-555-123-4567, Ticket No. 1234
    pub(crate) static ref LABELED_CASE: Regex =
        Regex::new(r"(?i)\b(?:case|ticket|incident|ref)[ \t]*(?:#|no\.?|num(?:ber)?\.?)?[ \t]*:?[ \t]*\d[\d-]*\d")
            .expect("labeled case pattern");

    /// Technical hostnames: PRNFSPA-TowerFW01, ROUTER-NYC-01. The last
    /// lettered segment ends in a digit or takes a short numeric suffix, so
    /// `US-555-123-4567` is not a host.
    pub(crate) static ref HOSTNAME: Regex = Regex::new(
        r"\b[A-Z][A-Z0-9]+(?:-[A-Za-z0-9]+)*-[A-Za-z0-9]*[A-Za-z][A-Za-z0-9]*(?:\d|-\d{1,2})\b"
    )
    .expect("hostname pattern");

    /// Capitalized word right after a NAME candidate
    pub(crate) static ref NEXT_WORD: Regex =
        Regex::new(r"^[ \t]+([A-Z][a-z]+)\b").expect("next word pattern");

    /// Initial right after a NAME candidate, as left by an earlier pass
    pub(crate) static ref NEXT_INITIAL: Regex =
        Regex::new(r"^[ \t]+[A-Z]\.").expect("next initial pattern");
}

/// The process-wide rule table, in priority order
pub fn rules() -> &'static [RedactionRule] {
    &RULES
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(category: Category) -> &'static Regex {
        &rules()
            .iter()
            .find(|r| r.category == category)
            .unwrap()
            .pattern
    }

    #[test]
    fn test_rule_order() {
        let order: Vec<Category> = rules().iter().map(|r| r.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }

    #[test]
    fn test_placeholders_match_no_rule() {
        for rule in rules() {
            if let Replacement::Placeholder(token) = rule.replacement {
                for other in rules() {
                    assert!(
                        !other.pattern.is_match(token),
                        "{} placeholder matched by {} rule",
                        rule.category,
                        other.category
                    );
                }
            }
        }
    }

    #[test]
    fn test_phone_shapes() {
        let phone = pattern(Category::Phone);
        assert!(phone.is_match("555-123-4567"));
        assert!(phone.is_match("555.123.4567"));
        assert!(phone.is_match("(555) 123-4567"));
        assert!(phone.is_match("5551234567"));
        assert!(!phone.is_match("12345678"));
        assert!(!phone.is_match("08-03-2025 09:29:30"));
        assert!(!phone.is_match("555\n123\n4567"));
    }

    #[test]
    fn test_phone_country_code_and_extension() {
        let phone = pattern(Category::Phone);
        assert_eq!(phone.find("call +15551234567").unwrap().as_str(), "+15551234567");
        assert_eq!(phone.find("or +1 (555) 123-4567").unwrap().as_str(), "+1 (555) 123-4567");
        assert_eq!(phone.find("desk 555-123-4567x89.").unwrap().as_str(), "555-123-4567x89");
        assert_eq!(phone.find("555-123-4567 ext. 204").unwrap().as_str(), "555-123-4567 ext. 204");
        assert_eq!(phone.find("555-123-4567 extra").unwrap().as_str(), "555-123-4567");
        assert!(!phone.is_match("15551234567"));
    }

    #[test]
    fn test_url_trailing_punctuation() {
        let url = pattern(Category::Url);
        let m = url.find("see https://portal.example.com/ticket?id=4.").unwrap();
        assert_eq!(m.as_str(), "https://portal.example.com/ticket?id=4");
    }

    #[test]
    fn test_case_number_shapes() {
        assert!(CASE_NUMBER.is_match("INC12345678"));
        assert!(CASE_NUMBER.is_match("RITM0012345"));
        assert!(!CASE_NUMBER.is_match("INCIDENT"));
        assert!(LABELED_CASE.is_match("Case#12345678"));
        assert!(LABELED_CASE.is_match("Case #6-555-123-4567"));
        assert!(LABELED_CASE.is_match("ticket no. 55512"));
    }

    #[test]
    fn test_hostname_shapes() {
        for host in ["PRNFSPA-TowerFW01", "PRNFSPA-ServerDB02", "ROUTER-NYC-01"] {
            assert_eq!(HOSTNAME.find(host).unwrap().as_str(), host);
        }
        assert!(!HOSTNAME.is_match("PR-Niagara"));
    }

    #[test]
    fn test_hostname_needs_a_lettered_segment() {
        for text in ["US-555-123-4567", "CONTACT-5551234567", "ROUTER-NYC-555-123-4567"] {
            let m = HOSTNAME.find(text).map(|m| m.as_str());
            assert!(m.is_none_or(|m| !m.contains("555")), "{text} matched as {m:?}");
        }
        assert_eq!(HOSTNAME.find("SW-NYC-2").unwrap().as_str(), "SW-NYC-2");
    }
}
