//! Redaction domain model

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A class of sensitive identifier the redactor knows how to detect.
///
/// Variants are declared in rule priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Url,
    Email,
    Ip,
    Mac,
    EmployeeId,
    Imei,
    Account,
    Phone,
    Name,
}

impl Category {
    /// Every category, in the order the rules run.
    pub const ALL: [Category; 9] = [
        Category::Url,
        Category::Email,
        Category::Ip,
        Category::Mac,
        Category::EmployeeId,
        Category::Imei,
        Category::Account,
        Category::Phone,
        Category::Name,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Url => "URL",
            Category::Email => "EMAIL",
            Category::Ip => "IP",
            Category::Mac => "MAC",
            Category::EmployeeId => "EMPLOYEE_ID",
            Category::Imei => "IMEI",
            Category::Account => "ACCOUNT",
            Category::Phone => "PHONE",
            Category::Name => "NAME",
        }
    }

    /// Human-readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Category::Url => "URLs",
            Category::Email => "Email addresses",
            Category::Ip => "IP addresses",
            Category::Mac => "MAC addresses",
            Category::EmployeeId => "Employee IDs",
            Category::Imei => "IMEI numbers",
            Category::Account => "Account numbers",
            Category::Phone => "Phone numbers",
            Category::Name => "Names truncated",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Accepts canonical names (`PHONE`) in any case, plus the long
    /// statistic keys used by older reports (`phone_numbers`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let category = match normalized.as_str() {
            "url" | "urls" => Category::Url,
            "email" | "emails" | "email_addresses" => Category::Email,
            "ip" | "ips" | "ip_addresses" => Category::Ip,
            "mac" | "macs" | "mac_addresses" => Category::Mac,
            "employee_id" | "employee_ids" => Category::EmployeeId,
            "imei" | "imei_numbers" => Category::Imei,
            "account" | "accounts" | "account_numbers" => Category::Account,
            "phone" | "phones" | "phone_numbers" => Category::Phone,
            "name" | "names" | "names_truncated" => Category::Name,
            _ => return Err(Error::UnknownCategory(s.to_string())),
        };
        Ok(category)
    }
}

/// Per-document count of accepted replacements, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedactionStatistics {
    counts: BTreeMap<Category, usize>,
}

impl RedactionStatistics {
    /// Statistics with a zero entry for each of the given categories.
    pub fn for_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            counts: categories.into_iter().map(|c| (c, 0)).collect(),
        }
    }

    pub fn record(&mut self, category: Category, count: usize) {
        *self.counts.entry(category).or_insert(0) += count;
    }

    pub fn get(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterate categories in rule order with their counts
    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }

    /// Add another document's counts into this one (batch totals)
    pub fn merge(&mut self, other: &RedactionStatistics) {
        for (category, count) in other.iter() {
            self.record(category, count);
        }
    }
}

/// Redacted text plus the statistics gathered while producing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactedDocument {
    pub text: String,
    pub statistics: RedactionStatistics,
}

impl RedactedDocument {
    pub fn new(text: String, statistics: RedactionStatistics) -> Self {
        Self { text, statistics }
    }

    /// An empty document with zero counts for the given categories
    pub fn empty(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            text: String::new(),
            statistics: RedactionStatistics::for_categories(categories),
        }
    }

    pub fn total_redactions(&self) -> usize {
        self.statistics.total()
    }
}
