//! Core domain models for ticket-audit
//!
//! This crate contains:
//! - Redaction models (Category, RedactionStatistics, RedactedDocument)
//! - Extracted source documents
//! - The fixed audit question table and audit report types

pub mod audit;
pub mod document;
pub mod error;
pub mod redaction;

pub use audit::{
    AuditQuestion, AuditReport, AuditStatus, AuditSummary, Provider, QuestionResult, QUESTIONS,
};
pub use document::SourceDocument;
pub use error::{Error, Result};
pub use redaction::{Category, RedactedDocument, RedactionStatistics};
