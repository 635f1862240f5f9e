//! Context checks around a candidate match

use std::ops::Range;

use regex::Regex;

use crate::rules::{CASE_NUMBER, HOSTNAME, LABELED_CASE};

/// Byte ranges of the current text that exception-carrying rules leave alone.
#[derive(Debug, Default)]
pub(crate) struct ProtectedSpans {
    spans: Vec<Range<usize>>,
}

impl ProtectedSpans {
    /// Case numbers and hostnames, plus lexicon phrases when given
    pub(crate) fn scan(text: &str, phrases: Option<&Regex>) -> Self {
        let mut spans: Vec<Range<usize>> = Vec::new();
        for re in [&*CASE_NUMBER, &*LABELED_CASE, &*HOSTNAME].into_iter().chain(phrases) {
            spans.extend(re.find_iter(text).map(|m| m.range()));
        }
        spans.sort_by_key(|r| r.start);
        Self { spans }
    }

    pub(crate) fn overlaps(&self, range: &Range<usize>) -> bool {
        self.spans
            .iter()
            .take_while(|s| s.start < range.end)
            .any(|s| s.end > range.start)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.spans.len()
    }
}

/// The part of the match's line that precedes it
pub(crate) fn line_prefix(text: &str, start: usize) -> &str {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    &text[line_start..start]
}
