// src/memory/stats.rs
// =============================================================================
// Aggregate numbers about a crawl, folded over every stored report.
// =============================================================================

use serde::Serialize;
use std::fmt;

use crate::scout::Report;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Number of URIs that have a report
    pub sources: usize,
    /// Sum of all reference list lengths
    pub references: usize,
    /// Sum of all response sizes
    pub characters: u64,
}

impl Statistics {
    // Adds one report to the totals
    pub fn record(mut self, report: &Report) -> Self {
        self.sources += 1;
        self.references += report.references.len();
        self.characters += report.response_size as u64;
        self
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# sources: {}", self.sources)?;
        writeln!(f, "# references: {}", self.references)?;
        write!(f, "# characters parsed: {}", self.characters)
    }
}
