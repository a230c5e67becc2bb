// src/scout/report.rs
// =============================================================================
// The result of fetching one page.
//
// A Report is created exactly once per URI (Memory makes sure of that) and
// is shared read-only behind an Arc afterwards.
// =============================================================================

use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The page that was fetched
    pub source: Url,
    /// The query string the page was searched for
    pub query: String,
    /// Whether the raw body contains the query
    pub found: bool,
    /// Sorted, deduplicated, fragment-free links (empty on a match)
    pub references: Vec<Url>,
    /// Length of the raw body in bytes, 0 if nothing was received
    pub response_size: usize,
}

impl Report {
    // The page contains the query, links were not extracted
    pub fn matched(source: Url, query: &str, response_size: usize) -> Self {
        Self {
            source,
            query: query.to_string(),
            found: true,
            references: Vec::new(),
            response_size,
        }
    }

    // No match and nothing to follow: error pages, non-HTML responses and
    // failed requests all end up here
    pub fn dead_end(source: Url, query: &str, response_size: usize) -> Self {
        Self {
            source,
            query: query.to_string(),
            found: false,
            references: Vec::new(),
            response_size,
        }
    }

    // No match, but links to follow
    pub fn expanded(source: Url, query: &str, references: Vec<Url>, response_size: usize) -> Self {
        Self {
            source,
            query: query.to_string(),
            found: false,
            references,
            response_size,
        }
    }
}
