// src/crawl/strategy.rs
// =============================================================================
// Scheduling policies for the traversal engine.
//
// All policies share the same branch logic (Search::visit) and therefore the
// same guarantees: one fetch per URI, first match wins, termination once the
// reachable graph is exhausted. They only differ in HOW children are run:
//
// - sequential: one branch at a time, depth-first
// - unbounded:  every branch is its own tokio task, a shared counter
//               detects when the last one finished
// - structured: every parent waits for its children in a JoinSet and
//               cancels its own scope as soon as one child reports a match
// =============================================================================

use async_trait::async_trait;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

use super::search::Search;
use super::sequential::Sequential;
use super::structured::Structured;
use super::unbounded::Unbounded;

// The capability every policy provides: walk the graph from `seed` until
// the search is cancelled or nothing is left, returning the match (if any)
#[async_trait]
pub trait Schedule: Send + Sync {
    async fn traverse(&self, search: Arc<Search>, seed: Url) -> Option<Url>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Depth-first, no concurrency
    Sequential,
    /// One task per discovered URI, no nesting
    #[default]
    Unbounded,
    /// One task per URI, parents wait for their children
    Structured,
}

impl Strategy {
    pub fn policy(self) -> Box<dyn Schedule> {
        match self {
            Strategy::Sequential => Box::new(Sequential),
            Strategy::Unbounded => Box::new(Unbounded),
            Strategy::Structured => Box::new(Structured),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Sequential => "sequential",
            Strategy::Unbounded => "unbounded",
            Strategy::Structured => "structured",
        };
        f.write_str(name)
    }
}
