// src/memory/mod.rs
// =============================================================================
// This module remembers everything a crawl has learned so far.
//
// Submodules:
// - store: the history of reports plus the per-URI locks that make sure
//          every page is fetched at most once
// - stats: aggregate numbers folded over the history
//
// One Memory lives exactly as long as one crawl. Every branch of the crawl
// shares it through an Arc.
// =============================================================================

mod stats;
mod store;

pub use stats::Statistics;
pub use store::{Memory, Resolution};
