// src/assess/mod.rs
// =============================================================================
// Judgements the crawl needs that are not about fetching itself.
//
// Submodules:
// - relevance: should a discovered link be followed at all? (host allow-list)
// - verify:    does the winning page really contain the query? (fresh GET)
// =============================================================================

mod relevance;
mod verify;

pub use relevance::RelevanceFilter;
pub use verify::Verifier;
