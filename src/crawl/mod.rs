// src/crawl/mod.rs
// =============================================================================
// This module is the traversal engine: it walks the graph of pages starting
// at a seed URI until one page contains the query or nothing is left.
//
// Features:
// - At most one fetch per URI, no matter how many pages link to it
// - Only relevant hosts are followed (the seed is always visited)
// - First match wins and cancels every other branch
// - Three interchangeable scheduling policies (see strategy.rs)
//
// Submodules:
// - crawler:    the entry point (Crawler::dig)
// - search:     shared per-crawl state and the work of one branch
// - strategy:   the Schedule trait and the Strategy selector
// - sequential, unbounded, structured: the three policies
// =============================================================================

mod crawler;
mod search;
mod sequential;
mod strategy;
mod structured;
mod unbounded;

pub use crawler::{CrawlError, Crawler};
pub use strategy::Strategy;
