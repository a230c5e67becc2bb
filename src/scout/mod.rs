// src/scout/mod.rs
// =============================================================================
// The scout visits pages for the crawl.
//
// Submodules:
// - report: the immutable result of visiting one page
// - fetch:  HTTP GET, response classification, memoized check()
// - links:  <base href> / <a href> extraction and resolution
// =============================================================================

mod fetch;
mod links;
mod report;

pub use fetch::{build_client, Scout};
pub use report::Report;
