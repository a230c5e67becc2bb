// src/crawl/search.rs
// =============================================================================
// State shared by every branch of one crawl, and the work one branch does.
//
// A branch for URI u:
// 1. gives up if the crawl was cancelled or u is already known
// 2. takes the lock for u and resolves its report (fetching if needed)
// 3. on a match: records u as the winner and cancels the whole crawl
// 4. otherwise: returns the relevant, still unknown references as children
//
// How (and whether concurrently) the children are visited is up to the
// scheduling policy, see strategy.rs.
// =============================================================================

use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::assess::RelevanceFilter;
use crate::memory::{Memory, Resolution};
use crate::scout::Scout;

// Outcome of visiting one URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// Cancelled, already known, or resolved by another branch
    Skipped,
    /// The page contains the query
    Matched(Url),
    /// No match; these children should be visited next
    Expand(Vec<Url>),
}

pub struct Search {
    query: String,
    scout: Arc<Scout>,
    relevance: Arc<RelevanceFilter>,
    cancel: CancellationToken,
    // First match wins; later matches are ignored
    winner: OnceLock<Url>,
}

impl Search {
    pub fn new(
        query: &str,
        scout: Arc<Scout>,
        relevance: Arc<RelevanceFilter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            query: query.to_string(),
            scout,
            relevance,
            cancel,
            winner: OnceLock::new(),
        }
    }

    fn memory(&self) -> &Memory {
        self.scout.memory()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    // Stops every branch at its next scheduling point
    pub fn cancel_all(&self) {
        self.cancel.cancel();
    }

    pub fn winner(&self) -> Option<Url> {
        self.winner.get().cloned()
    }

    fn signal(&self, found: &Url) {
        if self.winner.set(found.clone()).is_ok() {
            info!(%found, "🎯 query found, cancelling remaining branches");
        }
        self.cancel_all();
    }

    pub async fn visit(&self, uri: &Url) -> Visit {
        if self.is_cancelled() {
            debug!(%uri, "cancelled before visiting");
            return Visit::Skipped;
        }
        if !self.memory().unknown(uri) {
            debug!(%uri, "skipping, seen already");
            return Visit::Skipped;
        }

        let Some(Resolution { report, fresh }) =
            self.scout.check(uri, &self.query, &self.cancel).await
        else {
            return Visit::Skipped;
        };

        if !fresh {
            // Whoever fetched it has already handled the outcome
            debug!(%uri, "resolved by another branch");
            return Visit::Skipped;
        }
        if report.found {
            self.signal(uri);
            return Visit::Matched(uri.clone());
        }
        if self.is_cancelled() {
            debug!(%uri, "cancelled after fetch, not expanding");
            return Visit::Skipped;
        }

        let children: Vec<Url> = report
            .references
            .iter()
            .filter(|reference| self.relevance.relevant(reference))
            .filter(|reference| self.memory().unknown(reference))
            .cloned()
            .collect();
        debug!(%uri, children = children.len(), "expanding");
        Visit::Expand(children)
    }
}
