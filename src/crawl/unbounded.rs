// src/crawl/unbounded.rs
// =============================================================================
// One tokio task per discovered URI, no limit on fan-out.
//
// A shared counter tracks live branches: it is incremented by the parent
// BEFORE the child is spawned and decremented when the child finishes, so
// it can only reach zero once the whole reachable graph has been visited.
//
// The traversal stops scheduling as soon as the search is cancelled (a
// match, or an external abort) and returns once the counter drops to zero.
// Branches still mid-fetch when cancelled finish that one fetch and exit
// without spawning children.
// =============================================================================

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;
use url::Url;

use super::search::{Search, Visit};
use super::strategy::Schedule;

pub struct Unbounded;

#[async_trait]
impl Schedule for Unbounded {
    async fn traverse(&self, search: Arc<Search>, seed: Url) -> Option<Url> {
        let live = Arc::new(LiveBranches::default());
        spawn_branch(Arc::clone(&search), Arc::clone(&live), seed);

        tokio::select! {
            _ = search.cancelled() => debug!("search cancelled"),
            _ = live.drained() => debug!("all branches finished"),
        }

        // Cancelled branches start no new fetch, so this only waits for the
        // ones already in flight and keeps the statistics complete
        live.drained().await;
        search.winner()
    }
}

fn spawn_branch(search: Arc<Search>, live: Arc<LiveBranches>, uri: Url) {
    live.enter();
    tokio::spawn(async move {
        // Decrements even if the branch panics
        let _exit = BranchExit(Arc::clone(&live));

        if let Visit::Expand(children) = search.visit(&uri).await {
            for child in children {
                if search.is_cancelled() {
                    debug!(%uri, "cancelled, not spawning further children");
                    break;
                }
                spawn_branch(Arc::clone(&search), Arc::clone(&live), child);
            }
        }
    });
}

// Wait-group for the branches of one traversal
#[derive(Debug, Default)]
struct LiveBranches {
    remaining: AtomicUsize,
    drained: Notify,
}

impl LiveBranches {
    fn enter(&self) {
        self.remaining.fetch_add(1, Ordering::AcqRel);
    }

    fn exit(&self) {
        let before = self.remaining.fetch_sub(1, Ordering::AcqRel);
        debug!(remaining = before - 1, "branch finished");
        if before == 1 {
            // notify_one keeps a permit if nobody is waiting yet
            self.drained.notify_one();
        }
    }

    async fn drained(&self) {
        while self.remaining.load(Ordering::Acquire) > 0 {
            self.drained.notified().await;
        }
    }
}

struct BranchExit(Arc<LiveBranches>);

impl Drop for BranchExit {
    fn drop(&mut self) {
        self.0.exit();
    }
}
