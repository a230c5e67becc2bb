// src/crawl/structured.rs
// =============================================================================
// Structured fan-out: every branch runs its children in a JoinSet and waits
// for them, so branches nest strictly inside their parents.
//
// Each parent owns a scope token (a child of the search token). When one
// child reports a match, the parent cancels its scope, joins the other
// children (they finish an in-flight fetch, then stop) and hands the match
// to its own parent, which does the same, up to the seed.
// =============================================================================

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use super::search::{Search, Visit};
use super::strategy::Schedule;

pub struct Structured;

#[async_trait]
impl Schedule for Structured {
    async fn traverse(&self, search: Arc<Search>, seed: Url) -> Option<Url> {
        let scope = search.token().child_token();
        let found = dig(Arc::clone(&search), scope, seed).await;
        search.winner().or(found)
    }
}

// Recursive async fns need a boxed future
fn dig(search: Arc<Search>, scope: CancellationToken, uri: Url) -> BoxFuture<'static, Option<Url>> {
    async move {
        if scope.is_cancelled() {
            return None;
        }

        let children = match search.visit(&uri).await {
            Visit::Matched(found) => return Some(found),
            Visit::Expand(children) if !children.is_empty() => children,
            Visit::Expand(_) | Visit::Skipped => return None,
        };

        let scope = scope.child_token();
        let mut subtasks = JoinSet::new();
        for child in children {
            if scope.is_cancelled() {
                break;
            }
            subtasks.spawn(dig(Arc::clone(&search), scope.clone(), child));
        }

        let mut found = None;
        while let Some(joined) = subtasks.join_next().await {
            match joined {
                Ok(Some(hit)) => {
                    found = Some(hit);
                    break;
                }
                Ok(None) => {}
                Err(error) => warn!(%uri, %error, "branch failed"),
            }
        }

        if found.is_some() {
            debug!(%uri, "shutting down scope");
            scope.cancel();
        }
        // Cancelled siblings only finish a fetch already in flight
        while let Some(joined) = subtasks.join_next().await {
            if let Err(error) = joined {
                warn!(%uri, %error, "branch failed");
            }
        }
        found
    }
    .boxed()
}
