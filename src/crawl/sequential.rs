// src/crawl/sequential.rs
// =============================================================================
// Depth-first traversal without any concurrency.
//
// An explicit stack replaces recursion, so deep sites cannot overflow the
// call stack. Children are pushed in reverse so they are visited in their
// sorted order.
// =============================================================================

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use super::search::{Search, Visit};
use super::strategy::Schedule;

pub struct Sequential;

#[async_trait]
impl Schedule for Sequential {
    async fn traverse(&self, search: Arc<Search>, seed: Url) -> Option<Url> {
        let mut pending = vec![seed];

        while let Some(uri) = pending.pop() {
            if search.is_cancelled() {
                break;
            }
            match search.visit(&uri).await {
                Visit::Matched(found) => return Some(found),
                Visit::Expand(children) => pending.extend(children.into_iter().rev()),
                Visit::Skipped => {}
            }
        }

        search.winner()
    }
}
