// src/memory/store.rs
// =============================================================================
// The crawl's shared memory: which pages were already fetched (history) and
// which pages are being fetched right now (in-flight locks).
//
// The protocol every branch follows for one URI:
// 1. acquire(uri)   -> waits until this branch owns the URI
// 2. resolve(...)   -> returns the stored report, or computes and stores it
// 3. drop the lock  -> the next waiter reads the stored report
//
// Because the report is stored BEFORE the lock is released, a page is
// fetched at most once per crawl no matter how many branches ask for it.
//
// Rust concepts:
// - DashMap: a concurrent HashMap split into shards (no global lock)
// - Arc: shared ownership of reports and lock handles between tasks
// - Drop: the lock guard cleans up after itself on every exit path
// =============================================================================

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use url::Url;

use super::Statistics;
use crate::scout::Report;

// Process-wide dedup and cache store for one crawl
#[derive(Debug, Default)]
pub struct Memory {
    // Append-only: once a URI has a report it never changes
    history: DashMap<Url, Arc<Report>>,
    // Present only while some branch holds (or waits for) the URI
    inflight: DashMap<Url, Arc<Mutex<()>>>,
}

// Exclusive right to fetch one URI.
//
// Releasing happens in Drop, so the lock is given back on success, on early
// return and when the owning task is cancelled.
#[derive(Debug)]
pub struct SourceLock<'a> {
    memory: &'a Memory,
    source: Url,
    handle: Arc<Mutex<()>>,
    _guard: OwnedMutexGuard<()>,
}

// References to a handle nobody waits on: the map, `handle` and the guard
const UNSHARED_HANDLE_REFS: usize = 3;

impl Drop for SourceLock<'_> {
    fn drop(&mut self) {
        // Only remove our own handle, and only while no other branch holds a
        // clone of it: a waiter must inherit the entry, or a later acquire
        // would lock a fresh handle next to it.
        self.memory.inflight.remove_if(&self.source, |_, handle| {
            Arc::ptr_eq(handle, &self.handle) && Arc::strong_count(handle) <= UNSHARED_HANDLE_REFS
        });
    }
}

// What resolve() hands back
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The one report stored for this URI
    pub report: Arc<Report>,
    /// true if this call computed the report, false if it was cached
    pub fresh: bool,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    // Number of stored reports
    pub fn size(&self) -> usize {
        self.history.len()
    }

    // True if nobody holds a lock for the URI and no report exists yet.
    //
    // This is only a cheap pre-filter for scheduling: two branches may both
    // see `true` for the same URI. The lock + resolve protocol is what
    // actually guarantees a single fetch.
    pub fn unknown(&self, source: &Url) -> bool {
        !self.inflight.contains_key(source) && !self.history.contains_key(source)
    }

    // Waits until the caller owns the URI.
    //
    // Never call this twice for the same URI from one branch without
    // dropping the first lock: the second call would wait forever.
    pub async fn acquire(&self, source: &Url) -> SourceLock<'_> {
        // The map guard is a temporary, so no shard stays locked across .await
        let handle = Arc::clone(
            self.inflight
                .entry(source.clone())
                .or_insert_with(Default::default)
                .value(),
        );
        let guard = Arc::clone(&handle).lock_owned().await;
        debug!(%source, "acquired source lock");

        SourceLock {
            memory: self,
            source: source.clone(),
            handle,
            _guard: guard,
        }
    }

    // Gives the lock back. Same as dropping it, spelled out for call sites
    // that want to make the release visible.
    pub fn release(&self, lock: SourceLock<'_>) {
        debug!(source = %lock.source, "released source lock");
        drop(lock);
    }

    // Returns the cached report for the locked URI, or runs `compute` once
    // and stores its report.
    //
    // Taking the lock by reference is how the signature enforces that the
    // caller holds it.
    pub async fn resolve<F, Fut>(&self, lock: &SourceLock<'_>, compute: F) -> Resolution
    where
        F: FnOnce(Url) -> Fut,
        Fut: Future<Output = Report>,
    {
        debug_assert!(std::ptr::eq(lock.memory, self), "lock belongs to another memory");

        let cached = self
            .history
            .get(&lock.source)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(report) = cached {
            return Resolution {
                report,
                fresh: false,
            };
        }

        let report = Arc::new(compute(lock.source.clone()).await);
        self.history
            .insert(lock.source.clone(), Arc::clone(&report));

        Resolution {
            report,
            fresh: true,
        }
    }

    // Snapshot of the aggregate numbers.
    //
    // Safe to call while other branches are still fetching: it simply folds
    // over whatever reports exist right now.
    pub fn statistics(&self) -> Statistics {
        self.history
            .iter()
            .fold(Statistics::default(), |stats, entry| stats.record(entry.value()))
    }
}
