//! Memoized metadata query execution.
//!
//! [`CachingQueryFetcher`] sits between the hydration orchestrator and a
//! [`MetaQueryRunner`]. It executes each `(endpoint, query)` pair at most once
//! and hands every caller its own copy of the parsed values.
//!
//! # Concurrency
//!
//! Entries live in a `DashMap` keyed by endpoint and query text. Each entry is
//! an `Arc<tokio::sync::OnceCell>` so the *in-flight* fetch is shared, not just
//! the finished result: a second caller asking for a key that is still being
//! fetched waits on the same cell instead of issuing another request.
//!
//! ```text
//! task A ── fetch(e, q) ──► cell(e, q) empty ──► runner.run_meta_query ──► cell = [..]
//! task B ── fetch(e, q) ──► cell(e, q) initializing ──► wait ──────────────► clone [..]
//! ```
//!
//! A cell holds the outcome of its attempt, error included, so every waiter
//! of a failed attempt gets that error without running the query again. The
//! failed entry is then removed from the map and the next call retries.
//!
//! # Scope
//!
//! A fetcher is owned by whoever drives a hydration pass. There is no global
//! cache. [`CachingQueryFetcher::bind_endpoint`] lets one fetcher serve
//! dashboards on different data sources one after another: binding a new
//! endpoint drops every entry belonging to another endpoint.

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::core::Result;
use crate::source::{MetaQueryRunner, parse_meta_query};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    endpoint: String,
    query: String,
}

/// Hit and miss counters of a [`CachingQueryFetcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered without running a query (including requests that
    /// waited for an in-flight fetch)
    pub hits: usize,
    /// Queries actually handed to the runner
    pub misses: usize,
}

impl CacheStats {
    /// Share of requests served from the cache, in percent.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Executes metadata queries through a runner, at most once per key.
pub struct CachingQueryFetcher<R> {
    runner: R,
    entries: DashMap<CacheKey, Arc<OnceCell<Result<Vec<String>>>>>,
    endpoint: Mutex<Option<String>>,
    requests: AtomicUsize,
    misses: AtomicUsize,
}

impl<R: MetaQueryRunner> CachingQueryFetcher<R> {
    /// Create a fetcher with an empty cache and no bound endpoint.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            entries: DashMap::new(),
            endpoint: Mutex::new(None),
            requests: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// The underlying runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Fetch the values of `query` on `endpoint`.
    ///
    /// The first call for a key runs the query and parses the response with
    /// [`parse_meta_query`]; later and concurrent calls share that result.
    /// A failure is shared by the calls waiting on that attempt only.
    ///
    /// # Errors
    ///
    /// Propagates runner and parser errors unchanged.
    pub async fn fetch(&self, endpoint: &str, query: &str) -> Result<Vec<String>> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let key = CacheKey {
            endpoint: endpoint.to_string(),
            query: query.to_string(),
        };
        // clone the cell out so no map shard stays locked across the await
        let cell = Arc::clone(&self.entries.entry(key.clone()).or_default());

        if let Some(Ok(values)) = cell.get() {
            trace!("Query cache hit on {}: {}", endpoint, query);
            return Ok(values.clone());
        }

        let outcome = cell
            .get_or_init(|| async {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Query cache miss on {}: {}", endpoint, query);
                let response = self.runner.run_meta_query(endpoint, query).await?;
                parse_meta_query(query, &response)
            })
            .await;

        if outcome.is_err() {
            // only drop the cell of this attempt, a retry may already own the key
            self.entries.remove_if(&key, |_, current| Arc::ptr_eq(current, &cell));
        }

        outcome.clone()
    }

    /// Bind the fetcher to `endpoint`.
    ///
    /// When the endpoint differs from the one currently bound, every cached
    /// entry for another endpoint is dropped.
    pub fn bind_endpoint(&self, endpoint: &str) {
        let mut bound = self.endpoint.lock().unwrap_or_else(PoisonError::into_inner);
        if bound.as_deref() == Some(endpoint) {
            return;
        }

        let before = self.entries.len();
        self.entries.retain(|key, _| key.endpoint == endpoint);
        debug!(
            "Bound query cache to {} (dropped {} entries)",
            endpoint,
            before.saturating_sub(self.entries.len())
        );
        *bound = Some(endpoint.to_string());
    }

    /// The endpoint last passed to [`bind_endpoint`](Self::bind_endpoint).
    pub fn bound_endpoint(&self) -> Option<String> {
        self.endpoint.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of cached keys, including ones still being fetched.
    ///
    /// Keys whose fetch failed are not counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current hit and miss counts.
    pub fn stats(&self) -> CacheStats {
        let requests = self.requests.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            hits: requests.saturating_sub(misses),
            misses,
        }
    }

    /// Drop every cached entry and reset the counters.
    pub fn clear(&self) {
        self.entries.clear();
        self.requests.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
