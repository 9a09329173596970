//! Declarative cache of server-derived state.
//!
//! Entries hold a JSON snapshot keyed by [`QueryKey`]. A fresh entry is
//! served as-is; a stale one is served immediately while a background
//! refresh replaces it (stale-while-revalidate); a missing or
//! invalidated one is fetched before returning. Per-key epochs let
//! mutations cancel in-flight fetches so a slow response cannot clobber
//! an optimistic write; beyond that, last write to the cache wins.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use chatter_api::ApiError;
use chatter_types::Page;

use crate::key::QueryKey;

/// App-wide default freshness window.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Per-query tuning. Queries retry once by default; mutations never go
/// through this path at all.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub stale_time: Duration,
    pub retries: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            retries: 1,
        }
    }
}

impl QueryOptions {
    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn no_retry(mut self) -> Self {
        self.retries = 0;
        self
    }
}

struct Entry {
    value: Value,
    updated_at: Instant,
    invalidated: bool,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<QueryKey, Entry>,
    /// Bumped by `cancel`; a fetch writes back only if the epoch it
    /// started under is still current.
    epochs: HashMap<QueryKey, u64>,
    /// Keys with a background revalidation in flight. Repeated hits on
    /// the same stale entry share one refresh instead of stacking them.
    revalidating: HashSet<QueryKey>,
}

#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
}

enum Lookup {
    Fresh(Value),
    Stale(Value),
    Miss,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a query through the cache.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (lookup, epoch) = self.lookup(&key, options.stale_time);

        match lookup {
            Lookup::Fresh(value) => Ok(serde_json::from_value(value)?),
            Lookup::Stale(value) => {
                if self.begin_revalidate(&key) {
                    let cache = self.clone();
                    let bg_key = key.clone();
                    tokio::spawn(async move {
                        let result = cache
                            .run_fetch::<T, _, _>(&bg_key, epoch, options.retries, &fetcher)
                            .await;
                        cache.end_revalidate(&bg_key);
                        if let Err(e) = result {
                            debug!("Background revalidation of {} failed: {}", bg_key, e);
                        }
                    });
                }
                Ok(serde_json::from_value(value)?)
            }
            Lookup::Miss => self.run_fetch(&key, epoch, options.retries, &fetcher).await,
        }
    }

    /// Resolve a paginated query: the cached value is every page
    /// fetched so far, concatenated in fetch order.
    pub async fn fetch_infinite<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetch_page: F,
    ) -> Result<Vec<Page<T>>, ApiError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, ApiError>> + Send + 'static,
    {
        let (lookup, epoch) = self.lookup(&key, options.stale_time);

        match lookup {
            Lookup::Fresh(value) => Ok(serde_json::from_value(value)?),
            Lookup::Stale(value) => {
                let pages: Vec<Page<T>> = serde_json::from_value(value)?;
                if self.begin_revalidate(&key) {
                    let cache = self.clone();
                    let bg_key = key.clone();
                    let held = pages.len() as u32;
                    tokio::spawn(async move {
                        let result = cache
                            .refetch_pages::<T, _, _>(
                                &bg_key,
                                epoch,
                                options.retries,
                                held,
                                &fetch_page,
                            )
                            .await;
                        cache.end_revalidate(&bg_key);
                        if let Err(e) = result {
                            debug!("Background revalidation of {} failed: {}", bg_key, e);
                        }
                    });
                }
                Ok(pages)
            }
            Lookup::Miss => {
                self.refetch_pages(&key, epoch, options.retries, 1, &fetch_page)
                    .await
            }
        }
    }

    /// Fetch the page after the last one currently held, if the last
    /// page says there is one. Returns the full retained page list.
    pub async fn fetch_next_page<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: QueryOptions,
        fetch_page: F,
    ) -> Result<Vec<Page<T>>, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        let epoch = self.current_epoch(key);
        let mut pages: Vec<Page<T>> = self.get(key).unwrap_or_default();

        let next = match pages.last() {
            Some(last) if last.has_next() => last.page + 1,
            Some(_) => return Ok(pages),
            None => 1,
        };

        let page = run_attempts(key, options.retries, || fetch_page(next)).await?;
        pages.push(page);
        self.store_if_current(key, epoch, serde_json::to_value(&pages)?);
        Ok(pages)
    }

    /// Refetch every page currently held (at least page 1). Used by
    /// polling so already-loaded history is refreshed, not dropped.
    pub async fn refetch_infinite<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: QueryOptions,
        fetch_page: F,
    ) -> Result<Vec<Page<T>>, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        let epoch = self.current_epoch(key);
        let held = self
            .get::<Vec<Page<Value>>>(key)
            .map(|pages| pages.len() as u32)
            .unwrap_or(0)
            .max(1);
        self.refetch_pages(key, epoch, options.retries, held, &fetch_page)
            .await
    }

    pub fn has_next_page(&self, key: &QueryKey) -> bool {
        self.get::<Vec<Page<Value>>>(key)
            .and_then(|pages| pages.last().map(Page::has_next))
            .unwrap_or(true)
    }

    /// Read a snapshot without touching freshness bookkeeping.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let inner = self.lock();
        let entry = inner.entries.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// Write a snapshot directly (optimistic updates, rollbacks).
    pub fn set<T: Serialize>(&self, key: &QueryKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.lock().entries.insert(
                    key.clone(),
                    Entry {
                        value,
                        updated_at: Instant::now(),
                        invalidated: false,
                    },
                );
            }
            Err(e) => warn!("Cannot cache value under {}: {}", key, e),
        }
    }

    /// Mark matching entries untrustworthy. They keep serving their
    /// current snapshot via `get`, but the next `fetch` refetches.
    pub fn invalidate(&self, prefix: &QueryKey) {
        let mut inner = self.lock();
        let mut count = 0;
        for (key, entry) in inner.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }
        debug!("Invalidated {} entries under {}", count, prefix);
    }

    /// Discard the results of in-flight fetches for matching keys.
    pub fn cancel(&self, prefix: &QueryKey) {
        let mut inner = self.lock();
        let keys: Vec<QueryKey> = inner
            .epochs
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        for key in keys {
            if let Some(epoch) = inner.epochs.get_mut(&key) {
                *epoch += 1;
            }
        }
    }

    pub fn remove(&self, key: &QueryKey) {
        self.lock().entries.remove(key);
    }

    /// Drop everything (logout).
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.epochs.clear();
        inner.revalidating.clear();
    }

    // -- internals --

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, key: &QueryKey, stale_time: Duration) -> (Lookup, u64) {
        let mut inner = self.lock();
        let epoch = *inner.epochs.entry(key.clone()).or_insert(0);
        let lookup = match inner.entries.get(key) {
            // Invalidated entries stay readable through `get`, but a
            // fetch must not serve them, even stale-while-revalidating.
            Some(entry) if entry.invalidated => Lookup::Miss,
            Some(entry) if entry.updated_at.elapsed() < stale_time => {
                Lookup::Fresh(entry.value.clone())
            }
            Some(entry) => Lookup::Stale(entry.value.clone()),
            None => Lookup::Miss,
        };
        (lookup, epoch)
    }

    /// True if this caller claimed the revalidation slot for `key`.
    fn begin_revalidate(&self, key: &QueryKey) -> bool {
        self.lock().revalidating.insert(key.clone())
    }

    fn end_revalidate(&self, key: &QueryKey) {
        self.lock().revalidating.remove(key);
    }

    fn current_epoch(&self, key: &QueryKey) -> u64 {
        let mut inner = self.lock();
        *inner.epochs.entry(key.clone()).or_insert(0)
    }

    fn store_if_current(&self, key: &QueryKey, epoch: u64, value: Value) {
        let mut inner = self.lock();
        let current = inner.epochs.get(key).copied().unwrap_or(0);
        if current != epoch {
            debug!("Discarding cancelled fetch result for {}", key);
            return;
        }
        inner.entries.insert(
            key.clone(),
            Entry {
                value,
                updated_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    async fn run_fetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        epoch: u64,
        retries: u32,
        fetcher: &F,
    ) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let value = run_attempts(key, retries, fetcher).await?;
        self.store_if_current(key, epoch, serde_json::to_value(&value)?);
        Ok(value)
    }

    async fn refetch_pages<T, F, Fut>(
        &self,
        key: &QueryKey,
        epoch: u64,
        retries: u32,
        held: u32,
        fetch_page: &F,
    ) -> Result<Vec<Page<T>>, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(u32) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        let mut pages = Vec::with_capacity(held as usize);
        for number in 1..=held {
            let page: Page<T> = run_attempts(key, retries, || fetch_page(number)).await?;
            let last = !page.has_next();
            pages.push(page);
            // The server may have shrunk since we last paged through.
            if last {
                break;
            }
        }
        self.store_if_current(key, epoch, serde_json::to_value(&pages)?);
        Ok(pages)
    }
}

async fn run_attempts<T, F, Fut>(key: &QueryKey, retries: u32, f: F) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                attempt += 1;
                debug!("Query {} failed (attempt {}), retrying: {}", key, attempt, e);
            }
            Err(e) => return Err(e),
        }
    }
}
