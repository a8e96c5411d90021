//! Key-addressed response cache using moka
//!
//! Reads return cached data while it is fresh and otherwise fetch once per
//! key: concurrent readers of the same key join a single in-flight request.
//! Every write to a key bumps its generation; an in-flight read whose
//! generation has been superseded does not store its result, so an optimistic
//! write is never overwritten by an older response.
//!
//! A key may carry a mask, a transform applied to every value stored under
//! it until removed. Local edits that the server has not seen yet survive
//! refetches this way.

use crate::error::{ApiError, ClientResult};
use crate::keys::QueryKey;
use crate::mutation::Mutation;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use moka::future::Cache;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

type AnyValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyValue, ApiError>>>;
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<AnyValue, ApiError>> + Send + Sync>;
type Mask = Arc<dyn Fn(&AnyValue) -> Option<AnyValue> + Send + Sync>;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
    /// Reads currently on the wire
    pub in_flight: usize,
}

/// Sizing and freshness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Entries unused this long are evicted
    pub idle_eviction: Duration,
    /// Freshness for resources without their own threshold
    pub default_stale_time: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 1_000,
            idle_eviction: Duration::from_secs(5 * 60),
            default_stale_time: Duration::ZERO,
        }
    }
}

#[derive(Clone)]
struct CacheEntry {
    value: AnyValue,
    fetched_at: Instant,
    stale: Arc<AtomicBool>,
}

impl CacheEntry {
    fn new(value: AnyValue) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
            stale: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct InFlight {
    ticket: u64,
    generation: u64,
    future: SharedFetch,
}

struct Inner {
    entries: Cache<QueryKey, CacheEntry>,
    in_flight: DashMap<QueryKey, InFlight>,
    generations: DashMap<QueryKey, u64>,
    fetchers: DashMap<QueryKey, Fetcher>,
    masks: DashMap<QueryKey, Mask>,
    tickets: AtomicU64,
    // serializes check-then-store against writes
    write_lock: Mutex<()>,
    default_stale_time: Duration,
}

/// Shared response cache; clones share state
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache").field("stats", &self.stats()).finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

impl QueryCache {
    /// Create cache
    #[must_use]
    pub fn new(settings: CacheSettings) -> Self {
        let entries = Cache::builder()
            .max_capacity(settings.max_capacity)
            .time_to_idle(settings.idle_eviction)
            .build();
        Self {
            inner: Arc::new(Inner {
                entries,
                in_flight: DashMap::new(),
                generations: DashMap::new(),
                fetchers: DashMap::new(),
                masks: DashMap::new(),
                tickets: AtomicU64::new(0),
                write_lock: Mutex::new(()),
                default_stale_time: settings.default_stale_time,
            }),
        }
    }

    /// Read through the cache
    ///
    /// Returns `Ok(None)` without any network call when the key is disabled.
    /// `fetch` is remembered for later refetches of the same key.
    ///
    /// # Errors
    ///
    /// The fetch error, shared with every reader that joined the request.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> ClientResult<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        if !key.is_enabled() {
            trace!(%key, "query disabled");
            return Ok(None);
        }

        let fetcher: Fetcher = Arc::new(move || fetch().map(|r| r.map(|v| Arc::new(v) as AnyValue)).boxed());
        self.inner.fetchers.insert(key.clone(), fetcher);

        if let Some(entry) = self.inner.entries.get(&key).await {
            if self.is_fresh(&key, &entry) {
                if let Some(value) = entry.value.downcast_ref::<T>() {
                    trace!(%key, "cache hit");
                    return Ok(Some(value.clone()));
                }
            }
        }

        let value = self.load(&key).await?;
        downcast(&key, &value).map(Some)
    }

    /// Cached value regardless of freshness
    pub async fn peek<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.inner
            .entries
            .get(key)
            .await
            .and_then(|entry| entry.value.downcast_ref::<T>().cloned())
    }

    /// Whether `key` holds a fresh value
    pub async fn is_cached_fresh(&self, key: &QueryKey) -> bool {
        match self.inner.entries.get(key).await {
            Some(entry) => self.is_fresh(key, &entry),
            None => false,
        }
    }

    /// Replace the value of a key, superseding any in-flight read
    pub async fn set_data<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        let _guard = self.inner.write_lock.lock().await;
        self.supersede(key);
        let value = self.masked(key, Arc::new(value));
        self.inner.entries.insert(key.clone(), CacheEntry::new(value)).await;
    }

    /// Modify the cached value in place
    ///
    /// Returns `None`, changing nothing, when the key holds no value of type `T`.
    pub async fn update<T, R, F>(&self, key: &QueryKey, f: F) -> Option<R>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.inner.write_lock.lock().await;
        let mut value = self.peek::<T>(key).await?;
        let result = f(&mut value);
        self.supersede(key);
        let value = self.masked(key, Arc::new(value));
        self.inner.entries.insert(key.clone(), CacheEntry::new(value)).await;
        Some(result)
    }

    /// Apply `mask` to the value under `key` now and to every value stored
    /// there afterwards, until [`unmask`](Self::unmask)
    ///
    /// Values of another type than `T` pass through untouched. A second mask
    /// on the same key replaces the first.
    pub async fn mask<T, F>(&self, key: &QueryKey, mask: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        let apply: Mask = Arc::new(move |value: &AnyValue| {
            value.downcast_ref::<T>().map(|current| {
                let mut value = current.clone();
                mask(&mut value);
                Arc::new(value) as AnyValue
            })
        });

        let _guard = self.inner.write_lock.lock().await;
        if let Some(entry) = self.inner.entries.get(key).await {
            if let Some(value) = apply(&entry.value) {
                let entry = CacheEntry { value, ..entry };
                self.inner.entries.insert(key.clone(), entry).await;
            }
        }
        self.inner.masks.insert(key.clone(), apply);
        debug!(%key, "mask set");
    }

    /// Stop masking `key`; the cached value is left as it is
    pub fn unmask(&self, key: &QueryKey) {
        if self.inner.masks.remove(key).is_some() {
            debug!(%key, "mask removed");
        }
    }

    /// Cancel in-flight reads of every key under `prefix`
    ///
    /// Their callers still receive a value but nothing is stored.
    pub fn cancel(&self, prefix: &QueryKey) {
        let keys: Vec<QueryKey> = self
            .inner
            .in_flight
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        for key in keys {
            debug!(%key, "cancelling in-flight read");
            self.supersede(&key);
        }
    }

    /// Mark every entry under `prefix` stale and cancel its in-flight reads
    ///
    /// The next read of a stale entry refetches.
    pub fn invalidate(&self, prefix: &QueryKey) {
        let mut marked = 0usize;
        for (key, entry) in self.inner.entries.iter() {
            if key.starts_with(prefix) {
                entry.stale.store(true, Ordering::Release);
                marked += 1;
            }
        }
        self.cancel(prefix);
        debug!(%prefix, marked, "invalidated");
    }

    /// Invalidate everything a mutation touches
    pub fn invalidate_for(&self, mutation: &Mutation) {
        for target in mutation.invalidation_targets() {
            self.invalidate(&target);
        }
    }

    /// Fetch a key again now, ignoring freshness and any in-flight read
    ///
    /// A key that was never read through [`fetch`](Self::fetch) has no fetcher
    /// and is left alone.
    pub async fn refetch(&self, key: &QueryKey) -> ClientResult<()> {
        if !self.inner.fetchers.contains_key(key) {
            trace!(%key, "no fetcher registered, skipping refetch");
            return Ok(());
        }
        self.cancel(key);
        self.load(key).await.map(|_| ())
    }

    /// Refetch every cached key under `prefix`
    ///
    /// # Errors
    ///
    /// The first failure; remaining keys are still refetched.
    pub async fn refetch_matching(&self, prefix: &QueryKey) -> ClientResult<()> {
        let keys: Vec<QueryKey> = self
            .inner
            .fetchers
            .iter()
            .map(|e| e.key().clone())
            .filter(|k| k.starts_with(prefix) && self.inner.entries.contains_key(k))
            .collect();

        let mut first_error = None;
        for key in keys {
            if let Err(err) = self.refetch(&key).await {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Refetch in the background; failures are logged
    pub fn schedule_refetch(&self, prefix: QueryKey) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            if let Err(err) = cache.refetch_matching(&prefix).await {
                warn!(%prefix, error = %err, "background refetch failed");
            }
        })
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inner.entries.invalidate_all();
        self.inner.masks.clear();
        for entry in &self.inner.in_flight {
            self.bump(entry.key());
        }
        self.inner.in_flight.clear();
    }

    /// Cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entries.entry_count(),
            in_flight: self.inner.in_flight.len(),
        }
    }

    fn is_fresh(&self, key: &QueryKey, entry: &CacheEntry) -> bool {
        !entry.stale.load(Ordering::Acquire)
            && entry.fetched_at.elapsed() < key.stale_time(self.inner.default_stale_time)
    }

    fn generation(&self, key: &QueryKey) -> u64 {
        self.inner.generations.get(key).map_or(0, |g| *g)
    }

    fn bump(&self, key: &QueryKey) {
        *self.inner.generations.entry(key.clone()).or_insert(0) += 1;
    }

    fn masked(&self, key: &QueryKey, value: AnyValue) -> AnyValue {
        let mask = self.inner.masks.get(key).map(|m| Arc::clone(m.value()));
        match mask {
            Some(mask) => mask(&value).unwrap_or(value),
            None => value,
        }
    }

    fn supersede(&self, key: &QueryKey) {
        self.bump(key);
        self.inner.in_flight.remove(key);
    }

    async fn load(&self, key: &QueryKey) -> ClientResult<AnyValue> {
        let (ticket, generation, future) = {
            use dashmap::mapref::entry::Entry;

            match self.inner.in_flight.entry(key.clone()) {
                Entry::Occupied(slot) => {
                    trace!(%key, "joining in-flight read");
                    let flight = slot.get();
                    (flight.ticket, flight.generation, flight.future.clone())
                }
                Entry::Vacant(slot) => {
                    let fetcher = self
                        .inner
                        .fetchers
                        .get(key)
                        .map(|f| Arc::clone(f.value()))
                        .ok_or_else(|| ApiError::Config(format!("no fetcher for query '{key}'")))?;
                    let ticket = self.inner.tickets.fetch_add(1, Ordering::Relaxed);
                    let generation = self.generation(key);
                    let future = fetcher().shared();
                    trace!(%key, generation, "starting read");
                    slot.insert(InFlight {
                        ticket,
                        generation,
                        future: future.clone(),
                    });
                    (ticket, generation, future)
                }
            }
        };

        let result = future.await;
        self.inner.in_flight.remove_if(key, |_, f| f.ticket == ticket);
        let value = result?;

        let _guard = self.inner.write_lock.lock().await;
        if self.generation(key) == generation {
            let value = self.masked(key, value);
            self.inner
                .entries
                .insert(key.clone(), CacheEntry::new(Arc::clone(&value)))
                .await;
            Ok(value)
        } else {
            debug!(%key, "discarding superseded read");
            Ok(self
                .inner
                .entries
                .get(key)
                .await
                .map_or(value, |entry| entry.value))
        }
    }
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: &AnyValue) -> ClientResult<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| ApiError::Decode(format!("cached value for '{key}' has an unexpected type")))
}
