//! Optimistic updates
//!
//! An [`OptimisticUpdate`] moves through `Idle → Pending → Committed` or
//! `Idle → Pending → RolledBack`. Going pending cancels in-flight reads of the
//! key, snapshots the cached value and writes the transformed value. Commit
//! invalidates and schedules a reconciling refetch. Rollback restores the exact
//! snapshot and then reconciles the same way.

use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::keys::QueryKey;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where an optimistic update stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    /// Nothing applied yet
    Idle,
    /// Transformed value visible, server call outstanding
    Pending,
    /// Server accepted
    Committed,
    /// Server rejected; snapshot restored
    RolledBack,
}

/// Snapshot, apply, then commit or restore
#[derive(Debug)]
pub struct OptimisticUpdate<T> {
    cache: QueryCache,
    key: QueryKey,
    reconcile: Vec<QueryKey>,
    phase: MutationPhase,
    snapshot: Option<T>,
}

impl<T: Clone + Send + Sync + 'static> OptimisticUpdate<T> {
    /// Update of `key`; reconciles `key` itself unless told otherwise
    #[must_use]
    pub fn new(cache: QueryCache, key: QueryKey) -> Self {
        Self {
            cache,
            reconcile: vec![key.clone()],
            key,
            phase: MutationPhase::Idle,
            snapshot: None,
        }
    }

    /// Keys to invalidate and refetch once settled
    #[must_use]
    pub fn with_reconcile(mut self, keys: Vec<QueryKey>) -> Self {
        self.reconcile = keys;
        self
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> MutationPhase {
        self.phase
    }

    /// Value captured before the transform
    #[must_use]
    pub fn snapshot(&self) -> Option<&T> {
        self.snapshot.as_ref()
    }

    /// Go pending: cancel reads, snapshot, write the transformed value
    ///
    /// Returns the value now visible, or `None` when nothing was cached.
    /// Only the first call transforms; later calls return `None`.
    pub async fn apply<F: FnOnce(&mut T)>(&mut self, transform: F) -> Option<T> {
        if self.phase != MutationPhase::Idle {
            warn!(key = %self.key, phase = ?self.phase, "optimistic update already applied");
            return None;
        }
        self.phase = MutationPhase::Pending;
        self.cache.cancel(&self.key);

        let mut current = self.cache.peek::<T>(&self.key).await?;
        self.snapshot = Some(current.clone());
        transform(&mut current);
        self.cache.set_data(&self.key, current.clone()).await;
        debug!(key = %self.key, "optimistic value applied");
        Some(current)
    }

    /// Server accepted: invalidate and refetch in the background
    pub fn commit(&mut self) -> Vec<JoinHandle<()>> {
        if self.phase != MutationPhase::Pending {
            return Vec::new();
        }
        self.phase = MutationPhase::Committed;
        self.snapshot = None;
        self.reconcile()
    }

    /// Server rejected: restore the snapshot, then reconcile
    pub async fn rollback(&mut self) -> Vec<JoinHandle<()>> {
        if self.phase != MutationPhase::Pending {
            return Vec::new();
        }
        self.phase = MutationPhase::RolledBack;
        if let Some(snapshot) = self.snapshot.take() {
            self.cache.set_data(&self.key, snapshot).await;
            info!(key = %self.key, "optimistic update rolled back");
        }
        self.reconcile()
    }

    fn reconcile(&self) -> Vec<JoinHandle<()>> {
        self.reconcile
            .iter()
            .map(|key| {
                self.cache.invalidate(key);
                self.cache.schedule_refetch(key.clone())
            })
            .collect()
    }
}

/// Run `send` with `transform` applied optimistically to `key`
///
/// # Errors
///
/// The error of `send`, after the snapshot has been restored.
pub async fn run_optimistic<T, R, F, Fut>(
    update: &mut OptimisticUpdate<T>,
    transform: F,
    send: Fut,
) -> ClientResult<R>
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce(&mut T),
    Fut: Future<Output = ClientResult<R>>,
{
    update.apply(transform).await;
    match send.await {
        Ok(value) => {
            update.commit();
            Ok(value)
        }
        Err(err) => {
            update.rollback().await;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use futures::FutureExt;

    async fn seeded() -> (QueryCache, QueryKey) {
        let cache = QueryCache::default();
        let key = QueryKey::users();
        cache.set_data(&key, vec![1u32, 2, 3]).await;
        (cache, key)
    }

    #[tokio::test]
    async fn rollback_restores_snapshot() {
        let (cache, key) = seeded().await;
        let mut update = OptimisticUpdate::<Vec<u32>>::new(cache.clone(), key.clone());

        let visible = update.apply(|v| v.retain(|n| *n != 2)).await;
        assert_eq!(visible, Some(vec![1, 3]));
        assert_eq!(cache.peek::<Vec<u32>>(&key).await, Some(vec![1, 3]));

        update.rollback().await;
        assert_eq!(update.phase(), MutationPhase::RolledBack);
        assert_eq!(cache.peek::<Vec<u32>>(&key).await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn commit_keeps_value_and_marks_stale() {
        let (cache, key) = seeded().await;
        let mut update = OptimisticUpdate::<Vec<u32>>::new(cache.clone(), key.clone());
        update.apply(|v| v.push(4)).await;

        for handle in update.commit() {
            handle.await.unwrap();
        }
        assert_eq!(update.phase(), MutationPhase::Committed);
        assert_eq!(cache.peek::<Vec<u32>>(&key).await, Some(vec![1, 2, 3, 4]));
        assert!(!cache.is_cached_fresh(&key).await);
    }

    #[tokio::test]
    async fn second_apply_is_ignored() {
        let (cache, key) = seeded().await;
        let mut update = OptimisticUpdate::<Vec<u32>>::new(cache.clone(), key.clone());
        update.apply(|v| v.push(4)).await;
        assert_eq!(update.apply(|v| v.push(5)).await, None);
        assert_eq!(cache.peek::<Vec<u32>>(&key).await, Some(vec![1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn run_rolls_back_on_error() {
        let (cache, key) = seeded().await;
        let mut update = OptimisticUpdate::<Vec<u32>>::new(cache.clone(), key.clone());

        let result: ClientResult<()> = run_optimistic(
            &mut update,
            |v| v.clear(),
            async { Err(ApiError::Server { status: 500, message: "boom".into() }) }.boxed(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(cache.peek::<Vec<u32>>(&key).await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn nothing_cached_means_nothing_to_restore() {
        let cache = QueryCache::default();
        let key = QueryKey::users();
        let mut update = OptimisticUpdate::<Vec<u32>>::new(cache.clone(), key.clone());
        assert_eq!(update.apply(|v| v.push(1)).await, None);
        update.rollback().await;
        assert_eq!(cache.peek::<Vec<u32>>(&key).await, None);
    }
}
