//! Timeline of one case: grace-period delete with undo
//!
//! A delete removes the event from the cached list at once and parks it in a
//! single pending slot. The server is only told when the grace window runs
//! out, when another delete arrives, or on [`TimelineController::flush`].
//! Undo inside the window puts the event back where it was without any
//! request. While the slot is full the event stays masked out of every list
//! stored under the case's events key, refetches included.
//!
//! ```text
//!   delete(a) ──► slot: a ──(grace)──► DELETE a ──► refetch
//!                    │
//!                    ├── undo() ──► a reinserted, slot empty
//!                    └── delete(b) ──► DELETE a now, slot: b
//! ```

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::keys::QueryKey;
use crate::resources::EventsApi;
use audittrail_model::{CaseId, CreateEventRequest, EventId, EventListResponse, TimelineEvent};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default undo window
pub const DEFAULT_UNDO_GRACE: Duration = Duration::from_secs(5);

struct PendingRemoval {
    seq: u64,
    event: TimelineEvent,
    index: usize,
    timer: JoinHandle<()>,
}

struct Inner {
    case_id: CaseId,
    client: ApiClient,
    cache: QueryCache,
    grace: Duration,
    seq: AtomicU64,
    pending: Mutex<Option<PendingRemoval>>,
}

impl Inner {
    fn key(&self) -> QueryKey {
        QueryKey::events(&self.case_id)
    }

    /// Timer fired; commit only if the slot still holds this removal
    async fn expire(&self, seq: u64) {
        let mut slot = self.pending.lock().await;
        if slot.as_ref().map(|p| p.seq) != Some(seq) {
            return;
        }
        if let Some(removal) = slot.take() {
            debug!(event_id = %removal.event.id, "undo window elapsed");
            self.commit(&removal.event.id).await;
        }
    }

    /// Send the delete, then reload the list whatever the outcome
    async fn commit(&self, event_id: &EventId) {
        let path = format!("/api/cases/{}/events/{event_id}", self.case_id);
        match self.client.delete(&path).await {
            Ok(()) => info!(case_id = %self.case_id, %event_id, "event deleted"),
            Err(err) => warn!(case_id = %self.case_id, %event_id, error = %err, "event delete failed"),
        }
        let key = self.key();
        self.cache.unmask(&key);
        self.cache.invalidate(&key);
        if let Err(err) = self.cache.refetch(&key).await {
            warn!(%key, error = %err, "timeline refetch failed");
        }
    }
}

/// Timeline actions for one case
#[derive(Clone)]
pub struct TimelineController {
    inner: Arc<Inner>,
    events: EventsApi,
}

impl std::fmt::Debug for TimelineController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineController")
            .field("case_id", &self.inner.case_id)
            .field("grace", &self.inner.grace)
            .finish_non_exhaustive()
    }
}

impl TimelineController {
    /// Controller with the default undo window
    #[must_use]
    pub fn new(client: ApiClient, cache: QueryCache, case_id: CaseId) -> Self {
        Self::with_grace(client, cache, case_id, DEFAULT_UNDO_GRACE)
    }

    /// Controller with a custom undo window
    #[must_use]
    pub fn with_grace(client: ApiClient, cache: QueryCache, case_id: CaseId, grace: Duration) -> Self {
        let events = EventsApi::new(client.clone(), cache.clone());
        Self {
            inner: Arc::new(Inner {
                case_id,
                client,
                cache,
                grace,
                seq: AtomicU64::new(0),
                pending: Mutex::new(None),
            }),
            events,
        }
    }

    /// Case this timeline belongs to
    #[must_use]
    pub fn case_id(&self) -> &CaseId {
        &self.inner.case_id
    }

    /// Undo window
    #[must_use]
    pub fn grace(&self) -> Duration {
        self.inner.grace
    }

    /// Current list, through the cache
    pub async fn events(&self) -> ClientResult<Option<EventListResponse>> {
        self.events.list(&self.inner.case_id).await
    }

    /// Append an empty note dated today
    pub async fn add_blank_event(&self) -> ClientResult<TimelineEvent> {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        self.events
            .create(&self.inner.case_id, &CreateEventRequest::note_on(today))
            .await
    }

    /// Remove an event from the cached list and start its undo window
    ///
    /// A removal still waiting in the slot is committed first. Returns
    /// `false`, doing nothing, when the event is not in the cached list.
    pub async fn delete(&self, event_id: &EventId) -> bool {
        let inner = &self.inner;
        let key = inner.key();
        let mut slot = inner.pending.lock().await;

        let present = inner
            .cache
            .peek::<EventListResponse>(&key)
            .await
            .is_some_and(|list| list.get(event_id).is_some());
        if !present {
            debug!(%event_id, "delete ignored, event not cached");
            return false;
        }

        if let Some(previous) = slot.take() {
            previous.timer.abort();
            debug!(event_id = %previous.event.id, "committing previous removal early");
            inner.commit(&previous.event.id).await;
        }

        let Some((index, event)) = inner
            .cache
            .update::<EventListResponse, _, _>(&key, |list| list.remove(event_id))
            .await
            .flatten()
        else {
            return false;
        };
        let hidden = event_id.clone();
        inner
            .cache
            .mask::<EventListResponse, _>(&key, move |list| {
                list.remove(&hidden);
            })
            .await;

        let seq = inner.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let timer_inner = Arc::clone(inner);
        let grace = inner.grace;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            timer_inner.expire(seq).await;
        });
        debug!(%event_id, index, ?grace, "event removed, undo window open");
        *slot = Some(PendingRemoval {
            seq,
            event,
            index,
            timer,
        });
        true
    }

    /// Put the pending event back where it was
    ///
    /// Returns `false` when nothing is pending. A list that already holds the
    /// event is left as it is.
    pub async fn undo(&self) -> bool {
        let inner = &self.inner;
        let Some(removal) = inner.pending.lock().await.take() else {
            return false;
        };
        removal.timer.abort();

        let key = inner.key();
        inner.cache.unmask(&key);
        let event_id = removal.event.id.clone();
        let restored = inner
            .cache
            .update::<EventListResponse, _, _>(&key, |list| list.insert_sorted(removal.event, Some(removal.index)))
            .await;
        match restored {
            Some(index) => debug!(%event_id, index, "delete undone"),
            None => {
                // list evicted meanwhile
                inner.cache.invalidate(&key);
                debug!(%event_id, "delete undone, list reloads on next read");
            }
        }
        true
    }

    /// Commit the pending removal now
    pub async fn flush(&self) {
        let mut slot = self.inner.pending.lock().await;
        if let Some(removal) = slot.take() {
            removal.timer.abort();
            self.inner.commit(&removal.event.id).await;
        }
    }

    /// Event currently inside its undo window
    pub async fn pending(&self) -> Option<TimelineEvent> {
        self.inner.pending.lock().await.as_ref().map(|p| p.event.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credentials, MemoryTokenStore};
    use crate::transport::{ApiResponse, HttpMethod, MockTransport};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    fn event(id: &str, date: &str, time: Option<&str>, order: i64) -> TimelineEvent {
        serde_json::from_value(json!({
            "id": id,
            "case_id": "c1",
            "event_type": "note",
            "event_date": date,
            "event_time": time,
            "sort_order": order,
            "created_by_id": "u1",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    fn list() -> EventListResponse {
        EventListResponse {
            items: vec![
                event("e1", "2024-01-01", None, 0),
                event("e2", "2024-01-01", Some("09:00"), 0),
                event("e3", "2024-01-02", None, 0),
            ],
            total: 3,
        }
    }

    /// Controller whose transport records the path of every DELETE
    async fn controller(grace: Duration) -> (TimelineController, QueryCache, Arc<StdMutex<Vec<String>>>) {
        let deleted = Arc::new(StdMutex::new(Vec::new()));
        let seen = deleted.clone();
        let mut transport = MockTransport::new();
        transport.expect_send().returning(move |request| {
            assert_eq!(request.method, HttpMethod::Delete);
            seen.lock().unwrap().push(request.path);
            Ok(ApiResponse::empty(204))
        });
        let credentials = Arc::new(Credentials::new(Arc::new(MemoryTokenStore::new())));
        let client = ApiClient::new(Arc::new(transport), credentials);
        let cache = QueryCache::default();
        cache.set_data(&QueryKey::events(&CaseId::new("c1")), list()).await;
        let controller = TimelineController::with_grace(client, cache.clone(), CaseId::new("c1"), grace);
        (controller, cache, deleted)
    }

    async fn cached(cache: &QueryCache) -> EventListResponse {
        cache
            .peek::<EventListResponse>(&QueryKey::events(&CaseId::new("c1")))
            .await
            .unwrap()
    }

    fn ids(list: &EventListResponse) -> Vec<&str> {
        list.items.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn undo_restores_position_and_total_without_request() {
        let (timeline, cache, deleted) = controller(DEFAULT_UNDO_GRACE).await;

        assert!(timeline.delete(&EventId::new("e2")).await);
        let after_delete = cached(&cache).await;
        assert_eq!(ids(&after_delete), vec!["e1", "e3"]);
        assert_eq!(after_delete.total, 2);

        assert!(timeline.undo().await);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(cached(&cache).await, list());
        assert!(deleted.lock().unwrap().is_empty());
        assert!(!timeline.undo().await);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_sends_delete_once() {
        let (timeline, _cache, deleted) = controller(DEFAULT_UNDO_GRACE).await;

        timeline.delete(&EventId::new("e1")).await;
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(deleted.lock().unwrap().is_empty());
        assert!(timeline.pending().await.is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*deleted.lock().unwrap(), vec!["/api/cases/c1/events/e1".to_string()]);
        assert!(timeline.pending().await.is_none());
        assert!(!timeline.undo().await);
    }

    #[tokio::test(start_paused = true)]
    async fn second_delete_commits_the_first() {
        let (timeline, cache, deleted) = controller(DEFAULT_UNDO_GRACE).await;

        timeline.delete(&EventId::new("e1")).await;
        timeline.delete(&EventId::new("e3")).await;

        assert_eq!(*deleted.lock().unwrap(), vec!["/api/cases/c1/events/e1".to_string()]);
        assert_eq!(timeline.pending().await.map(|e| e.id), Some(EventId::new("e3")));
        assert_eq!(ids(&cached(&cache).await), vec!["e2"]);

        assert!(timeline.undo().await);
        assert_eq!(ids(&cached(&cache).await), vec!["e2", "e3"]);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_grace_commits_on_next_tick() {
        let (timeline, _cache, deleted) = controller(Duration::ZERO).await;

        timeline.delete(&EventId::new("e2")).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_unknown_event_is_a_no_op() {
        let (timeline, cache, deleted) = controller(DEFAULT_UNDO_GRACE).await;

        assert!(!timeline.delete(&EventId::new("missing")).await);
        assert_eq!(cached(&cache).await, list());
        assert!(timeline.pending().await.is_none());
        assert!(deleted.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn flush_commits_immediately() {
        let (timeline, _cache, deleted) = controller(DEFAULT_UNDO_GRACE).await;

        timeline.delete(&EventId::new("e3")).await;
        timeline.flush().await;

        assert_eq!(deleted.lock().unwrap().len(), 1);
        assert!(!timeline.undo().await);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(deleted.lock().unwrap().len(), 1);
    }
}
