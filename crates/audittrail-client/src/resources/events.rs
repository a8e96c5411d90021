//! Timeline events

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::keys::QueryKey;
use crate::mutation::Mutation;
use crate::optimistic::{run_optimistic, OptimisticUpdate};
use audittrail_model::{CaseId, CreateEventRequest, EventId, EventListResponse, EventPatch, TimelineEvent};
use tracing::{debug, warn};

/// `/api/cases/{case}/events`
#[derive(Debug, Clone)]
pub struct EventsApi {
    client: ApiClient,
    cache: QueryCache,
}

impl EventsApi {
    /// Create API group
    #[must_use]
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    /// Shared cache
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Timeline of a case; `None` when `case_id` is empty
    pub async fn list(&self, case_id: &CaseId) -> ClientResult<Option<EventListResponse>> {
        let client = self.client.clone();
        let path = events_path(case_id);
        self.cache
            .fetch(QueryKey::events(case_id), move || {
                let client = client.clone();
                let path = path.clone();
                async move { client.get::<EventListResponse>(&path).await }
            })
            .await
    }

    /// Add an event
    pub async fn create(&self, case_id: &CaseId, request: &CreateEventRequest) -> ClientResult<TimelineEvent> {
        let event: TimelineEvent = self.client.post(&events_path(case_id), request).await?;
        self.cache.invalidate_for(&mutation(case_id));
        debug!(case_id = %case_id, event_id = %event.id, "event created");
        Ok(event)
    }

    /// Partially update an event, waiting for the server before touching the cache
    pub async fn update(&self, case_id: &CaseId, event_id: &EventId, patch: &EventPatch) -> ClientResult<TimelineEvent> {
        let event: TimelineEvent = self.client.patch(&event_path(case_id, event_id), patch).await?;
        self.cache.invalidate_for(&mutation(case_id));
        Ok(event)
    }

    /// Partially update an event, showing the change in the cached timeline first
    ///
    /// On rejection the cached timeline is restored to exactly what it was
    /// before the call.
    ///
    /// # Errors
    ///
    /// A patch that does not fit the cached event is rejected before sending;
    /// server errors are returned after rollback.
    pub async fn update_optimistic(
        &self,
        case_id: &CaseId,
        event_id: &EventId,
        patch: &EventPatch,
    ) -> ClientResult<TimelineEvent> {
        let key = QueryKey::events(case_id);
        if let Some(event) = self
            .cache
            .peek::<EventListResponse>(&key)
            .await
            .and_then(|list| list.get(event_id).cloned())
        {
            patch.apply_to(&event)?;
        }

        let mut update = OptimisticUpdate::<EventListResponse>::new(self.cache.clone(), key)
            .with_reconcile(mutation(case_id).invalidation_targets());
        let id = event_id.clone();
        let cached = patch.clone();
        let path = event_path(case_id, event_id);

        run_optimistic(
            &mut update,
            move |list| {
                if let Err(err) = list.patch(&id, &cached) {
                    warn!(event_id = %id, error = %err, "optimistic patch not applied");
                }
            },
            self.client.patch::<TimelineEvent, _>(&path, patch),
        )
        .await
    }

    /// Delete an event immediately
    pub async fn delete(&self, case_id: &CaseId, event_id: &EventId) -> ClientResult<()> {
        self.client.delete(&event_path(case_id, event_id)).await?;
        self.cache.invalidate_for(&mutation(case_id));
        debug!(case_id = %case_id, event_id = %event_id, "event deleted");
        Ok(())
    }
}

fn mutation(case_id: &CaseId) -> Mutation {
    Mutation::Event {
        case_id: case_id.clone(),
    }
}

fn events_path(case_id: &CaseId) -> String {
    format!("/api/cases/{case_id}/events")
}

fn event_path(case_id: &CaseId, event_id: &EventId) -> String {
    format!("/api/cases/{case_id}/events/{event_id}")
}
