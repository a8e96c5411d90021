//! File batches

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::keys::QueryKey;
use crate::mutation::Mutation;
use audittrail_model::{BatchId, CaseId, CreateFileBatchRequest, EventId, FileBatch, UpdateFileBatchRequest};

/// `/api/cases/{case}/events/{event}/batches`
#[derive(Debug, Clone)]
pub struct BatchesApi {
    client: ApiClient,
    cache: QueryCache,
}

impl BatchesApi {
    /// Create API group
    #[must_use]
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    /// Batches of an event; `None` when either id is empty
    pub async fn list(&self, case_id: &CaseId, event_id: &EventId) -> ClientResult<Option<Vec<FileBatch>>> {
        let client = self.client.clone();
        let path = batches_path(case_id, event_id);
        self.cache
            .fetch(QueryKey::file_batches(case_id, event_id), move || {
                let client = client.clone();
                let path = path.clone();
                async move { client.get::<Vec<FileBatch>>(&path).await }
            })
            .await
    }

    /// Add a batch
    pub async fn create(
        &self,
        case_id: &CaseId,
        event_id: &EventId,
        request: &CreateFileBatchRequest,
    ) -> ClientResult<FileBatch> {
        let batch = self.client.post(&batches_path(case_id, event_id), request).await?;
        self.cache.invalidate_for(&mutation(case_id, event_id));
        Ok(batch)
    }

    /// Partially update a batch
    pub async fn update(
        &self,
        case_id: &CaseId,
        event_id: &EventId,
        batch_id: &BatchId,
        request: &UpdateFileBatchRequest,
    ) -> ClientResult<FileBatch> {
        let path = format!("{}/{batch_id}", batches_path(case_id, event_id));
        let batch = self.client.patch(&path, request).await?;
        self.cache.invalidate_for(&mutation(case_id, event_id));
        Ok(batch)
    }

    /// Delete a batch
    pub async fn delete(&self, case_id: &CaseId, event_id: &EventId, batch_id: &BatchId) -> ClientResult<()> {
        let path = format!("{}/{batch_id}", batches_path(case_id, event_id));
        self.client.delete(&path).await?;
        self.cache.invalidate_for(&mutation(case_id, event_id));
        Ok(())
    }
}

fn mutation(case_id: &CaseId, event_id: &EventId) -> Mutation {
    Mutation::Batch {
        case_id: case_id.clone(),
        event_id: event_id.clone(),
    }
}

fn batches_path(case_id: &CaseId, event_id: &EventId) -> String {
    format!("/api/cases/{case_id}/events/{event_id}/batches")
}
