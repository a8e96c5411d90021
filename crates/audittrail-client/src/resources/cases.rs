//! Cases and their lifecycle

use super::enabled;
use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::keys::QueryKey;
use crate::mutation::Mutation;
use audittrail_model::{Case, CaseFilters, CaseId, CaseListResponse, CaseStatus, CreateCaseRequest, UpdateCaseRequest, UserId};
use tracing::info;

/// `/api/cases`
#[derive(Debug, Clone)]
pub struct CasesApi {
    client: ApiClient,
    cache: QueryCache,
}

impl CasesApi {
    /// Create API group
    #[must_use]
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    /// Filtered, paginated case list
    ///
    /// Empty filter values are left out of the query string.
    pub async fn list(&self, filters: &CaseFilters) -> ClientResult<CaseListResponse> {
        let key = QueryKey::cases_list(filters);
        let client = self.client.clone();
        let query = filters.to_query_pairs();
        let list = self
            .cache
            .fetch(key.clone(), move || {
                let client = client.clone();
                let query = query.clone();
                async move { client.get_with_query::<CaseListResponse>("/api/cases", query).await }
            })
            .await?;
        enabled(list, &key)
    }

    /// One case; `None` when `id` is empty
    pub async fn get(&self, id: &CaseId) -> ClientResult<Option<Case>> {
        let client = self.client.clone();
        let path = case_path(id);
        self.cache
            .fetch(QueryKey::case(id), move || {
                let client = client.clone();
                let path = path.clone();
                async move { client.get::<Case>(&path).await }
            })
            .await
    }

    /// Create a case
    pub async fn create(&self, request: &CreateCaseRequest) -> ClientResult<Case> {
        let case: Case = self.client.post("/api/cases", request).await?;
        self.cache.invalidate_for(&Mutation::Case);
        info!(case_id = %case.id, case_number = case.case_number, "case created");
        Ok(case)
    }

    /// Partially update a case
    pub async fn update(&self, id: &CaseId, request: &UpdateCaseRequest) -> ClientResult<Case> {
        let case: Case = self.client.patch(&case_path(id), request).await?;
        self.cache.invalidate_for(&Mutation::Case);
        Ok(case)
    }

    /// Delete a case
    pub async fn delete(&self, id: &CaseId) -> ClientResult<()> {
        self.client.delete(&case_path(id)).await?;
        self.cache.invalidate_for(&Mutation::Case);
        info!(case_id = %id, "case deleted");
        Ok(())
    }

    /// Move a case along its lifecycle
    ///
    /// # Errors
    ///
    /// Transitions the state machine does not allow are rejected locally,
    /// without a request.
    pub async fn transition(&self, case: &Case, target: CaseStatus) -> ClientResult<Case> {
        let transition = case.status.validate_transition(target)?;
        info!(case_id = %case.id, from = %case.status, to = %target, action = transition.label, "case transition");
        self.update(&case.id, &UpdateCaseRequest::status(target)).await
    }

    /// Assign or unassign a case
    pub async fn assign(&self, id: &CaseId, user: Option<UserId>) -> ClientResult<Case> {
        self.update(id, &UpdateCaseRequest::assignee(user)).await
    }
}

fn case_path(id: &CaseId) -> String {
    format!("/api/cases/{id}")
}
