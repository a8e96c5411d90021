//! Issue-tracker scraping and field mappings

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::keys::QueryKey;
use crate::mutation::Mutation;
use audittrail_model::{AuditTypeId, FieldMapping, FieldMappingCreate, ScrapeRequest, ScrapeResponse};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct ReplaceMappings<'a> {
    mappings: &'a [FieldMappingCreate],
}

/// `/api/jira`
#[derive(Debug, Clone)]
pub struct JiraApi {
    client: ApiClient,
    cache: QueryCache,
}

impl JiraApi {
    /// Create API group
    #[must_use]
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    /// Field mappings of an audit type; `None` when `audit_type_id` is empty
    pub async fn mappings(&self, audit_type_id: &AuditTypeId) -> ClientResult<Option<Vec<FieldMapping>>> {
        let client = self.client.clone();
        let path = mappings_path(audit_type_id);
        self.cache
            .fetch(QueryKey::jira_mappings(audit_type_id), move || {
                let client = client.clone();
                let path = path.clone();
                async move { client.get::<Vec<FieldMapping>>(&path).await }
            })
            .await
    }

    /// Replace all field mappings of an audit type
    pub async fn replace_mappings(
        &self,
        audit_type_id: &AuditTypeId,
        mappings: &[FieldMappingCreate],
    ) -> ClientResult<Vec<FieldMapping>> {
        let saved: Vec<FieldMapping> = self
            .client
            .put(&mappings_path(audit_type_id), &ReplaceMappings { mappings })
            .await?;
        self.cache.invalidate_for(&Mutation::FieldMappings {
            audit_type_id: audit_type_id.clone(),
        });
        info!(audit_type_id = %audit_type_id, count = saved.len(), "field mappings replaced");
        Ok(saved)
    }

    /// Scrape an issue without mapping
    pub async fn scrape(&self, request: &ScrapeRequest) -> ClientResult<ScrapeResponse> {
        self.client.post("/api/jira/scrape", request).await
    }

    /// Scrape an issue and map its fields onto an audit type's metadata keys
    pub async fn scrape_and_map(
        &self,
        audit_type_id: &AuditTypeId,
        request: &ScrapeRequest,
    ) -> ClientResult<ScrapeResponse> {
        self.client
            .post_with_query(
                "/api/jira/scrape-and-map",
                vec![("audit_type_id".to_string(), audit_type_id.to_string())],
                request,
            )
            .await
    }
}

fn mappings_path(audit_type_id: &AuditTypeId) -> String {
    format!("/api/jira/mappings/{audit_type_id}")
}
