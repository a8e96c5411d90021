//! Users, audit types and the signed-in identity

use super::enabled;
use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::keys::QueryKey;
use audittrail_model::{AuditType, AuditTypeId, AuditTypeListResponse, Identity, UserInfo};

/// Reference data that rarely changes
#[derive(Debug, Clone)]
pub struct DirectoryApi {
    client: ApiClient,
    cache: QueryCache,
}

impl DirectoryApi {
    /// Create API group
    #[must_use]
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    /// All users
    pub async fn users(&self) -> ClientResult<Vec<UserInfo>> {
        let key = QueryKey::users();
        let client = self.client.clone();
        let users = self
            .cache
            .fetch(key.clone(), move || {
                let client = client.clone();
                async move { client.get::<Vec<UserInfo>>("/api/users").await }
            })
            .await?;
        enabled(users, &key)
    }

    /// All audit types
    pub async fn audit_types(&self) -> ClientResult<Vec<AuditType>> {
        let key = QueryKey::audit_types();
        let client = self.client.clone();
        let types = self
            .cache
            .fetch(key.clone(), move || {
                let client = client.clone();
                async move {
                    client
                        .get::<AuditTypeListResponse>("/api/audit-types")
                        .await
                        .map(|list| list.items)
                }
            })
            .await?;
        enabled(types, &key)
    }

    /// One audit type; `None` when `id` is empty
    pub async fn audit_type(&self, id: &AuditTypeId) -> ClientResult<Option<AuditType>> {
        let client = self.client.clone();
        let path = format!("/api/audit-types/{id}");
        self.cache
            .fetch(QueryKey::audit_type(id), move || {
                let client = client.clone();
                let path = path.clone();
                async move { client.get::<AuditType>(&path).await }
            })
            .await
    }

    /// The signed-in user
    pub async fn me(&self) -> ClientResult<Identity> {
        let key = QueryKey::me();
        let client = self.client.clone();
        let me = self
            .cache
            .fetch(key.clone(), move || {
                let client = client.clone();
                async move { client.get::<Identity>("/api/auth/me").await }
            })
            .await?;
        enabled(me, &key)
    }
}
