//! Spreadsheet import: upload, validate, confirm

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::mutation::Mutation;
use audittrail_model::{
    CaseId, ColumnMappingRequest, ImportConfirmRequest, ImportConfirmResponse, ImportUploadResponse,
    ImportValidationResponse,
};
use bytes::Bytes;
use tracing::info;

/// `/api/cases/{case}/imports`
#[derive(Debug, Clone)]
pub struct ImportsApi {
    client: ApiClient,
    cache: QueryCache,
}

impl ImportsApi {
    /// Create API group
    #[must_use]
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    /// Upload a spreadsheet and open an import session
    pub async fn upload(&self, case_id: &CaseId, file_name: &str, bytes: Bytes) -> ClientResult<ImportUploadResponse> {
        let response: ImportUploadResponse = self
            .client
            .upload(&format!("{}/upload", imports_path(case_id)), file_name, bytes)
            .await?;
        info!(case_id = %case_id, session_id = %response.session_id, rows = response.row_count, "import uploaded");
        Ok(response)
    }

    /// Validate the column mapping of a session
    pub async fn validate(
        &self,
        case_id: &CaseId,
        request: &ColumnMappingRequest,
    ) -> ClientResult<ImportValidationResponse> {
        self.client
            .post(&format!("{}/validate", imports_path(case_id)), request)
            .await
    }

    /// Create the validated events
    pub async fn confirm(&self, case_id: &CaseId, session_id: &str) -> ClientResult<ImportConfirmResponse> {
        let request = ImportConfirmRequest {
            session_id: session_id.to_string(),
        };
        let response: ImportConfirmResponse = self
            .client
            .post(&format!("{}/confirm", imports_path(case_id)), &request)
            .await?;
        self.cache.invalidate_for(&Mutation::ImportConfirmed {
            case_id: case_id.clone(),
        });
        info!(case_id = %case_id, created = response.created_count, errors = response.error_count, "import confirmed");
        Ok(response)
    }
}

fn imports_path(case_id: &CaseId) -> String {
    format!("/api/cases/{case_id}/imports")
}
