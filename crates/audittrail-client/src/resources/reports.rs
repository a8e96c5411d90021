//! Report downloads

use crate::api::{ApiClient, Download};
use crate::error::ClientResult;
use audittrail_model::{CaseId, ReportFormat, ReportMode};

/// Name used when the HTML report arrives without one
pub const HTML_REPORT_FALLBACK: &str = "audit-report.html";

/// `/api/cases/{case}/reports`
#[derive(Debug, Clone)]
pub struct ReportsApi {
    client: ApiClient,
}

impl ReportsApi {
    /// Create API group
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// HTML report
    pub async fn html(&self, case_id: &CaseId) -> ClientResult<Download> {
        self.client
            .download(&format!("/api/cases/{case_id}/reports/html"), Vec::new(), HTML_REPORT_FALLBACK)
            .await
    }

    /// Generated PDF or DOCX
    pub async fn generate(&self, case_id: &CaseId, format: ReportFormat, mode: ReportMode) -> ClientResult<Download> {
        let query = vec![
            ("format".to_string(), format.as_str().to_string()),
            ("mode".to_string(), mode.as_str().to_string()),
        ];
        self.client
            .download(
                &format!("/api/cases/{case_id}/reports/generate"),
                query,
                &format.fallback_filename(),
            )
            .await
    }
}
