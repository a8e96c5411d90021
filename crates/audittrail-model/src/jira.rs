//! Issue-tracker scrape and field mapping DTOs

use crate::ids::{AuditTypeId, MappingId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Pairs an issue-tracker field with a case metadata key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Mapping id
    pub id: MappingId,
    /// Audit type the mapping belongs to
    pub audit_type_id: AuditTypeId,
    /// Field name as scraped
    pub jira_field_name: String,
    /// Target metadata key
    pub case_metadata_key: String,
}

/// One entry of `PUT /api/jira/mappings/{audit_type}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMappingCreate {
    /// Field name as scraped
    pub jira_field_name: String,
    /// Target metadata key
    pub case_metadata_key: String,
}

impl From<&FieldMapping> for FieldMappingCreate {
    fn from(m: &FieldMapping) -> Self {
        Self {
            jira_field_name: m.jira_field_name.clone(),
            case_metadata_key: m.case_metadata_key.clone(),
        }
    }
}

/// Body of the scrape endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// Issue URL
    pub url: String,
    /// Scraper timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ScrapeRequest {
    /// Request for a URL (trimmed)
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            timeout_ms: None,
        }
    }
}

/// Scrape result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    /// Issue URL
    #[serde(default)]
    pub url: String,
    /// Metadata key → value, after mapping
    #[serde(default)]
    pub fields: IndexMap<String, String>,
    /// Scraped field name → value
    #[serde(default)]
    pub raw_fields: IndexMap<String, String>,
    /// Scraper error
    #[serde(default)]
    pub error: Option<String>,
    /// Whether scraping succeeded
    #[serde(default)]
    pub success: bool,
}
