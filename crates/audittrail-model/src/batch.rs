//! File batches owned by timeline events

use crate::ids::{BatchId, EventId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A labeled group of files attached to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBatch {
    /// Batch id
    pub id: BatchId,
    /// Owning event
    pub event_id: EventId,
    /// Label
    pub label: String,
    /// Number of files
    pub file_count: u32,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Comma-separated file extensions
    #[serde(default)]
    pub file_types: Option<String>,
    /// Position within the event
    #[serde(default)]
    pub sort_order: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST .../batches`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateFileBatchRequest {
    /// Label
    pub label: String,
    /// Number of files
    pub file_count: u32,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_types: Option<String>,
    /// Position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl CreateFileBatchRequest {
    /// Build from raw form input; text is trimmed and blank optionals dropped
    #[must_use]
    pub fn from_form(label: &str, file_count: u32, file_types: &str, description: &str) -> Self {
        Self {
            label: label.trim().to_string(),
            file_count,
            description: non_blank(description),
            file_types: non_blank(file_types),
            sort_order: None,
        }
    }
}

/// Body of `PATCH .../batches/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateFileBatchRequest {
    /// Label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Number of files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u32>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_types: Option<String>,
    /// Position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl From<CreateFileBatchRequest> for UpdateFileBatchRequest {
    fn from(req: CreateFileBatchRequest) -> Self {
        Self {
            label: Some(req.label),
            file_count: Some(req.file_count),
            description: req.description,
            file_types: req.file_types,
            sort_order: req.sort_order,
        }
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_input_is_trimmed() {
        let req = CreateFileBatchRequest::from_form("  USB copy ", 0, "  ", " pdfs ");
        assert_eq!(req.label, "USB copy");
        assert_eq!(req.file_count, 0);
        assert_eq!(req.file_types, None);
        assert_eq!(req.description.as_deref(), Some("pdfs"));
    }

    #[test]
    fn unset_fields_are_not_sent() {
        let body = serde_json::to_value(CreateFileBatchRequest::from_form("x", 2, "", "")).unwrap();
        assert_eq!(body, serde_json::json!({"label": "x", "file_count": 2}));
    }
}
