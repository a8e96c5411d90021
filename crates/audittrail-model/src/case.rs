//! Cases, audit types and users
//!
//! A case's `metadata` map is shaped by its audit type's [`JsonSchema`].

use crate::ids::{AuditTypeId, CaseId, UserId};
use crate::lifecycle::CaseStatus;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user as embedded in other entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User id
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Display name
    pub full_name: String,
    /// Whether the account can sign in
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// One property declared by an audit type schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    /// Declared JSON type (`string`, `number`, `integer`, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Human-readable title
    #[serde(default)]
    pub title: String,
    /// Optional format hint (`email`, `date`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Allowed values, when enumerated
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl SchemaProperty {
    /// Property of the given type with a title
    #[must_use]
    pub fn new(kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            format: None,
            options: None,
        }
    }

    /// With format hint
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// With enumerated options
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Title, falling back to the raw key
    #[must_use]
    pub fn label_or<'a>(&'a self, key: &'a str) -> &'a str {
        if self.title.is_empty() {
            key
        } else {
            &self.title
        }
    }
}

/// JSON-Schema-like description of case metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    /// Always `object` in practice
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Declared properties, in declaration order
    #[serde(default)]
    pub properties: IndexMap<String, SchemaProperty>,
    /// Keys that must be filled
    #[serde(default)]
    pub required: Vec<String>,
}

impl JsonSchema {
    /// Empty object schema
    #[must_use]
    pub fn object() -> Self {
        Self {
            kind: "object".to_string(),
            ..Self::default()
        }
    }

    /// Add a property
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, property: SchemaProperty) -> Self {
        self.properties.insert(key.into(), property);
        self
    }

    /// Mark a key as required
    #[must_use]
    pub fn with_required(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }

    /// Check if key is required
    #[inline]
    #[must_use]
    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|r| r == key)
    }
}

/// Audit type: a named metadata schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditType {
    /// Audit type id
    pub id: AuditTypeId,
    /// Display name
    pub name: String,
    /// URL-safe name
    pub slug: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Metadata schema
    #[serde(default)]
    pub schema: JsonSchema,
    /// Whether new cases may use it
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// List envelope for audit types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTypeListResponse {
    /// Audit types
    pub items: Vec<AuditType>,
    /// Total count
    pub total: usize,
}

/// A case (audit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Case id
    pub id: CaseId,
    /// Sequential display number
    pub case_number: u64,
    /// Title
    pub title: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Audit type reference
    pub audit_type_id: AuditTypeId,
    /// Embedded audit type, when the server expands it
    #[serde(default)]
    pub audit_type: Option<AuditType>,
    /// Schema-governed metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Lifecycle status
    pub status: CaseStatus,
    /// Assignee reference
    #[serde(default)]
    pub assigned_to_id: Option<UserId>,
    /// Embedded assignee
    #[serde(default)]
    pub assigned_to: Option<UserInfo>,
    /// Creator reference
    pub created_by_id: UserId,
    /// Embedded creator
    #[serde(default)]
    pub created_by: Option<UserInfo>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Paged case list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseListResponse {
    /// Cases on this page
    pub items: Vec<Case>,
    /// Total matching cases
    pub total: usize,
    /// Page offset
    pub offset: usize,
    /// Page size
    pub limit: usize,
}

/// Body of `POST /api/cases`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCaseRequest {
    /// Title
    pub title: String,
    /// Audit type
    pub audit_type_id: AuditTypeId,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Initial metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Body of `PATCH /api/cases/{id}`; unset fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateCaseRequest {
    /// New title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    /// New status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    /// `Some(None)` unassigns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<Option<UserId>>,
}

impl UpdateCaseRequest {
    /// Status-only update
    #[must_use]
    pub fn status(status: CaseStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Assignee-only update (`None` clears the assignee)
    #[must_use]
    pub fn assignee(user: Option<UserId>) -> Self {
        Self {
            assigned_to_id: Some(user),
            ..Self::default()
        }
    }

    /// Metadata-only update
    #[must_use]
    pub fn metadata(metadata: Map<String, Value>) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::default()
        }
    }
}

/// Case list filters
///
/// Empty strings and unset numbers mean "no filter" and are never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseFilters {
    /// Status filter
    #[serde(default)]
    pub status: String,
    /// Audit type filter
    #[serde(default)]
    pub audit_type_id: String,
    /// Assignee filter
    #[serde(default)]
    pub assigned_to_id: String,
    /// Free-text search
    #[serde(default)]
    pub search: String,
    /// Page offset
    #[serde(default)]
    pub offset: Option<u32>,
    /// Page size
    #[serde(default)]
    pub limit: Option<u32>,
}

impl CaseFilters {
    /// Default page size of the case list view
    pub const PAGE_SIZE: u32 = 20;

    /// Filters the case list view starts from
    #[must_use]
    pub fn initial() -> Self {
        Self {
            offset: Some(0),
            limit: Some(Self::PAGE_SIZE),
            ..Self::default()
        }
    }

    /// With status filter (resets paging)
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self.reset_offset();
        self
    }

    /// With audit type filter (resets paging)
    #[must_use]
    pub fn with_audit_type(mut self, audit_type_id: impl Into<String>) -> Self {
        self.audit_type_id = audit_type_id.into();
        self.reset_offset();
        self
    }

    /// With assignee filter (resets paging)
    #[must_use]
    pub fn with_assignee(mut self, assigned_to_id: impl Into<String>) -> Self {
        self.assigned_to_id = assigned_to_id.into();
        self.reset_offset();
        self
    }

    /// With search text (resets paging)
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self.reset_offset();
        self
    }

    /// With page size
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// With page offset
    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    fn reset_offset(&mut self) {
        if self.offset.is_some() {
            self.offset = Some(0);
        }
    }

    /// True when status, audit type or search narrows the list
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.status.is_empty() || !self.audit_type_id.is_empty() || !self.search.is_empty()
    }

    /// Query-string pairs, omitting empty values
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let text = [
            ("status", &self.status),
            ("audit_type_id", &self.audit_type_id),
            ("assigned_to_id", &self.assigned_to_id),
            ("search", &self.search),
        ];
        let numbers = [("offset", self.offset), ("limit", self.limit)];

        text.into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.to_string(), v.clone()))
            .chain(
                numbers
                    .into_iter()
                    .filter_map(|(k, v)| v.map(|n| (k.to_string(), n.to_string()))),
            )
            .collect()
    }
}
