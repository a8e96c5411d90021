//! Cache keys
//!
//! A key is a resource name plus id and filter parts, e.g.
//! `events/<case>` or `file-batches/<case>/<event>`. Invalidation works on
//! key prefixes, so `cases` covers every case list and every single case.

use audittrail_model::{AuditTypeId, CaseFilters, CaseId, EventId};
use std::fmt;
use std::time::Duration;

/// Resource names
pub mod resource {
    /// Case lists and single cases
    pub const CASES: &str = "cases";
    /// Timeline of one case
    pub const EVENTS: &str = "events";
    /// Batches of one event
    pub const FILE_BATCHES: &str = "file-batches";
    /// User directory
    pub const USERS: &str = "users";
    /// Audit types
    pub const AUDIT_TYPES: &str = "audit-types";
    /// Issue-tracker field mappings per audit type
    pub const JIRA_MAPPINGS: &str = "jira-mappings";
    /// Signed-in identity
    pub const ME: &str = "me";
}

/// One component after the resource name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    /// Entity id; an empty id disables the key
    Id(String),
    /// Serialized filter
    Filter(String),
}

impl KeyPart {
    fn as_str(&self) -> &str {
        match self {
            KeyPart::Id(s) | KeyPart::Filter(s) => s,
        }
    }
}

/// Composite cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: &'static str,
    parts: Vec<KeyPart>,
}

impl QueryKey {
    /// Key covering a whole resource
    #[must_use]
    pub fn resource(resource: &'static str) -> Self {
        Self {
            resource,
            parts: Vec::new(),
        }
    }

    /// Append an id part
    #[must_use]
    pub fn with_id(mut self, id: impl AsRef<str>) -> Self {
        self.parts.push(KeyPart::Id(id.as_ref().to_string()));
        self
    }

    /// Append a filter part
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.parts.push(KeyPart::Filter(filter.into()));
        self
    }

    /// Resource name
    #[must_use]
    pub fn resource_name(&self) -> &'static str {
        self.resource
    }

    /// Parts after the resource
    #[must_use]
    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    /// False when any id part is empty; disabled keys never fetch
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.parts.iter().all(|p| match p {
            KeyPart::Id(id) => !id.is_empty(),
            KeyPart::Filter(_) => true,
        })
    }

    /// Whether `prefix` covers this key
    #[must_use]
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.resource == prefix.resource && self.parts.starts_with(&prefix.parts)
    }

    /// How long a fetched value stays fresh
    #[must_use]
    pub fn stale_time(&self, default: Duration) -> Duration {
        match self.resource {
            resource::EVENTS => Duration::from_secs(30),
            resource::USERS => Duration::from_secs(10 * 60),
            resource::JIRA_MAPPINGS => Duration::from_secs(5 * 60),
            _ => default,
        }
    }

    /// Every case key
    #[must_use]
    pub fn cases() -> Self {
        Self::resource(resource::CASES)
    }

    /// One filtered case list
    #[must_use]
    pub fn cases_list(filters: &CaseFilters) -> Self {
        let query = filters
            .to_query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        Self::cases().with_filter(format!("list?{query}"))
    }

    /// One case
    #[must_use]
    pub fn case(id: &CaseId) -> Self {
        Self::cases().with_id(id)
    }

    /// Timeline of a case
    #[must_use]
    pub fn events(case_id: &CaseId) -> Self {
        Self::resource(resource::EVENTS).with_id(case_id)
    }

    /// Batches of an event
    #[must_use]
    pub fn file_batches(case_id: &CaseId, event_id: &EventId) -> Self {
        Self::resource(resource::FILE_BATCHES)
            .with_id(case_id)
            .with_id(event_id)
    }

    /// User directory
    #[must_use]
    pub fn users() -> Self {
        Self::resource(resource::USERS)
    }

    /// Every audit type key
    #[must_use]
    pub fn audit_types() -> Self {
        Self::resource(resource::AUDIT_TYPES)
    }

    /// One audit type
    #[must_use]
    pub fn audit_type(id: &AuditTypeId) -> Self {
        Self::audit_types().with_id(id)
    }

    /// Field mappings of an audit type
    #[must_use]
    pub fn jira_mappings(audit_type_id: &AuditTypeId) -> Self {
        Self::resource(resource::JIRA_MAPPINGS).with_id(audit_type_id)
    }

    /// Signed-in identity
    #[must_use]
    pub fn me() -> Self {
        Self::resource(resource::ME)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource)?;
        for part in &self.parts {
            write!(f, "/{}", part.as_str())?;
        }
        Ok(())
    }
}
