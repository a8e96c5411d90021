//! Write operations and the cache keys they invalidate

use crate::keys::{resource, QueryKey};
use audittrail_model::{AuditTypeId, CaseId, EventId};

/// A server-side write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Case created, updated or deleted
    Case,
    /// Event created, updated or deleted
    Event {
        /// Owning case
        case_id: CaseId,
    },
    /// File batch created, updated or deleted
    Batch {
        /// Owning case
        case_id: CaseId,
        /// Owning event
        event_id: EventId,
    },
    /// Field mappings of an audit type replaced
    FieldMappings {
        /// Audit type
        audit_type_id: AuditTypeId,
    },
    /// Spreadsheet import confirmed
    ImportConfirmed {
        /// Case the events were created on
        case_id: CaseId,
    },
}

impl Mutation {
    /// Key prefixes to invalidate after the write succeeds
    #[must_use]
    pub fn invalidation_targets(&self) -> Vec<QueryKey> {
        match self {
            Mutation::Case => vec![QueryKey::cases()],
            Mutation::Event { case_id } | Mutation::ImportConfirmed { case_id } => {
                vec![QueryKey::events(case_id)]
            }
            // batches are embedded in the event list
            Mutation::Batch { case_id, event_id } => vec![
                QueryKey::file_batches(case_id, event_id),
                QueryKey::events(case_id),
            ],
            Mutation::FieldMappings { audit_type_id } => vec![QueryKey::jira_mappings(audit_type_id)],
        }
    }

    /// Resource written
    #[must_use]
    pub fn resource(&self) -> &'static str {
        match self {
            Mutation::Case => resource::CASES,
            Mutation::Event { .. } | Mutation::ImportConfirmed { .. } => resource::EVENTS,
            Mutation::Batch { .. } => resource::FILE_BATCHES,
            Mutation::FieldMappings { .. } => resource::JIRA_MAPPINGS,
        }
    }
}
