//! AuditTrail Model
//!
//! Typed view of the entities the AuditTrail API serves:
//! - Cases, audit types and their metadata schemas
//! - Timeline events and the file batches they own
//! - Users, issue-tracker field mappings, import and report DTOs
//! - The case lifecycle state machine
//!
//! All identities are server-assigned; the client only ever receives them.
//!
//! # Example
//!
//! ```rust
//! use audittrail_model::CaseStatus;
//!
//! let targets: Vec<_> = CaseStatus::Open
//!     .transitions()
//!     .iter()
//!     .map(|t| t.target)
//!     .collect();
//! assert_eq!(targets, vec![CaseStatus::Active, CaseStatus::Closed]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod auth;
pub mod batch;
pub mod case;
pub mod error;
pub mod event;
pub mod ids;
pub mod import;
pub mod jira;
pub mod lifecycle;
pub mod report;
pub mod templates;

pub use auth::{Identity, TokenResponse};
pub use batch::{CreateFileBatchRequest, FileBatch, UpdateFileBatchRequest};
pub use case::{
    AuditType, AuditTypeListResponse, Case, CaseFilters, CaseListResponse, CreateCaseRequest,
    JsonSchema, SchemaProperty, UpdateCaseRequest, UserInfo,
};
pub use error::ModelError;
pub use event::{CreateEventRequest, EventListResponse, EventPatch, EventType, TimelineEvent};
pub use ids::{AuditTypeId, BatchId, CaseId, EventId, MappingId, UserId};
pub use import::{
    ColumnMappingRequest, ImportConfirmRequest, ImportConfirmResponse, ImportUploadResponse,
    ImportValidationResponse, ImportValidationRow,
};
pub use jira::{FieldMapping, FieldMappingCreate, ScrapeRequest, ScrapeResponse};
pub use lifecycle::{CaseStatus, Transition};
pub use report::{ReportFormat, ReportMode};
pub use templates::{BatchTemplate, BATCH_TEMPLATES};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with AuditTrail entities
    pub use crate::{
        AuditType, Case, CaseFilters, CaseId, CaseStatus, EventId, EventListResponse, EventPatch,
        FileBatch, ModelError, TimelineEvent,
    };
}
