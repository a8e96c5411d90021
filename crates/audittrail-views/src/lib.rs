//! AuditTrail Views
//!
//! Pure calculations over model entities. Nothing here performs I/O:
//! - Completeness scoring for cases, events and file batches
//! - Schema-driven form classification and value parsing
//! - Review of scraped issue-tracker fields against current metadata
//! - Import column mapping
//! - Display fallbacks
//!
//! # Example
//!
//! ```rust
//! use audittrail_views::{CompletenessScore, FieldStatus};
//!
//! let score = CompletenessScore::from_fields(&[
//!     FieldStatus::new("title", "Title", true, true),
//!     FieldStatus::new("description", "Description", false, false),
//!     FieldStatus::new("assigned_to_id", "Assignee", true, false),
//! ]);
//! assert_eq!(score.percentage, 67);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod completeness;
pub mod display;
pub mod error;
pub mod import_mapping;
pub mod jira_review;
pub mod schema_form;

pub use completeness::{is_empty, timeline_completeness, Completeness, CompletenessScore, FieldStatus};
pub use error::{FormError, FormResult};
pub use import_mapping::{ColumnMapper, ImportField};
pub use jira_review::{apply_scrape, ReviewStatus, ReviewedField, ScrapeReview};
pub use schema_form::{classify, form_fields, value_text, FieldKind, FormField, SchemaForm};
