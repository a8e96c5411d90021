//! Typed endpoint groups
//!
//! Reads go through the [`QueryCache`](crate::QueryCache) under the keys in
//! [`keys`](crate::keys); successful writes invalidate the keys their
//! [`Mutation`](crate::Mutation) names.

mod batches;
mod cases;
mod directory;
mod events;
mod imports;
mod jira;
mod reports;

pub use batches::BatchesApi;
pub use cases::CasesApi;
pub use directory::DirectoryApi;
pub use events::EventsApi;
pub use imports::ImportsApi;
pub use jira::JiraApi;
pub use reports::{ReportsApi, HTML_REPORT_FALLBACK};

use crate::error::{ApiError, ClientResult};
use crate::keys::QueryKey;

/// Unwrap a read on a key that cannot be disabled
fn enabled<T>(value: Option<T>, key: &QueryKey) -> ClientResult<T> {
    value.ok_or_else(|| ApiError::Disabled(key.to_string()))
}
