//! Display fallbacks for optional references

use audittrail_model::{AuditType, Case, UserInfo};
use chrono::{DateTime, Local, Utc};

/// Shown for a case without an assignee
pub const UNASSIGNED: &str = "Unassigned";

/// Shown for a missing creator or audit type
pub const UNKNOWN: &str = "Unknown";

/// Assignee's full name, or "Unassigned"
#[must_use]
pub fn assignee_name(user: Option<&UserInfo>) -> &str {
    user.map_or(UNASSIGNED, |u| u.full_name.as_str())
}

/// Creator's full name, or "Unknown"
#[must_use]
pub fn creator_name(user: Option<&UserInfo>) -> &str {
    user.map_or(UNKNOWN, |u| u.full_name.as_str())
}

/// Audit type name, or "Unknown"
#[must_use]
pub fn audit_type_name(audit_type: Option<&AuditType>) -> &str {
    audit_type.map_or(UNKNOWN, |t| t.name.as_str())
}

/// `#<number> <title>`
#[must_use]
pub fn case_heading(case: &Case) -> String {
    format!("#{} {}", case.case_number, case.title)
}

/// Cut `text` to `max` characters, appending "..." when shortened
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}

/// Coarse age of a timestamp relative to `now`
///
/// Under a minute is "Just now", then minutes, hours and days up to a week;
/// older timestamps show the local calendar date.
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        then.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}
