//! Completeness scoring
//!
//! Each entity reports a list of [`FieldStatus`]; [`CompletenessScore::from_fields`]
//! folds any such list into a percentage. A value counts as empty only when it
//! is null, absent or the empty string: `0`, `false` and `" "` are filled.

use audittrail_model::{Case, FileBatch, TimelineEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a value is empty for completeness purposes
#[must_use]
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn text_is_empty(text: Option<&str>) -> bool {
    text.map_or(true, str::is_empty)
}

/// Filled state of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStatus {
    /// Field path, `metadata.<key>` for schema fields
    pub field: String,
    /// Display label
    pub label: String,
    /// Has a value
    pub filled: bool,
    /// Counts toward `all_required_filled`
    pub required: bool,
}

impl FieldStatus {
    /// Build a status
    pub fn new(field: impl Into<String>, label: impl Into<String>, filled: bool, required: bool) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            filled,
            required,
        }
    }
}

/// Aggregate over a list of field statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessScore {
    /// Fields with a value
    pub filled: usize,
    /// Fields considered
    pub total: usize,
    /// `round(filled / total * 100)`, 100 for an empty list
    pub percentage: u8,
    /// Every required field has a value
    pub all_required_filled: bool,
}

impl CompletenessScore {
    /// Score a field list
    #[must_use]
    pub fn from_fields(fields: &[FieldStatus]) -> Self {
        let filled = fields.iter().filter(|f| f.filled).count();
        let total = fields.len();
        let all_required_filled = fields.iter().filter(|f| f.required).all(|f| f.filled);

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percentage = if total == 0 {
            100
        } else {
            ((filled as f64 / total as f64) * 100.0).round() as u8
        };

        Self {
            filled,
            total,
            percentage,
            all_required_filled,
        }
    }

    /// Nothing left to fill
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.filled == self.total
    }
}

/// Entities that can report per-field completeness
pub trait Completeness {
    /// Status of every tracked field, in display order
    fn field_statuses(&self) -> Vec<FieldStatus>;

    /// Aggregate score
    fn completeness(&self) -> CompletenessScore {
        CompletenessScore::from_fields(&self.field_statuses())
    }
}

impl Completeness for Case {
    fn field_statuses(&self) -> Vec<FieldStatus> {
        let mut fields = vec![
            FieldStatus::new("title", "Title", !self.title.is_empty(), true),
            FieldStatus::new(
                "description",
                "Description",
                !text_is_empty(self.description.as_deref()),
                false,
            ),
            FieldStatus::new(
                "assigned_to_id",
                "Assignee",
                !text_is_empty(self.assigned_to_id.as_ref().map(|id| id.as_str())),
                false,
            ),
        ];

        if let Some(audit_type) = &self.audit_type {
            let schema = &audit_type.schema;
            fields.extend(schema.properties.iter().map(|(key, property)| {
                FieldStatus::new(
                    format!("metadata.{key}"),
                    property.label_or(key),
                    !is_empty(self.metadata.get(key)),
                    schema.is_required(key),
                )
            }));
        }

        fields
    }
}

impl Completeness for TimelineEvent {
    fn field_statuses(&self) -> Vec<FieldStatus> {
        vec![
            FieldStatus::new("event_date", "Date", !self.event_date.is_empty(), true),
            FieldStatus::new("event_time", "Time", !text_is_empty(self.event_time.as_deref()), false),
            FieldStatus::new("file_name", "File Name", !text_is_empty(self.file_name.as_deref()), false),
            // zero files is a real answer
            FieldStatus::new("file_count", "File Count", self.file_count.is_some(), false),
            FieldStatus::new(
                "file_description",
                "Description",
                !text_is_empty(self.file_description.as_deref()),
                false,
            ),
            FieldStatus::new("file_type", "File Type", !text_is_empty(self.file_type.as_deref()), false),
        ]
    }
}

impl Completeness for FileBatch {
    fn field_statuses(&self) -> Vec<FieldStatus> {
        vec![
            FieldStatus::new("label", "Label", !self.label.is_empty(), true),
            FieldStatus::new("file_count", "File Count", true, true),
            FieldStatus::new(
                "description",
                "Description",
                !text_is_empty(self.description.as_deref()),
                false,
            ),
            FieldStatus::new("file_types", "File Types", !text_is_empty(self.file_types.as_deref()), false),
        ]
    }
}

/// Combined score of every event on a timeline
#[must_use]
pub fn timeline_completeness(events: &[TimelineEvent]) -> CompletenessScore {
    let fields: Vec<FieldStatus> = events.iter().flat_map(Completeness::field_statuses).collect();
    CompletenessScore::from_fields(&fields)
}
