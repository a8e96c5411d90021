//! Timeline events
//!
//! Events are ordered chronologically: date ascending (lexicographic on the
//! ISO text), then time of day ascending with a missing or empty time first,
//! then the explicit `sort_order`.

use crate::batch::FileBatch;
use crate::case::UserInfo;
use crate::error::ModelError;
use crate::ids::{CaseId, EventId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Event type tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Something discovered
    Finding,
    /// Something done
    Action,
    /// Free-form note
    #[default]
    Note,
}

impl EventType {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Finding => "finding",
            EventType::Action => "action",
            EventType::Note => "note",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finding" => Ok(EventType::Finding),
            "action" => Ok(EventType::Action),
            "note" => Ok(EventType::Note),
            other => Err(ModelError::UnknownEventType(other.to_string())),
        }
    }
}

/// A timeline event belonging to one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Event id
    pub id: EventId,
    /// Owning case
    pub case_id: CaseId,
    /// Type tag
    #[serde(default)]
    pub event_type: EventType,
    /// `YYYY-MM-DD`
    pub event_date: String,
    /// `HH:MM[:SS]`
    #[serde(default)]
    pub event_time: Option<String>,
    /// Name of the file involved
    #[serde(default)]
    pub file_name: Option<String>,
    /// Number of files; zero is a real value
    #[serde(default)]
    pub file_count: Option<u32>,
    /// Free-text description
    #[serde(default)]
    pub file_description: Option<String>,
    /// File type text
    #[serde(default)]
    pub file_type: Option<String>,
    /// Additional metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Tiebreaker within one date/time
    #[serde(default)]
    pub sort_order: i64,
    /// Creator reference
    pub created_by_id: UserId,
    /// Embedded creator
    #[serde(default)]
    pub created_by: Option<UserInfo>,
    /// Owned file batches
    #[serde(default)]
    pub file_batches: Vec<FileBatch>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl TimelineEvent {
    /// Chronological comparison used for timeline placement
    #[must_use]
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.event_date
            .cmp(&other.event_date)
            .then_with(|| time_key(self.event_time.as_deref()).cmp(&time_key(other.event_time.as_deref())))
            .then_with(|| self.sort_order.cmp(&other.sort_order))
    }
}

/// Missing and empty times share the lowest key
fn time_key(time: Option<&str>) -> Option<&str> {
    time.filter(|t| !t.is_empty())
}

/// Event list for one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventListResponse {
    /// Events, chronological
    pub items: Vec<TimelineEvent>,
    /// Total count
    pub total: usize,
}

impl EventListResponse {
    /// Find an event by id
    #[must_use]
    pub fn get(&self, id: &EventId) -> Option<&TimelineEvent> {
        self.items.iter().find(|e| &e.id == id)
    }

    /// Remove an event, returning it with its former index
    pub fn remove(&mut self, id: &EventId) -> Option<(usize, TimelineEvent)> {
        let index = self.items.iter().position(|e| &e.id == id)?;
        let event = self.items.remove(index);
        self.total = self.total.saturating_sub(1);
        Some((index, event))
    }

    /// Insert an event at its chronological position
    ///
    /// `hint` is the index the event used to occupy; it is honored when it
    /// still satisfies the ordering, which keeps ties in their old place.
    /// An event whose id is already listed is not inserted again; its
    /// current index is returned.
    pub fn insert_sorted(&mut self, event: TimelineEvent, hint: Option<usize>) -> usize {
        if let Some(existing) = self.items.iter().position(|e| e.id == event.id) {
            return existing;
        }
        let fits = |index: usize| {
            let after_prev = index == 0
                || self.items[index - 1].chronological_cmp(&event) != Ordering::Greater;
            let before_next = index == self.items.len()
                || event.chronological_cmp(&self.items[index]) != Ordering::Greater;
            after_prev && before_next
        };

        let index = match hint {
            Some(h) if h <= self.items.len() && fits(h) => h,
            _ => self
                .items
                .iter()
                .position(|e| event.chronological_cmp(e) == Ordering::Less)
                .unwrap_or(self.items.len()),
        };

        self.items.insert(index, event);
        self.total += 1;
        index
    }

    /// Apply a patch to one event in place
    ///
    /// # Errors
    /// `ModelError::InvalidPatch` if the merged value no longer decodes.
    pub fn patch(&mut self, id: &EventId, patch: &EventPatch) -> Result<bool, ModelError> {
        match self.items.iter_mut().find(|e| &e.id == id) {
            Some(event) => {
                *event = patch.apply_to(event)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Body of `POST /api/cases/{case}/events`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateEventRequest {
    /// Type tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    /// `YYYY-MM-DD`
    pub event_date: String,
    /// Time of day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
    /// File name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// File count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u32>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_description: Option<String>,
    /// File type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl CreateEventRequest {
    /// A blank note on the given date
    #[must_use]
    pub fn note_on(event_date: impl Into<String>) -> Self {
        Self {
            event_type: Some(EventType::Note),
            event_date: event_date.into(),
            ..Self::default()
        }
    }
}

/// Partial update of a timeline event
///
/// Only the fields set on the patch are sent; setting a field to `null`
/// clears it. The same patch is merged into the cached copy for optimistic
/// display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventPatch(Map<String, Value>);

impl EventPatch {
    /// Empty patch
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw field
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Set the type tag
    #[must_use]
    pub fn event_type(self, event_type: EventType) -> Self {
        self.set("event_type", event_type.as_str())
    }

    /// Set the date
    #[must_use]
    pub fn event_date(self, date: impl Into<String>) -> Self {
        self.set("event_date", date.into())
    }

    /// Set or clear the time
    #[must_use]
    pub fn event_time(self, time: Option<&str>) -> Self {
        self.set("event_time", time)
    }

    /// Set or clear the file name
    #[must_use]
    pub fn file_name(self, name: Option<&str>) -> Self {
        self.set("file_name", name)
    }

    /// Set or clear the file count
    #[must_use]
    pub fn file_count(self, count: Option<u32>) -> Self {
        self.set("file_count", count)
    }

    /// Set or clear the description
    #[must_use]
    pub fn file_description(self, description: Option<&str>) -> Self {
        self.set("file_description", description)
    }

    /// Set or clear the file type
    #[must_use]
    pub fn file_type(self, file_type: Option<&str>) -> Self {
        self.set("file_type", file_type)
    }

    /// Replace metadata
    #[must_use]
    pub fn metadata(self, metadata: Map<String, Value>) -> Self {
        self.set("metadata", Value::Object(metadata))
    }

    /// Nothing set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields set on the patch
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Merge into an event, field by field
    ///
    /// # Errors
    /// `ModelError::InvalidPatch` if the merged value no longer decodes.
    pub fn apply_to(&self, event: &TimelineEvent) -> Result<TimelineEvent, ModelError> {
        let mut value =
            serde_json::to_value(event).map_err(|e| ModelError::InvalidPatch(e.to_string()))?;
        if let Value::Object(target) = &mut value {
            for (field, v) in &self.0 {
                target.insert(field.clone(), v.clone());
            }
        }
        serde_json::from_value(value).map_err(|e| ModelError::InvalidPatch(e.to_string()))
    }
}
