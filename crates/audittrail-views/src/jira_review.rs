//! Review of scraped issue-tracker data before it is merged into case metadata

use crate::completeness::is_empty;
use crate::schema_form::value_text;
use audittrail_model::{FieldMapping, JsonSchema, ScrapeResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// How a scraped value relates to the current metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// No current value
    New,
    /// Current value differs
    Changed,
    /// Current value matches
    Same,
}

impl ReviewStatus {
    /// Badge text
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ReviewStatus::New => "New",
            ReviewStatus::Changed => "Changed",
            ReviewStatus::Same => "Same",
        }
    }
}

/// One mapped field in the review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedField {
    /// Metadata key
    pub key: String,
    /// Schema title, or the key
    pub label: String,
    /// Scraped value
    pub value: String,
    /// Current value when it will be overwritten
    pub previous: Option<String>,
    /// Classification
    pub status: ReviewStatus,
}

/// Mapped and unmapped fields of one scrape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeReview {
    /// Mapped fields, in response order
    pub fields: Vec<ReviewedField>,
    /// Raw fields no mapping consumed
    pub unmapped: Vec<(String, String)>,
}

impl ScrapeReview {
    /// Build the review
    ///
    /// `mappings` are the audit type's field mappings. With none known, a raw
    /// field counts as mapped when its value appears among the mapped values.
    #[must_use]
    pub fn build(
        scrape: &ScrapeResponse,
        current: &Map<String, Value>,
        schema: Option<&JsonSchema>,
        mappings: &[FieldMapping],
    ) -> Self {
        let fields = scrape
            .fields
            .iter()
            .map(|(key, value)| review_field(key, value, current.get(key), schema))
            .collect();

        let consumed = consumed_raw_keys(scrape, mappings);
        let unmapped = scrape
            .raw_fields
            .iter()
            .filter(|(raw_key, _)| !consumed.contains(raw_key.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self { fields, unmapped }
    }

    /// Fields with the given status
    pub fn with_status(&self, status: ReviewStatus) -> impl Iterator<Item = &ReviewedField> {
        self.fields.iter().filter(move |f| f.status == status)
    }

    /// Any field would change the metadata
    #[must_use]
    pub fn has_updates(&self) -> bool {
        self.fields.iter().any(|f| f.status != ReviewStatus::Same)
    }
}

fn review_field(
    key: &str,
    value: &str,
    existing: Option<&Value>,
    schema: Option<&JsonSchema>,
) -> ReviewedField {
    let label = schema
        .and_then(|s| s.properties.get(key))
        .map_or(key, |p| p.label_or(key))
        .to_string();

    let (status, previous) = if is_empty(existing) {
        (ReviewStatus::New, None)
    } else {
        let text = existing.map(value_text).unwrap_or_default();
        if text == value {
            (ReviewStatus::Same, None)
        } else {
            (ReviewStatus::Changed, Some(text))
        }
    };

    ReviewedField {
        key: key.to_string(),
        label,
        value: value.to_string(),
        previous,
        status,
    }
}

fn consumed_raw_keys<'a>(scrape: &'a ScrapeResponse, mappings: &[FieldMapping]) -> HashSet<&'a str> {
    if mappings.is_empty() {
        return scrape
            .raw_fields
            .iter()
            .filter(|(_, raw)| scrape.fields.values().any(|mapped| mapped == *raw))
            .map(|(k, _)| k.as_str())
            .collect();
    }

    scrape
        .raw_fields
        .keys()
        .filter(|raw_key| {
            mappings.iter().any(|m| {
                &m.jira_field_name == *raw_key && scrape.fields.contains_key(&m.case_metadata_key)
            })
        })
        .map(String::as_str)
        .collect()
}

/// Merge mapped fields into metadata, overwriting existing values
pub fn apply_scrape(scrape: &ScrapeResponse, metadata: &mut Map<String, Value>) {
    for (key, value) in &scrape.fields {
        metadata.insert(key.clone(), Value::String(value.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audittrail_model::SchemaProperty;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scrape() -> ScrapeResponse {
        ScrapeResponse {
            url: "https://jira.internal/browse/SEC-1".into(),
            fields: [("owner", "Dana"), ("priority", "P1"), ("ticket", "SEC-1")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            raw_fields: [
                ("Assignee", "Dana"),
                ("Priority", "P1"),
                ("Key", "SEC-1"),
                ("Reporter", "Dana"),
                ("Labels", "audit"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            error: None,
            success: true,
        }
    }

    fn mapping(raw: &str, key: &str) -> FieldMapping {
        FieldMapping {
            id: format!("m-{key}").into(),
            audit_type_id: "at-1".into(),
            jira_field_name: raw.into(),
            case_metadata_key: key.into(),
        }
    }

    #[test]
    fn classifies_new_changed_same() {
        let current = json!({"owner": "", "priority": "P2", "ticket": "SEC-1"});
        let schema = JsonSchema::object().with_property("priority", SchemaProperty::new("string", "Priority"));
        let review = ScrapeReview::build(&scrape(), current.as_object().unwrap(), Some(&schema), &[]);

        let statuses: Vec<_> = review.fields.iter().map(|f| (f.key.as_str(), f.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("owner", ReviewStatus::New),
                ("priority", ReviewStatus::Changed),
                ("ticket", ReviewStatus::Same),
            ]
        );
        assert_eq!(review.fields[1].label, "Priority");
        assert_eq!(review.fields[1].previous.as_deref(), Some("P2"));
        assert_eq!(review.fields[0].label, "owner");
        assert!(review.has_updates());
    }

    #[test]
    fn non_string_current_values_compare_as_text() {
        let mut s = scrape();
        s.fields = [("count".to_string(), "3".to_string())].into_iter().collect();
        let current = json!({"count": 3});
        let review = ScrapeReview::build(&s, current.as_object().unwrap(), None, &[]);
        assert_eq!(review.fields[0].status, ReviewStatus::Same);
    }

    #[test]
    fn unmapped_by_mapping_keys() {
        let mappings = vec![
            mapping("Assignee", "owner"),
            mapping("Priority", "priority"),
            mapping("Key", "ticket"),
        ];
        let review = ScrapeReview::build(&scrape(), &Map::new(), None, &mappings);
        let unmapped: Vec<_> = review.unmapped.iter().map(|(k, _)| k.as_str()).collect();
        // Reporter shares a value with Assignee but was not mapped
        assert_eq!(unmapped, vec!["Reporter", "Labels"]);
    }

    #[test]
    fn unmapped_by_value_without_mappings() {
        let review = ScrapeReview::build(&scrape(), &Map::new(), None, &[]);
        let unmapped: Vec<_> = review.unmapped.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(unmapped, vec!["Labels"]);
    }

    #[test]
    fn apply_overwrites_and_keeps_others() {
        let mut metadata = json!({"priority": "P2", "region": "EU"}).as_object().unwrap().clone();
        apply_scrape(&scrape(), &mut metadata);
        assert_eq!(
            Value::Object(metadata),
            json!({"priority": "P1", "region": "EU", "owner": "Dana", "ticket": "SEC-1"})
        );
    }
}
