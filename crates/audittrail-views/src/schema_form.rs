//! Schema-driven metadata forms
//!
//! [`classify`] maps a schema property to a [`FieldKind`]; [`SchemaForm`]
//! holds the edited values as the flat key → value map the API stores in
//! `Case::metadata`.

use crate::error::{FormError, FormResult};
use audittrail_model::{JsonSchema, SchemaProperty};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Input control chosen for a property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Choice from a fixed list
    Select {
        /// Allowed values
        options: Vec<String>,
    },
    /// Number input; `integer` schemas reject fractions
    Numeric {
        /// Whole numbers only
        integer: bool,
    },
    /// Email address
    Email,
    /// Free text
    Text,
}

/// Pick the control for a property
///
/// Priority: string with enum, then number/integer, then string with email
/// format, then text.
#[must_use]
pub fn classify(property: &SchemaProperty) -> FieldKind {
    match (property.kind.as_str(), &property.options, property.format.as_deref()) {
        ("string", Some(options), _) => FieldKind::Select {
            options: options.clone(),
        },
        ("number", _, _) => FieldKind::Numeric { integer: false },
        ("integer", _, _) => FieldKind::Numeric { integer: true },
        ("string", None, Some("email")) => FieldKind::Email,
        _ => FieldKind::Text,
    }
}

/// One rendered form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// Metadata key
    pub key: String,
    /// Title, or the key when untitled
    pub label: String,
    /// Control
    pub kind: FieldKind,
    /// Marked required; advisory only
    pub required: bool,
}

impl FormField {
    /// Validate raw input and convert it to the stored value
    ///
    /// Numeric fields store empty input as `""` ("no value").
    pub fn parse_input(&self, input: &str) -> FormResult<Value> {
        match &self.kind {
            FieldKind::Select { options } => {
                if options.iter().any(|o| o == input) {
                    Ok(Value::String(input.to_string()))
                } else {
                    Err(FormError::NotAnOption {
                        key: self.key.clone(),
                        value: input.to_string(),
                    })
                }
            }
            FieldKind::Numeric { integer } => parse_number(&self.key, input, *integer),
            FieldKind::Email | FieldKind::Text => Ok(Value::String(input.to_string())),
        }
    }
}

fn parse_number(key: &str, input: &str, integer: bool) -> FormResult<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Value::String(String::new()));
    }

    let invalid = || FormError::InvalidNumber {
        key: key.to_string(),
        input: input.to_string(),
    };

    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(Value::Number(n.into()));
    }
    if integer {
        return Err(invalid());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(invalid)
}

/// Fields in schema order
#[must_use]
pub fn form_fields(schema: &JsonSchema) -> Vec<FormField> {
    schema
        .properties
        .iter()
        .map(|(key, property)| FormField {
            key: key.clone(),
            label: property.label_or(key).to_string(),
            kind: classify(property),
            required: schema.is_required(key),
        })
        .collect()
}

/// Editable metadata bound to a schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaForm {
    fields: Vec<FormField>,
    values: Map<String, Value>,
}

impl SchemaForm {
    /// Form over `schema`, starting from existing metadata
    #[must_use]
    pub fn new(schema: &JsonSchema, values: Map<String, Value>) -> Self {
        Self {
            fields: form_fields(schema),
            values,
        }
    }

    /// Rendered fields
    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Field by key
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Apply user input to one field
    pub fn set_input(&mut self, key: &str, input: &str) -> FormResult<()> {
        let field = self
            .field(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
        let value = field.parse_input(input)?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Text shown in the control for `key`
    #[must_use]
    pub fn display_value(&self, key: &str) -> String {
        self.values.get(key).map(value_text).unwrap_or_default()
    }

    /// Required fields that are still empty
    #[must_use]
    pub fn missing_required(&self) -> Vec<&FormField> {
        self.fields
            .iter()
            .filter(|f| f.required && crate::completeness::is_empty(self.values.get(&f.key)))
            .collect()
    }

    /// Current values
    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Finish editing
    #[must_use]
    pub fn into_values(self) -> Map<String, Value> {
        self.values
    }
}

/// Render a stored value as plain text
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> JsonSchema {
        JsonSchema::object()
            .with_property(
                "severity",
                SchemaProperty::new("string", "Severity").with_options(["low", "high"]),
            )
            .with_property("hours", SchemaProperty::new("number", "Hours"))
            .with_property("files", SchemaProperty::new("integer", ""))
            .with_property(
                "contact",
                SchemaProperty::new("string", "Contact").with_format("email"),
            )
            .with_property("notes", SchemaProperty::new("string", "Notes"))
            .with_property("flag", SchemaProperty::new("boolean", "Flag"))
            .with_required("severity")
    }

    #[test]
    fn classification_order() {
        let kinds: Vec<_> = form_fields(&schema()).into_iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Select {
                    options: vec!["low".into(), "high".into()]
                },
                FieldKind::Numeric { integer: false },
                FieldKind::Numeric { integer: true },
                FieldKind::Email,
                FieldKind::Text,
                FieldKind::Text,
            ]
        );
    }

    #[test]
    fn enum_wins_over_email_format() {
        let property = SchemaProperty::new("string", "x")
            .with_format("email")
            .with_options(["a@b.c"]);
        assert!(matches!(classify(&property), FieldKind::Select { .. }));
    }

    #[test]
    fn untitled_field_uses_key() {
        let fields = form_fields(&schema());
        assert_eq!(fields[2].label, "files");
        assert!(fields[0].required);
        assert!(!fields[1].required);
    }

    #[test]
    fn values_round_trip_into_flat_map() {
        let mut form = SchemaForm::new(&schema(), Map::new());
        form.set_input("severity", "high").unwrap();
        form.set_input("hours", "1.5").unwrap();
        form.set_input("files", "3").unwrap();
        form.set_input("contact", "a@example.com").unwrap();

        assert_eq!(
            Value::Object(form.into_values()),
            json!({"severity": "high", "hours": 1.5, "files": 3, "contact": "a@example.com"})
        );
    }

    #[test]
    fn empty_numeric_input_means_no_value() {
        let mut form = SchemaForm::new(&schema(), Map::new());
        form.set_input("hours", "").unwrap();
        assert_eq!(form.values().get("hours"), Some(&json!("")));
        assert_eq!(form.display_value("hours"), "");
    }

    #[test]
    fn invalid_input_is_rejected() {
        let mut form = SchemaForm::new(&schema(), Map::new());
        assert!(matches!(
            form.set_input("hours", "abc"),
            Err(FormError::InvalidNumber { .. })
        ));
        assert!(matches!(
            form.set_input("files", "2.5"),
            Err(FormError::InvalidNumber { .. })
        ));
        assert!(matches!(
            form.set_input("severity", "medium"),
            Err(FormError::NotAnOption { .. })
        ));
        assert_eq!(
            form.set_input("nope", "x"),
            Err(FormError::UnknownField("nope".into()))
        );
        assert!(form.values().is_empty());
    }

    #[test]
    fn required_marks_are_advisory() {
        let form = SchemaForm::new(&schema(), Map::new());
        let missing: Vec<_> = form.missing_required().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(missing, vec!["severity"]);
    }
}
