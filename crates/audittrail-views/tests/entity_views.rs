//! Views over the shared entity fixtures

use audittrail_model::{
    EventListResponse, FieldMapping, ImportUploadResponse, MappingId, ScrapeResponse, BATCH_TEMPLATES,
};
use audittrail_test_utils::{audit_type, batch, case, case_with_metadata, event, timeline};
use audittrail_views::{
    apply_scrape, display, timeline_completeness, ColumnMapper, Completeness, FieldKind, FormError, ImportField,
    ReviewStatus, SchemaForm, ScrapeReview,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[test]
fn test_case_score_counts_schema_properties() {
    let bare = case("c1").completeness();
    assert_eq!((bare.filled, bare.total), (1, 7));
    assert_eq!(bare.percentage, 14);
    assert!(!bare.all_required_filled);

    let filled = case_with_metadata("c1", json!({"vendor": "Acme", "amount": 0, "contact": ""})).completeness();
    assert_eq!((filled.filled, filled.total), (3, 7));
    assert_eq!(filled.percentage, 43);
    assert!(filled.all_required_filled);
}

#[test]
fn test_case_without_audit_type_scores_core_fields_only() {
    let mut case = case("c1");
    case.audit_type = None;
    case.description = Some(String::new());

    let score = case.completeness();
    assert_eq!(score.total, 3);
    assert_eq!(score.percentage, 33);
}

#[test]
fn test_event_and_batch_scores() {
    let mut event = event("e1", "c1", "2024-01-01", None, 0);
    event.file_count = Some(0);
    let score = event.completeness();
    assert_eq!((score.filled, score.total), (2, 6));
    assert!(score.all_required_filled);

    let batch = batch("b1", "e1", "", 0);
    let score = batch.completeness();
    assert_eq!((score.filled, score.total), (1, 4));
    assert!(!score.all_required_filled);
}

#[test]
fn test_timeline_score_aggregates_every_event() {
    let EventListResponse { items, .. } = timeline("c1");
    let score = timeline_completeness(&items);
    // date always set, time set on two of three
    assert_eq!(score.total, 18);
    assert_eq!(score.filled, 5);
}

#[test]
fn test_schema_form_round_trips_into_metadata() {
    let schema = audit_type().schema;
    let mut form = SchemaForm::new(&schema, case("c1").metadata);

    let kinds: Vec<_> = form.fields().iter().map(|f| (f.key.as_str(), f.kind.clone())).collect();
    assert!(matches!(kinds[1].1, FieldKind::Select { .. }));
    assert_eq!(kinds[3].1, FieldKind::Email);
    assert_eq!(form.missing_required().len(), 1);

    form.set_input("vendor", "Acme").unwrap();
    form.set_input("severity", "high").unwrap();
    form.set_input("amount", "12.5").unwrap();
    form.set_input("contact", "ops@acme.test").unwrap();
    assert!(matches!(
        form.set_input("severity", "critical"),
        Err(FormError::NotAnOption { .. })
    ));
    assert!(matches!(
        form.set_input("amount", "twelve"),
        Err(FormError::InvalidNumber { .. })
    ));

    assert!(form.missing_required().is_empty());
    assert_eq!(form.display_value("amount"), "12.5");
    assert_eq!(
        Value::Object(form.into_values()),
        json!({"vendor": "Acme", "severity": "high", "amount": 12.5, "contact": "ops@acme.test"})
    );
}

#[test]
fn test_scrape_review_against_case_metadata() {
    let mut metadata = case_with_metadata("c1", json!({"vendor": "Acme", "severity": "low"})).metadata;
    let scrape = ScrapeResponse {
        url: "https://jira.example/browse/SEC-9".to_string(),
        fields: [("vendor", "Acme"), ("severity", "high"), ("amount", "1200")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        raw_fields: [("Vendor", "Acme"), ("Priority", "high"), ("Cost", "1200"), ("Reporter", "Bob")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        error: None,
        success: true,
    };
    let mappings: Vec<FieldMapping> = [("Vendor", "vendor"), ("Priority", "severity"), ("Cost", "amount")]
        .into_iter()
        .enumerate()
        .map(|(i, (jira, key))| FieldMapping {
            id: MappingId::new(format!("m{i}")),
            audit_type_id: audit_type().id,
            jira_field_name: jira.to_string(),
            case_metadata_key: key.to_string(),
        })
        .collect();

    let review = ScrapeReview::build(&scrape, &metadata, Some(&audit_type().schema), &mappings);

    let statuses: Vec<_> = review.fields.iter().map(|f| (f.key.as_str(), f.status)).collect();
    assert_eq!(
        statuses,
        vec![
            ("vendor", ReviewStatus::Same),
            ("severity", ReviewStatus::Changed),
            ("amount", ReviewStatus::New),
        ]
    );
    assert_eq!(review.fields[1].previous.as_deref(), Some("low"));
    assert_eq!(review.fields[2].label, "Amount");
    assert_eq!(review.unmapped, vec![("Reporter".to_string(), "Bob".to_string())]);

    apply_scrape(&scrape, &mut metadata);
    assert_eq!(metadata.get("severity"), Some(&json!("high")));
    assert_eq!(metadata.get("amount"), Some(&json!("1200")));
}

#[test]
fn test_column_mapper_requires_a_date_column() {
    let upload = ImportUploadResponse {
        session_id: "s1".to_string(),
        filename: "log.xlsx".to_string(),
        headers: vec!["When".to_string(), "File".to_string(), "Notes".to_string()],
        row_count: 10,
        preview_rows: Vec::new(),
    };
    let mut mapper = ColumnMapper::new(&upload);

    mapper.assign("File", Some(ImportField::FileName)).unwrap();
    assert_eq!(mapper.to_request().unwrap_err(), FormError::MissingDateMapping);

    mapper.assign("When", Some(ImportField::EventDate)).unwrap();
    let request = mapper.to_request().unwrap();
    assert_eq!(request.session_id, "s1");
    assert_eq!(
        request.mappings.into_iter().collect::<Vec<_>>(),
        vec![
            ("When".to_string(), "event_date".to_string()),
            ("File".to_string(), "file_name".to_string()),
        ]
    );
}

#[test]
fn test_templates_prefill_batches() {
    let usb = &BATCH_TEMPLATES[0];
    let request = usb.to_request(12);
    assert_eq!(request.file_count, 12);
    assert_eq!(request.label, usb.label);
    assert_eq!(display::case_heading(&case("c1")), "#1 Laptop exfiltration");
}
