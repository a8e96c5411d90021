//! Cache, optimistic and timeline behavior over a scripted server

use audittrail_client::{ApiError, ApiResponse, HttpMethod, QueryKey, RequestBody};
use audittrail_model::{
    AuditTypeId, CaseFilters, CaseId, CaseStatus, ColumnMappingRequest, EventId, EventListResponse, EventPatch,
    FieldMappingCreate, ModelError,
};
use audittrail_test_utils::{audit_trail, batch, case, event, timeline, to_json, ScriptedTransport};
use chrono::Utc;
use futures::future::join_all;
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

const EVENTS: &str = "/api/cases/c1/events";

fn scripted_timeline() -> ScriptedTransport {
    let transport = ScriptedTransport::new();
    transport.on_json(HttpMethod::Get, EVENTS, 200, to_json(&timeline("c1")));
    transport
}

fn ids(list: &EventListResponse) -> Vec<&str> {
    list.items.iter().map(|e| e.id.as_str()).collect()
}

#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let transport = scripted_timeline().with_delay(Duration::from_millis(20));
    let app = audit_trail(&transport);
    let events = app.events();

    let case_id = CaseId::new("c1");
    let reads = (0..5).map(|_| events.list(&case_id));
    let results = join_all(reads).await;

    assert!(results.iter().all(|r| r.as_ref().unwrap().as_ref().unwrap().total == 3));
    assert_eq!(transport.count(HttpMethod::Get, EVENTS), 1);
}

#[tokio::test]
async fn test_empty_id_is_disabled_without_request() {
    let transport = ScriptedTransport::new();
    let app = audit_trail(&transport);

    assert_eq!(app.events().list(&CaseId::new("")).await.unwrap(), None);
    assert_eq!(app.cases().get(&CaseId::new("")).await.unwrap(), None);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_case_reads_always_refetch_but_events_do_not() {
    let transport = scripted_timeline();
    transport.on_json(HttpMethod::Get, "/api/cases/c1", 200, to_json(&case("c1")));
    let app = audit_trail(&transport);
    let case_id = CaseId::new("c1");

    app.cases().get(&case_id).await.unwrap();
    app.cases().get(&case_id).await.unwrap();
    app.events().list(&case_id).await.unwrap();
    app.events().list(&case_id).await.unwrap();

    assert_eq!(transport.count(HttpMethod::Get, "/api/cases/c1"), 2);
    assert_eq!(transport.count(HttpMethod::Get, EVENTS), 1);
}

#[tokio::test]
async fn test_batch_write_invalidates_batches_and_events() {
    let transport = scripted_timeline();
    let batches_path = "/api/cases/c1/events/e1/batches";
    transport.on_json(HttpMethod::Get, batches_path, 200, json!([]));
    transport.on_json(
        HttpMethod::Post,
        batches_path,
        201,
        to_json(&batch("b1", "e1", "USB copy", 3)),
    );
    let app = audit_trail(&transport);
    let (case_id, event_id) = (CaseId::new("c1"), EventId::new("e1"));

    app.events().list(&case_id).await.unwrap();
    app.batches().list(&case_id, &event_id).await.unwrap();
    assert!(app.cache().is_cached_fresh(&QueryKey::events(&case_id)).await);

    let request = audittrail_model::BATCH_TEMPLATES[0].to_request(3);
    let created = app.batches().create(&case_id, &event_id, &request).await.unwrap();
    assert_eq!(created.file_count, 3);

    assert!(!app.cache().is_cached_fresh(&QueryKey::events(&case_id)).await);
    assert!(
        !app.cache()
            .is_cached_fresh(&QueryKey::file_batches(&case_id, &event_id))
            .await
    );
    app.events().list(&case_id).await.unwrap();
    assert_eq!(transport.count(HttpMethod::Get, EVENTS), 2);
}

#[tokio::test]
async fn test_case_writes_invalidate_every_case_key() {
    let transport = ScriptedTransport::new();
    transport.on_json(
        HttpMethod::Get,
        "/api/cases",
        200,
        json!({"items": [], "total": 0, "offset": 0, "limit": 20}),
    );
    let mut closed = case("c1");
    closed.status = CaseStatus::Closed;
    transport.on_json(HttpMethod::Patch, "/api/cases/c1", 200, to_json(&closed));
    let app = audit_trail(&transport);
    let cache = app.cache();

    let key = QueryKey::cases_list(&CaseFilters::initial());
    cache.set_data(&key, json!("seeded")).await;
    cache.set_data(&QueryKey::case(&CaseId::new("c1")), json!("seeded")).await;

    let updated = app.cases().transition(&case("c1"), CaseStatus::Closed).await.unwrap();
    assert_eq!(updated.status, CaseStatus::Closed);

    let sent = transport.last_request().unwrap();
    assert_eq!(sent.body, audittrail_client::RequestBody::Json(json!({"status": "closed"})));
    assert!(!cache.is_cached_fresh(&key).await);
    assert!(!cache.is_cached_fresh(&QueryKey::case(&CaseId::new("c1"))).await);
}

#[tokio::test]
async fn test_disallowed_transition_is_rejected_locally() {
    let transport = ScriptedTransport::new();
    let app = audit_trail(&transport);

    let err = app.cases().transition(&case("c1"), CaseStatus::Open).await.unwrap_err();

    assert!(matches!(err, ApiError::Model(ModelError::InvalidTransition { .. })));
    assert!(err.is_local());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_optimistic_edit_failure_leaves_list_identical() {
    let transport = scripted_timeline();
    transport.on_json(
        HttpMethod::Patch,
        "/api/cases/c1/events/e2",
        422,
        json!({"detail": "file_count must be positive"}),
    );
    let app = audit_trail(&transport);
    let case_id = CaseId::new("c1");
    let before = app.events().list(&case_id).await.unwrap().unwrap();

    let patch = EventPatch::new().file_name(Some("renamed.txt"));
    let err = app
        .events()
        .update_optimistic(&case_id, &EventId::new("e2"), &patch)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "file_count must be positive");

    let after = app
        .cache()
        .peek::<EventListResponse>(&QueryKey::events(&case_id))
        .await
        .unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_optimistic_edit_success_is_visible_and_reconciled() {
    let transport = scripted_timeline();
    let mut renamed = event("e2", "c1", "2024-01-01", Some("09:30"), 0);
    renamed.file_name = Some("renamed.txt".to_string());
    transport.on_json(HttpMethod::Patch, "/api/cases/c1/events/e2", 200, to_json(&renamed));
    let app = audit_trail(&transport);
    let case_id = CaseId::new("c1");
    app.events().list(&case_id).await.unwrap();

    let patch = EventPatch::new().file_name(Some("renamed.txt"));
    let saved = app
        .events()
        .update_optimistic(&case_id, &EventId::new("e2"), &patch)
        .await
        .unwrap();
    assert_eq!(saved.file_name.as_deref(), Some("renamed.txt"));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.count(HttpMethod::Get, EVENTS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_grace_delete_undo_and_commit() {
    let transport = scripted_timeline();
    transport.on(HttpMethod::Delete, "/api/cases/c1/events/e2", ApiResponse::empty(204));
    let app = audit_trail(&transport);
    let timeline = app.timeline(CaseId::new("c1"));

    let original = timeline.events().await.unwrap().unwrap();
    assert!(timeline.delete(&EventId::new("e2")).await);
    let shown = timeline.events().await.unwrap().unwrap();
    assert_eq!(ids(&shown), vec!["e1", "e3"]);
    assert_eq!(shown.total, 2);

    assert!(timeline.undo().await);
    assert_eq!(timeline.events().await.unwrap().unwrap(), original);

    assert!(timeline.delete(&EventId::new("e2")).await);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(transport.count(HttpMethod::Delete, "/api/cases/c1/events/e2"), 1);
    // list reloaded after the delete
    assert_eq!(transport.count(HttpMethod::Get, EVENTS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refetch_inside_undo_window_keeps_event_hidden() {
    let transport = scripted_timeline();
    let mut renamed = event("e1", "c1", "2024-01-01", None, 0);
    renamed.file_name = Some("renamed.txt".to_string());
    transport.on_json(HttpMethod::Patch, "/api/cases/c1/events/e1", 200, to_json(&renamed));
    transport.on_json(
        HttpMethod::Post,
        EVENTS,
        201,
        to_json(&event("e4", "c1", "2024-01-03", None, 0)),
    );
    transport.on(HttpMethod::Delete, "/api/cases/c1/events/e2", ApiResponse::empty(204));
    let app = audit_trail(&transport);
    let case_id = CaseId::new("c1");
    let timeline = app.timeline(case_id.clone());
    let original = timeline.events().await.unwrap().unwrap();

    assert!(timeline.delete(&EventId::new("e2")).await);

    // optimistic edit schedules a reconciling refetch of the list
    let patch = EventPatch::new().file_name(Some("renamed.txt"));
    app.events()
        .update_optimistic(&case_id, &EventId::new("e1"), &patch)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.count(HttpMethod::Get, EVENTS), 2);
    let shown = timeline.events().await.unwrap().unwrap();
    assert_eq!(ids(&shown), vec!["e1", "e3"]);
    assert_eq!(shown.total, 2);

    // invalidating write, then a read that goes to the server
    timeline.add_blank_event().await.unwrap();
    let RequestBody::Json(body) = transport.last_request().unwrap().body else {
        panic!("event create sends json");
    };
    assert_eq!(body["event_date"], json!(Utc::now().date_naive().format("%Y-%m-%d").to_string()));
    let shown = timeline.events().await.unwrap().unwrap();
    assert_eq!(transport.count(HttpMethod::Get, EVENTS), 3);
    assert_eq!(ids(&shown), vec!["e1", "e3"]);
    assert_eq!(shown.total, 2);

    assert!(timeline.undo().await);
    let restored = timeline.events().await.unwrap().unwrap();
    assert_eq!(restored, original);
    assert_eq!(restored.total, 3);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(transport.count(HttpMethod::Delete, "/api/cases/c1/events/e2"), 0);
    app.cache().invalidate(&QueryKey::events(&case_id));
    assert_eq!(ids(&timeline.events().await.unwrap().unwrap()), vec!["e1", "e2", "e3"]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_commit_does_not_restore_locally() {
    let transport = scripted_timeline();
    transport.on_json(
        HttpMethod::Delete,
        "/api/cases/c1/events/e1",
        500,
        json!({"detail": "db down"}),
    );
    let app = audit_trail(&transport);
    let timeline = app.timeline(CaseId::new("c1"));
    timeline.events().await.unwrap();

    timeline.delete(&EventId::new("e1")).await;
    timeline.flush().await;

    assert_eq!(transport.count(HttpMethod::Delete, "/api/cases/c1/events/e1"), 1);
    assert_eq!(transport.count(HttpMethod::Get, EVENTS), 2);
    assert!(!timeline.undo().await);
}

#[tokio::test]
async fn test_import_flow() {
    let transport = scripted_timeline();
    transport.on_json(
        HttpMethod::Post,
        "/api/cases/c1/imports/validate",
        200,
        json!({"session_id": "s1", "total_rows": 2, "valid_count": 2, "error_count": 0, "rows": []}),
    );
    transport.on_json(
        HttpMethod::Post,
        "/api/cases/c1/imports/confirm",
        200,
        json!({"created_count": 2, "error_count": 0, "errors": []}),
    );
    let app = audit_trail(&transport);
    let case_id = CaseId::new("c1");
    app.events().list(&case_id).await.unwrap();

    let mut mappings = IndexMap::new();
    mappings.insert("Date".to_string(), "event_date".to_string());
    let validation = app
        .imports()
        .validate(
            &case_id,
            &ColumnMappingRequest {
                session_id: "s1".to_string(),
                mappings,
            },
        )
        .await
        .unwrap();
    assert_eq!(validation.valid_count, 2);

    let confirmed = app.imports().confirm(&case_id, "s1").await.unwrap();
    assert_eq!(confirmed.created_count, 2);
    assert!(!app.cache().is_cached_fresh(&QueryKey::events(&case_id)).await);
}

#[tokio::test]
async fn test_field_mapping_replace_and_scrape() {
    let transport = ScriptedTransport::new();
    let path = "/api/jira/mappings/at-vendor";
    let saved = json!([{
        "id": "m1",
        "audit_type_id": "at-vendor",
        "jira_field_name": "Vendor",
        "case_metadata_key": "vendor",
    }]);
    transport.on_json(HttpMethod::Get, path, 200, json!([]));
    transport.on_json(HttpMethod::Put, path, 200, saved.clone());
    transport.on_json(
        HttpMethod::Post,
        "/api/jira/scrape-and-map",
        200,
        json!({"url": "https://jira/ABC-1", "fields": {"vendor": "Acme"}, "raw_fields": {}, "success": true}),
    );
    let app = audit_trail(&transport);
    let audit_type = AuditTypeId::new("at-vendor");

    assert_eq!(app.jira().mappings(&audit_type).await.unwrap(), Some(Vec::new()));
    let replaced = app
        .jira()
        .replace_mappings(
            &audit_type,
            &[FieldMappingCreate {
                jira_field_name: "Vendor".to_string(),
                case_metadata_key: "vendor".to_string(),
            }],
        )
        .await
        .unwrap();
    assert_eq!(replaced.len(), 1);
    assert_eq!(
        transport.last_request().unwrap().body,
        audittrail_client::RequestBody::Json(json!({
            "mappings": [{"jira_field_name": "Vendor", "case_metadata_key": "vendor"}]
        }))
    );

    let scraped = app
        .jira()
        .scrape_and_map(&audit_type, &audittrail_model::ScrapeRequest::new(" https://jira/ABC-1 "))
        .await
        .unwrap();
    assert_eq!(scraped.fields.get("vendor").map(String::as_str), Some("Acme"));
    assert_eq!(
        transport.last_request().unwrap().query,
        vec![("audit_type_id".to_string(), "at-vendor".to_string())]
    );
}
