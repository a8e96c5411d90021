//! Testing utilities for the AuditTrail workspace
//!
//! Entity fixtures and a scripted transport that answers requests from a
//! route table and records everything it was sent.

#![allow(missing_docs)]

use async_trait::async_trait;
use audittrail_client::{
    ApiRequest, ApiResponse, AuditTrail, ClientResult, HttpMethod, MemoryTokenStore, QueryCache, Transport,
    DEFAULT_UNDO_GRACE,
};
use audittrail_model::{
    AuditType, AuditTypeId, Case, CaseId, CaseStatus, EventId, EventListResponse, EventType, FileBatch, Identity,
    JsonSchema, SchemaProperty, TimelineEvent, UserId, UserInfo,
};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_TOKEN: &str = "test-token";

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn user(id: &str, username: &str, full_name: &str) -> UserInfo {
    UserInfo {
        id: UserId::new(id),
        username: username.to_string(),
        full_name: full_name.to_string(),
        is_active: true,
    }
}

pub fn alice() -> UserInfo {
    user("u-alice", "alice", "Alice Auditor")
}

pub fn bob() -> UserInfo {
    user("u-bob", "bob", "Bob Reviewer")
}

pub fn identity() -> Identity {
    let alice = alice();
    Identity {
        id: alice.id,
        username: alice.username,
        full_name: alice.full_name,
    }
}

/// Schema with one property of every field kind; `vendor` is required
pub fn vendor_schema() -> JsonSchema {
    JsonSchema::object()
        .with_property("vendor", SchemaProperty::new("string", "Vendor"))
        .with_property(
            "severity",
            SchemaProperty::new("string", "Severity").with_options(["low", "medium", "high"]),
        )
        .with_property("amount", SchemaProperty::new("number", "Amount"))
        .with_property("contact", SchemaProperty::new("string", "").with_format("email"))
        .with_required("vendor")
}

pub fn audit_type() -> AuditType {
    AuditType {
        id: AuditTypeId::new("at-vendor"),
        name: "Vendor Review".to_string(),
        slug: "vendor-review".to_string(),
        description: None,
        schema: vendor_schema(),
        is_active: true,
        created_at: Some(timestamp()),
    }
}

pub fn case(id: &str) -> Case {
    Case {
        id: CaseId::new(id),
        case_number: 1,
        title: "Laptop exfiltration".to_string(),
        description: None,
        audit_type_id: AuditTypeId::new("at-vendor"),
        audit_type: Some(audit_type()),
        metadata: Map::new(),
        status: CaseStatus::Open,
        assigned_to_id: None,
        assigned_to: None,
        created_by_id: alice().id,
        created_by: Some(alice()),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn case_with_metadata(id: &str, metadata: Value) -> Case {
    let mut case = case(id);
    if let Value::Object(map) = metadata {
        case.metadata = map;
    }
    case
}

pub fn event(id: &str, case_id: &str, date: &str, time: Option<&str>, sort_order: i64) -> TimelineEvent {
    TimelineEvent {
        id: EventId::new(id),
        case_id: CaseId::new(case_id),
        event_type: EventType::Finding,
        event_date: date.to_string(),
        event_time: time.map(str::to_string),
        file_name: None,
        file_count: None,
        file_description: None,
        file_type: None,
        metadata: Map::new(),
        sort_order,
        created_by_id: alice().id,
        created_by: Some(alice()),
        file_batches: Vec::new(),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

/// Three events on `case_id`, already in timeline order
pub fn timeline(case_id: &str) -> EventListResponse {
    let items = vec![
        event("e1", case_id, "2024-01-01", None, 0),
        event("e2", case_id, "2024-01-01", Some("09:30"), 0),
        event("e3", case_id, "2024-01-02", Some("08:00"), 1),
    ];
    EventListResponse { total: items.len(), items }
}

pub fn batch(id: &str, event_id: &str, label: &str, file_count: u32) -> FileBatch {
    FileBatch {
        id: id.into(),
        event_id: EventId::new(event_id),
        label: label.to_string(),
        file_count,
        description: None,
        file_types: None,
        sort_order: 0,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap()
}

struct Route {
    method: HttpMethod,
    path: String,
    responses: VecDeque<ApiResponse>,
}

#[derive(Default)]
struct Script {
    routes: Vec<Route>,
    requests: Vec<ApiRequest>,
    delay: Duration,
}

/// Transport answering from a route table
///
/// Each route replays its queued responses in order and keeps repeating the
/// last one. Unknown routes answer 404. Clones share the script.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let script = self.script.lock();
        f.debug_struct("ScriptedTransport")
            .field("routes", &script.routes.len())
            .field("requests", &script.requests.len())
            .finish()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method path`
    pub fn on(&self, method: HttpMethod, path: &str, response: ApiResponse) -> &Self {
        let mut script = self.script.lock();
        match script.routes.iter_mut().find(|r| r.method == method && r.path == path) {
            Some(route) => route.responses.push_back(response),
            None => script.routes.push(Route {
                method,
                path: path.to_string(),
                responses: VecDeque::from([response]),
            }),
        }
        self
    }

    pub fn on_json(&self, method: HttpMethod, path: &str, status: u16, body: Value) -> &Self {
        self.on(method, path, ApiResponse::json(status, &body))
    }

    /// Wait this long before answering every request
    pub fn with_delay(self, delay: Duration) -> Self {
        self.script.lock().delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.lock().requests.clone()
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.script
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.script.lock().requests.last().cloned()
    }

    pub fn clear_requests(&self) {
        self.script.lock().requests.clear();
    }

    fn answer(&self, request: ApiRequest) -> (ApiResponse, Duration) {
        let mut script = self.script.lock();
        let delay = script.delay;
        let response = script
            .routes
            .iter_mut()
            .find(|r| r.method == request.method && r.path == request.path)
            .map(|route| {
                if route.responses.len() > 1 {
                    route.responses.pop_front().unwrap()
                } else {
                    route.responses[0].clone()
                }
            })
            .unwrap_or_else(|| ApiResponse::json(404, &json!({"detail": "Not Found"})));
        script.requests.push(request);
        (response, delay)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let (response, delay) = self.answer(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(response)
    }
}

/// Client context over `transport`, signed in with [`TEST_TOKEN`]
pub fn audit_trail(transport: &ScriptedTransport) -> AuditTrail {
    AuditTrail::with_transport(
        Arc::new(transport.clone()),
        Arc::new(MemoryTokenStore::with_token(TEST_TOKEN)),
        QueryCache::default(),
        DEFAULT_UNDO_GRACE,
    )
}
