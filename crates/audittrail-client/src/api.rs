//! Authenticated request layer
//!
//! Every call attaches the stored bearer token. A 401 revokes the session
//! (token cleared, identity reset, redirect to `/login` broadcast) and fails
//! with [`ApiError::Unauthorized`]. Other failures carry the server's
//! `detail`, then `message`, then `Request failed with status N`.

use crate::credentials::Credentials;
use crate::error::{ApiError, ClientResult};
use crate::transport::{ApiRequest, ApiResponse, HttpMethod, Transport};
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

static FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"filename="?([^";\n]+)"?"#).expect("filename pattern compiles"));

/// A downloaded file
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    /// Name from `Content-Disposition`, or the caller's fallback
    pub file_name: String,
    /// `Content-Type`, if sent
    pub content_type: Option<String>,
    /// File content
    pub bytes: Bytes,
}

/// How failure bodies of a call are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorStyle {
    Api,
    Report,
}

/// Sends authenticated requests and decodes responses
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    credentials: Arc<Credentials>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client over a transport and shared credentials
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, credentials: Arc<Credentials>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Shared credentials
    #[must_use]
    pub fn credentials(&self) -> &Arc<Credentials> {
        &self.credentials
    }

    /// Send a request and return the raw successful response
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] on 401, a status error on any other non-2xx,
    /// [`ApiError::Transport`] when no response arrives.
    pub async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.execute_with(request, ErrorStyle::Api).await
    }

    async fn execute_with(&self, mut request: ApiRequest, style: ErrorStyle) -> ClientResult<ApiResponse> {
        if request.bearer.is_none() {
            request.bearer = self.credentials.token();
        }
        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, "api request");

        let response = self.transport.send(request).await?;

        if response.status == 401 {
            warn!(%method, %path, "unauthorized, clearing session");
            self.credentials.revoke();
            return Err(ApiError::Unauthorized);
        }
        if !response.is_success() {
            let err = failure(&response, style);
            debug!(%method, %path, status = response.status, error = %err, "api request failed");
            return Err(err);
        }
        Ok(response)
    }

    async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        self.execute(request).await?.decode()
    }

    /// GET and decode
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request(ApiRequest::get(path)).await
    }

    /// GET with query parameters and decode
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> ClientResult<T> {
        self.request(ApiRequest::get(path).with_query(query)).await
    }

    /// POST a JSON body and decode
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send_json(HttpMethod::Post, path, Vec::new(), body).await
    }

    /// POST a JSON body with query parameters and decode
    pub async fn post_with_query<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
        body: &B,
    ) -> ClientResult<T> {
        self.send_json(HttpMethod::Post, path, query, body).await
    }

    /// POST a url-encoded form and decode
    pub async fn post_form<T: DeserializeOwned>(&self, path: &str, fields: Vec<(String, String)>) -> ClientResult<T> {
        self.request(ApiRequest::new(HttpMethod::Post, path).with_form(fields))
            .await
    }

    /// PUT a JSON body and decode
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send_json(HttpMethod::Put, path, Vec::new(), body).await
    }

    /// PATCH a JSON body and decode
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send_json(HttpMethod::Patch, path, Vec::new(), body).await
    }

    /// DELETE; a 204 yields unit
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.execute(ApiRequest::new(HttpMethod::Delete, path)).await?;
        Ok(())
    }

    /// POST one file as multipart field `file` and decode
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, file_name: &str, bytes: Bytes) -> ClientResult<T> {
        self.request(ApiRequest::new(HttpMethod::Post, path).with_file("file", file_name, bytes))
            .await
    }

    /// GET a generated report
    ///
    /// Failures read only `detail` and otherwise say
    /// `Report generation failed with status N`.
    pub async fn download(
        &self,
        path: &str,
        query: Vec<(String, String)>,
        fallback_name: &str,
    ) -> ClientResult<Download> {
        let response = self
            .execute_with(ApiRequest::get(path).with_query(query), ErrorStyle::Report)
            .await?;
        let file_name = response
            .header("content-disposition")
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| fallback_name.to_string());
        Ok(Download {
            file_name,
            content_type: response.header("content-type").map(str::to_string),
            bytes: response.body,
        })
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        query: Vec<(String, String)>,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        self.request(ApiRequest::new(method, path).with_query(query).with_json(body))
            .await
    }
}

/// File name from a `Content-Disposition` header
#[must_use]
pub fn filename_from_disposition(header: &str) -> Option<String> {
    FILENAME
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn failure(response: &ApiResponse, style: ErrorStyle) -> ApiError {
    let body = response.json_body();
    let message = body.as_ref().and_then(|b| match style {
        ErrorStyle::Api => detail(b).or_else(|| b.get("message").and_then(Value::as_str).map(str::to_string)),
        ErrorStyle::Report => detail(b),
    });
    let message = message.unwrap_or_else(|| match style {
        ErrorStyle::Api => format!("Request failed with status {}", response.status),
        ErrorStyle::Report => format!("Report generation failed with status {}", response.status),
    });
    ApiError::from_status(response.status, message, body.is_some())
}

fn detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        // validation errors arrive as a list of objects
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{MemoryTokenStore, SessionEvent};
    use crate::transport::MockTransport;
    use serde_json::json;

    fn client(mock: MockTransport, token: Option<&str>) -> ApiClient {
        let store = match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        };
        ApiClient::new(Arc::new(mock), Arc::new(Credentials::new(Arc::new(store))))
    }

    #[tokio::test]
    async fn bearer_token_is_attached() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.bearer.as_deref() == Some("tok") && req.path == "/api/users")
            .times(1)
            .returning(|_| Ok(ApiResponse::json(200, &json!([]))));

        let users: Vec<Value> = client(mock, Some("tok")).get("/api/users").await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_clears_token_and_redirects() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .returning(|_| Ok(ApiResponse::json(401, &json!({"detail": "Not authenticated"}))));

        let client = client(mock, Some("tok"));
        let mut events = client.credentials().subscribe();
        let err = client.get::<Value>("/api/cases").await.unwrap_err();

        assert_eq!(err.to_string(), "Unauthorized");
        assert_eq!(client.credentials().token(), None);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Redirect("/login".into()));
    }

    #[tokio::test]
    async fn message_prefers_detail_then_message() {
        let mut mock = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ApiResponse::json(404, &json!({"detail": "Case not found", "message": "x"}))));
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ApiResponse::json(400, &json!({"message": "Bad input"}))));
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ApiResponse::new(502, "<html>bad gateway</html>")));

        let client = client(mock, None);
        let first = client.get::<Value>("/a").await.unwrap_err();
        let second = client.get::<Value>("/b").await.unwrap_err();
        let third = client.get::<Value>("/c").await.unwrap_err();

        assert_eq!(first.to_string(), "Case not found");
        assert_eq!(first.status(), Some(404));
        assert_eq!(second.to_string(), "Bad input");
        assert!(matches!(second, ApiError::Validation { status: 400, .. }));
        assert_eq!(third.to_string(), "Request failed with status 502");
        assert!(matches!(third, ApiError::Server { status: 502, .. }));
    }

    #[tokio::test]
    async fn structured_detail_is_rendered_as_json() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| {
            Ok(ApiResponse::json(422, &json!({"detail": [{"loc": ["body", "title"], "msg": "field required"}]})))
        });
        let err = client(mock, None).post::<Value, _>("/api/cases", &json!({})).await.unwrap_err();
        assert!(err.to_string().contains("field required"));
    }

    #[tokio::test]
    async fn report_errors_ignore_message() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .returning(|_| Ok(ApiResponse::json(500, &json!({"message": "ignored"}))));
        let err = client(mock, None)
            .download("/api/cases/c1/reports/html", Vec::new(), "audit-report.html")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Report generation failed with status 500");
    }

    #[tokio::test]
    async fn delete_accepts_no_content() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.method == HttpMethod::Delete)
            .returning(|_| Ok(ApiResponse::empty(204)));
        client(mock, None).delete("/api/cases/c1").await.unwrap();
    }

    #[test]
    fn disposition_filename() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="case-7.pdf""#).as_deref(),
            Some("case-7.pdf")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=report.docx").as_deref(),
            Some("report.docx")
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }
}
