//! Transport abstraction
//!
//! [`ApiClient`](crate::ApiClient) speaks to the server through a
//! [`Transport`], so tests can substitute a scripted or mocked one for the
//! reqwest-backed [`HttpTransport`](crate::HttpTransport).

use crate::error::{ApiError, ClientResult};
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// HTTP verbs the API uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Upper-case verb
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// `application/json`
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// `multipart/form-data` with a single file part
    Multipart {
        /// Part name
        field: String,
        /// File name sent with the part
        file_name: String,
        /// File content
        bytes: Bytes,
    },
}

/// A request relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Verb
    pub method: HttpMethod,
    /// Absolute path, e.g. `/api/cases`
    pub path: String,
    /// Query parameters, sent in order
    pub query: Vec<(String, String)>,
    /// Payload
    pub body: RequestBody,
    /// Bearer token
    pub bearer: Option<String>,
}

impl ApiRequest {
    /// Create request
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// With query parameters
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// With JSON body
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// With form body
    #[must_use]
    pub fn with_form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    /// With single-file multipart body
    #[must_use]
    pub fn with_file(mut self, field: &str, file_name: &str, bytes: Bytes) -> Self {
        self.body = RequestBody::Multipart {
            field: field.to_string(),
            file_name: file_name.to_string(),
            bytes,
        };
        self
    }

    /// With bearer token
    #[must_use]
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    /// Value of a query parameter
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A response as received
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    /// HTTP status
    pub status: u16,
    /// Headers, names lower-cased
    pub headers: HashMap<String, String>,
    /// Raw body
    pub body: Bytes,
}

impl ApiResponse {
    /// Response with a raw body
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Response with a JSON body
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string()).with_header("content-type", "application/json")
    }

    /// Empty response
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, Bytes::new())
    }

    /// With header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Header by case-insensitive name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// 2xx
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body; an empty body or 204 decodes from `null`
    pub fn decode<T: DeserializeOwned>(&self) -> ClientResult<T> {
        if self.status == 204 || self.body.is_empty() {
            return serde_json::from_value(Value::Null).map_err(ApiError::from);
        }
        serde_json::from_slice(&self.body).map_err(ApiError::from)
    }

    /// Body as JSON, if it is JSON
    #[must_use]
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Sends requests to the server
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request; `Err` only when no response was received
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse>;
}
