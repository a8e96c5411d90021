//! reqwest-backed transport

use crate::error::{ApiError, ClientResult};
use crate::transport::{ApiRequest, ApiResponse, HttpMethod, RequestBody, Transport};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Url};
use std::collections::HashMap;
use std::time::Duration;
use tracing::trace;

/// Sends requests over HTTP with reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        Url::parse(base_url).map_err(|err| ApiError::Config(format!("invalid base URL '{base_url}': {err}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Config(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, request: &ApiRequest) -> ClientResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, request.path))
            .map_err(|err| ApiError::Config(format!("invalid request path '{}': {err}", request.path)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let url = self.url(&request)?;
        trace!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(method(request.method), url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart {
                field,
                file_name,
                bytes,
            } => {
                let part = Part::bytes(bytes.to_vec()).file_name(file_name);
                builder.multipart(Form::new().part(field, part))
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
