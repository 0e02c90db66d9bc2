use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::error::RequestError;
use crate::config::ClientConfig;
use crate::credentials::{CredentialStore, ACCESS_TOKEN_KEY};

/// Per-call overrides layered on top of the default headers.
///
/// Headers are applied in order after the defaults, so the last value written
/// for a name wins, including over `Content-Type` and `Authorization`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The request pipeline.
///
/// Every backend call goes through [`ApiClient::send`], which attaches the
/// bearer token from the credential store and normalizes failures into a
/// [`RequestError`]. Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    user_agent: String,
    error_placeholder: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    /// Create a new API client reading tokens from `credentials`.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialStore>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
            error_placeholder: config.error_placeholder.clone(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The store this client reads its bearer token from.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    fn build_url(&self, path: &str) -> Result<Url, RequestError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| RequestError::new(format!("Invalid request URL {}: {}", raw, e)))
    }

    /// Fresh header set for one call: defaults, then bearer token, then overrides.
    fn build_headers(&self, options: &RequestOptions) -> Result<HeaderMap, RequestError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        headers.insert(
            HeaderName::from_static("x-request-id"),
            header_value(&Uuid::new_v4().to_string())?,
        );

        if let Some(token) = self
            .credentials
            .get(ACCESS_TOKEN_KEY)
            .filter(|t| !t.is_empty())
        {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        }

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RequestError::new(format!("Invalid header name {}: {}", name, e)))?;
            headers.insert(name, header_value(value)?);
        }

        Ok(headers)
    }

    /// Send a request and classify the outcome.
    ///
    /// `path` is appended verbatim to the base URL. `body` is already
    /// serialized JSON. Returns `Ok(None)` for successful responses without a
    /// usable payload.
    pub async fn send(
        &self,
        path: &str,
        method: Method,
        body: Option<String>,
    ) -> Result<Option<Value>, RequestError> {
        self.send_with(path, method, body, RequestOptions::default())
            .await
    }

    /// [`send`](Self::send) with caller-supplied header overrides.
    pub async fn send_with(
        &self,
        path: &str,
        method: Method,
        body: Option<String>,
        options: RequestOptions,
    ) -> Result<Option<Value>, RequestError> {
        let url = self.build_url(path)?;
        let headers = self.build_headers(&options)?;

        debug!("=== API Request ===");
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, url.clone()).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            debug!("Request to {} failed: {}", url, e);
            RequestError::new(format!("Failed to send request to {}: {}", url, e))
        })?;

        let status = response.status();
        debug!("=== API Response ===");
        debug!("Status: {}", status);

        // A body that cannot be read is handled like one that cannot be parsed.
        let body = response.text().await.unwrap_or_default();
        let outcome = classify_response(status, &body, &self.error_placeholder);

        if let Err(ref err) = outcome {
            debug!("API request failed ({}): {}", status.as_u16(), err);
        }

        outcome
    }

    /// Serialize `body` as JSON and [`send`](Self::send) it.
    pub async fn send_json<T>(
        &self,
        path: &str,
        method: Method,
        body: &T,
    ) -> Result<Option<Value>, RequestError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body)
            .map_err(|e| RequestError::new(format!("Failed to serialize request body: {}", e)))?;
        self.send(path, method, Some(body)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

fn header_value(value: &str) -> Result<HeaderValue, RequestError> {
    HeaderValue::from_str(value)
        .map_err(|e| RequestError::new(format!("Invalid header value: {}", e)))
}

/// Map a transport-level response onto the pipeline outcome.
///
/// Successful responses never fail: 204 and unparseable bodies both come back
/// as `Ok(None)`.
fn classify_response(
    status: StatusCode,
    body: &str,
    error_placeholder: &str,
) -> Result<Option<Value>, RequestError> {
    if status.is_success() {
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        return Ok(serde_json::from_str::<Value>(body).ok());
    }

    Err(RequestError::from_response(
        status.as_u16(),
        body,
        error_placeholder,
    ))
}
