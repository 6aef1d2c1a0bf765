//! The single HTTP egress point for every API call.
//!
//! ARCHITECTURE
//! ============
//! `HttpClient` wraps one configured `reqwest::Client` (base URL, JSON
//! headers, request timeout) and runs two interceptors around every call:
//!
//! - outbound: read the credential store and attach `Authorization: Bearer`
//!   unless the request was built as anonymous;
//! - inbound: on 401 clear the credential store, notify the injected
//!   [`UnauthorizedHandler`], then fail with [`ApiError::Unauthorized`].
//!
//! Facades never special-case 401 themselves. Navigation policy lives behind
//! the handler so the transport does not know what "go to login" means.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::Arc;
use std::time::Instant;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::Ack;
use crate::config::{ClientConfig, normalize_base_url};
use crate::error::{ApiError, DecodeError};
use crate::store::CredentialStore;

/// Observer notified after the transport has cleared a rejected credential.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

/// Whether the outbound interceptor may attach the stored credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Credentials {
    Attach,
    Anonymous,
}

// =============================================================================
// CLIENT
// =============================================================================

/// Cheap-to-clone handle; all clones share one connection pool and store.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    on_unauthorized: Arc<dyn UnauthorizedHandler>,
}

impl HttpClient {
    /// Build the client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails to build.
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn CredentialStore>,
        on_unauthorized: Arc<dyn UnauthorizedHandler>,
    ) -> Result<Self, ApiError> {
        let base_url = normalize_base_url(&config.base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self { inner: Arc::new(Inner { http, base_url, store, on_unauthorized }) })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Absolute URL for an API-relative `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.inner.base_url)
        } else {
            format!("{}/{path}", self.inner.base_url)
        }
    }

    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            method: method.clone(),
            path: path.to_owned(),
            inner: self.inner.http.request(method, self.url(path)),
            credentials: Credentials::Attach,
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::GET, path)
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::POST, path)
    }

    #[must_use]
    pub fn put(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::DELETE, path)
    }

    /// Inbound interceptor: classify the status and apply the 401 policy.
    fn intercept(&self, status: u16, path: String, body: String) -> Result<Response, ApiError> {
        if status == 401 {
            self.expire_credential(&path);
            return Err(ApiError::Unauthorized);
        }
        if !(200..300).contains(&status) {
            return Err(ApiError::Status { status, message: error_message(status, &body) });
        }
        Ok(Response { status, path, body })
    }

    fn expire_credential(&self, path: &str) {
        tracing::warn!(%path, "credential rejected; clearing stored token");
        if let Err(e) = self.inner.store.clear() {
            tracing::error!(error = %e, "failed to clear rejected credential");
        }
        self.inner.on_unauthorized.on_unauthorized();
    }
}

// =============================================================================
// REQUEST
// =============================================================================

/// One pending request; `send` runs both interceptors.
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    method: Method,
    path: String,
    inner: reqwest::RequestBuilder,
    credentials: Credentials,
}

impl RequestBuilder<'_> {
    /// Skip the outbound credential attach (login, register).
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.credentials = Credentials::Anonymous;
        self
    }

    #[must_use]
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.inner = self.inner.json(body);
        self
    }

    #[must_use]
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.inner = self.inner.query(query);
        self
    }

    /// Send the request and read the whole body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] on 401 (after clearing the store),
    /// [`ApiError::Status`] on other non-2xx statuses, and
    /// [`ApiError::Network`]/[`ApiError::Timeout`] when no response arrived.
    pub async fn send(self) -> Result<Response, ApiError> {
        let Self { client, method, path, mut inner, credentials } = self;

        if credentials == Credentials::Attach {
            if let Some(token) = client.inner.store.read()? {
                inner = inner.bearer_auth(token);
            }
        }

        let started = Instant::now();
        let response = inner.send().await.map_err(|e| {
            tracing::debug!(%method, %path, error = %e, "api request failed");
            ApiError::from_transport(&e)
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ApiError::from_transport(&e))?;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(%method, %path, status, elapsed_ms, "api request");
        client.intercept(status, path, body)
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// A successful (2xx) response with its body fully read.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    path: String,
    body: String,
}

impl Response {
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] naming the request path if the shape does not match.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        serde_json::from_str(&self.body).map_err(|e| DecodeError::new(&self.path, e.to_string()))
    }

    /// Decode an acknowledgement body; empty bodies are a plain ack.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if a non-empty body is not JSON.
    pub fn ack(&self) -> Result<Ack, DecodeError> {
        if self.body.trim().is_empty() {
            return Ok(Ack::default());
        }
        let value: serde_json::Value = self.decode()?;
        Ok(Ack::from_value(&value))
    }
}

/// Human-readable message for a failed response.
///
/// Prefers the server's `error`/`message` field, then the raw body, then the
/// canonical reason phrase.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let field = ["error", "message", "mensaje"]
            .iter()
            .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str));
        if let Some(message) = field {
            return message.to_owned();
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_owned();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("request failed")
        .to_owned()
}
