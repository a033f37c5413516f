//! The single outbound HTTP client.
//!
//! Every call goes through [`ApiClient::send`], which attaches the session's
//! bearer token, classifies failures into [`ApiError`], and ends the session
//! when the backend rejects the token.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::request::{OutboundRequest, RequestBody};
use super::{ApiError, ErrorKind};
use crate::auth::Session;

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the lending backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a client for `base_url` bound to `session`.
    pub fn new(base_url: &str, timeout: Duration, session: Arc<Session>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Full URL for `path` followed by `segments`, each percent-encoded as
    /// a single segment.
    fn request_url(&self, path: &str, segments: &[String]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url(path)).map_err(|e| {
            ApiError::new(ErrorKind::Unknown, format!("Invalid request URL: {}", e))
        })?;
        if segments.is_empty() {
            return Ok(url);
        }

        // `.` and `..` would be dropped by the URL path normalizer.
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || s.as_str() == "." || s.as_str() == "..")
        {
            return Err(ApiError::new(
                ErrorKind::Unknown,
                format!("Invalid path segment: {:?}", bad),
            ));
        }

        url.path_segments_mut()
            .map_err(|_| ApiError::new(ErrorKind::Unknown, "Base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send `request` and decode a successful JSON body into `T`.
    ///
    /// A 401 tears down the session before the error is returned, provided
    /// the rejected token is still the active one.
    pub async fn send<T: DeserializeOwned>(&self, request: OutboundRequest) -> Result<T, ApiError> {
        let OutboundRequest {
            method,
            path,
            segments,
            query,
            body,
            authorize,
        } = request;

        let presented = if authorize {
            self.session.credential()
        } else {
            None
        };

        let url = self.request_url(&path, &segments)?;
        let mut builder = self.client.request(method.clone(), url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(ref credential) = presented {
            builder = builder.bearer_auth(credential.expose());
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        debug!(%method, path = %path, authorized = presented.is_some(), "Sending request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = ApiError::from_transport(e);
                warn!(%method, path = %path, kind = %error.kind(), error = %error, "Request failed without response");
                return Err(error);
            }
        };

        let status = response.status();
        // A failed status is classified even if its body cannot be read, so a
        // truncated 401 still ends the session.
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) if status.is_success() => return Err(ApiError::from_transport(e)),
            Err(e) => {
                debug!(path = %path, status = status.as_u16(), error = %e, "Failed to read error body");
                String::new()
            }
        };

        if status.is_success() {
            let text = if text.trim().is_empty() { "null" } else { text.as_str() };
            return serde_json::from_str(text).map_err(|e| {
                warn!(%method, path = %path, error = %e, "Failed to parse response");
                ApiError::invalid_response(status, e)
            });
        }

        let error = ApiError::from_status(status, &text);
        if error.is_unauthorized() && self.session.invalidate(presented.as_ref()) {
            debug!(path = %path, "Session ended after 401");
        }
        warn!(%method, path = %path, status = status.as_u16(), kind = %error.kind(), "Request failed");
        Err(error)
    }
}
