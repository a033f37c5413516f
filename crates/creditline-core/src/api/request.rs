use reqwest::multipart::Form;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, ErrorKind};

pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// One outbound call. Built per call and consumed by [`super::ApiClient::send`].
pub struct OutboundRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) segments: Vec<String>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: RequestBody,
    pub(crate) authorize: bool,
}

impl OutboundRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
            authorize: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| {
            ApiError::new(ErrorKind::Unknown, format!("Failed to encode request body: {}", e))
        })?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Append one caller-supplied path segment, e.g. an id. It is
    /// percent-encoded when the URL is built, so `/` or `?` inside it stay
    /// part of the segment.
    pub fn segment(mut self, value: impl ToString) -> Self {
        self.segments.push(value.to_string());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Send without the bearer token even if one is stored.
    pub fn without_authorization(mut self) -> Self {
        self.authorize = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_authorized(&self) -> bool {
        self.authorize
    }
}
