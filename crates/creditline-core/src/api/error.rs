use std::fmt;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Classification of a failed call. Assigned once by the API client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    NetworkError,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not found",
            ErrorKind::ServerError => "server error",
            ErrorKind::NetworkError => "network error",
            ErrorKind::Unknown => "unknown error",
        };
        f.write_str(name)
    }
}

/// A classified failure, optionally carrying the structured body the
/// backend sent with it.
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct ApiError {
    kind: ErrorKind,
    status: Option<u16>,
    payload: Option<Value>,
    message: String,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            payload: None,
            message: message.into(),
        }
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let kind = match status.as_u16() {
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            500..=599 => ErrorKind::ServerError,
            _ => ErrorKind::Unknown,
        };

        let payload = serde_json::from_str::<Value>(body).ok();
        let message = payload
            .as_ref()
            .and_then(detail_of)
            .map(str::to_string)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("Status {}", status)
                } else {
                    format!("Status {}: {}", status, Self::truncate_body(body))
                }
            });

        Self {
            kind,
            status: Some(status.as_u16()),
            payload,
            message,
        }
    }

    /// Classify a failure where no usable response arrived.
    pub fn from_transport(err: reqwest::Error) -> Self {
        // A request that could not even be built never reached the network.
        let kind = if err.is_builder() {
            ErrorKind::Unknown
        } else {
            ErrorKind::NetworkError
        };
        let message = if err.is_timeout() {
            format!("Request timed out: {}", err)
        } else {
            err.to_string()
        };
        Self::new(kind, message)
    }

    /// A 2xx response whose body did not match the expected shape.
    pub fn invalid_response(status: StatusCode, err: serde_json::Error) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: Some(status.as_u16()),
            payload: None,
            message: format!("Invalid response: {}", err),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Structured body supplied by the backend, if it sent JSON.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The backend's human-readable `detail`, when present.
    pub fn detail(&self) -> Option<&str> {
        self.payload.as_ref().and_then(detail_of)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

// FastAPI validation errors put a list under `detail`; only plain strings are messages.
fn detail_of(payload: &Value) -> Option<&str> {
    payload.get("detail").and_then(Value::as_str)
}
