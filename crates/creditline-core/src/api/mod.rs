//! REST API client module for the lending backend.
//!
//! This module provides the `ApiClient` every gateway sends through, the
//! per-call `OutboundRequest`, and the classified `ApiError`.
//!
//! The backend uses JWT bearer token authentication; the token comes from
//! the session and is attached automatically.

pub mod client;
pub mod error;
pub mod request;

pub use client::{ApiClient, REQUEST_TIMEOUT_SECS};
pub use error::{ApiError, ErrorKind};
pub use request::OutboundRequest;
