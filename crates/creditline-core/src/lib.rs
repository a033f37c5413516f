//! Core library for creditline.
//!
//! Owns the client side of the lending backend: the bearer-token session,
//! the API gateway that decorates and classifies every request, typed
//! gateways per backend resource, and the view models the front-end renders.
//!
//! Most hosts only need [`AppContext`], which wires everything together.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod gateways;
pub mod models;
pub mod utils;
pub mod views;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use auth::{Credential, CredentialStore, Session, SessionEvent, SessionManager, SessionState};
pub use config::Config;
pub use context::AppContext;
