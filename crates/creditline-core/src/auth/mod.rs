//! Authentication module for the client session.
//!
//! This module provides:
//! - `CredentialStore`: durable storage for the bearer token (keychain, file, memory)
//! - `Session`: the single session state and its transitions
//! - `SessionManager`: login, registration, verification and logout
//!
//! Tokens are opaque and never renewed; a stale token is only discovered
//! when the backend answers 401.

pub mod credentials;
pub mod manager;
pub mod session;

pub use credentials::{
    Credential, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore,
};
pub use manager::SessionManager;
pub use session::{Session, SessionEvent, SessionState};
