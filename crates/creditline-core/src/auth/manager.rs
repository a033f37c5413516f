use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use super::credentials::Credential;
use super::session::{Session, SessionEvent, SessionState, VerifyStep};
use crate::api::{ApiError, ErrorKind};
use crate::gateways::AuthGateway;
use crate::models::{AuthResponse, LoginRequest, Registration, UserProfile};

/// Drives the session through login, registration, verification and logout.
#[derive(Clone)]
pub struct SessionManager {
    session: Arc<Session>,
    auth: AuthGateway,
}

impl SessionManager {
    pub fn new(session: Arc<Session>, auth: AuthGateway) -> Self {
        Self { session, auth }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.session.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// Confirm a stored credential with the backend. Meant to run once at
    /// startup.
    ///
    /// Without a stored credential this settles on `Unauthenticated` without
    /// touching the network. Any failure clears the credential and the
    /// classified error is returned. While one check is in flight, other
    /// callers get `Ok(Verifying)` and send nothing.
    pub async fn verify(&self) -> Result<SessionState, ApiError> {
        let credential = match self.session.begin_verify() {
            VerifyStep::NoCredential => return Ok(SessionState::Unauthenticated),
            VerifyStep::Settled(state) => return Ok(state),
            VerifyStep::Check(credential) => credential,
        };

        match self.auth.verify().await {
            Ok(user) => {
                self.session.confirm(&credential, user);
                Ok(self.session.state())
            }
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "Stored credential rejected");
                self.session.invalidate(Some(&credential));
                Err(e)
            }
        }
    }

    /// Log in. On failure the session is left exactly as it was.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<UserProfile, ApiError> {
        let response = self.auth.login(credentials).await.map_err(|e| {
            warn!(kind = %e.kind(), "Login failed");
            e
        })?;
        self.adopt(response)
    }

    /// Register a new account; success signs the user in.
    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, ApiError> {
        let response = self.auth.register(registration).await.map_err(|e| {
            warn!(kind = %e.kind(), "Registration failed");
            e
        })?;
        self.adopt(response)
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    fn adopt(&self, response: AuthResponse) -> Result<UserProfile, ApiError> {
        if response.access_token.trim().is_empty() {
            return Err(ApiError::new(
                ErrorKind::Unknown,
                "Invalid response: empty access token",
            ));
        }

        let user = response.user;
        self.session
            .establish(Credential::new(response.access_token), user.clone())
            .map_err(|e| {
                ApiError::new(ErrorKind::Unknown, format!("Failed to persist credential: {:#}", e))
            })?;
        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }
}
