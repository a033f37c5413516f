use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::credentials::{Credential, CredentialStore};
use crate::models::UserProfile;

/// Buffer size for the session event channel.
/// Hosts drain it promptly; lagging receivers only miss intermediate events.
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unauthenticated,
    /// A stored credential exists but the backend has not confirmed it yet.
    Verifying,
    Authenticated(UserProfile),
}

impl SessionState {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Verifying => "verifying",
            SessionState::Authenticated(_) => "authenticated",
        }
    }
}

/// Published on every session transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Authenticated(UserProfile),
    /// The user logged out.
    LoggedOut,
    /// The backend rejected the active credential; the host should show its
    /// login screen.
    Invalidated,
}

/// What `verify` should do, decided under the session lock.
#[derive(Debug)]
pub(crate) enum VerifyStep {
    /// No credential; the session is now unauthenticated.
    NoCredential,
    /// Not in `Verifying`, or another check is already in flight; nothing to do.
    Settled(SessionState),
    Check(Credential),
}

struct SessionInner {
    state: SessionState,
    active: Option<Credential>,
    /// A verify request for `active` has been sent and not yet settled.
    verify_in_flight: bool,
}

/// The single session of this client process.
///
/// All writes to the credential store happen here, under one lock, so the
/// stored credential and the state always change together.
pub struct Session {
    store: Arc<dyn CredentialStore>,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Open the session, starting in `Verifying` if a credential is stored.
    pub fn open(store: Arc<dyn CredentialStore>) -> Self {
        let active = match store.get() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential, starting signed out");
                None
            }
        };
        let state = if active.is_some() {
            SessionState::Verifying
        } else {
            SessionState::Unauthenticated
        };
        debug!(state = state.label(), "Session opened");

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            inner: Mutex::new(SessionInner {
                state,
                active,
                verify_in_flight: false,
            }),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.lock().state.user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.lock().state, SessionState::Authenticated(_))
    }

    /// The credential requests should carry right now.
    pub fn credential(&self) -> Option<Credential> {
        self.lock().active.clone()
    }

    /// Store a fresh credential and become authenticated as `user`.
    ///
    /// If the store write fails nothing changes.
    pub(crate) fn establish(&self, credential: Credential, user: UserProfile) -> Result<()> {
        let mut inner = self.lock();
        self.store.set(&credential)?;
        inner.active = Some(credential);
        inner.state = SessionState::Authenticated(user.clone());
        inner.verify_in_flight = false;
        info!(user_id = %user.id, "Session authenticated");
        self.publish(SessionEvent::Authenticated(user));
        Ok(())
    }

    pub(crate) fn begin_verify(&self) -> VerifyStep {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match (&inner.active, &inner.state) {
            (None, _) => {
                inner.state = SessionState::Unauthenticated;
                VerifyStep::NoCredential
            }
            (Some(_), SessionState::Verifying) if inner.verify_in_flight => {
                debug!("Verification already in flight");
                VerifyStep::Settled(SessionState::Verifying)
            }
            (Some(credential), SessionState::Verifying) => {
                let credential = credential.clone();
                inner.verify_in_flight = true;
                VerifyStep::Check(credential)
            }
            (Some(_), state) => VerifyStep::Settled(state.clone()),
        }
    }

    /// Accept a successful verification of `checked`.
    ///
    /// Returns false if the session moved on while the check was in flight.
    pub(crate) fn confirm(&self, checked: &Credential, user: UserProfile) -> bool {
        let mut inner = self.lock();
        if inner.active.as_ref() != Some(checked) || inner.state != SessionState::Verifying {
            debug!("Verification result is stale, ignoring");
            return false;
        }
        inner.state = SessionState::Authenticated(user.clone());
        inner.verify_in_flight = false;
        info!(user_id = %user.id, "Stored credential verified");
        self.publish(SessionEvent::Authenticated(user));
        true
    }

    /// Sign out. Never fails; a store error is logged and the in-memory
    /// session still ends.
    pub fn logout(&self) {
        let mut inner = self.lock();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }
        inner.active = None;
        inner.state = SessionState::Unauthenticated;
        inner.verify_in_flight = false;
        info!("Logged out");
        self.publish(SessionEvent::LoggedOut);
    }

    /// React to the backend rejecting `presented`.
    ///
    /// Only takes effect while `presented` is still the active credential,
    /// so a late rejection can never undo a newer login and repeated
    /// rejections of the same credential end the session once. Returns
    /// whether the session was torn down.
    pub fn invalidate(&self, presented: Option<&Credential>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        let mut inner = self.lock();
        if inner.active.as_ref() != Some(presented) {
            debug!("Rejected credential is no longer active, ignoring");
            return false;
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear rejected credential");
        }
        inner.active = None;
        inner.state = SessionState::Unauthenticated;
        inner.verify_in_flight = false;
        warn!("Session invalidated by backend");
        self.publish(SessionEvent::Invalidated);
        true
    }
}
