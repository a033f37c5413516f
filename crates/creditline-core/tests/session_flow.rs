//! Integration tests for the session lifecycle against a mock backend

use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use creditline_core::auth::{Credential, CredentialStore, MemoryCredentialStore};
use creditline_core::models::{CityTier, LoginRequest, Registration};
use creditline_core::{AppContext, ErrorKind, SessionEvent, SessionState};
use mockito::{Matcher, Server};
use serde_json::json;

fn context(url: &str, store: &Arc<MemoryCredentialStore>) -> AppContext {
    let store: Arc<dyn CredentialStore> = store.clone();
    AppContext::with_store(url, Duration::from_secs(5), store).expect("Failed to build context")
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn login_then_401_tears_down_session() {
    //* Given
    let mut server = Server::new_async().await;

    let login_mock = server
        .mock("POST", "/api/auth/login")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::PartialJson(json!({"email": "asha@example.in"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-1", "token_type": "bearer", "user": {"id": 7, "full_name": "Asha Rao"}}"#)
        .expect(1)
        .create_async()
        .await;

    let expired_mock = server
        .mock("GET", "/api/loans/user/7")
        .match_header("authorization", "Bearer tok-1")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Token expired"}"#)
        .expect(1)
        .create_async()
        .await;

    let anonymous_mock = server
        .mock("GET", "/api/loans/user/7")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let ctx = context(&server.url(), &store);
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);

    //* When
    let user = ctx
        .session
        .login(&LoginRequest::new("asha@example.in", "correct horse"))
        .await
        .expect("Login should succeed");

    //* Then
    assert_eq!(user.id, "7");
    assert_eq!(ctx.session.user().map(|u| u.id), Some("7".to_string()));
    assert!(matches!(ctx.session.state(), SessionState::Authenticated(_)));
    assert_eq!(store.get().unwrap(), Some(Credential::new("tok-1")));

    //* When
    let mut events = ctx.session.subscribe();
    let err = ctx.loans.user_loans("7").await.expect_err("Expected 401");

    //* Then
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.detail(), Some("Token expired"));
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);
    assert!(store.get().unwrap().is_none());
    assert_eq!(drain(&mut events), vec![SessionEvent::Invalidated]);

    //* When
    let loans = ctx.loans.user_loans("7").await.expect("Anonymous call should reach backend");

    //* Then
    assert!(loans.is_empty());
    login_mock.assert_async().await;
    expired_mock.assert_async().await;
    anonymous_mock.assert_async().await;
}

#[tokio::test]
async fn failed_login_leaves_session_unchanged() {
    //* Given
    let mut server = Server::new_async().await;

    server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::PartialJson(json!({"password": "right"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-1", "user": {"id": "u-1"}}"#)
        .create_async()
        .await;

    let rejected_mock = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::PartialJson(json!({"password": "wrong"})))
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Incorrect email or password"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let ctx = context(&server.url(), &store);
    ctx.session
        .login(&LoginRequest::new("a@example.in", "right"))
        .await
        .expect("First login should succeed");
    let mut events = ctx.session.subscribe();

    //* When
    let err = ctx
        .session
        .login(&LoginRequest::new("a@example.in", "wrong"))
        .await
        .expect_err("Second login should fail");

    //* Then
    rejected_mock.assert_async().await;
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.detail(), Some("Incorrect email or password"));
    assert!(ctx.session.is_authenticated());
    assert_eq!(store.get().unwrap(), Some(Credential::new("tok-1")));
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn failed_login_from_scratch_stores_nothing() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let ctx = context(&server.url(), &store);

    //* When
    let err = ctx
        .session
        .login(&LoginRequest::new("a@example.in", "pw"))
        .await
        .expect_err("Login should fail");

    //* Then
    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);
    assert!(store.get().unwrap().is_none());
}

#[tokio::test]
async fn login_with_empty_token_is_rejected() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "", "user": {"id": 1}}"#)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let ctx = context(&server.url(), &store);

    //* When
    let err = ctx
        .session
        .login(&LoginRequest::new("a@example.in", "pw"))
        .await
        .expect_err("Empty token must not sign in");

    //* Then
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);
    assert!(store.get().unwrap().is_none());
}

#[tokio::test]
async fn register_signs_in_and_surfaces_backend_detail() {
    //* Given
    let mut server = Server::new_async().await;

    let created_mock = server
        .mock("POST", "/api/auth/register")
        .match_body(Matcher::PartialJson(json!({
            "email": "new@example.in",
            "city_tier": "tier_1"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-new", "user": {"id": 11, "full_name": "Ravi K"}}"#)
        .expect(1)
        .create_async()
        .await;

    server
        .mock("POST", "/api/auth/register")
        .match_body(Matcher::PartialJson(json!({"email": "taken@example.in"})))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Email already registered"}"#)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let ctx = context(&server.url(), &store);

    let registration = |email: &str| Registration {
        full_name: "Ravi K".to_string(),
        email: email.to_string(),
        phone: "9876543210".to_string(),
        city_tier: CityTier::Tier1,
        password: "pw".to_string(),
    };

    //* When
    let err = ctx
        .session
        .register(&registration("taken@example.in"))
        .await
        .expect_err("Duplicate email should fail");

    //* Then
    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.detail(), Some("Email already registered"));
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);

    //* When
    let user = ctx
        .session
        .register(&registration("new@example.in"))
        .await
        .expect("Registration should succeed");

    //* Then
    created_mock.assert_async().await;
    assert_eq!(user.display_name(), "Ravi K");
    assert!(ctx.session.is_authenticated());
    assert_eq!(store.get().unwrap(), Some(Credential::new("tok-new")));
}

#[tokio::test]
async fn verify_without_credential_makes_no_request() {
    //* Given
    let mut server = Server::new_async().await;
    let verify_mock = server
        .mock("GET", "/api/auth/verify")
        .expect(0)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let ctx = context(&server.url(), &store);

    //* When
    let first = ctx.session.verify().await.expect("Verify should not fail");
    let second = ctx.session.verify().await.expect("Verify should not fail");

    //* Then
    verify_mock.assert_async().await;
    assert_eq!(first, SessionState::Unauthenticated);
    assert_eq!(second, SessionState::Unauthenticated);
}

#[tokio::test]
async fn verify_confirms_stored_credential_once() {
    //* Given
    let mut server = Server::new_async().await;
    let verify_mock = server
        .mock("GET", "/api/auth/verify")
        .match_header("authorization", "Bearer stored-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"valid": true, "user": {"id": 3, "name": "Meera"}}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("stored-token")));
    let ctx = context(&server.url(), &store);
    assert_eq!(ctx.session.state(), SessionState::Verifying);

    //* When
    let state = ctx.session.verify().await.expect("Verify should succeed");
    let again = ctx.session.verify().await.expect("Second verify is a no-op");

    //* Then
    verify_mock.assert_async().await;
    assert_eq!(state.user().map(|u| u.display_name()), Some("Meera"));
    assert_eq!(again, state);
    assert_eq!(store.get().unwrap(), Some(Credential::new("stored-token")));
}

#[tokio::test]
async fn overlapping_verifies_send_one_request() {
    //* Given
    let mut server = Server::new_async().await;
    let verify_mock = server
        .mock("GET", "/api/auth/verify")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"valid": true, "user": {"id": 3, "name": "Meera"}}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("stored-token")));
    let ctx = context(&server.url(), &store);

    //* When
    let (first, second) = futures::join!(ctx.session.verify(), ctx.session.verify());

    //* Then
    verify_mock.assert_async().await;
    assert!(matches!(first, Ok(SessionState::Authenticated(_))));
    assert_eq!(second.unwrap(), SessionState::Verifying);
    assert!(ctx.session.is_authenticated());
}

#[tokio::test]
async fn verify_accepts_bare_user_body() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/auth/verify")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 5, "email": "b@example.in"}"#)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("t")));
    let ctx = context(&server.url(), &store);

    //* When
    let state = ctx.session.verify().await.expect("Verify should succeed");

    //* Then
    assert_eq!(state.user().map(|u| u.id.as_str()), Some("5"));
}

#[tokio::test]
async fn verify_rejection_clears_credential() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/auth/verify")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Could not validate credentials"}"#)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("stale")));
    let ctx = context(&server.url(), &store);
    let mut events = ctx.session.subscribe();

    //* When
    let err = ctx.session.verify().await.expect_err("Verify should fail");

    //* Then
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);
    assert!(store.get().unwrap().is_none());
    assert_eq!(drain(&mut events), vec![SessionEvent::Invalidated]);
}

#[tokio::test]
async fn verify_network_failure_clears_credential() {
    //* Given
    // Nothing listens on port 1.
    let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("t")));
    let ctx = context("http://127.0.0.1:1", &store);

    //* When
    let err = ctx.session.verify().await.expect_err("Verify should fail");

    //* Then
    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);
    assert!(store.get().unwrap().is_none());
}

#[tokio::test]
async fn logout_clears_credential_and_strips_header() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-1", "user": {"id": 1}}"#)
        .create_async()
        .await;
    let anonymous_mock = server
        .mock("GET", "/api/banks/")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let ctx = context(&server.url(), &store);
    ctx.session
        .login(&LoginRequest::new("a@example.in", "pw"))
        .await
        .unwrap();
    let mut events = ctx.session.subscribe();

    //* When
    ctx.session.logout();
    ctx.banks.all().await.expect("Anonymous bank list");

    //* Then
    anonymous_mock.assert_async().await;
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);
    assert!(store.get().unwrap().is_none());
    assert_eq!(drain(&mut events), vec![SessionEvent::LoggedOut]);
}

#[tokio::test]
async fn concurrent_401s_collapse_to_one_invalidation() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-1", "user": {"id": 1}}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/banks/")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Token expired"}"#)
        .expect(8)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let ctx = context(&server.url(), &store);
    ctx.session
        .login(&LoginRequest::new("a@example.in", "pw"))
        .await
        .unwrap();
    let mut events = ctx.session.subscribe();

    //* When
    let results = futures::future::join_all((0..8).map(|_| ctx.banks.all())).await;

    //* Then
    assert!(results
        .iter()
        .all(|r| matches!(r, Err(e) if e.kind() == ErrorKind::Unauthorized)));
    assert_eq!(drain(&mut events), vec![SessionEvent::Invalidated]);
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);
    assert!(store.get().unwrap().is_none());
}

#[tokio::test]
async fn late_rejection_of_old_token_keeps_new_login() {
    //* Given
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok-new", "user": {"id": 1}}"#)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("tok-old")));
    let ctx = context(&server.url(), &store);
    ctx.session
        .login(&LoginRequest::new("a@example.in", "pw"))
        .await
        .unwrap();

    //* When
    let applied = ctx
        .client()
        .session()
        .invalidate(Some(&Credential::new("tok-old")));

    //* Then
    assert!(!applied);
    assert!(ctx.session.is_authenticated());
    assert_eq!(store.get().unwrap(), Some(Credential::new("tok-new")));
}

#[tokio::test]
async fn truncated_401_still_clears_credential() {
    //* Given
    // Announces a 100 byte body, sends 10, then hangs up.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(
                b"HTTP/1.1 401 Unauthorized\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 100\r\n\
                  \r\n\
                  {\"detail\":",
            );
            let _ = stream.flush();
            let _ = stream.shutdown(Shutdown::Both);
        }
    });

    let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("tok")));
    let ctx = context(&format!("http://{}", addr), &store);
    let mut events = ctx.session.subscribe();

    //* When
    let err = ctx.banks.all().await.expect_err("Expected 401");

    //* Then
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.status(), Some(401));
    assert!(store.get().unwrap().is_none());
    assert_eq!(ctx.session.state(), SessionState::Unauthenticated);
    assert_eq!(drain(&mut events), vec![SessionEvent::Invalidated]);
}
