use crate::api::{ApiClient, ApiError, ErrorKind, OutboundRequest};
use crate::models::{AuthResponse, LoginRequest, Registration, UserProfile, VerifyResponse};

/// `/api/auth/*`.
///
/// Login and registration go out without the bearer token, so a rejected
/// password can never end a session that is already signed in.
#[derive(Clone)]
pub struct AuthGateway {
    client: ApiClient,
}

impl AuthGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let request = OutboundRequest::post("/api/auth/register")
            .json(registration)?
            .without_authorization();
        self.client.send(request).await
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let request = OutboundRequest::post("/api/auth/login")
            .json(credentials)?
            .without_authorization();
        self.client.send(request).await
    }

    /// Check the stored token and return the user it belongs to.
    pub async fn verify(&self) -> Result<UserProfile, ApiError> {
        let response: VerifyResponse = self
            .client
            .send(OutboundRequest::get("/api/auth/verify"))
            .await?;
        response
            .into_user()
            .ok_or_else(|| ApiError::new(ErrorKind::Unknown, "Token reported invalid"))
    }
}
