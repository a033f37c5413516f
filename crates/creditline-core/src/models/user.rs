use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de_id;
use super::loan::CityTier;

/// Identity returned by the backend. Replaced wholesale on every login,
/// registration or verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city_tier: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Name for greetings: `name`, then `full_name`, then "User".
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.full_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or("User")
    }
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub city_tier: CityTier,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("city_tier", &self.city_tier)
            .field("password", &"***")
            .finish()
    }
}

/// Body of a successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: UserProfile,
}

/// `/api/auth/verify` answers either `{valid, user}` or the bare user.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VerifyResponse {
    Wrapped {
        #[serde(default = "default_valid")]
        valid: bool,
        user: UserProfile,
    },
    Bare(UserProfile),
}

fn default_valid() -> bool {
    true
}

impl VerifyResponse {
    /// The verified user, or `None` if the backend flagged the token invalid.
    pub fn into_user(self) -> Option<UserProfile> {
        match self {
            VerifyResponse::Wrapped { valid: true, user } => Some(user),
            VerifyResponse::Wrapped { valid: false, .. } => None,
            VerifyResponse::Bare(user) => Some(user),
        }
    }
}
