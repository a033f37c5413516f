//! Wire types for the lending backend.
//!
//! - `UserProfile` and the auth request/response bodies
//! - `LoanForm`, `LoanApplication`, `LoanRecord`
//! - `BehaviorPayload` and its per-category scores
//! - `Bank`
//!
//! Payload structs keep unknown fields in an `extra` map so nothing the
//! backend adds is silently lost.

pub mod bank;
pub mod behavior;
pub mod loan;
pub mod user;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub use bank::Bank;
pub use behavior::{BehaviorPayload, CategoryScore};
pub use loan::{CityTier, LoanApplication, LoanForm, LoanRecord};
pub use user::{AuthResponse, LoginRequest, Registration, UserProfile, VerifyResponse};

fn id_from_value<E: serde::de::Error>(value: Value) -> Result<String, E> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!("expected string or number id, got {}", other))),
    }
}

/// Backend ids arrive as numbers or strings; normalize to a string.
pub(crate) fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    id_from_value(Value::deserialize(deserializer)?)
}

pub(crate) fn de_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        other => id_from_value(other).map(Some),
    }
}

/// Point flags come as `1`/`0` or booleans. Only `1` (or `true`) counts.
pub(crate) fn de_flag<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<bool>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b)),
        Value::Number(n) => Ok(Some(n.as_f64() == Some(1.0))),
        other => Err(D::Error::custom(format!("expected point flag, got {}", other))),
    }
}
