use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full account row, including credential and verification state. Never
/// serialized into responses directly; use [`User::public`] for that.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub email_verified: bool,
    pub otp_code: Option<String>,
    pub otp_issued_at: Option<DateTime<Utc>>,
    pub created_at: Option<String>,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// The fields of an account safe to hand to any authenticated caller.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub full_name: String,
}
