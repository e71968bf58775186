use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// How an account signs in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    Local,
    Google,
}

impl AuthProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(AuthProvider::Local),
            "google" => Ok(AuthProvider::Google),
            other => anyhow::bail!("unknown auth provider {other:?}"),
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // absent for OAuth accounts
    pub auth_provider: String,
    pub profile_pic: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn provider(&self) -> anyhow::Result<AuthProvider> {
        self.auth_provider.parse()
    }
}

/// What a pending record's emailed token confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPurpose {
    Registration,
    EmailChange,
    PasswordReset,
}

impl PendingPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            PendingPurpose::Registration => "registration",
            PendingPurpose::EmailChange => "email_change",
            PendingPurpose::PasswordReset => "password_reset",
        }
    }

    /// How long the emailed link stays valid.
    pub fn lifetime(self) -> Duration {
        match self {
            PendingPurpose::Registration | PendingPurpose::EmailChange => Duration::hours(24),
            PendingPurpose::PasswordReset => Duration::minutes(30),
        }
    }
}

impl FromStr for PendingPurpose {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(PendingPurpose::Registration),
            "email_change" => Ok(PendingPurpose::EmailChange),
            "password_reset" => Ok(PendingPurpose::PasswordReset),
            other => anyhow::bail!("unknown pending purpose {other:?}"),
        }
    }
}

/// Unconfirmed registration, email change or password reset.
#[derive(Debug, Clone, FromRow)]
pub struct PendingUser {
    pub id: Uuid,
    pub purpose: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub token: String,
    pub user_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl PendingUser {
    pub fn purpose(&self) -> anyhow::Result<PendingPurpose> {
        self.purpose.parse()
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

/// Values for a new pending row.
#[derive(Debug, Clone)]
pub struct NewPending<'a> {
    pub purpose: PendingPurpose,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub user_id: Option<Uuid>,
}
