//! # Backend Trait
//!
//! The seam between LavaPro and the hosted backend.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Arc<dyn Backend>                                 │
//! │                                                                         │
//! │   auth ────────────────────────────   tables ─────────────────────────  │
//! │   sign_in_with_password               select(token?, query)            │
//! │   send_otp / verify_otp               update(token?, query, patch)     │
//! │   sign_up                             insert(token?, table, row)       │
//! │   refresh_session                                                       │
//! │   get_user / sign_out                 token = None → anonymous key     │
//! │                                                                         │
//! │   HttpBackend    ── reqwest against /auth/v1 and /rest/v1              │
//! │   MemoryBackend  ── in-process tables, row policies emulated           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::BaasResult;
use crate::query::Query;

/// The authenticated account behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Tokens issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token expiry, when the auth service reported it.
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account is usable right away.
    SignedIn(AuthSession),
    /// A confirmation email was sent; sign in after confirming.
    ConfirmationRequired { email: String },
}

/// Everything LavaPro asks of the hosted backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchanges email and password for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BaasResult<AuthSession>;

    /// Emails a magic link / one-time code. Does not create a session.
    async fn send_otp(&self, email: &str, redirect_to: Option<&str>) -> BaasResult<()>;

    /// Completes a one-time-code sign-in.
    async fn verify_otp(&self, email: &str, code: &str) -> BaasResult<AuthSession>;

    /// Registers an account; `full_name` goes into the user metadata.
    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> BaasResult<SignUpOutcome>;

    /// Exchanges a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> BaasResult<AuthSession>;

    /// Returns the user behind an access token; fails when it is invalid.
    async fn get_user(&self, access_token: &str) -> BaasResult<AuthUser>;

    /// Revokes the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> BaasResult<()>;

    /// Reads rows.
    async fn select(&self, token: Option<&str>, query: &Query) -> BaasResult<Vec<Value>>;

    /// Patches the rows matched by `query` and returns them.
    async fn update(&self, token: Option<&str>, query: &Query, patch: Value) -> BaasResult<Vec<Value>>;

    /// Inserts one row and returns it as stored.
    async fn insert(&self, token: Option<&str>, table: &str, row: Value) -> BaasResult<Vec<Value>>;
}
