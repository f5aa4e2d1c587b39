//! # Session Store
//!
//! Owns the current auth session and publishes every change.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  new()                 state = { session: None, loading: true }         │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  restore(stored)       expired (recorded expiry or JWT `exp`)?         │
//! │    │                     yes → refresh_session                         │
//! │    │                     no  → get_user (validates the token)          │
//! │    │                   failure → logged, no session                    │
//! │    ▼                                                                    │
//! │  { session, loading: false }                                           │
//! │    │                                                                    │
//! │    ├── sign_in / verify_otp / sign_up ──► SignedIn                     │
//! │    ├── refresh ─────────────────────────► TokenRefreshed               │
//! │    └── sign_out ────────────────────────► SignedOut                    │
//! │                                                                         │
//! │  subscribe() → watch::Receiver<SessionState>                           │
//! │  events()    → broadcast::Receiver<AuthEvent>                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No call is retried.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use lavapro_baas::{AuthSession, Backend, SignUpOutcome};
use lavapro_core::validation::{validate_email, validate_full_name, validate_otp_code, validate_password};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};

/// Tokens expiring within this margin are refreshed on restore.
const EXPIRY_MARGIN_SECS: i64 = 30;

const EVENT_CAPACITY: usize = 32;

/// What subscribers see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session: Option<AuthSession>,
    /// True until the initial restore has finished, and during sign-in.
    pub loading: bool,
}

/// Session-change notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: Uuid },
    TokenRefreshed { user_id: Uuid },
    SignedOut,
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Reads the `exp` claim of an access token without verifying it.
///
/// The signature belongs to the auth service; the client only needs to know
/// whether the token is worth presenting.
pub fn token_expiry(access_token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(access_token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    data.claims
        .exp
        .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
}

/// Whether a session's access token has (nearly) expired at `now`.
pub fn is_expired(session: &AuthSession, now: DateTime<Utc>) -> bool {
    let expiry = session
        .expires_at
        .or_else(|| token_expiry(&session.access_token));
    match expiry {
        Some(at) => at - Duration::seconds(EXPIRY_MARGIN_SECS) <= now,
        // Unknown expiry: let the backend decide when the token is used.
        None => false,
    }
}

/// Current session plus sign-in and sign-out operations.
pub struct SessionStore {
    backend: Arc<dyn Backend>,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (state, _) = watch::channel(SessionState {
            session: None,
            loading: true,
        });
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SessionStore {
            backend,
            state,
            events,
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.state.borrow().session.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// The access token of the current session.
    pub fn access_token(&self) -> SessionResult<String> {
        self.state
            .borrow()
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(SessionError::NotSignedIn)
    }

    fn set(&self, session: Option<AuthSession>, loading: bool) {
        self.state.send_replace(SessionState { session, loading });
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_modify(|s| s.loading = loading);
    }

    fn emit(&self, event: AuthEvent) {
        // No receiver is fine.
        let _ = self.events.send(event);
    }

    fn signed_in(&self, session: AuthSession) -> AuthSession {
        let user_id = session.user.id;
        info!(%user_id, "Signed in");
        self.set(Some(session.clone()), false);
        self.emit(AuthEvent::SignedIn { user_id });
        session
    }

    // =========================================================================
    // Restore
    // =========================================================================

    /// Finishes start-up with a session stored by an earlier run.
    ///
    /// Never fails: an unusable stored session is logged and leaves the
    /// store signed out.
    pub async fn restore(&self, stored: Option<AuthSession>) -> Option<AuthSession> {
        let Some(stored) = stored else {
            debug!("No stored session");
            self.set(None, false);
            return None;
        };
        self.set_loading(true);

        let user_id = stored.user.id;
        let restored = if is_expired(&stored, Utc::now()) {
            debug!(%user_id, "Stored session expired, refreshing");
            self.backend.refresh_session(&stored.refresh_token).await
        } else {
            match self.backend.get_user(&stored.access_token).await {
                Ok(user) if user.id == user_id => Ok(stored),
                Ok(user) => {
                    warn!(stored = %user_id, actual = %user.id, "Stored session belongs to another user");
                    Err(lavapro_baas::BaasError::Unauthorized("user mismatch".to_string()))
                }
                Err(e) if e.is_auth_error() => {
                    debug!(%user_id, error = %e, "Stored token rejected, refreshing");
                    self.backend.refresh_session(&stored.refresh_token).await
                }
                Err(e) => Err(e),
            }
        };

        match restored {
            Ok(session) => {
                info!(user_id = %session.user.id, "Session restored");
                self.set(Some(session.clone()), false);
                self.emit(AuthEvent::SignedIn {
                    user_id: session.user.id,
                });
                Some(session)
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Could not restore session");
                self.set(None, false);
                None
            }
        }
    }

    // =========================================================================
    // Sign-in Flows
    // =========================================================================

    /// Email and password sign-in.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> SessionResult<AuthSession> {
        let email = validate_email(email)?;
        validate_password(password)?;

        self.set_loading(true);
        match self.backend.sign_in_with_password(&email, password).await {
            Ok(session) => Ok(self.signed_in(session)),
            Err(e) => {
                warn!(%email, error = %e, "Password sign-in failed");
                self.set_loading(false);
                Err(SessionError::auth(e))
            }
        }
    }

    /// Emails a magic link / one-time code. The session does not change.
    pub async fn send_magic_link(&self, email: &str, redirect_to: Option<&str>) -> SessionResult<()> {
        let email = validate_email(email)?;
        self.backend
            .send_otp(&email, redirect_to)
            .await
            .map_err(SessionError::auth)?;
        info!(%email, "Magic link sent");
        Ok(())
    }

    /// Completes a one-time-code sign-in.
    pub async fn verify_otp(&self, email: &str, code: &str) -> SessionResult<AuthSession> {
        let email = validate_email(email)?;
        let code = validate_otp_code(code)?;

        self.set_loading(true);
        match self.backend.verify_otp(&email, &code).await {
            Ok(session) => Ok(self.signed_in(session)),
            Err(e) => {
                warn!(%email, error = %e, "One-time code rejected");
                self.set_loading(false);
                Err(SessionError::auth(e))
            }
        }
    }

    /// Registers an account. When the backend signs the user in right away
    /// the session is set; otherwise confirmation is pending.
    pub async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> SessionResult<SignUpOutcome> {
        let email = validate_email(email)?;
        validate_password(password)?;
        let full_name = validate_full_name(full_name)?;

        let outcome = self
            .backend
            .sign_up(&email, password, &full_name)
            .await
            .map_err(SessionError::auth)?;
        match outcome {
            SignUpOutcome::SignedIn(session) => Ok(SignUpOutcome::SignedIn(self.signed_in(session))),
            SignUpOutcome::ConfirmationRequired { email } => {
                info!(%email, "Sign-up awaiting confirmation");
                Ok(SignUpOutcome::ConfirmationRequired { email })
            }
        }
    }

    // =========================================================================
    // Refresh and Sign-out
    // =========================================================================

    /// Exchanges the refresh token for new tokens.
    pub async fn refresh(&self) -> SessionResult<AuthSession> {
        let current = self.current().ok_or(SessionError::NotSignedIn)?;
        let session = self
            .backend
            .refresh_session(&current.refresh_token)
            .await
            .map_err(SessionError::auth)?;

        let user_id = session.user.id;
        debug!(%user_id, "Token refreshed");
        self.set(Some(session.clone()), false);
        self.emit(AuthEvent::TokenRefreshed { user_id });
        Ok(session)
    }

    /// Signs out. A failed revocation is logged; the local session is
    /// cleared either way.
    pub async fn sign_out(&self) {
        if let Some(session) = self.current() {
            if let Err(e) = self.backend.sign_out(&session.access_token).await {
                warn!(user_id = %session.user.id, error = %e, "Sign-out revocation failed");
            }
            info!(user_id = %session.user.id, "Signed out");
        }
        self.set(None, false);
        self.emit(AuthEvent::SignedOut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lavapro_baas::memory::{Failure, AUTH_TARGET};
    use lavapro_baas::MemoryBackend;

    fn store_with_user() -> (SessionStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        backend.add_user("ana@lavapro.com", "secret1");
        (SessionStore::new(backend.clone()), backend)
    }

    #[test]
    fn test_token_expiry_reads_exp_claim() {
        // {"alg":"HS256","typ":"JWT"} . {"sub":"x","exp":1700000000} . sig
        let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ4IiwiZXhwIjoxNzAwMDAwMDAwfQ.c2ln";
        assert_eq!(token_expiry(token).unwrap().timestamp(), 1_700_000_000);
        assert!(token_expiry("not-a-jwt").is_none());
    }

    #[tokio::test]
    async fn test_initial_state_is_loading() {
        let (store, _) = store_with_user();
        assert!(store.is_loading());
        assert!(store.restore(None).await.is_none());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_sign_in_publishes_event() {
        let (store, _) = store_with_user();
        let mut events = store.events();
        let session = store.sign_in_with_password("ana@lavapro.com", "secret1").await.unwrap();

        assert_eq!(store.current(), Some(session.clone()));
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SignedIn {
                user_id: session.user.id
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_backend() {
        let (store, backend) = store_with_user();
        assert!(store.sign_in_with_password("not-an-email", "secret1").await.is_err());
        assert!(store.sign_in_with_password("ana@lavapro.com", "123").await.is_err());
        assert!(store.verify_otp("ana@lavapro.com", "12ab").await.is_err());
        assert_eq!(backend.call_count(AUTH_TARGET), 0);
    }

    #[tokio::test]
    async fn test_restore_refreshes_expired_session() {
        let backend = Arc::new(MemoryBackend::new().with_access_ttl(chrono::Duration::minutes(-1)));
        backend.add_user("ana@lavapro.com", "secret1");
        let expired = backend.sign_in_with_password("ana@lavapro.com", "secret1").await.unwrap();

        let store = SessionStore::new(backend.clone());
        let restored = store.restore(Some(expired.clone())).await.unwrap();
        assert_ne!(restored.refresh_token, expired.refresh_token);
    }

    #[tokio::test]
    async fn test_restore_failure_means_no_session() {
        let (store, backend) = store_with_user();
        let session = backend.sign_in_with_password("ana@lavapro.com", "secret1").await.unwrap();
        backend.fail_next(AUTH_TARGET, Failure::Network);

        assert!(store.restore(Some(session)).await.is_none());
        assert!(store.current().is_none());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_sign_out_clears_even_when_revocation_fails() {
        let (store, backend) = store_with_user();
        store.sign_in_with_password("ana@lavapro.com", "secret1").await.unwrap();
        backend.fail_next(AUTH_TARGET, Failure::Network);

        store.sign_out().await;
        assert!(store.current().is_none());
        assert!(matches!(store.access_token(), Err(SessionError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_refresh_emits_token_refreshed() {
        let (store, _) = store_with_user();
        let first = store.sign_in_with_password("ana@lavapro.com", "secret1").await.unwrap();
        let mut events = store.events();

        let second = store.refresh().await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::TokenRefreshed {
                user_id: first.user.id
            }
        );
    }
}
