//! # Memory Backend
//!
//! An in-process [`Backend`] used by demo mode and by the test suites.
//!
//! ## What It Emulates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Auth                                                                   │
//! │  ├── users with passwords, confirmation, one-time codes                │
//! │  ├── signed HS256 access tokens (real `exp` claims)                    │
//! │  └── rotating refresh tokens, revocation on sign-out                   │
//! │                                                                         │
//! │  Tables (JSON rows, same filters as the HTTP dialect)                  │
//! │  ├── row policies: tenant isolation, customers see own orders only,    │
//! │  │   anonymous callers see the service catalog only                    │
//! │  ├── embedded selects: customers(name), services(name)                 │
//! │  └── identity ids and created_at filled on insert                      │
//! │                                                                         │
//! │  Test hooks                                                             │
//! │  ├── fail_next(target, Failure)   next call on target fails            │
//! │  ├── delay_next(target, Duration) next response is held back           │
//! │  └── call_count(target)           how often a target was hit           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Responses are computed before any simulated delay, so a delayed
//! response carries the data as it was when the request arrived.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lavapro_core::schema::parse_role;
use lavapro_core::Role;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{AuthSession, AuthUser, Backend, SignUpOutcome};
use crate::error::{BaasError, BaasResult};
use crate::query::{value_text, Query};

/// Target name for auth calls in the test hooks.
pub const AUTH_TARGET: &str = "auth";

/// Tables the memory backend knows about.
pub const TABLES: [&str; 5] = ["profiles", "tenants", "customers", "services", "orders"];

/// A failure injected with [`MemoryBackend::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Network,
    Unauthorized,
    PermissionDenied,
    Server,
}

impl Failure {
    fn into_error(self, target: &str) -> BaasError {
        match self {
            Failure::Network => BaasError::Network(format!("connection reset while calling {}", target)),
            Failure::Unauthorized => BaasError::Unauthorized("JWT expired".to_string()),
            Failure::PermissionDenied => {
                BaasError::PermissionDenied(format!("permission denied for {}", target))
            }
            Failure::Server => BaasError::Http {
                status: 500,
                message: "internal server error".to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    role: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone)]
struct MemoryUser {
    id: Uuid,
    email: String,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Value>>,
    users: Vec<MemoryUser>,
    access_tokens: HashMap<String, Uuid>,
    refresh_tokens: HashMap<String, Uuid>,
    otp_codes: HashMap<String, String>,
    failures: HashMap<String, VecDeque<Failure>>,
    delays: HashMap<String, VecDeque<Duration>>,
    calls: HashMap<String, usize>,
}

/// In-process backend.
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    secret: Vec<u8>,
    access_ttl: ChronoDuration,
    auto_confirm: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates an empty backend. Access tokens live one hour.
    pub fn new() -> Self {
        MemoryBackend {
            state: Mutex::new(MemoryState::default()),
            secret: Uuid::new_v4().as_bytes().to_vec(),
            access_ttl: ChronoDuration::hours(1),
            auto_confirm: true,
        }
    }

    /// Sets the lifetime of issued access tokens. A negative value issues
    /// tokens that are already expired.
    pub fn with_access_ttl(mut self, ttl: ChronoDuration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Whether sign-ups are usable without email confirmation.
    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Seeding and Test Hooks
    // =========================================================================

    /// Registers a confirmed user and returns its id.
    pub fn add_user(&self, email: &str, password: &str) -> Uuid {
        self.add_user_with_id(Uuid::new_v4(), email, password)
    }

    /// Registers a confirmed user with a fixed id.
    pub fn add_user_with_id(&self, id: Uuid, email: &str, password: &str) -> Uuid {
        self.lock().users.push(MemoryUser {
            id,
            email: email.to_ascii_lowercase(),
            password: password.to_string(),
            confirmed: true,
        });
        id
    }

    /// Inserts a row as-is, bypassing row policies.
    pub fn insert_row(&self, table: &str, row: Value) {
        self.lock().tables.entry(table.to_string()).or_default().push(row);
    }

    /// Snapshot of a table, bypassing row policies.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Makes the next call on `target` (a table or [`AUTH_TARGET`]) fail.
    pub fn fail_next(&self, target: &str, failure: Failure) {
        self.lock()
            .failures
            .entry(target.to_string())
            .or_default()
            .push_back(failure);
    }

    /// Holds back the next response from `target` for `delay`.
    pub fn delay_next(&self, target: &str, delay: Duration) {
        self.lock()
            .delays
            .entry(target.to_string())
            .or_default()
            .push_back(delay);
    }

    /// How many calls `target` has received.
    pub fn call_count(&self, target: &str) -> usize {
        self.lock().calls.get(target).copied().unwrap_or(0)
    }

    /// The last one-time code sent to `email`.
    pub fn last_otp(&self, email: &str) -> Option<String> {
        self.lock().otp_codes.get(&email.to_ascii_lowercase()).cloned()
    }

    /// Records a call and returns its injected failure and delay.
    fn enter(&self, target: &str) -> (Option<Failure>, Option<Duration>) {
        let mut state = self.lock();
        *state.calls.entry(target.to_string()).or_default() += 1;
        let failure = state.failures.get_mut(target).and_then(VecDeque::pop_front);
        let delay = state.delays.get_mut(target).and_then(VecDeque::pop_front);
        (failure, delay)
    }

    /// Runs `op` against the state, then applies the injected delay.
    async fn call<T>(
        &self,
        target: &str,
        op: impl FnOnce(&mut MemoryState) -> BaasResult<T>,
    ) -> BaasResult<T> {
        let (failure, delay) = self.enter(target);
        let result = match failure {
            Some(failure) => Err(failure.into_error(target)),
            None => {
                let mut state = self.lock();
                op(&mut state)
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    fn issue_session(&self, state: &mut MemoryState, user: &MemoryUser) -> BaasResult<AuthSession> {
        let now = Utc::now();
        let expires_at = now + self.access_ttl;
        let claims = Claims {
            sub: user.id.to_string(),
            email: Some(user.email.clone()),
            role: "authenticated".to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let access_token = encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|e| BaasError::Http {
                status: 500,
                message: format!("cannot sign token: {}", e),
            })?;
        let refresh_token = Uuid::new_v4().simple().to_string();

        state.access_tokens.insert(access_token.clone(), user.id);
        state.refresh_tokens.insert(refresh_token.clone(), user.id);

        Ok(AuthSession {
            access_token,
            refresh_token,
            expires_at: Some(expires_at),
            user: AuthUser {
                id: user.id,
                email: Some(user.email.clone()),
            },
        })
    }

    /// Resolves a bearer token to a user id. Expired or revoked tokens fail.
    fn authenticate(&self, state: &MemoryState, token: &str) -> BaasResult<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map_err(|e| BaasError::Unauthorized(format!("invalid JWT: {}", e)))?;
        state
            .access_tokens
            .get(token)
            .copied()
            .ok_or_else(|| BaasError::Unauthorized("session not found".to_string()))
    }

    fn caller(&self, state: &MemoryState, token: Option<&str>) -> BaasResult<Option<Caller>> {
        match token {
            None => Ok(None),
            Some(token) => {
                let user_id = self.authenticate(state, token)?;
                Ok(Some(Caller::resolve(state, user_id)))
            }
        }
    }
}

// =============================================================================
// Row Policies
// =============================================================================

/// The signed-in user as the row policies see it.
#[derive(Debug, Clone)]
struct Caller {
    user_id: Uuid,
    tenant_id: Option<String>,
    role: Option<Role>,
    customer_ids: Vec<String>,
}

impl Caller {
    fn resolve(state: &MemoryState, user_id: Uuid) -> Caller {
        let id = user_id.to_string();
        let profile = state
            .tables
            .get("profiles")
            .and_then(|rows| rows.iter().find(|r| text(r, "id").as_deref() == Some(id.as_str())));
        let tenant_id = profile.and_then(|p| text(p, "tenant_id"));
        let role = profile
            .and_then(|p| text(p, "role"))
            .as_deref()
            .and_then(parse_role);
        let customer_ids = state
            .tables
            .get("customers")
            .map(|rows| {
                rows.iter()
                    .filter(|r| text(r, "profile_id").as_deref() == Some(id.as_str()))
                    .filter_map(|r| text(r, "id"))
                    .collect()
            })
            .unwrap_or_default();

        Caller {
            user_id,
            tenant_id,
            role,
            customer_ids,
        }
    }

    fn same_tenant(&self, row: &Value) -> bool {
        match (&self.tenant_id, text(row, "tenant_id")) {
            (Some(mine), Some(theirs)) => *mine == theirs,
            _ => false,
        }
    }

    fn is_staff(&self) -> bool {
        self.role.map_or(false, |r| r.uses_admin_layout())
    }

    fn is_manager(&self) -> bool {
        matches!(self.role, Some(Role::Owner | Role::Admin))
    }
}

fn can_read(caller: Option<&Caller>, table: &str, row: &Value) -> bool {
    let Some(caller) = caller else {
        return table == "services";
    };
    match table {
        "profiles" => {
            text(row, "id").as_deref() == Some(caller.user_id.to_string().as_str())
                || caller.same_tenant(row)
        }
        "tenants" => caller.tenant_id.is_some() && text(row, "id") == caller.tenant_id,
        "customers" => {
            caller.same_tenant(row)
                && (caller.is_staff()
                    || text(row, "profile_id").as_deref() == Some(caller.user_id.to_string().as_str()))
        }
        "orders" => {
            caller.same_tenant(row)
                && match caller.role {
                    Some(Role::Customer) => text(row, "customer_id")
                        .map_or(false, |id| caller.customer_ids.contains(&id)),
                    Some(_) => true,
                    None => false,
                }
        }
        "services" => text(row, "tenant_id").is_none() || caller.same_tenant(row),
        _ => false,
    }
}

fn can_write(caller: Option<&Caller>, table: &str, row: &Value) -> bool {
    let Some(c) = caller else {
        return false;
    };
    match table {
        "orders" => c.same_tenant(row) && (c.is_staff() || c.role == Some(Role::Delivery)),
        "customers" => {
            c.same_tenant(row)
                && (c.is_staff()
                    || (c.role == Some(Role::Customer)
                        && text(row, "profile_id").as_deref() == Some(c.user_id.to_string().as_str())))
        }
        "services" => c.same_tenant(row) && c.is_manager(),
        _ => false,
    }
}

fn known_table(table: &str) -> BaasResult<()> {
    if TABLES.contains(&table) {
        Ok(())
    } else {
        Err(BaasError::from_status(
            404,
            format!("relation \"public.{}\" does not exist", table),
        ))
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

fn text(row: &Value, key: &str) -> Option<String> {
    match row.get(key) {
        None | Some(Value::Null) => None,
        Some(v) => Some(value_text(v)),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

/// Adds embedded relations such as `customers(name)` to a row.
fn embed(state: &MemoryState, row: &mut Value, query: &Query) {
    for (relation, columns) in query.embeds() {
        let foreign_key = format!("{}_id", relation.trim_end_matches('s'));
        let target = text(row, &foreign_key).and_then(|id| {
            state
                .tables
                .get(&relation)
                .and_then(|rows| rows.iter().find(|r| text(r, "id").as_deref() == Some(id.as_str())))
        });
        let embedded = match target {
            Some(Value::Object(fields)) => {
                let picked: Map<String, Value> = fields
                    .iter()
                    .filter(|(k, _)| columns.iter().any(|c| c == "*" || c == *k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Value::Object(picked)
            }
            _ => Value::Null,
        };
        if let Value::Object(map) = row {
            map.insert(relation, embedded);
        }
    }
}

fn next_id(rows: &[Value]) -> i64 {
    rows.iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .max()
        .unwrap_or(0)
        + 1
}

// =============================================================================
// Backend Implementation
// =============================================================================

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BaasResult<AuthSession> {
        let email = email.to_ascii_lowercase();
        self.call(AUTH_TARGET, |state| {
            let user = state
                .users
                .iter()
                .find(|u| u.email == email && u.password == password)
                .cloned()
                .ok_or_else(|| {
                    BaasError::InvalidCredentials("invalid_grant: Invalid login credentials".to_string())
                })?;
            if !user.confirmed {
                return Err(BaasError::InvalidCredentials(
                    "invalid_grant: Email not confirmed".to_string(),
                ));
            }
            self.issue_session(state, &user)
        })
        .await
    }

    async fn send_otp(&self, email: &str, _redirect_to: Option<&str>) -> BaasResult<()> {
        let email = email.to_ascii_lowercase();
        self.call(AUTH_TARGET, |state| {
            if !state.users.iter().any(|u| u.email == email) {
                return Err(BaasError::InvalidCredentials(
                    "otp_disabled: Signups not allowed for otp".to_string(),
                ));
            }
            let code = format!("{:06}", Uuid::new_v4().as_u128() % 1_000_000);
            info!(%email, "One-time code issued");
            state.otp_codes.insert(email.clone(), code);
            Ok(())
        })
        .await
    }

    async fn verify_otp(&self, email: &str, code: &str) -> BaasResult<AuthSession> {
        let email = email.to_ascii_lowercase();
        self.call(AUTH_TARGET, |state| {
            if state.otp_codes.get(&email).map(String::as_str) != Some(code) {
                return Err(BaasError::InvalidCredentials(
                    "otp_expired: Token has expired or is invalid".to_string(),
                ));
            }
            state.otp_codes.remove(&email);
            let user = state
                .users
                .iter_mut()
                .find(|u| u.email == email)
                .map(|u| {
                    u.confirmed = true;
                    u.clone()
                })
                .ok_or_else(|| BaasError::not_found("User", &email))?;
            self.issue_session(state, &user)
        })
        .await
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> BaasResult<SignUpOutcome> {
        let email = email.to_ascii_lowercase();
        self.call(AUTH_TARGET, |state| {
            if state.users.iter().any(|u| u.email == email) {
                return Err(BaasError::Http {
                    status: 422,
                    message: "user_already_exists: User already registered".to_string(),
                });
            }
            let user = MemoryUser {
                id: Uuid::new_v4(),
                email: email.clone(),
                password: password.to_string(),
                confirmed: self.auto_confirm,
            };
            debug!(user_id = %user.id, %full_name, "Account registered");
            state.users.push(user.clone());

            if self.auto_confirm {
                Ok(SignUpOutcome::SignedIn(self.issue_session(state, &user)?))
            } else {
                Ok(SignUpOutcome::ConfirmationRequired { email: email.clone() })
            }
        })
        .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> BaasResult<AuthSession> {
        self.call(AUTH_TARGET, |state| {
            let user_id = state.refresh_tokens.remove(refresh_token).ok_or_else(|| {
                BaasError::InvalidCredentials("invalid_grant: Invalid Refresh Token".to_string())
            })?;
            let user = state
                .users
                .iter()
                .find(|u| u.id == user_id)
                .cloned()
                .ok_or_else(|| BaasError::not_found("User", user_id))?;
            self.issue_session(state, &user)
        })
        .await
    }

    async fn get_user(&self, access_token: &str) -> BaasResult<AuthUser> {
        self.call(AUTH_TARGET, |state| {
            let user_id = self.authenticate(state, access_token)?;
            let user = state
                .users
                .iter()
                .find(|u| u.id == user_id)
                .ok_or_else(|| BaasError::Unauthorized("user not found".to_string()))?;
            Ok(AuthUser {
                id: user.id,
                email: Some(user.email.clone()),
            })
        })
        .await
    }

    async fn sign_out(&self, access_token: &str) -> BaasResult<()> {
        self.call(AUTH_TARGET, |state| {
            let user_id = state
                .access_tokens
                .remove(access_token)
                .ok_or_else(|| BaasError::Unauthorized("session not found".to_string()))?;
            state.refresh_tokens.retain(|_, owner| *owner != user_id);
            Ok(())
        })
        .await
    }

    async fn select(&self, token: Option<&str>, query: &Query) -> BaasResult<Vec<Value>> {
        known_table(&query.table)?;
        self.call(&query.table, |state| {
            let caller = self.caller(state, token)?;
            let mut rows: Vec<Value> = state
                .tables
                .get(&query.table)
                .map(|rows| {
                    rows.iter()
                        .filter(|r| can_read(caller.as_ref(), &query.table, r) && query.matches(r))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();

            for row in rows.iter_mut() {
                embed(state, row, query);
            }
            if let Some(order) = &query.order {
                rows.sort_by(|a, b| {
                    let ord = compare(a.get(&order.column), b.get(&order.column));
                    if order.descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                });
            }
            if let Some(limit) = query.limit {
                rows.truncate(limit);
            }
            Ok(rows)
        })
        .await
    }

    async fn update(&self, token: Option<&str>, query: &Query, patch: Value) -> BaasResult<Vec<Value>> {
        known_table(&query.table)?;
        let Value::Object(patch) = patch else {
            return Err(BaasError::Http {
                status: 400,
                message: "patch body must be an object".to_string(),
            });
        };
        self.call(&query.table, |state| {
            let caller = self.caller(state, token)?;
            let mut updated = Vec::new();
            if let Some(rows) = state.tables.get_mut(&query.table) {
                for row in rows.iter_mut() {
                    let visible = can_read(caller.as_ref(), &query.table, row)
                        && can_write(caller.as_ref(), &query.table, row);
                    if !visible || !query.matches(row) {
                        continue;
                    }
                    if let Value::Object(fields) = row {
                        for (k, v) in &patch {
                            fields.insert(k.clone(), v.clone());
                        }
                    }
                    updated.push(row.clone());
                }
            }
            Ok(updated)
        })
        .await
    }

    async fn insert(&self, token: Option<&str>, table: &str, row: Value) -> BaasResult<Vec<Value>> {
        known_table(table)?;
        let Value::Object(mut fields) = row else {
            return Err(BaasError::Http {
                status: 400,
                message: "row must be an object".to_string(),
            });
        };
        self.call(table, |state| {
            let caller = self.caller(state, token)?;
            let rows = state.tables.entry(table.to_string()).or_default();
            fields
                .entry("id")
                .or_insert_with(|| Value::from(next_id(rows)));
            fields
                .entry("created_at")
                .or_insert_with(|| Value::from(Utc::now().to_rfc3339()));
            let row = Value::Object(fields);

            if !can_write(caller.as_ref(), table, &row) {
                return Err(BaasError::PermissionDenied(format!(
                    "new row violates row-level security policy for table \"{}\"",
                    table
                )));
            }
            rows.push(row.clone());
            Ok(vec![row])
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TENANT: &str = "11111111-1111-4111-8111-111111111111";
    const OTHER_TENANT: &str = "22222222-2222-4222-8222-222222222222";

    fn backend_with_admin() -> (MemoryBackend, Uuid) {
        let backend = MemoryBackend::new();
        let admin = backend.add_user("admin@lavapro.com", "secret1");
        backend.insert_row(
            "profiles",
            json!({ "id": admin.to_string(), "tenant_id": TENANT, "full_name": "Admin", "role": "admin" }),
        );
        backend.insert_row("orders", json!({ "id": 1, "tenant_id": TENANT, "status": "pending" }));
        backend.insert_row("orders", json!({ "id": 2, "tenant_id": OTHER_TENANT, "status": "pending" }));
        (backend, admin)
    }

    #[tokio::test]
    async fn test_password_sign_in_and_get_user() {
        let (backend, admin) = backend_with_admin();
        let session = backend
            .sign_in_with_password("ADMIN@lavapro.com", "secret1")
            .await
            .unwrap();
        assert_eq!(session.user.id, admin);
        assert!(session.expires_at.is_some());

        let user = backend.get_user(&session.access_token).await.unwrap();
        assert_eq!(user.id, admin);

        let err = backend.sign_in_with_password("admin@lavapro.com", "wrong").await.unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let backend = MemoryBackend::new().with_access_ttl(ChronoDuration::minutes(-5));
        backend.add_user("a@b.com", "secret1");
        let session = backend.sign_in_with_password("a@b.com", "secret1").await.unwrap();
        let err = backend.get_user(&session.access_token).await.unwrap_err();
        assert!(matches!(err, BaasError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_sign_out_revokes() {
        let (backend, _) = backend_with_admin();
        let first = backend.sign_in_with_password("admin@lavapro.com", "secret1").await.unwrap();
        let second = backend.refresh_session(&first.refresh_token).await.unwrap();
        assert!(backend.refresh_session(&first.refresh_token).await.is_err());

        backend.sign_out(&second.access_token).await.unwrap();
        assert!(backend.get_user(&second.access_token).await.is_err());
        assert!(backend.refresh_session(&second.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_otp_flow() {
        let (backend, admin) = backend_with_admin();
        backend.send_otp("admin@lavapro.com", None).await.unwrap();
        let code = backend.last_otp("admin@lavapro.com").unwrap();
        assert_eq!(code.len(), 6);

        assert!(backend.verify_otp("admin@lavapro.com", "000000x").await.is_err());
        let session = backend.verify_otp("admin@lavapro.com", &code).await.unwrap();
        assert_eq!(session.user.id, admin);
        assert!(backend.verify_otp("admin@lavapro.com", &code).await.is_err());

        assert!(backend.send_otp("nobody@lavapro.com", None).await.unwrap_err().is_auth_error());
    }

    #[tokio::test]
    async fn test_sign_up_confirmation() {
        let backend = MemoryBackend::new().with_auto_confirm(false);
        let outcome = backend.sign_up("new@lavapro.com", "secret1", "Nova").await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired { .. }));
        assert!(backend.sign_in_with_password("new@lavapro.com", "secret1").await.is_err());
        assert!(backend.sign_up("new@lavapro.com", "secret1", "Nova").await.is_err());
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let (backend, _) = backend_with_admin();
        let session = backend.sign_in_with_password("admin@lavapro.com", "secret1").await.unwrap();

        let rows = backend
            .select(Some(&session.access_token), &Query::table("orders"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], 1);

        let anon = backend.select(None, &Query::table("orders")).await.unwrap();
        assert!(anon.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_insert_policies() {
        let (backend, _) = backend_with_admin();
        let session = backend.sign_in_with_password("admin@lavapro.com", "secret1").await.unwrap();
        let token = Some(session.access_token.as_str());

        let updated = backend
            .update(token, &Query::table("orders").eq("id", 2), json!({ "status": "ready" }))
            .await
            .unwrap();
        assert!(updated.is_empty(), "other tenant's order must not be writable");

        let updated = backend
            .update(token, &Query::table("orders").eq("id", 1), json!({ "status": "ready" }))
            .await
            .unwrap();
        assert_eq!(updated[0]["status"], "ready");

        let inserted = backend
            .insert(token, "customers", json!({ "tenant_id": TENANT, "name": "Ana" }))
            .await
            .unwrap();
        assert_eq!(inserted[0]["id"], 1);
        assert!(inserted[0].get("created_at").is_some());

        let err = backend
            .insert(token, "customers", json!({ "tenant_id": OTHER_TENANT, "name": "Eve" }))
            .await
            .unwrap_err();
        assert!(err.is_permission_error());
    }

    #[tokio::test]
    async fn test_embedded_select() {
        let (backend, _) = backend_with_admin();
        backend.insert_row("customers", json!({ "id": 7, "tenant_id": TENANT, "name": "Ana", "phone": "1" }));
        backend.insert_row("orders", json!({ "id": 3, "tenant_id": TENANT, "customer_id": 7, "status": "ready" }));
        let session = backend.sign_in_with_password("admin@lavapro.com", "secret1").await.unwrap();

        let rows = backend
            .select(
                Some(&session.access_token),
                &Query::table("orders").select("*,customers(name)").eq("id", 3),
            )
            .await
            .unwrap();
        assert_eq!(rows[0]["customers"], json!({ "name": "Ana" }));
    }

    #[tokio::test]
    async fn test_injected_failure_and_call_count() {
        let (backend, _) = backend_with_admin();
        backend.fail_next("services", Failure::Network);
        assert!(matches!(
            backend.select(None, &Query::table("services")).await,
            Err(BaasError::Network(_))
        ));
        assert!(backend.select(None, &Query::table("services")).await.is_ok());
        assert_eq!(backend.call_count("services"), 2);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let backend = MemoryBackend::new();
        assert!(backend.select(None, &Query::table("sales")).await.unwrap_err().is_not_found());
    }
}
