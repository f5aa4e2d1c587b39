//! # HTTP Backend
//!
//! [`Backend`] over the hosted service's REST endpoints.
//!
//! ## Request Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /auth/v1/token?grant_type=password      {email, password}        │
//! │  POST /auth/v1/token?grant_type=refresh_token {refresh_token}          │
//! │  POST /auth/v1/otp?redirect_to=...            {email, create_user}     │
//! │  POST /auth/v1/verify                         {type, email, token}     │
//! │  POST /auth/v1/signup                         {email, password, data}  │
//! │  POST /auth/v1/logout                                                   │
//! │  GET  /auth/v1/user                                                     │
//! │                                                                         │
//! │  GET   /rest/v1/{table}?select=..&col=eq.val                           │
//! │  PATCH /rest/v1/{table}?col=eq.val   Prefer: return=representation     │
//! │  POST  /rest/v1/{table}              Prefer: return=representation     │
//! │                                                                         │
//! │  Every request:  apikey: <anon key>                                    │
//! │                  Authorization: Bearer <access token | anon key>       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No request is retried; failures surface to the caller as [`BaasError`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::client::{AuthSession, AuthUser, Backend, SignUpOutcome};
use crate::config::BaasConfig;
use crate::error::{BaasError, BaasResult};
use crate::query::Query;

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    email: Option<String>,
}

impl From<UserPayload> for AuthUser {
    fn from(user: UserPayload) -> Self {
        AuthUser {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserPayload,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .or_else(|| self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

/// Backend implementation over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: BaasConfig,
}

impl HttpBackend {
    /// Creates a backend with the config's timeout applied to every request.
    pub fn new(config: BaasConfig) -> BaasResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BaasError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(HttpBackend { client, config })
    }

    pub fn config(&self) -> &BaasConfig {
        &self.config
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token.unwrap_or(&self.config.anon_key))
    }

    async fn send(&self, builder: RequestBuilder) -> BaasResult<Value> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body, status);
            warn!(status = status.as_u16(), %message, "Backend request failed");
            return Err(BaasError::from_status(status.as_u16(), message));
        }
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> BaasResult<AuthSession> {
        let mut url = self.config.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        let value = self.send(self.request(Method::POST, url, None).json(&body)).await?;
        let token: TokenResponse = serde_json::from_value(value)?;
        Ok(token.into_session())
    }

    fn rows(value: Value) -> BaasResult<Vec<Value>> {
        match value {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }
}

/// Extracts a readable message from an error body.
///
/// The auth service answers `{error, error_description}` or `{msg}`; the
/// table API answers `{code, message, details}`.
fn error_message(body: &str, status: StatusCode) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body.trim().to_string()
        };
    };
    let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

    let detail = field("error_description")
        .or_else(|| field("msg"))
        .or_else(|| field("message"));
    let code = field("error_code").or_else(|| field("error")).or_else(|| field("code"));

    match (code, detail) {
        (Some(code), Some(detail)) => format!("{}: {}", code, detail),
        (Some(one), None) | (None, Some(one)) => one,
        (None, None) => body.trim().to_string(),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> BaasResult<AuthSession> {
        debug!(%email, "Password sign-in");
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn send_otp(&self, email: &str, redirect_to: Option<&str>) -> BaasResult<()> {
        let mut url = self.config.auth_url("otp")?;
        if let Some(redirect) = redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect);
        }
        debug!(%email, "Requesting one-time code");
        self.send(
            self.request(Method::POST, url, None)
                .json(&json!({ "email": email, "create_user": false })),
        )
        .await?;
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> BaasResult<AuthSession> {
        let url = self.config.auth_url("verify")?;
        let value = self
            .send(
                self.request(Method::POST, url, None)
                    .json(&json!({ "type": "email", "email": email, "token": code })),
            )
            .await?;
        let token: TokenResponse = serde_json::from_value(value)?;
        Ok(token.into_session())
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> BaasResult<SignUpOutcome> {
        let url = self.config.auth_url("signup")?;
        let value = self
            .send(self.request(Method::POST, url, None).json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            })))
            .await?;

        if value.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(value)?;
            Ok(SignUpOutcome::SignedIn(token.into_session()))
        } else {
            Ok(SignUpOutcome::ConfirmationRequired {
                email: email.to_string(),
            })
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> BaasResult<AuthSession> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn get_user(&self, access_token: &str) -> BaasResult<AuthUser> {
        let url = self.config.auth_url("user")?;
        let value = self
            .send(self.request(Method::GET, url, Some(access_token)))
            .await?;
        let user: UserPayload = serde_json::from_value(value)?;
        Ok(user.into())
    }

    async fn sign_out(&self, access_token: &str) -> BaasResult<()> {
        let url = self.config.auth_url("logout")?;
        self.send(self.request(Method::POST, url, Some(access_token)))
            .await?;
        Ok(())
    }

    async fn select(&self, token: Option<&str>, query: &Query) -> BaasResult<Vec<Value>> {
        let url = self.config.rest_url(&query.table)?;
        debug!(table = %query.table, "Selecting rows");
        let value = self
            .send(self.request(Method::GET, url, token).query(&query.to_params()))
            .await?;
        Self::rows(value)
    }

    async fn update(&self, token: Option<&str>, query: &Query, patch: Value) -> BaasResult<Vec<Value>> {
        let url = self.config.rest_url(&query.table)?;
        let params: Vec<(String, String)> = query
            .to_params()
            .into_iter()
            .filter(|(key, _)| key != "order" && key != "limit")
            .collect();
        let value = self
            .send(
                self.request(Method::PATCH, url, token)
                    .header("Prefer", "return=representation")
                    .query(&params)
                    .json(&patch),
            )
            .await?;
        Self::rows(value)
    }

    async fn insert(&self, token: Option<&str>, table: &str, row: Value) -> BaasResult<Vec<Value>> {
        let url = self.config.rest_url(table)?;
        let value = self
            .send(
                self.request(Method::POST, url, token)
                    .header("Prefer", "return=representation")
                    .json(&row),
            )
            .await?;
        Self::rows(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#, StatusCode::BAD_REQUEST),
            "invalid_grant: Invalid login credentials"
        );
        assert_eq!(
            error_message(r#"{"code":"42501","message":"permission denied for table orders"}"#, StatusCode::FORBIDDEN),
            "42501: permission denied for table orders"
        );
        assert_eq!(error_message(r#"{"msg":"Token has expired"}"#, StatusCode::UNAUTHORIZED), "Token has expired");
        assert_eq!(error_message("", StatusCode::BAD_GATEWAY), "Bad Gateway");
        assert_eq!(error_message("upstream down", StatusCode::BAD_GATEWAY), "upstream down");
    }

    #[test]
    fn test_token_response_expiry() {
        let body = json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "expires_at": 1_700_000_000,
            "user": { "id": "7d5e0a3c-1b8e-4f7a-9c3d-2a1b0c9d8e7f", "email": "ana@lavapro.com" }
        });
        let session = serde_json::from_value::<TokenResponse>(body).unwrap().into_session();
        assert_eq!(session.expires_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(session.user.email.as_deref(), Some("ana@lavapro.com"));
    }

    #[test]
    fn test_token_response_without_expires_at() {
        let body = json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 60,
            "user": { "id": "7d5e0a3c-1b8e-4f7a-9c3d-2a1b0c9d8e7f" }
        });
        let session = serde_json::from_value::<TokenResponse>(body).unwrap().into_session();
        assert!(session.expires_at.unwrap() > Utc::now());
    }

    #[test]
    fn test_rows_wraps_single_object() {
        assert_eq!(HttpBackend::rows(Value::Null).unwrap().len(), 0);
        assert_eq!(HttpBackend::rows(json!({"id": 1})).unwrap().len(), 1);
        assert_eq!(HttpBackend::rows(json!([{"id": 1}, {"id": 2}])).unwrap().len(), 2);
    }
}
