//! # Backend Error Types
//!
//! Error types for calls to the hosted backend.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  reqwest::Error / HTTP status / unreadable row                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BaasError (this module) ← Adds categorization                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SessionError (lavapro-session) ← Maps to the dashboard's taxonomy     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CliError (console) ← Exit code + message                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use lavapro_core::{CoreError, ValidationError};
use thiserror::Error;

/// Backend operation errors.
#[derive(Debug, Error)]
pub enum BaasError {
    /// Missing or malformed backend configuration.
    ///
    /// ## When This Occurs
    /// - `SUPABASE_URL` or `SUPABASE_ANON_KEY` unset
    /// - URL does not parse
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wrong email/password, bad one-time code or rejected refresh token.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The access token is missing, expired or revoked.
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    /// A row-level policy refused the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The backend answered with an unexpected status.
    #[error("Backend returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never got an answer.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Input rejected before the call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A business rule refused the operation.
    #[error(transparent)]
    Rule(#[from] CoreError),
}

impl BaasError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        BaasError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Maps an HTTP error status and its message.
    ///
    /// ```text
    /// 400 invalid_grant / otp_expired  → InvalidCredentials
    /// 401                              → Unauthorized
    /// 403                              → PermissionDenied
    /// 404                              → NotFound
    /// other                            → Http
    /// ```
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 422 if looks_like_credentials(&message) => BaasError::InvalidCredentials(message),
            401 => BaasError::Unauthorized(message),
            403 => BaasError::PermissionDenied(message),
            404 => BaasError::NotFound {
                entity: "Resource".to_string(),
                id: message,
            },
            _ => BaasError::Http { status, message },
        }
    }

    /// Returns true for failures the user fixes by signing in again.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            BaasError::InvalidCredentials(_) | BaasError::Unauthorized(_)
        )
    }

    /// Returns true for configuration failures (fatal at startup).
    pub fn is_config_error(&self) -> bool {
        matches!(self, BaasError::Config(_))
    }

    /// Returns true when a row-level policy or a role rule refused the call.
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            BaasError::PermissionDenied(_)
                | BaasError::Rule(CoreError::Forbidden { .. })
                | BaasError::Rule(CoreError::NoRole)
        )
    }

    /// Returns true for entity-not-found errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BaasError::NotFound { .. } | BaasError::Rule(CoreError::OrderNotFound(_))
        )
    }
}

fn looks_like_credentials(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["invalid_grant", "invalid login", "credentials", "otp", "token has expired", "refresh token"]
        .iter()
        .any(|needle| lower.contains(needle))
}

impl From<reqwest::Error> for BaasError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BaasError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            BaasError::from_status(status.as_u16(), err.to_string())
        } else {
            BaasError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BaasError {
    fn from(err: serde_json::Error) -> Self {
        BaasError::Decode(err.to_string())
    }
}

/// Result type for backend operations.
pub type BaasResult<T> = Result<T, BaasError>;

#[cfg(test)]
mod tests {
    use super::*;
    use lavapro_core::Role;

    #[test]
    fn test_status_mapping() {
        assert!(BaasError::from_status(400, "invalid_grant: Invalid login credentials").is_auth_error());
        assert!(BaasError::from_status(401, "JWT expired").is_auth_error());
        assert!(BaasError::from_status(403, "new row violates row-level security").is_permission_error());
        assert!(BaasError::from_status(404, "orders").is_not_found());
        assert!(matches!(
            BaasError::from_status(400, "column does not exist"),
            BaasError::Http { status: 400, .. }
        ));
        assert!(matches!(BaasError::from_status(500, "boom"), BaasError::Http { status: 500, .. }));
    }

    #[test]
    fn test_categories() {
        assert!(BaasError::Config("SUPABASE_URL".into()).is_config_error());
        assert!(!BaasError::Network("timeout".into()).is_auth_error());

        let forbidden: BaasError = CoreError::Forbidden {
            role: Role::Customer,
            action: "edit orders".to_string(),
        }
        .into();
        assert!(forbidden.is_permission_error());
        assert!(BaasError::from(CoreError::OrderNotFound(3)).is_not_found());
    }
}
