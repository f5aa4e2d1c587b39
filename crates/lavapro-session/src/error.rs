//! # Session Error Types
//!
//! Every failure the dashboard services report, sorted into the four
//! categories the UI treats differently.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │ Authentication  │  │      Data fetch         │ │
//! │  │  fatal, shown   │  │ notification,   │  │ logged, view degrades   │ │
//! │  │  full-screen    │  │ user retries    │  │ to empty/loading        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Mutation     │  │   Validation    │  Nothing is retried          │
//! │  │ notification,   │  │ input rejected  │  automatically.              │
//! │  │ state unchanged │  │ before any call │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use lavapro_baas::BaasError;
use lavapro_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// How the UI handles an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Authentication,
    DataFetch,
    Mutation,
    Validation,
}

/// Dashboard service errors.
#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// The backend is not configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Authentication Errors
    // =========================================================================
    /// Sign-in, sign-up or token refresh was rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NotSignedIn,

    // =========================================================================
    // Data Errors
    // =========================================================================
    /// Reading dashboard data failed.
    #[error("Could not load {what}: {source}")]
    DataFetch {
        what: &'static str,
        #[source]
        source: BaasError,
    },

    /// Profile, tenant or data have not been resolved yet.
    #[error("Dashboard data is not available: {0}")]
    NotReady(String),

    // =========================================================================
    // Mutation Errors
    // =========================================================================
    /// A write was refused or failed.
    #[error("Could not {action}: {source}")]
    Mutation {
        action: &'static str,
        #[source]
        source: BaasError,
    },

    /// A lifecycle or role rule refused the operation.
    #[error(transparent)]
    Rule(CoreError),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl SessionError {
    /// Maps an error from an auth call.
    pub fn auth(err: BaasError) -> Self {
        match err {
            BaasError::Config(msg) => SessionError::Configuration(msg),
            BaasError::Validation(v) => SessionError::Validation(v),
            other => SessionError::Authentication(other.to_string()),
        }
    }

    /// Maps an error from a read.
    pub fn fetch(what: &'static str, err: BaasError) -> Self {
        match err {
            BaasError::Config(msg) => SessionError::Configuration(msg),
            source => SessionError::DataFetch { what, source },
        }
    }

    /// Maps an error from a write.
    pub fn mutation(action: &'static str, err: BaasError) -> Self {
        match err {
            BaasError::Config(msg) => SessionError::Configuration(msg),
            BaasError::Validation(v) => SessionError::Validation(v),
            BaasError::Rule(rule) => SessionError::from(rule),
            source => SessionError::Mutation { action, source },
        }
    }

    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Configuration(_) => ErrorKind::Configuration,
            SessionError::Authentication(_) | SessionError::NotSignedIn => ErrorKind::Authentication,
            SessionError::DataFetch { .. } | SessionError::NotReady(_) => ErrorKind::DataFetch,
            SessionError::Mutation { .. } | SessionError::Rule(_) => ErrorKind::Mutation,
            SessionError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Returns true when a role or row policy refused the operation.
    pub fn is_permission_error(&self) -> bool {
        match self {
            SessionError::Rule(CoreError::Forbidden { .. } | CoreError::NoRole) => true,
            SessionError::Mutation { source, .. } | SessionError::DataFetch { source, .. } => {
                source.is_permission_error()
            }
            _ => false,
        }
    }
}

impl From<CoreError> for SessionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => SessionError::Validation(v),
            other => SessionError::Rule(other),
        }
    }
}
