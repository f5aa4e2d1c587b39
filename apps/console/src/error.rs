//! # Console Errors
//!
//! Commands return `anyhow::Result`; whatever typed error sits in the
//! chain decides the process exit code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ─► CoreError ─► BaasError ─► SessionError ─► CliError  │
//! │                                                                         │
//! │  exit 0  success                                                        │
//! │  exit 1  refused or invalid operation                                  │
//! │  exit 2  configuration (config file, env, backend URL/key)             │
//! │  exit 3  authentication (not signed in, bad credentials)               │
//! │  exit 4  data could not be loaded                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use lavapro_baas::BaasError;
use lavapro_session::{ErrorKind, SessionError};
use thiserror::Error;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_AUTH: u8 = 3;
pub const EXIT_DATA: u8 = 4;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session file error: {0}")]
    SessionFile(String),

    #[error("Not signed in; run `lavapro login` first")]
    NotSignedIn,

    /// The signed-in account cannot use this command.
    #[error("{0}")]
    Unavailable(String),

    #[error("Invalid argument: {0}")]
    Usage(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) => EXIT_CONFIG,
            CliError::NotSignedIn => EXIT_AUTH,
            CliError::SessionFile(_) | CliError::Unavailable(_) | CliError::Usage(_) => EXIT_FAILURE,
            CliError::Session(e) => session_exit_code(e),
        }
    }
}

fn session_exit_code(err: &SessionError) -> u8 {
    match err.kind() {
        ErrorKind::Configuration => EXIT_CONFIG,
        ErrorKind::Authentication => EXIT_AUTH,
        ErrorKind::DataFetch => EXIT_DATA,
        ErrorKind::Mutation | ErrorKind::Validation => EXIT_FAILURE,
    }
}

impl From<::config::ConfigError> for CliError {
    fn from(err: ::config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<BaasError> for CliError {
    fn from(err: BaasError) -> Self {
        if err.is_config_error() {
            return CliError::Config(err.to_string());
        }
        CliError::Session(SessionError::fetch("backend", err))
    }
}

/// Exit code for an error returned by a command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<CliError>() {
            return e.exit_code();
        }
        if let Some(e) = cause.downcast_ref::<SessionError>() {
            return session_exit_code(e);
        }
    }
    EXIT_FAILURE
}
