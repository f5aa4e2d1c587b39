//! Persisted session tokens (`session.toml`).
//!
//! The file holds the last issued [`AuthSession`]; it is rewritten whenever
//! the tokens rotate and removed on sign-out.

use chrono::{DateTime, Utc};
use lavapro_baas::AuthSession;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredSession {
    saved_at: DateTime<Utc>,
    session: AuthSession,
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        SessionFile { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, if any. An unreadable file counts as none.
    pub fn load(&self) -> Option<AuthSession> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read session file");
                return None;
            }
        };
        match toml::from_str::<StoredSession>(&text) {
            Ok(stored) => {
                debug!(path = %self.path.display(), saved_at = %stored.saved_at, "Session file loaded");
                Some(stored.session)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt session file");
                None
            }
        }
    }

    pub fn save(&self, session: &AuthSession) -> Result<(), CliError> {
        let stored = StoredSession {
            saved_at: Utc::now(),
            session: session.clone(),
        };
        let text = toml::to_string(&stored).map_err(|e| CliError::SessionFile(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, text).map_err(|e| self.io_error(e))?;
        restrict_permissions(&self.path);
        debug!(path = %self.path.display(), "Session file saved");
        Ok(())
    }

    /// Removes the file. A missing file is not an error.
    pub fn clear(&self) -> Result<(), CliError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, err: std::io::Error) -> CliError {
        CliError::SessionFile(format!("{}: {}", self.path.display(), err))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!(path = %path.display(), error = %e, "Cannot restrict session file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use lavapro_baas::AuthUser;
    use uuid::Uuid;

    fn temp_file() -> SessionFile {
        let dir = std::env::temp_dir().join(format!("lavapro-test-{}", Uuid::new_v4()));
        SessionFile::new(dir.join("session.toml"))
    }

    fn session() -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Some(Utc::now()),
            user: AuthUser {
                id: Uuid::new_v4(),
                email: Some("admin@bolhaazul.com.br".to_string()),
            },
        }
    }

    #[test]
    fn test_save_load_clear() {
        let file = temp_file();
        assert!(file.load().is_none());

        let session = session();
        file.save(&session).unwrap();
        let loaded = file.load().unwrap();
        assert_eq!(loaded.user, session.user);
        assert_eq!(loaded.refresh_token, "refresh");

        file.clear().unwrap();
        assert!(file.load().is_none());
        file.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let file = temp_file();
        fs::create_dir_all(file.path().parent().unwrap()).unwrap();
        fs::write(file.path(), "not = [valid").unwrap();
        assert!(file.load().is_none());
    }
}
