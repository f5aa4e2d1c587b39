//! # Profile Resolver
//!
//! Maps the signed-in user to their profile row.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   no session ─────────────────────────────────────────► Idle            │
//! │   session(user) ──► Loading ──┬── one row ────────────► Ready(profile)  │
//! │                               ├── zero rows ──────────► Missing         │
//! │                               └── network/permission ─► Failed          │
//! │                                                                         │
//! │   Missing is a valid state (account created, profile not yet written); │
//! │   Failed is an error. Both expose no profile.                          │
//! │                                                                         │
//! │   The row is fetched once per user: a refreshed token for the same     │
//! │   user keeps the settled state.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use lavapro_baas::{AuthSession, ProfileRepository};
use lavapro_core::Profile;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::generation::Generation;

/// Resolution state of the current user's profile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileState {
    Idle,
    Loading { user_id: Uuid },
    Missing { user_id: Uuid },
    Ready(Profile),
    Failed { user_id: Uuid, message: String },
}

impl ProfileState {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            ProfileState::Ready(profile) => Some(profile),
            _ => None,
        }
    }

    /// The user this state was resolved for.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            ProfileState::Idle => None,
            ProfileState::Ready(profile) => Some(profile.id),
            ProfileState::Loading { user_id }
            | ProfileState::Missing { user_id }
            | ProfileState::Failed { user_id, .. } => Some(*user_id),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ProfileState::Loading { .. })
    }
}

/// Fetches and publishes the current profile.
pub struct ProfileResolver {
    profiles: ProfileRepository,
    state: watch::Sender<ProfileState>,
    generation: Generation,
}

impl ProfileResolver {
    pub fn new(profiles: ProfileRepository) -> Self {
        let (state, _) = watch::channel(ProfileState::Idle);
        ProfileResolver {
            profiles,
            state,
            generation: Generation::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ProfileState {
        self.state.borrow().clone()
    }

    /// Brings the state in line with `session`.
    ///
    /// Fetches only when the user changed or the last attempt failed.
    pub async fn resolve(&self, session: Option<&AuthSession>) -> ProfileState {
        let Some(session) = session else {
            self.generation.next();
            self.state.send_replace(ProfileState::Idle);
            return ProfileState::Idle;
        };

        let current = self.snapshot();
        let settled = !matches!(current, ProfileState::Failed { .. } | ProfileState::Loading { .. });
        if settled && current.user_id() == Some(session.user.id) {
            debug!(user_id = %session.user.id, "Profile already resolved");
            return current;
        }
        self.reload(session).await
    }

    /// Fetches the profile of the session's user unconditionally.
    ///
    /// If a newer fetch starts (or the session ends) before this one
    /// answers, its result is dropped and the newer state is returned.
    pub async fn reload(&self, session: &AuthSession) -> ProfileState {
        let user_id = session.user.id;
        let ticket = self.generation.next();
        self.state.send_replace(ProfileState::Loading { user_id });

        let result = self.profiles.get(&session.access_token, user_id).await;
        if !self.generation.is_current(ticket) {
            debug!(%user_id, "Dropping stale profile result");
            return self.snapshot();
        }

        let next = match result {
            Ok(Some(profile)) => {
                info!(%user_id, role = ?profile.role, tenant_id = ?profile.tenant_id, "Profile resolved");
                ProfileState::Ready(profile)
            }
            Ok(None) => {
                info!(%user_id, "No profile row for user");
                ProfileState::Missing { user_id }
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Profile fetch failed");
                ProfileState::Failed {
                    user_id,
                    message: e.to_string(),
                }
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    /// Forgets the profile (sign-out).
    pub fn clear(&self) {
        self.generation.next();
        self.state.send_replace(ProfileState::Idle);
    }
}
