//! Profile lookups.

use lavapro_core::schema::normalize_profile;
use lavapro_core::Profile;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::client::Backend;
use crate::error::BaasResult;
use crate::query::Query;

/// Repository for `profiles`.
#[derive(Clone)]
pub struct ProfileRepository {
    backend: Arc<dyn Backend>,
}

impl ProfileRepository {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        ProfileRepository { backend }
    }

    /// Fetches the profile of a user.
    ///
    /// `Ok(None)` means the row does not exist yet (an account whose
    /// profile was never created). A row that exists but cannot be read is
    /// an error.
    pub async fn get(&self, token: &str, user_id: Uuid) -> BaasResult<Option<Profile>> {
        let query = Query::table("profiles").eq("id", user_id.to_string()).limit(1);
        let rows = self.backend.select(Some(token), &query).await?;
        debug!(%user_id, found = !rows.is_empty(), "Profile fetched");

        match rows.first() {
            None => Ok(None),
            Some(row) => Ok(Some(normalize_profile(row)?)),
        }
    }
}
