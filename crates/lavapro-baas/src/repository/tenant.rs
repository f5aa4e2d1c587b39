//! Tenant lookups.

use lavapro_core::schema::normalize_tenant;
use lavapro_core::Tenant;
use std::sync::Arc;
use uuid::Uuid;

use crate::client::Backend;
use crate::error::{BaasError, BaasResult};
use crate::query::Query;

/// Repository for `tenants`.
#[derive(Clone)]
pub struct TenantRepository {
    backend: Arc<dyn Backend>,
}

impl TenantRepository {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        TenantRepository { backend }
    }

    /// Fetches one tenant. A tenant the caller cannot see reads as not found.
    pub async fn get(&self, token: &str, tenant_id: Uuid) -> BaasResult<Tenant> {
        let query = Query::table("tenants").eq("id", tenant_id.to_string()).limit(1);
        let rows = self.backend.select(Some(token), &query).await?;
        let row = rows
            .first()
            .ok_or_else(|| BaasError::not_found("Tenant", tenant_id))?;
        Ok(normalize_tenant(row)?)
    }
}
