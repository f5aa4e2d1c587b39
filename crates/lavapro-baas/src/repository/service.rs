//! Service catalog.
//!
//! Services without a tenant are global catalog entries shown to every
//! tenant; the public catalog is readable without signing in.

use lavapro_core::schema::normalize_service;
use lavapro_core::validation::validate_new_service;
use lavapro_core::{NewService, Service};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{normalize_rows, Normalized};
use crate::client::Backend;
use crate::error::{BaasError, BaasResult};
use crate::query::{Filter, Query};

/// Repository for `services`.
#[derive(Clone)]
pub struct ServiceRepository {
    backend: Arc<dyn Backend>,
}

impl ServiceRepository {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        ServiceRepository { backend }
    }

    /// The tenant's own services plus the global ones, by name.
    pub async fn list_for_tenant(&self, token: &str, tenant_id: Uuid) -> BaasResult<Normalized<Service>> {
        let query = Query::table("services")
            .or(vec![
                Filter::Eq("tenant_id".to_string(), json!(tenant_id.to_string())),
                Filter::IsNull("tenant_id".to_string()),
            ])
            .order_by("name", false);
        let rows = self.backend.select(Some(token), &query).await?;
        let services = normalize_rows("services", rows, normalize_service);
        debug!(%tenant_id, count = services.items.len(), "Services listed");
        Ok(services)
    }

    /// The catalog as an anonymous visitor sees it.
    pub async fn list_public(&self) -> BaasResult<Normalized<Service>> {
        let query = Query::table("services").order_by("name", false);
        let rows = self.backend.select(None, &query).await?;
        Ok(normalize_rows("services", rows, normalize_service))
    }

    /// Validates and inserts a tenant service.
    pub async fn insert(&self, token: &str, tenant_id: Uuid, input: &NewService) -> BaasResult<Service> {
        let service = validate_new_service(input)?;
        let row = json!({
            "tenant_id": tenant_id.to_string(),
            "name": service.name,
            "description": service.description,
            "price": service.price.to_decimal_string(),
            "icon": service.icon,
        });
        let rows = self.backend.insert(Some(token), "services", row).await?;
        let stored = rows.first().ok_or_else(|| BaasError::Http {
            status: 500,
            message: "insert returned no row".to_string(),
        })?;
        let service = normalize_service(stored)?;
        info!(service_id = service.id, %tenant_id, "Service created");
        Ok(service)
    }
}
