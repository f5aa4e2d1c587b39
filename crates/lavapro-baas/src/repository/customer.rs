//! Customer listing and creation.

use lavapro_core::schema::normalize_customer;
use lavapro_core::validation::validate_new_customer;
use lavapro_core::{Customer, NewCustomer};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{normalize_rows, Normalized};
use crate::client::Backend;
use crate::error::{BaasError, BaasResult};
use crate::query::Query;

/// Repository for `customers`.
#[derive(Clone)]
pub struct CustomerRepository {
    backend: Arc<dyn Backend>,
}

impl CustomerRepository {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        CustomerRepository { backend }
    }

    /// Every customer of a tenant, by name.
    pub async fn list(&self, token: &str, tenant_id: Uuid) -> BaasResult<Normalized<Customer>> {
        let query = Query::table("customers")
            .eq("tenant_id", tenant_id.to_string())
            .order_by("name", false);
        let rows = self.backend.select(Some(token), &query).await?;
        let customers = normalize_rows("customers", rows, |row| normalize_customer(row, tenant_id));
        debug!(%tenant_id, count = customers.items.len(), "Customers listed");
        Ok(customers)
    }

    /// Customer rows linked to a profile (a self-registered customer).
    pub async fn linked_to(
        &self,
        token: &str,
        tenant_id: Uuid,
        profile_id: Uuid,
    ) -> BaasResult<Vec<Customer>> {
        let query = Query::table("customers")
            .eq("tenant_id", tenant_id.to_string())
            .eq("profile_id", profile_id.to_string());
        let rows = self.backend.select(Some(token), &query).await?;
        Ok(normalize_rows("customers", rows, |row| normalize_customer(row, tenant_id)).items)
    }

    /// Validates and inserts a customer registered by staff.
    pub async fn insert(&self, token: &str, tenant_id: Uuid, input: &NewCustomer) -> BaasResult<Customer> {
        self.insert_row(token, tenant_id, None, input).await
    }

    /// Validates and inserts the customer row of a signed-up customer,
    /// linked to their profile.
    pub async fn register_self(
        &self,
        token: &str,
        tenant_id: Uuid,
        profile_id: Uuid,
        input: &NewCustomer,
    ) -> BaasResult<Customer> {
        self.insert_row(token, tenant_id, Some(profile_id), input).await
    }

    async fn insert_row(
        &self,
        token: &str,
        tenant_id: Uuid,
        profile_id: Option<Uuid>,
        input: &NewCustomer,
    ) -> BaasResult<Customer> {
        let customer = validate_new_customer(input)?;
        let row = json!({
            "tenant_id": tenant_id.to_string(),
            "profile_id": profile_id.map(|id| id.to_string()),
            "name": customer.name,
            "email": customer.email,
            "phone": customer.phone,
            "address": customer.address,
        });
        let rows = self.backend.insert(Some(token), "customers", row).await?;
        let stored = rows.first().ok_or_else(|| BaasError::Http {
            status: 500,
            message: "insert returned no row".to_string(),
        })?;
        let customer = normalize_customer(stored, tenant_id)?;
        info!(customer_id = customer.id, %tenant_id, self_registered = profile_id.is_some(), "Customer created");
        Ok(customer)
    }
}
