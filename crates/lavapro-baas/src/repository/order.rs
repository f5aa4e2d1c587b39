//! # Order Repository
//!
//! Reads orders within a [`DataScope`] and writes status changes.
//!
//! ## Scoping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tenant scope    tenant_id = eq.T                                       │
//! │  Customer scope  tenant_id = eq.T & customer_id = in.(linked ids)      │
//! │                  no linked customer → no query, empty result           │
//! │  Courier scope   tenant_id = eq.T, then filtered in process:           │
//! │                  delivery kind, ready/in transit, assigned to courier  │
//! │                                                                         │
//! │  Every row is checked with DataScope::admits after normalization, so   │
//! │  a backend without row policies still cannot leak another scope.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Courier filtering happens in process because legacy rows store status
//! and delivery labels in Portuguese, which a server-side `eq` would miss.

use lavapro_core::schema::{normalize_order, SchemaRevision};
use lavapro_core::{DataScope, Order, OrderStatus};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{normalize_rows, Normalized};
use crate::client::Backend;
use crate::error::{BaasError, BaasResult};
use crate::query::Query;

/// Select list with the customer and service names embedded.
pub const ORDER_SELECT: &str = "*,customers(name),services(name)";

/// Repository for `orders`.
#[derive(Clone)]
pub struct OrderRepository {
    backend: Arc<dyn Backend>,
}

impl OrderRepository {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        OrderRepository { backend }
    }

    /// Lists the orders visible in `scope`, newest first.
    ///
    /// `linked_customers` are the customer ids linked to the profile; only
    /// the customer scope reads them.
    pub async fn list(
        &self,
        token: &str,
        scope: &DataScope,
        linked_customers: &[i64],
    ) -> BaasResult<Normalized<Order>> {
        let tenant_id = scope.tenant_id();
        let mut query = Query::table("orders")
            .select(ORDER_SELECT)
            .eq("tenant_id", tenant_id.to_string())
            .order_by("created_at", true);

        if let DataScope::Customer { .. } = scope {
            if linked_customers.is_empty() {
                debug!(%tenant_id, "No linked customer, no orders to read");
                return Ok(Normalized::empty());
            }
            query = query.in_list("customer_id", linked_customers.iter().copied());
        }

        let rows = self.backend.select(Some(token), &query).await?;
        let fetched = rows.len();
        let mut normalized = normalize_rows("orders", rows, |row| normalize_order(row, tenant_id));
        let legacy = normalized
            .items
            .iter()
            .filter(|n| n.revision < SchemaRevision::V4)
            .count();

        let before = normalized.items.len();
        normalized.items.retain(|n| scope.admits(&n.order, linked_customers));
        debug!(
            %tenant_id,
            fetched,
            legacy,
            admitted = normalized.items.len(),
            out_of_scope = before - normalized.items.len(),
            skipped = normalized.skipped,
            "Orders listed"
        );

        Ok(Normalized {
            items: normalized.items.into_iter().map(|n| n.order).collect(),
            skipped: normalized.skipped,
        })
    }

    /// Fetches one order of a tenant.
    pub async fn get(&self, token: &str, tenant_id: Uuid, order_id: i64) -> BaasResult<Order> {
        let query = Query::table("orders")
            .select(ORDER_SELECT)
            .eq("tenant_id", tenant_id.to_string())
            .eq("id", order_id)
            .limit(1);
        let rows = self.backend.select(Some(token), &query).await?;
        let row = rows
            .first()
            .ok_or_else(|| BaasError::not_found("Order", order_id))?;
        Ok(normalize_order(row, tenant_id)?.order)
    }

    /// Writes a new status with its canonical label.
    ///
    /// Zero updated rows means the order does not exist or the caller may
    /// not write it; both read as not found.
    pub async fn update_status(
        &self,
        token: &str,
        tenant_id: Uuid,
        order_id: i64,
        status: OrderStatus,
    ) -> BaasResult<()> {
        let query = Query::table("orders")
            .eq("tenant_id", tenant_id.to_string())
            .eq("id", order_id);
        let rows = self
            .backend
            .update(Some(token), &query, json!({ "status": status.as_str() }))
            .await?;
        if rows.is_empty() {
            return Err(BaasError::not_found("Order", order_id));
        }
        info!(order_id, status = %status, "Order status updated");
        Ok(())
    }
}
