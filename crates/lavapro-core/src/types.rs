//! # Domain Types
//!
//! Core domain types used throughout the LavaPro dashboard.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Tenant      │   │     Profile     │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  tenant_id?     │   │  id (bigint)    │       │
//! │  │  name           │   │  full_name      │◄──│  profile_id?    │       │
//! │  │  subscription   │   │  role?          │   │  tenant_id      │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │                 │
//! │  ┌─────────────────┐   ┌─────────────────┐            │                 │
//! │  │     Service     │   │      Order      │◄───────────┘                 │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  id (bigint)    │◄──│  service_id?    │                              │
//! │  │  price (Money)  │   │  status         │                              │
//! │  │  tenant_id?     │   │  total_price    │                              │
//! │  └─────────────────┘   │  delivery       │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Auth-issued records (profiles, tenants) use UUIDs; business rows
//! (orders, customers, services) use the backend's bigint identity columns,
//! which is what staff read out loud ("pedido #42").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// The application role stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owns the tenant; manages the subscription.
    Owner,
    /// Full dashboard access.
    Admin,
    /// Employee: works orders, cannot manage catalog or billing.
    Staff,
    /// End customer: sees own orders only.
    Customer,
    /// Courier: sees and advances assigned deliveries.
    Delivery,
}

impl Role {
    /// Returns true for roles that use the admin layout.
    pub const fn uses_admin_layout(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin | Role::Staff)
    }

    /// Label shown on the settings page.
    pub const fn label_pt(&self) -> &'static str {
        match self {
            Role::Owner => "Proprietário",
            Role::Admin => "Administrador",
            Role::Staff => "Funcionário",
            Role::Customer => "Cliente",
            Role::Delivery => "Entregador",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Customer => "customer",
            Role::Delivery => "delivery",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Profile
// =============================================================================

/// The application-level user record, linked 1:1 to an auth account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Profile {
    /// Same id as the auth user.
    #[ts(as = "String")]
    pub id: Uuid,

    /// Tenant the user works for (or buys from).
    #[ts(as = "Option<String>")]
    pub tenant_id: Option<Uuid>,

    /// Display name. Couriers are matched to orders by this name.
    pub full_name: String,

    /// `None` when the row has no role or an unrecognized one.
    pub role: Option<Role>,

    pub avatar_url: Option<String>,
}

// =============================================================================
// Tenant
// =============================================================================

/// Subscription state of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    /// Label shown on the settings page.
    pub const fn label_pt(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trialing => "Período de Teste",
            SubscriptionStatus::Active => "Ativa",
            SubscriptionStatus::PastDue => "Pendente",
            SubscriptionStatus::Canceled => "Cancelada",
        }
    }

    /// Trialing and active tenants have full access.
    pub const fn is_in_good_standing(&self) -> bool {
        matches!(self, SubscriptionStatus::Trialing | SubscriptionStatus::Active)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// A laundry business subscribing to the product; the unit of isolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tenant {
    #[ts(as = "String")]
    pub id: Uuid,
    pub name: String,
    pub subscription_status: SubscriptionStatus,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Service
// =============================================================================

/// A catalog entry ("Lavagem a Seco", "Passadoria", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Service {
    pub id: i64,

    /// `None` for global catalog entries shared by every tenant.
    #[ts(as = "Option<String>")]
    pub tenant_id: Option<Uuid>,

    pub name: String,
    pub description: String,
    pub price: Money,

    /// Icon name used by the web catalog page.
    pub icon: Option<String>,
}

/// Input for creating a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub icon: Option<String>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer of a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    #[ts(as = "String")]
    pub tenant_id: Uuid,

    /// Set when the customer registered an account themselves.
    #[ts(as = "Option<String>")]
    pub profile_id: Option<Uuid>,

    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for registering a customer from the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of a laundry order.
///
/// ```text
/// pending ──► in_progress ──► ready ──► in_transit ──► delivered
///    │             │            │    └─────────────────────▲
///    │             │            │       (pickup orders)
///    └─────────────┴────────────┴──────────► canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Ready,
    InTransit,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    /// Canonical label written to the backend.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Ready => "ready",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Portuguese label as shown on the status badges.
    pub const fn label_pt(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendente",
            OrderStatus::InProgress => "Em Preparo",
            OrderStatus::Ready => "Aguardando Coleta",
            OrderStatus::InTransit => "Em Trânsito",
            OrderStatus::Delivered => "Entregue",
            OrderStatus::Canceled => "Cancelado",
        }
    }

    /// Delivered and canceled orders never change again.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// How the customer gets the laundry back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryKind {
    /// Customer collects at the store ("Coleta").
    Pickup,
    /// A courier takes it to the customer ("Entrega").
    Delivery,
}

impl Default for DeliveryKind {
    fn default() -> Self {
        DeliveryKind::Pickup
    }
}

impl DeliveryKind {
    pub const fn label_pt(&self) -> &'static str {
        match self {
            DeliveryKind::Pickup => "Coleta",
            DeliveryKind::Delivery => "Entrega",
        }
    }
}

/// Delivery metadata carried by an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryInfo {
    pub kind: DeliveryKind,
    #[ts(as = "Option<String>")]
    pub courier_id: Option<Uuid>,
    pub courier_name: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Order
// =============================================================================

/// A customer's service request, in the canonical schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: i64,
    #[ts(as = "String")]
    pub tenant_id: Uuid,
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub service_id: Option<i64>,
    pub service_name: String,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub total_price: Money,
    pub delivery: DeliveryInfo,
}

impl Order {
    /// Completed orders are the only ones that count as revenue.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Delivered
    }

    /// Checks if the order is assigned to the given courier.
    ///
    /// Older rows only carry the courier's display name, so the name is
    /// compared when no courier id is present.
    pub fn is_assigned_to(&self, courier_id: Uuid, courier_name: &str) -> bool {
        if let Some(id) = self.delivery.courier_id {
            return id == courier_id;
        }
        match &self.delivery.courier_name {
            Some(name) => {
                !courier_name.trim().is_empty()
                    && name.trim().eq_ignore_ascii_case(courier_name.trim())
            }
            None => false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_courier(courier_id: Option<Uuid>, courier_name: Option<&str>) -> Order {
        Order {
            id: 1,
            tenant_id: Uuid::nil(),
            customer_id: None,
            customer_name: "Ana".to_string(),
            service_id: None,
            service_name: "Lavagem".to_string(),
            status: OrderStatus::Ready,
            created_at: Utc::now(),
            total_price: Money::from_centavos(1000),
            delivery: DeliveryInfo {
                kind: DeliveryKind::Delivery,
                courier_id,
                courier_name: courier_name.map(str::to_string),
                address: None,
            },
        }
    }

    fn courier(name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            tenant_id: None,
            full_name: name.to_string(),
            role: Some(Role::Delivery),
            avatar_url: None,
        }
    }

    #[test]
    fn test_role_layouts() {
        assert!(Role::Owner.uses_admin_layout());
        assert!(Role::Staff.uses_admin_layout());
        assert!(!Role::Customer.uses_admin_layout());
        assert!(!Role::Delivery.uses_admin_layout());
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&OrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: OrderStatus = serde_json::from_str("\"in_transit\"").unwrap();
        assert_eq!(back, OrderStatus::InTransit);
    }

    #[test]
    fn test_terminal_statuses() {
        let terminal: Vec<_> = OrderStatus::ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![&OrderStatus::Delivered, &OrderStatus::Canceled]);
    }

    #[test]
    fn test_assignment_by_id_wins_over_name() {
        let carlos = courier("Carlos");
        let other = Uuid::new_v4();

        assert!(order_with_courier(Some(carlos.id), None).is_assigned_to(carlos.id, &carlos.full_name));
        assert!(!order_with_courier(Some(other), Some("Carlos")).is_assigned_to(carlos.id, &carlos.full_name));
    }

    #[test]
    fn test_assignment_by_name_fallback() {
        let carlos = courier("Carlos Souza");
        assert!(order_with_courier(None, Some("carlos souza ")).is_assigned_to(carlos.id, &carlos.full_name));
        assert!(!order_with_courier(None, Some("Marta")).is_assigned_to(carlos.id, &carlos.full_name));
        assert!(!order_with_courier(None, None).is_assigned_to(carlos.id, &carlos.full_name));
        let nameless = courier("");
        assert!(!order_with_courier(None, Some("")).is_assigned_to(nameless.id, ""));
    }
}
