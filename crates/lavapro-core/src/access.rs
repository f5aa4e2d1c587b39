//! # Access Rules
//!
//! The role-based view state machine, per-role capabilities and the data
//! scope each role reads through.
//!
//! ## View State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────────────┐  LoginSubmitted / SessionRestored                │
//! │   │ Unauthenticated │───────────────────────┐                           │
//! │   └─────────────────┘                       ▼                           │
//! │          ▲  ▲   AuthFailed          ┌─────────────┐                     │
//! │          │  └───────────────────────│   Loading   │                     │
//! │          │                          └──────┬──────┘                     │
//! │          │        ProfileResolved(role)    │  ProfileResolved(None)     │
//! │          │     ┌───────────┬───────────────┼──ProfileMissing/Failed     │
//! │          │     ▼           ▼               ▼             ▼              │
//! │          │  ┌───────┐ ┌──────────┐ ┌──────────┐ ┌─────────────┐        │
//! │          │  │ Admin │ │ Customer │ │ Delivery │ │ UnknownRole │        │
//! │          │  └───┬───┘ └────┬─────┘ └────┬─────┘ └──────┬──────┘        │
//! │          │      └──────────┴────────────┴──────────────┘               │
//! │          └──────────────────── SignedOut (from any state)              │
//! │                                                                         │
//! │   Events that do not apply leave the state unchanged.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{DeliveryKind, Order, OrderStatus, Profile, Role};

// =============================================================================
// View State Machine
// =============================================================================

/// Which layout the dashboard shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Unauthenticated,
    Loading,
    Admin,
    Customer,
    Delivery,
    /// Signed in, but without a usable role. Sign-out is the only action.
    UnknownRole,
}

/// Inputs to the view state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    LoginSubmitted,
    SessionRestored,
    /// The profile row was read; `None` when its role is missing or
    /// unrecognized.
    ProfileResolved(Option<Role>),
    /// No profile row exists for the user.
    ProfileMissing,
    /// The profile could not be fetched.
    ProfileFailed,
    AuthFailed,
    SignedOut,
}

impl ViewState {
    /// The layout a role lands on.
    pub const fn for_role(role: Role) -> ViewState {
        match role {
            Role::Owner | Role::Admin | Role::Staff => ViewState::Admin,
            Role::Customer => ViewState::Customer,
            Role::Delivery => ViewState::Delivery,
        }
    }

    /// Applies one event.
    pub fn apply(self, event: ViewEvent) -> ViewState {
        use ViewEvent::*;
        use ViewState::*;

        match (self, event) {
            (_, SignedOut) => Unauthenticated,
            (Unauthenticated, LoginSubmitted | SessionRestored) => Loading,
            (Loading, ProfileResolved(Some(role))) => ViewState::for_role(role),
            (Loading, ProfileResolved(None) | ProfileMissing | ProfileFailed) => UnknownRole,
            (Loading, AuthFailed) => Unauthenticated,
            (state, _) => state,
        }
    }

    /// Returns true once a layout (or the unknown-role screen) is showing.
    pub const fn is_settled(&self) -> bool {
        !matches!(self, ViewState::Loading)
    }

    /// Actions offered in this state.
    pub fn actions(&self) -> &'static [ViewAction] {
        use ViewAction::*;
        match self {
            ViewState::Unauthenticated => &[SignIn, SignUp, BrowseCatalog],
            ViewState::Loading => &[],
            ViewState::Admin => &[
                Dashboard, Orders, Board, Customers, Catalog, Reports, Settings, SignOut,
            ],
            ViewState::Customer => &[OwnOrders, BrowseCatalog, SignOut],
            ViewState::Delivery => &[Deliveries, SignOut],
            ViewState::UnknownRole => &[SignOut],
        }
    }
}

/// Navigation entries offered by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ViewAction {
    SignIn,
    SignUp,
    SignOut,
    BrowseCatalog,
    Dashboard,
    Orders,
    Board,
    Customers,
    Catalog,
    Reports,
    Settings,
    OwnOrders,
    Deliveries,
}

// =============================================================================
// Capabilities
// =============================================================================

/// Something a role may or may not do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    EditOrders,
    ViewAllOrders,
    ViewCustomers,
    ManageCustomers,
    RegisterSelf,
    ViewReports,
    ManageCatalog,
    ManageSubscription,
    AdvanceDeliveries,
}

impl Capability {
    /// Phrase used in "not allowed to ..." messages.
    pub const fn describe(&self) -> &'static str {
        match self {
            Capability::EditOrders => "edit orders",
            Capability::ViewAllOrders => "view all orders",
            Capability::ViewCustomers => "view customers",
            Capability::ManageCustomers => "register customers",
            Capability::RegisterSelf => "register as a customer",
            Capability::ViewReports => "view reports",
            Capability::ManageCatalog => "manage the catalog",
            Capability::ManageSubscription => "manage the subscription",
            Capability::AdvanceDeliveries => "advance deliveries",
        }
    }
}

/// What the signed-in role may do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Capabilities {
    pub edit_orders: bool,
    pub view_all_orders: bool,
    pub view_customers: bool,
    pub manage_customers: bool,
    /// A customer account creating its own customer row.
    pub register_self: bool,
    pub view_reports: bool,
    pub manage_catalog: bool,
    pub manage_subscription: bool,
    pub advance_deliveries: bool,
}

impl Capabilities {
    /// Capabilities of a role. No role means no capabilities.
    pub fn for_role(role: Option<Role>) -> Self {
        let Some(role) = role else {
            return Capabilities::default();
        };
        let staff_or_above = role.uses_admin_layout();
        let owner_or_admin = matches!(role, Role::Owner | Role::Admin);

        Capabilities {
            edit_orders: staff_or_above,
            view_all_orders: staff_or_above,
            view_customers: staff_or_above,
            manage_customers: staff_or_above,
            register_self: role == Role::Customer,
            view_reports: staff_or_above,
            manage_catalog: owner_or_admin,
            manage_subscription: role == Role::Owner,
            advance_deliveries: role == Role::Delivery,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::EditOrders => self.edit_orders,
            Capability::ViewAllOrders => self.view_all_orders,
            Capability::ViewCustomers => self.view_customers,
            Capability::ManageCustomers => self.manage_customers,
            Capability::RegisterSelf => self.register_self,
            Capability::ViewReports => self.view_reports,
            Capability::ManageCatalog => self.manage_catalog,
            Capability::ManageSubscription => self.manage_subscription,
            Capability::AdvanceDeliveries => self.advance_deliveries,
        }
    }
}

/// Fails unless `role` has `capability`.
pub fn ensure(role: Option<Role>, capability: Capability) -> CoreResult<()> {
    let Some(role) = role else {
        return Err(CoreError::NoRole);
    };
    if Capabilities::for_role(Some(role)).allows(capability) {
        Ok(())
    } else {
        Err(CoreError::Forbidden {
            role,
            action: capability.describe().to_string(),
        })
    }
}

// =============================================================================
// Data Scope
// =============================================================================

/// The slice of tenant data a signed-in user reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataScope {
    /// Owner, admin, staff: everything in the tenant.
    Tenant { tenant_id: Uuid },
    /// Orders of the customer rows linked to this profile.
    Customer { tenant_id: Uuid, profile_id: Uuid },
    /// Open deliveries assigned to this courier.
    Courier {
        tenant_id: Uuid,
        profile_id: Uuid,
        courier_name: String,
    },
}

/// Statuses a courier works on.
pub const COURIER_STATUSES: [OrderStatus; 2] = [OrderStatus::Ready, OrderStatus::InTransit];

impl DataScope {
    /// Builds the scope for a profile within a tenant. `None` without a role.
    pub fn for_profile(profile: &Profile, tenant_id: Uuid) -> Option<DataScope> {
        let scope = match profile.role? {
            Role::Owner | Role::Admin | Role::Staff => DataScope::Tenant { tenant_id },
            Role::Customer => DataScope::Customer {
                tenant_id,
                profile_id: profile.id,
            },
            Role::Delivery => DataScope::Courier {
                tenant_id,
                profile_id: profile.id,
                courier_name: profile.full_name.clone(),
            },
        };
        Some(scope)
    }

    pub fn tenant_id(&self) -> Uuid {
        match self {
            DataScope::Tenant { tenant_id }
            | DataScope::Customer { tenant_id, .. }
            | DataScope::Courier { tenant_id, .. } => *tenant_id,
        }
    }

    /// Whether customers and the customer list are readable.
    pub fn includes_customer_list(&self) -> bool {
        matches!(self, DataScope::Tenant { .. })
    }

    /// Whether `order` falls in this scope. `linked_customers` are the
    /// customer ids linked to the profile (customer scope only).
    pub fn admits(&self, order: &Order, linked_customers: &[i64]) -> bool {
        if order.tenant_id != self.tenant_id() {
            return false;
        }
        match self {
            DataScope::Tenant { .. } => true,
            DataScope::Customer { .. } => order
                .customer_id
                .map_or(false, |id| linked_customers.contains(&id)),
            DataScope::Courier {
                profile_id,
                courier_name,
                ..
            } => {
                order.delivery.kind == DeliveryKind::Delivery
                    && COURIER_STATUSES.contains(&order.status)
                    && order.is_assigned_to(*profile_id, courier_name)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::DeliveryInfo;
    use chrono::Utc;

    fn profile(role: Option<Role>, name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            tenant_id: Some(Uuid::nil()),
            full_name: name.to_string(),
            role,
            avatar_url: None,
        }
    }

    fn order(id: i64, customer_id: Option<i64>, status: OrderStatus, delivery: DeliveryInfo) -> Order {
        Order {
            id,
            tenant_id: Uuid::nil(),
            customer_id,
            customer_name: "Ana".to_string(),
            service_id: None,
            service_name: "Lavagem".to_string(),
            status,
            created_at: Utc::now(),
            total_price: Money::from_centavos(100),
            delivery,
        }
    }

    #[test]
    fn test_login_path_to_each_layout() {
        let loading = ViewState::Unauthenticated.apply(ViewEvent::LoginSubmitted);
        assert_eq!(loading, ViewState::Loading);
        assert_eq!(loading.apply(ViewEvent::ProfileResolved(Some(Role::Staff))), ViewState::Admin);
        assert_eq!(loading.apply(ViewEvent::ProfileResolved(Some(Role::Owner))), ViewState::Admin);
        assert_eq!(loading.apply(ViewEvent::ProfileResolved(Some(Role::Customer))), ViewState::Customer);
        assert_eq!(loading.apply(ViewEvent::ProfileResolved(Some(Role::Delivery))), ViewState::Delivery);
    }

    #[test]
    fn test_unknown_role_paths() {
        let loading = ViewState::Unauthenticated.apply(ViewEvent::SessionRestored);
        for event in [
            ViewEvent::ProfileResolved(None),
            ViewEvent::ProfileMissing,
            ViewEvent::ProfileFailed,
        ] {
            let state = loading.apply(event);
            assert_eq!(state, ViewState::UnknownRole);
            assert_eq!(state.actions(), &[ViewAction::SignOut]);
        }
    }

    #[test]
    fn test_auth_failure_and_sign_out() {
        assert_eq!(ViewState::Loading.apply(ViewEvent::AuthFailed), ViewState::Unauthenticated);
        for state in [ViewState::Admin, ViewState::UnknownRole, ViewState::Loading, ViewState::Delivery] {
            assert_eq!(state.apply(ViewEvent::SignedOut), ViewState::Unauthenticated);
        }
    }

    #[test]
    fn test_inapplicable_events_leave_state() {
        assert_eq!(
            ViewState::Unauthenticated.apply(ViewEvent::ProfileResolved(Some(Role::Admin))),
            ViewState::Unauthenticated
        );
        assert_eq!(ViewState::Admin.apply(ViewEvent::LoginSubmitted), ViewState::Admin);
        assert_eq!(ViewState::Customer.apply(ViewEvent::AuthFailed), ViewState::Customer);
    }

    #[test]
    fn test_capabilities_per_role() {
        let owner = Capabilities::for_role(Some(Role::Owner));
        assert!(owner.manage_subscription && owner.manage_catalog && owner.edit_orders);

        let staff = Capabilities::for_role(Some(Role::Staff));
        assert!(staff.edit_orders && staff.view_customers);
        assert!(!staff.manage_catalog && !staff.manage_subscription);

        let customer = Capabilities::for_role(Some(Role::Customer));
        assert_eq!(
            customer,
            Capabilities {
                register_self: true,
                ..Capabilities::default()
            }
        );
        assert!(!staff.register_self);

        let courier = Capabilities::for_role(Some(Role::Delivery));
        assert!(courier.advance_deliveries && !courier.edit_orders);

        assert_eq!(Capabilities::for_role(None), Capabilities::default());
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(Some(Role::Admin), Capability::EditOrders).is_ok());
        assert!(matches!(
            ensure(Some(Role::Customer), Capability::EditOrders),
            Err(CoreError::Forbidden { role: Role::Customer, .. })
        ));
        assert!(matches!(ensure(None, Capability::EditOrders), Err(CoreError::NoRole)));
    }

    #[test]
    fn test_customer_scope_admits_linked_orders_only() {
        let p = profile(Some(Role::Customer), "Ana");
        let scope = DataScope::for_profile(&p, Uuid::nil()).unwrap();
        assert!(!scope.includes_customer_list());

        assert!(scope.admits(&order(1, Some(7), OrderStatus::Pending, DeliveryInfo::default()), &[7]));
        assert!(!scope.admits(&order(2, Some(8), OrderStatus::Pending, DeliveryInfo::default()), &[7]));
        assert!(!scope.admits(&order(3, None, OrderStatus::Pending, DeliveryInfo::default()), &[7]));
    }

    #[test]
    fn test_scope_rejects_other_tenant() {
        let p = profile(Some(Role::Admin), "Ana");
        let scope = DataScope::for_profile(&p, Uuid::new_v4()).unwrap();
        assert!(!scope.admits(&order(1, Some(7), OrderStatus::Pending, DeliveryInfo::default()), &[]));
    }

    #[test]
    fn test_courier_scope() {
        let p = profile(Some(Role::Delivery), "Carlos");
        let scope = DataScope::for_profile(&p, Uuid::nil()).unwrap();
        let assigned = |status, kind, courier_id: Option<Uuid>, name: Option<&str>| {
            order(
                1,
                None,
                status,
                DeliveryInfo {
                    kind,
                    courier_id,
                    courier_name: name.map(str::to_string),
                    address: None,
                },
            )
        };

        assert!(scope.admits(&assigned(OrderStatus::Ready, DeliveryKind::Delivery, Some(p.id), None), &[]));
        assert!(scope.admits(&assigned(OrderStatus::InTransit, DeliveryKind::Delivery, None, Some("carlos")), &[]));
        assert!(!scope.admits(&assigned(OrderStatus::Delivered, DeliveryKind::Delivery, Some(p.id), None), &[]));
        assert!(!scope.admits(&assigned(OrderStatus::Ready, DeliveryKind::Pickup, Some(p.id), None), &[]));
        assert!(!scope.admits(&assigned(OrderStatus::Ready, DeliveryKind::Delivery, None, Some("Marta")), &[]));
    }

    #[test]
    fn test_no_role_no_scope() {
        assert!(DataScope::for_profile(&profile(None, "X"), Uuid::nil()).is_none());
    }
}
