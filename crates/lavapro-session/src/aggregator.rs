//! # Data Aggregator
//!
//! Fetches the orders, customers and services a signed-in user may see and
//! computes the dashboard figures from them.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  AwaitingContext ── load(ctx) ──► Loading ──┬──► Ready(data)            │
//! │        ▲                                    ├──► Failed (logged)        │
//! │        │                                    └──► NoAccess (no role)     │
//! │        └── clear() on sign-out                                         │
//! │                                                                         │
//! │  deny(reason) ──► NoAccess    (profile without tenant)                 │
//! │                                                                         │
//! │  Until profile and tenant are resolved the state is AwaitingContext,  │
//! │  never an empty Ready: "no orders yet" and "not loaded yet" differ.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fetch
//! ```text
//!   customer scope: linked customers ──┐
//!                                      ▼
//!   ┌──────────── tokio::try_join! ─────────────┐
//!   │ orders (scoped)  customers  services      │──► DashboardStats::compute
//!   └───────────────────────────────────────────┘    build_board
//! ```
//!
//! Mutations check the role's capability and the order lifecycle, write,
//! then refresh. A failed mutation leaves the published state untouched.

use chrono::{DateTime, Utc};
use lavapro_baas::{Baas, BaasError, Normalized};
use lavapro_core::access::{ensure, Capability};
use lavapro_core::board::{build_board, recent_orders, search_orders, BoardColumn};
use lavapro_core::lifecycle::{check_transition, next_delivery_step, Transition};
use lavapro_core::validation::validate_new_customer;
use lavapro_core::{
    Capabilities, CoreError, Customer, DashboardStats, DataScope, NewCustomer, NewService, Order,
    OrderStatus, Profile, Role, Service, Tenant,
};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::generation::Generation;

/// Everything the aggregator needs to fetch: who, for which tenant.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessContext {
    pub access_token: String,
    pub profile: Profile,
    pub tenant: Tenant,
}

/// One consistent snapshot of dashboard data.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub role: Role,
    pub scope: DataScope,
    pub profile: Profile,
    pub tenant: Tenant,
    /// Newest first.
    pub orders: Vec<Order>,
    pub customers: Vec<Customer>,
    pub services: Vec<Service>,
    pub stats: DashboardStats,
    pub board: Vec<BoardColumn>,
    /// Rows dropped because they could not be normalized.
    pub skipped_rows: usize,
    pub loaded_at: DateTime<Utc>,
}

impl DashboardData {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_role(Some(self.role))
    }

    pub fn order(&self, order_id: i64) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    /// Orders matching a search box query.
    pub fn search(&self, query: &str) -> Vec<&Order> {
        search_orders(&self.orders, query)
    }

    pub fn recent(&self, limit: usize) -> Vec<&Order> {
        recent_orders(&self.orders, limit)
    }
}

/// Published aggregator state.
#[derive(Debug, Clone)]
pub enum DataState {
    /// Profile or tenant not resolved yet.
    AwaitingContext,
    Loading,
    Ready(Arc<DashboardData>),
    /// Signed in, but there is nothing this account may read.
    NoAccess { reason: String },
    /// The last fetch failed. Nothing is retried until the next refresh.
    Failed { message: String },
}

impl DataState {
    pub fn data(&self) -> Option<&Arc<DashboardData>> {
        match self {
            DataState::Ready(data) => Some(data),
            _ => None,
        }
    }
}

/// Scoped data fetching and in-memory statistics.
pub struct DataAggregator {
    baas: Baas,
    revenue_months: usize,
    context: Mutex<Option<AccessContext>>,
    state: watch::Sender<DataState>,
    generation: Generation,
}

impl DataAggregator {
    pub fn new(baas: Baas, revenue_months: usize) -> Self {
        let (state, _) = watch::channel(DataState::AwaitingContext);
        DataAggregator {
            baas,
            revenue_months,
            context: Mutex::new(None),
            state,
            generation: Generation::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DataState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DataState {
        self.state.borrow().clone()
    }

    /// The current data, when loaded.
    pub fn data(&self) -> SessionResult<Arc<DashboardData>> {
        match self.snapshot() {
            DataState::Ready(data) => Ok(data),
            DataState::NoAccess { reason } => Err(SessionError::NotReady(reason)),
            DataState::Failed { message } => Err(SessionError::NotReady(message)),
            DataState::AwaitingContext | DataState::Loading => {
                Err(SessionError::NotReady("still loading".to_string()))
            }
        }
    }

    fn context(&self) -> Option<AccessContext> {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_context(&self, context: Option<AccessContext>) {
        *self.context.lock().unwrap_or_else(PoisonError::into_inner) = context;
    }

    fn require_context(&self) -> SessionResult<AccessContext> {
        self.context()
            .ok_or_else(|| SessionError::NotReady("profile and tenant not resolved".to_string()))
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Sets the access context and fetches.
    pub async fn load(&self, context: AccessContext) -> DataState {
        self.set_context(Some(context));
        self.refresh().await
    }

    /// Back to AwaitingContext (sign-out, session change).
    pub fn clear(&self) {
        self.generation.next();
        self.set_context(None);
        self.state.send_replace(DataState::AwaitingContext);
    }

    /// Nothing to read for this account.
    pub fn deny(&self, reason: impl Into<String>) {
        self.generation.next();
        self.set_context(None);
        self.state.send_replace(DataState::NoAccess {
            reason: reason.into(),
        });
    }

    /// The context could not be resolved.
    pub fn fail(&self, message: impl Into<String>) {
        self.generation.next();
        self.set_context(None);
        self.state.send_replace(DataState::Failed {
            message: message.into(),
        });
    }

    /// Re-fetches everything for the current context.
    ///
    /// While a refresh runs, already loaded data stays visible. A result
    /// overtaken by a newer refresh is dropped.
    pub async fn refresh(&self) -> DataState {
        let Some(context) = self.context() else {
            self.state.send_replace(DataState::AwaitingContext);
            return DataState::AwaitingContext;
        };
        let Some(role) = context.profile.role else {
            let state = DataState::NoAccess {
                reason: "account has no recognized role".to_string(),
            };
            self.state.send_replace(state.clone());
            return state;
        };

        let ticket = self.generation.next();
        self.state.send_if_modified(|state| {
            if matches!(state, DataState::Ready(_)) {
                false
            } else {
                *state = DataState::Loading;
                true
            }
        });

        let result = self.fetch(&context, role).await;
        if !self.generation.is_current(ticket) {
            debug!(tenant_id = %context.tenant.id, "Dropping stale dashboard data");
            return self.snapshot();
        }

        let next = match result {
            Ok(data) => {
                info!(
                    tenant_id = %context.tenant.id,
                    role = %role,
                    orders = data.orders.len(),
                    customers = data.customers.len(),
                    services = data.services.len(),
                    skipped = data.skipped_rows,
                    "Dashboard data loaded"
                );
                DataState::Ready(Arc::new(data))
            }
            Err(e) => {
                warn!(tenant_id = %context.tenant.id, error = %e, "Dashboard data fetch failed");
                DataState::Failed {
                    message: e.to_string(),
                }
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    async fn fetch(&self, context: &AccessContext, role: Role) -> SessionResult<DashboardData> {
        let token = context.access_token.as_str();
        let tenant_id = context.tenant.id;
        let scope = DataScope::for_profile(&context.profile, tenant_id)
            .ok_or(SessionError::Rule(CoreError::NoRole))?;

        let linked = match &scope {
            DataScope::Customer { profile_id, .. } => self
                .baas
                .customers()
                .linked_to(token, tenant_id, *profile_id)
                .await
                .map_err(|e| SessionError::fetch("customers", e))?,
            _ => Vec::new(),
        };
        let linked_ids: Vec<i64> = linked.iter().map(|c| c.id).collect();

        let orders = self.baas.orders();
        let customers = self.baas.customers();
        let services = self.baas.services();
        let (orders, customers, services) = tokio::try_join!(
            async {
                orders
                    .list(token, &scope, &linked_ids)
                    .await
                    .map_err(|e| SessionError::fetch("orders", e))
            },
            async {
                if scope.includes_customer_list() {
                    customers
                        .list(token, tenant_id)
                        .await
                        .map_err(|e| SessionError::fetch("customers", e))
                } else {
                    Ok(Normalized {
                        items: linked.clone(),
                        skipped: 0,
                    })
                }
            },
            async {
                services
                    .list_for_tenant(token, tenant_id)
                    .await
                    .map_err(|e| SessionError::fetch("services", e))
            },
        )?;

        let loaded_at = Utc::now();
        let stats = DashboardStats::compute(
            &orders.items,
            customers.items.len(),
            loaded_at,
            self.revenue_months,
        );
        let board = build_board(&orders.items);

        Ok(DashboardData {
            role,
            scope,
            profile: context.profile.clone(),
            tenant: context.tenant.clone(),
            skipped_rows: orders.skipped + customers.skipped + services.skipped,
            orders: orders.items,
            customers: customers.items,
            services: services.items,
            stats,
            board,
            loaded_at,
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    async fn current_order(&self, context: &AccessContext, order_id: i64, action: &'static str) -> SessionResult<Order> {
        self.baas
            .orders()
            .get(&context.access_token, context.tenant.id, order_id)
            .await
            .map_err(|e| match e {
                BaasError::NotFound { .. } => SessionError::Rule(CoreError::OrderNotFound(order_id)),
                other => SessionError::mutation(action, other),
            })
    }

    /// Moves an order to `status` (staff and above).
    ///
    /// Requesting the status the order already has writes nothing and
    /// returns [`Transition::Unchanged`].
    pub async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> SessionResult<Transition> {
        const ACTION: &str = "update the order status";
        let context = self.require_context()?;
        ensure(context.profile.role, Capability::EditOrders)?;

        let order = self.current_order(&context, order_id, ACTION).await?;
        let transition = check_transition(&order, status)?;
        if transition == Transition::Unchanged {
            debug!(order_id, status = %status, "Order already has the requested status");
            return Ok(transition);
        }

        self.baas
            .orders()
            .update_status(&context.access_token, context.tenant.id, order_id, status)
            .await
            .map_err(|e| SessionError::mutation(ACTION, e))?;
        info!(order_id, from = %order.status, to = %status, "Order moved");

        self.refresh().await;
        Ok(transition)
    }

    /// Moves an assigned delivery one step: ready → in transit → delivered.
    pub async fn advance_delivery(&self, order_id: i64) -> SessionResult<OrderStatus> {
        const ACTION: &str = "advance the delivery";
        let context = self.require_context()?;
        ensure(context.profile.role, Capability::AdvanceDeliveries)?;
        let scope = DataScope::for_profile(&context.profile, context.tenant.id)
            .ok_or(SessionError::Rule(CoreError::NoRole))?;

        let order = self.current_order(&context, order_id, ACTION).await?;
        if !scope.admits(&order, &[]) {
            return Err(SessionError::Rule(CoreError::OrderNotFound(order_id)));
        }
        let next = next_delivery_step(order.status).ok_or(SessionError::Rule(
            CoreError::InvalidStatusTransition {
                order_id,
                from: order.status,
                to: OrderStatus::Delivered,
            },
        ))?;
        check_transition(&order, next)?;

        self.baas
            .orders()
            .update_status(&context.access_token, context.tenant.id, order_id, next)
            .await
            .map_err(|e| SessionError::mutation(ACTION, e))?;
        info!(order_id, from = %order.status, to = %next, "Delivery advanced");

        self.refresh().await;
        Ok(next)
    }

    /// Registers a customer (staff and above).
    pub async fn create_customer(&self, input: &NewCustomer) -> SessionResult<Customer> {
        let context = self.require_context()?;
        ensure(context.profile.role, Capability::ManageCustomers)?;

        let customer = self
            .baas
            .customers()
            .insert(&context.access_token, context.tenant.id, input)
            .await
            .map_err(|e| SessionError::mutation("register the customer", e))?;

        self.refresh().await;
        Ok(customer)
    }

    /// Creates the signed-in customer's own customer row, linked to their
    /// profile. Refused when the profile already has one.
    pub async fn register_self(&self, input: &NewCustomer) -> SessionResult<Customer> {
        const ACTION: &str = "complete the registration";
        let input = validate_new_customer(input)?;
        let context = self.require_context()?;
        ensure(context.profile.role, Capability::RegisterSelf)?;

        let customers = self.baas.customers();
        let linked = customers
            .linked_to(&context.access_token, context.tenant.id, context.profile.id)
            .await
            .map_err(|e| SessionError::mutation(ACTION, e))?;
        if !linked.is_empty() {
            return Err(SessionError::Rule(CoreError::AlreadyRegistered));
        }

        let customer = customers
            .register_self(&context.access_token, context.tenant.id, context.profile.id, &input)
            .await
            .map_err(|e| SessionError::mutation(ACTION, e))?;

        self.refresh().await;
        Ok(customer)
    }

    /// Adds a catalog entry (owner and admin).
    pub async fn create_service(&self, input: &NewService) -> SessionResult<Service> {
        let context = self.require_context()?;
        ensure(context.profile.role, Capability::ManageCatalog)?;

        let service = self
            .baas
            .services()
            .insert(&context.access_token, context.tenant.id, input)
            .await
            .map_err(|e| SessionError::mutation("add the service", e))?;

        self.refresh().await;
        Ok(service)
    }
}
