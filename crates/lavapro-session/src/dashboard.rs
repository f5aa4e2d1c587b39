//! # Dashboard
//!
//! Owns every service and runs the resolution chain after each session
//! change.
//!
//! ## Resolution Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  session ──► profile ──► tenant ──► data                               │
//! │     │           │           │          │                                │
//! │     │           │           │          └─ Ready / Failed                │
//! │     │           │           ├─ NoTenant ──────► data: NoAccess          │
//! │     │           │           └─ Failed ────────► data: Failed            │
//! │     │           ├─ Ready(role) ──► router: ProfileResolved(role)        │
//! │     │           ├─ Missing ──────► router: ProfileMissing               │
//! │     │           └─ Failed ───────► router: ProfileFailed                │
//! │     └─ none ──► everything cleared, router: SignedOut                   │
//! │                                                                         │
//! │  Each run takes a ticket. After every await the run checks that its    │
//! │  ticket is newest and the session it started with is still current;    │
//! │  otherwise it stops without touching router, tenant or data.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Signing in while a session exists signs the old user out first, so the
//! view always passes through `Unauthenticated` and `Loading`.
//!
//! All services share one backend handle; there is no global state.

use lavapro_baas::{AuthSession, Baas, SignUpOutcome};
use lavapro_core::lifecycle::Transition;
use lavapro_core::{
    Capabilities, Customer, NewCustomer, NewService, OrderStatus, Role, Service,
    SubscriptionStatus, ViewEvent, ViewState, DEFAULT_REVENUE_MONTHS,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::aggregator::{AccessContext, DataAggregator, DataState};
use crate::error::{SessionError, SessionResult};
use crate::generation::{Generation, Ticket};
use crate::notify::Notifier;
use crate::profile::{ProfileResolver, ProfileState};
use crate::router::ViewRouter;
use crate::session::SessionStore;
use crate::tenant::{TenantResolver, TenantState};

/// Tunables for a [`Dashboard`].
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Months on the revenue chart.
    pub revenue_months: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        DashboardOptions {
            revenue_months: DEFAULT_REVENUE_MONTHS,
        }
    }
}

/// What the settings page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: String,
    pub role: Option<Role>,
    pub role_label: String,
    pub avatar_url: Option<String>,
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_label: String,
    pub capabilities: Capabilities,
}

/// The whole dashboard: session, resolvers, data, view and notifications.
pub struct Dashboard {
    baas: Baas,
    session: SessionStore,
    profiles: ProfileResolver,
    tenants: TenantResolver,
    data: DataAggregator,
    router: ViewRouter,
    notifier: Notifier,
    syncs: Generation,
}

impl Dashboard {
    pub fn new(baas: Baas, options: DashboardOptions) -> Self {
        Dashboard {
            session: SessionStore::new(baas.backend().clone()),
            profiles: ProfileResolver::new(baas.profiles()),
            tenants: TenantResolver::new(baas.tenants()),
            data: DataAggregator::new(baas.clone(), options.revenue_months),
            router: ViewRouter::new(),
            notifier: Notifier::new(),
            syncs: Generation::new(),
            baas,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn profiles(&self) -> &ProfileResolver {
        &self.profiles
    }

    pub fn tenants(&self) -> &TenantResolver {
        &self.tenants
    }

    pub fn data(&self) -> &DataAggregator {
        &self.data
    }

    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn view(&self) -> ViewState {
        self.router.current()
    }

    // =========================================================================
    // Session Changes
    // =========================================================================

    /// Start-up: restores a stored session and resolves everything.
    pub async fn start(&self, stored: Option<AuthSession>) -> ViewState {
        if stored.is_some() {
            self.router.apply(ViewEvent::SessionRestored);
        }
        let restored = self.session.restore(stored).await;
        if restored.is_none() {
            self.router.apply(ViewEvent::AuthFailed);
        }
        self.sync().await
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> SessionResult<ViewState> {
        self.end_current_session().await;
        self.router.apply(ViewEvent::LoginSubmitted);
        match self.session.sign_in_with_password(email, password).await {
            Ok(_) => Ok(self.sync().await),
            Err(e) => Err(self.auth_failed(e)),
        }
    }

    pub async fn send_magic_link(&self, email: &str, redirect_to: Option<&str>) -> SessionResult<()> {
        match self.session.send_magic_link(email, redirect_to).await {
            Ok(()) => {
                self.notifier.info(format!("Link de acesso enviado para {}", email.trim()));
                Ok(())
            }
            Err(e) => {
                self.notifier.error(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> SessionResult<ViewState> {
        self.end_current_session().await;
        self.router.apply(ViewEvent::LoginSubmitted);
        match self.session.verify_otp(email, code).await {
            Ok(_) => Ok(self.sync().await),
            Err(e) => Err(self.auth_failed(e)),
        }
    }

    /// Registers an account. Returns the outcome and the resulting view.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> SessionResult<(SignUpOutcome, ViewState)> {
        self.end_current_session().await;
        self.router.apply(ViewEvent::LoginSubmitted);
        match self.session.sign_up(email, password, full_name).await {
            Ok(outcome @ SignUpOutcome::SignedIn(_)) => Ok((outcome, self.sync().await)),
            Ok(outcome @ SignUpOutcome::ConfirmationRequired { .. }) => {
                self.notifier.info("Verifique seu email para confirmar a conta");
                Ok((outcome, self.router.apply(ViewEvent::AuthFailed)))
            }
            Err(e) => Err(self.auth_failed(e)),
        }
    }

    /// Refreshes the access token. The profile is kept: same user.
    pub async fn refresh_session(&self) -> SessionResult<AuthSession> {
        let session = self.session.refresh().await?;
        self.sync().await;
        Ok(session)
    }

    pub async fn sign_out(&self) -> ViewState {
        self.session.sign_out().await;
        self.sync().await
    }

    /// Signs out whoever is signed in before another sign-in starts.
    async fn end_current_session(&self) {
        if let Some(previous) = self.session.current() {
            info!(user_id = %previous.user.id, "Ending current session for a new sign-in");
            self.sign_out().await;
        }
    }

    fn auth_failed(&self, err: SessionError) -> SessionError {
        self.router.apply(ViewEvent::AuthFailed);
        self.notifier.error(err.to_string());
        err
    }

    /// Runs session → profile → tenant → data and updates the view.
    ///
    /// A run overtaken by a newer one (or by a session change) returns the
    /// current view and leaves everything to the newer run.
    pub async fn sync(&self) -> ViewState {
        let ticket = self.syncs.next();
        let Some(session) = self.session.current() else {
            self.profiles.clear();
            self.tenants.clear();
            self.data.clear();
            return self.router.apply(ViewEvent::SignedOut);
        };

        let profile_state = self.profiles.resolve(Some(&session)).await;
        if !self.is_current(ticket, &session) || profile_state.user_id() != Some(session.user.id) {
            return self.superseded(&session);
        }
        let view = match &profile_state {
            ProfileState::Ready(profile) => self.router.apply(ViewEvent::ProfileResolved(profile.role)),
            ProfileState::Missing { .. } => self.router.apply(ViewEvent::ProfileMissing),
            ProfileState::Failed { .. } => self.router.apply(ViewEvent::ProfileFailed),
            ProfileState::Idle | ProfileState::Loading { .. } => self.router.current(),
        };

        let Some(profile) = profile_state.profile() else {
            self.tenants.clear();
            self.data.deny("no profile for this account");
            return view;
        };
        if profile.role.is_none() {
            self.tenants.clear();
            self.data.deny("account has no recognized role");
            return view;
        }

        let tenant_state = self.tenants.resolve(&session.access_token, Some(profile)).await;
        if !self.is_current(ticket, &session) {
            return self.superseded(&session);
        }
        match tenant_state {
            TenantState::Ready(tenant) => {
                let state = self
                    .data
                    .load(AccessContext {
                        access_token: session.access_token.clone(),
                        profile: profile.clone(),
                        tenant,
                    })
                    .await;
                if let DataState::Failed { message } = &state {
                    debug!(%message, "Dashboard shows degraded data");
                }
            }
            TenantState::NoTenant => self.data.deny("account is not linked to a laundry"),
            TenantState::Failed { message, .. } => self.data.fail(message),
            TenantState::Idle | TenantState::Loading { .. } => {}
        }
        view
    }

    /// Whether a sync run holding `ticket` for `session` is still the newest.
    fn is_current(&self, ticket: Ticket, session: &AuthSession) -> bool {
        self.syncs.is_current(ticket)
            && self.session.current().map_or(false, |now| {
                now.user.id == session.user.id && now.access_token == session.access_token
            })
    }

    fn superseded(&self, session: &AuthSession) -> ViewState {
        debug!(user_id = %session.user.id, "Dropping superseded sync");
        self.router.current()
    }

    // =========================================================================
    // Data Operations
    // =========================================================================

    /// Manual refresh.
    pub async fn refresh(&self) -> DataState {
        self.data.refresh().await
    }

    pub async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> SessionResult<Transition> {
        let result = self.data.update_order_status(order_id, status).await;
        match &result {
            Ok(Transition::Move) => {
                self.notifier
                    .success(format!("Pedido #{} agora está {}", order_id, status.label_pt()));
            }
            Ok(Transition::Unchanged) => {
                self.notifier
                    .info(format!("Pedido #{} já está {}", order_id, status.label_pt()));
            }
            Err(e) => {
                self.notifier.error(e.to_string());
            }
        }
        result
    }

    pub async fn advance_delivery(&self, order_id: i64) -> SessionResult<OrderStatus> {
        let result = self.data.advance_delivery(order_id).await;
        match &result {
            Ok(status) => {
                self.notifier
                    .success(format!("Pedido #{}: {}", order_id, status.label_pt()));
            }
            Err(e) => {
                self.notifier.error(e.to_string());
            }
        }
        result
    }

    pub async fn create_customer(&self, input: &NewCustomer) -> SessionResult<Customer> {
        let result = self.data.create_customer(input).await;
        match &result {
            Ok(customer) => {
                self.notifier.success(format!("Cliente {} cadastrado", customer.name));
            }
            Err(e) => {
                self.notifier.error(e.to_string());
            }
        }
        result
    }

    /// Self-registration of a signed-up customer.
    pub async fn register_self(&self, input: &NewCustomer) -> SessionResult<Customer> {
        let result = self.data.register_self(input).await;
        match &result {
            Ok(customer) => {
                self.notifier.success(format!("Cadastro de {} concluído", customer.name));
            }
            Err(e) => {
                self.notifier.error(e.to_string());
            }
        }
        result
    }

    pub async fn create_service(&self, input: &NewService) -> SessionResult<Service> {
        let result = self.data.create_service(input).await;
        match &result {
            Ok(service) => {
                self.notifier.success(format!("Serviço {} adicionado", service.name));
            }
            Err(e) => {
                self.notifier.error(e.to_string());
            }
        }
        result
    }

    // =========================================================================
    // Pages
    // =========================================================================

    /// Account and laundry summary.
    pub fn settings(&self) -> SessionResult<Settings> {
        let session = self.session.current().ok_or(SessionError::NotSignedIn)?;
        let profile_state = self.profiles.snapshot();
        let profile = profile_state
            .profile()
            .ok_or_else(|| SessionError::NotReady("profile not resolved".to_string()))?;
        let tenant_state = self.tenants.snapshot();
        let tenant = tenant_state
            .tenant()
            .ok_or_else(|| SessionError::NotReady("laundry not resolved".to_string()))?;

        Ok(Settings {
            user_id: session.user.id,
            email: session.user.email.clone(),
            full_name: profile.full_name.clone(),
            role: profile.role,
            role_label: profile
                .role
                .map_or("Sem função", |r| r.label_pt())
                .to_string(),
            avatar_url: profile.avatar_url.clone(),
            tenant_id: tenant.id,
            tenant_name: tenant.name.clone(),
            subscription_status: tenant.subscription_status,
            subscription_label: tenant.subscription_status.label_pt().to_string(),
            capabilities: Capabilities::for_role(profile.role),
        })
    }

    /// The public service catalog. No sign-in needed.
    pub async fn catalog(&self) -> SessionResult<Vec<Service>> {
        let services = self
            .baas
            .services()
            .list_public()
            .await
            .map_err(|e| SessionError::fetch("catalog", e))?;
        info!(count = services.items.len(), "Catalog listed");
        Ok(services.items)
    }
}
