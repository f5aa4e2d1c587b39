//! Tenant resolver: profile.tenant_id → tenant row.
//!
//! Purely derived from the profile. Every resolve fetches; nothing is cached.

use lavapro_baas::TenantRepository;
use lavapro_core::{Profile, Tenant};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::generation::Generation;

/// Resolution state of the current tenant.
#[derive(Debug, Clone, PartialEq)]
pub enum TenantState {
    Idle,
    Loading { tenant_id: Uuid },
    /// The profile is not attached to any tenant.
    NoTenant,
    Ready(Tenant),
    Failed { tenant_id: Uuid, message: String },
}

impl TenantState {
    pub fn tenant(&self) -> Option<&Tenant> {
        match self {
            TenantState::Ready(tenant) => Some(tenant),
            _ => None,
        }
    }
}

/// Fetches and publishes the current tenant.
pub struct TenantResolver {
    tenants: TenantRepository,
    state: watch::Sender<TenantState>,
    generation: Generation,
}

impl TenantResolver {
    pub fn new(tenants: TenantRepository) -> Self {
        let (state, _) = watch::channel(TenantState::Idle);
        TenantResolver {
            tenants,
            state,
            generation: Generation::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TenantState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> TenantState {
        self.state.borrow().clone()
    }

    /// Resolves the tenant of `profile`. `None` (no resolved profile) clears.
    pub async fn resolve(&self, access_token: &str, profile: Option<&Profile>) -> TenantState {
        let ticket = self.generation.next();
        let Some(profile) = profile else {
            self.state.send_replace(TenantState::Idle);
            return TenantState::Idle;
        };
        let Some(tenant_id) = profile.tenant_id else {
            info!(profile_id = %profile.id, "Profile has no tenant");
            self.state.send_replace(TenantState::NoTenant);
            return TenantState::NoTenant;
        };

        self.state.send_replace(TenantState::Loading { tenant_id });
        let result = self.tenants.get(access_token, tenant_id).await;
        if !self.generation.is_current(ticket) {
            debug!(%tenant_id, "Dropping stale tenant result");
            return self.snapshot();
        }

        let next = match result {
            Ok(tenant) => {
                debug!(%tenant_id, name = %tenant.name, "Tenant resolved");
                TenantState::Ready(tenant)
            }
            Err(e) => {
                warn!(%tenant_id, error = %e, "Tenant fetch failed");
                TenantState::Failed {
                    tenant_id,
                    message: e.to_string(),
                }
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    pub fn clear(&self) {
        self.generation.next();
        self.state.send_replace(TenantState::Idle);
    }
}
