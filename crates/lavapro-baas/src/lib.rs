//! # lavapro-baas: Hosted Backend Access for LavaPro
//!
//! Every call LavaPro makes to the hosted auth and table API goes through
//! this crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lavapro-session (resolvers, aggregator)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  lavapro-baas (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │   │
//! │  │   │ Repositories │──►│    Query     │──►│   dyn Backend    │   │   │
//! │  │   │ orders       │   │ eq / in / or │   │ ├── HttpBackend  │   │   │
//! │  │   │ customers    │   │ order, limit │   │ └── MemoryBackend│   │   │
//! │  │   │ services ... │   │ embeds       │   │     (demo, tests)│   │   │
//! │  │   └──────────────┘   └──────────────┘   └──────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  /auth/v1/*     /rest/v1/{profiles,tenants,customers,services,orders}  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - URL and anon key from the environment
//! - [`client`] - the [`Backend`] trait and auth types
//! - [`http`] - reqwest implementation
//! - [`memory`] - in-process implementation with emulated row policies
//! - [`demo`] - demo dataset for the memory backend
//! - [`query`] - table query builder
//! - [`repository`] - typed repositories
//! - [`error`] - error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lavapro_baas::{Baas, BaasConfig};
//!
//! let baas = Baas::http(BaasConfig::from_env()?)?;
//! let session = baas.backend().sign_in_with_password(email, password).await?;
//! let profile = baas.profiles().get(&session.access_token, session.user.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod http;
pub mod memory;
pub mod query;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{AuthSession, AuthUser, Backend, SignUpOutcome};
pub use config::BaasConfig;
pub use error::{BaasError, BaasResult};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
pub use query::Query;
pub use repository::{
    CustomerRepository, Normalized, OrderRepository, ProfileRepository, ServiceRepository,
    TenantRepository,
};

use std::sync::Arc;

/// Shared handle to a backend and its repositories.
///
/// Cloning is cheap; every clone talks to the same backend.
#[derive(Clone)]
pub struct Baas {
    backend: Arc<dyn Backend>,
}

impl Baas {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Baas { backend }
    }

    /// Connects to the hosted project described by `config`.
    pub fn http(config: BaasConfig) -> BaasResult<Self> {
        Ok(Self::new(Arc::new(HttpBackend::new(config)?)))
    }

    /// An in-process backend seeded with the demo dataset.
    pub fn demo() -> Self {
        Self::new(Arc::new(demo::demo_backend()))
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn profiles(&self) -> ProfileRepository {
        ProfileRepository::new(Arc::clone(&self.backend))
    }

    pub fn tenants(&self) -> TenantRepository {
        TenantRepository::new(Arc::clone(&self.backend))
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(Arc::clone(&self.backend))
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(Arc::clone(&self.backend))
    }

    pub fn services(&self) -> ServiceRepository {
        ServiceRepository::new(Arc::clone(&self.backend))
    }
}

impl std::fmt::Debug for Baas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Baas").finish_non_exhaustive()
    }
}
