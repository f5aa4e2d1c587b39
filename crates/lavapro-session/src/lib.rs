//! # lavapro-session: Dashboard Services
//!
//! The stateful half of LavaPro: who is signed in, which profile and
//! laundry they belong to, what data they may see, and which layout shows.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dashboard (dashboard.rs)                         │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌─────────┐  │
//! │  │ SessionStore │──►│ Profile      │──►│ Tenant       │──►│ Data    │  │
//! │  │ session.rs   │   │ Resolver     │   │ Resolver     │   │ Aggreg. │  │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘   └─────────┘  │
//! │                            ▼                                            │
//! │                     ┌──────────────┐   ┌──────────────┐                 │
//! │                     │ ViewRouter   │   │ Notifier     │                 │
//! │                     └──────────────┘   └──────────────┘                 │
//! │                                                                         │
//! │  Each service publishes its state on a tokio watch channel. Fetches    │
//! │  carry a generation ticket; superseded results are dropped.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`] - auth session, sign-in flows, auth events
//! - [`profile`] - user → profile row
//! - [`tenant`] - profile → tenant row
//! - [`aggregator`] - scoped data, statistics, mutations
//! - [`router`] - role-based view state
//! - [`notify`] - transient notifications
//! - [`dashboard`] - orchestration
//! - [`generation`] - stale-result guard
//! - [`error`] - error taxonomy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lavapro_baas::Baas;
//! use lavapro_session::{Dashboard, DashboardOptions};
//!
//! let dashboard = Dashboard::new(Baas::demo(), DashboardOptions::default());
//! dashboard.sign_in_with_password("admin@bolhaazul.com.br", "lavapro123").await?;
//! let data = dashboard.data().data()?;
//! println!("{}", data.stats.total_revenue);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod dashboard;
pub mod error;
pub mod generation;
pub mod notify;
pub mod profile;
pub mod router;
pub mod session;
pub mod tenant;

// =============================================================================
// Re-exports
// =============================================================================

pub use aggregator::{AccessContext, DashboardData, DataAggregator, DataState};
pub use dashboard::{Dashboard, DashboardOptions, Settings};
pub use error::{ErrorKind, SessionError, SessionResult};
pub use notify::{Notification, NotificationKind, Notifier};
pub use profile::{ProfileResolver, ProfileState};
pub use router::ViewRouter;
pub use session::{AuthEvent, SessionState, SessionStore};
pub use tenant::{TenantResolver, TenantState};
