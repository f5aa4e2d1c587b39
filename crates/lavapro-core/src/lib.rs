//! # lavapro-core: Pure Domain Logic for the LavaPro Dashboard
//!
//! This crate is the **heart** of the LavaPro dashboard. It contains every
//! rule the dashboard applies to laundry orders as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        LavaPro Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/console (`lavapro` CLI)                    │   │
//! │  │     login ──► dashboard ──► orders ──► set-status ──► board     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          lavapro-session (session, resolvers, aggregator)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ lavapro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐  │   │
//! │  │  │  types  │ │  money  │ │ schema  │ │  stats  │ │  access  │  │   │
//! │  │  │ Order   │ │ Money   │ │ legacy  │ │ revenue │ │ router   │  │   │
//! │  │  │ Profile │ │ R$ fmt  │ │ rows →  │ │ buckets │ │ roles    │  │   │
//! │  │  │ Tenant  │ │         │ │ v4      │ │ board   │ │ scopes   │  │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            lavapro-baas (hosted auth + table API)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, Customer, Service, Profile, Tenant)
//! - [`money`] - Money type with integer centavos (no floating point!)
//! - [`lifecycle`] - Order status transitions
//! - [`schema`] - Normalization of rows from older schema revisions
//! - [`stats`] - Revenue, ticket and monthly bucket computation
//! - [`board`] - Status board columns and order search
//! - [`access`] - View state machine, role capabilities, data scopes
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`text`] - Label folding shared by parsing and search
//!
//! ## Example Usage
//!
//! ```rust
//! use lavapro_core::money::Money;
//!
//! let price = Money::parse_decimal("25.5").unwrap();
//! assert_eq!(price.centavos(), 2550);
//! assert_eq!(price.to_string(), "R$ 25,50");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod board;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod schema;
pub mod stats;
pub mod text;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{Capabilities, DataScope, ViewEvent, ViewState};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use stats::DashboardStats;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Version of the canonical order schema used above the data-access boundary.
///
/// Rows written by older dashboard snapshots are normalized to this shape by
/// [`schema::normalize_order`].
pub const SCHEMA_VERSION: u32 = 4;

/// Number of months shown in the revenue series by default.
pub const DEFAULT_REVENUE_MONTHS: usize = 6;

/// How long a notification stays visible, in seconds.
pub const NOTIFICATION_TTL_SECS: u64 = 5;

/// Minimum password length accepted by the hosted auth service.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Number of digits in an emailed one-time sign-in code.
pub const OTP_CODE_LEN: usize = 6;
