//! # Repository Module
//!
//! Typed access to the backend's tables.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Data Aggregator                                                        │
//! │       │                                                                 │
//! │       │  baas.orders().list(token, &scope, &linked)                    │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── builds a Query scoped by tenant_id                                │
//! │  ├── sends it through dyn Backend                                      │
//! │  └── normalizes each row to lavapro-core types                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Normalized { items, skipped }                                         │
//! │                                                                         │
//! │  A row that cannot be normalized is logged and skipped; it never fails │
//! │  the whole listing.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProfileRepository`] - profile by user id
//! - [`TenantRepository`] - tenant by id
//! - [`OrderRepository`] - scoped listing, status updates
//! - [`CustomerRepository`] - listing, linked customers, creation
//! - [`ServiceRepository`] - tenant and public catalog, creation

pub mod customer;
pub mod order;
pub mod profile;
pub mod service;
pub mod tenant;

pub use customer::CustomerRepository;
pub use order::OrderRepository;
pub use profile::ProfileRepository;
pub use service::ServiceRepository;
pub use tenant::TenantRepository;

use lavapro_core::ValidationError;
use serde_json::Value;
use tracing::warn;

/// Rows that normalized, plus how many did not.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> Normalized<T> {
    pub fn empty() -> Self {
        Normalized {
            items: Vec::new(),
            skipped: 0,
        }
    }
}

/// Normalizes every row, skipping (and logging) the ones that fail.
pub(crate) fn normalize_rows<T>(
    table: &str,
    rows: Vec<Value>,
    normalize: impl Fn(&Value) -> Result<T, ValidationError>,
) -> Normalized<T> {
    let mut items = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for row in &rows {
        match normalize(row) {
            Ok(item) => items.push(item),
            Err(e) => {
                skipped += 1;
                warn!(
                    table,
                    row_id = %row.get("id").map(|v| v.to_string()).unwrap_or_default(),
                    error = %e,
                    "Skipping row that cannot be normalized"
                );
            }
        }
    }
    Normalized { items, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_rows_skips_failures() {
        let rows = vec![json!({ "id": 1 }), json!({ "id": "x" }), json!({ "id": 3 })];
        let result = normalize_rows("t", rows, |row| {
            row["id"]
                .as_i64()
                .ok_or_else(|| ValidationError::invalid("id", "not an integer"))
        });
        assert_eq!(result.items, vec![1, 3]);
        assert_eq!(result.skipped, 1);
    }
}
