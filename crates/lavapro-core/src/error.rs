//! # Error Types
//!
//! Domain-specific error types for lavapro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lavapro-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input / row validation failures                │
//! │                                                                         │
//! │  lavapro-baas errors (separate crate)                                  │
//! │  └── BaasError        - Backend call failures                          │
//! │                                                                         │
//! │  lavapro-session errors (separate crate)                               │
//! │  └── SessionError     - What the dashboard reports (categorized)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → BaasError → SessionError → CLI    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{OrderStatus, Role};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested status change is not part of the order lifecycle.
    ///
    /// ## When This Occurs
    /// - Moving a delivered or canceled order anywhere
    /// - Skipping backwards (ready → pending)
    /// - Putting a pickup order in transit
    #[error("Order #{order_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The signed-in role is not allowed to perform the action.
    #[error("Role {role} is not allowed to {action}")]
    Forbidden { role: Role, action: String },

    /// The profile has no recognized role, so no capability applies.
    #[error("Account has no recognized role")]
    NoRole,

    /// The order is not part of the caller's visible set.
    #[error("Order #{0} not found")]
    OrderNotFound(i64),

    /// The profile already has a customer row.
    #[error("Account is already registered as a customer")]
    AlreadyRegistered,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised for user input before any network call, and for backend rows that
/// cannot be normalized to the canonical schema.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid email, invalid amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_message() {
        let err = CoreError::InvalidStatusTransition {
            order_id: 42,
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Order #42 cannot move from delivered to pending"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("email").to_string(), "email is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
