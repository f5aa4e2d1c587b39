//! # Validation Module
//!
//! Input validation for LavaPro forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Console / web form                                           │
//! │  └── THIS MODULE: shape checks before any network call                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Hosted auth service                                          │
//! │  └── Password policy, duplicate accounts, code expiry                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Relational store                                             │
//! │  └── NOT NULL, row-level policies                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lavapro_core::validation::{validate_email, validate_password};
//!
//! assert_eq!(validate_email(" ana@lavapro.com ").unwrap(), "ana@lavapro.com");
//! assert!(validate_password("12345").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewCustomer, NewService};
use crate::{MIN_PASSWORD_LEN, OTP_CODE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 120;
const MAX_EMAIL_LEN: usize = 254;
const MAX_DESCRIPTION_LEN: usize = 500;

// =============================================================================
// Auth Form Validators
// =============================================================================

/// Validates an email address and returns it trimmed.
///
/// ## Rules
/// - One `@` with a non-empty local part
/// - Domain contains a dot that is neither first nor last
/// - No whitespace
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid("email", "contains whitespace"));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::invalid("email", "missing @"));
    };
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::invalid("email", "malformed address"));
    }
    let dotted = domain
        .find('.')
        .map_or(false, |pos| pos > 0 && !domain.ends_with('.'));
    if !dotted {
        return Err(ValidationError::invalid("email", "malformed domain"));
    }

    Ok(email.to_string())
}

/// Validates a password against the auth service's minimum length.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Validates an emailed one-time code (six digits) and returns it trimmed.
pub fn validate_otp_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }
    if code.len() != OTP_CODE_LEN || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid(
            "code",
            format!("must be {} digits", OTP_CODE_LEN),
        ));
    }
    Ok(code.to_string())
}

/// Validates a person's name and returns it trimmed.
pub fn validate_full_name(name: &str) -> ValidationResult<String> {
    validate_name("full_name", name)
}

fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 {
        return Err(ValidationError::required(field));
    }
    if len < MIN_NAME_LEN {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: MIN_NAME_LEN,
        });
    }
    if len > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(name.to_string())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a phone number: digits with optional `+ ( ) -` and spaces,
/// 8 to 15 digits in total.
pub fn validate_phone(phone: &str) -> ValidationResult<String> {
    let phone = phone.trim();
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | ' '))
    {
        return Err(ValidationError::invalid("phone", "unexpected character"));
    }
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(8..=15).contains(&digits) {
        return Err(ValidationError::invalid("phone", "must have 8 to 15 digits"));
    }
    Ok(phone.to_string())
}

/// Validates a price for a catalog entry.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates and trims a new customer. Blank optional fields become `None`.
pub fn validate_new_customer(input: &NewCustomer) -> ValidationResult<NewCustomer> {
    let blank_to_none = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(NewCustomer {
        name: validate_name("name", &input.name)?,
        email: blank_to_none(&input.email)
            .map(|e| validate_email(&e))
            .transpose()?,
        phone: blank_to_none(&input.phone)
            .map(|p| validate_phone(&p))
            .transpose()?,
        address: blank_to_none(&input.address),
    })
}

/// Validates and trims a new catalog entry.
pub fn validate_new_service(input: &NewService) -> ValidationResult<NewService> {
    let description = input.description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }
    validate_price(input.price)?;

    Ok(NewService {
        name: validate_name("name", &input.name)?,
        description: description.to_string(),
        price: input.price,
        icon: input
            .icon
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
