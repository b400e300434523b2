//! # Validation Module
//!
//! Boundary validation for booking, charge and catalog inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Engine request DTOs (hotelier-engine)                        │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation, before any write           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repositories (hotelier-db)                                   │
//! │  └── State checks inside the transaction (status, stay window)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (amounts, participants, date order)             │
//! │  ├── Foreign keys                                                      │
//! │  └── Overlap triggers                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hotelier_core::validation::{validate_guest_counts, validate_participants};
//!
//! validate_guest_counts(2, 1).unwrap();
//! assert!(validate_participants(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{Residency, StayDates};
use crate::MAX_STAY_NIGHTS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MAX_PHONE_LEN: usize = 20;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_ROOM_NUMBER_LEN: usize = 20;
const MAX_DOCUMENT_LEN: usize = 32;

/// Largest single charge or price accepted, in cents (10 billion LKR).
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Largest party that can be booked onto one activity.
pub const MAX_PARTICIPANTS: i64 = 100;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a guest name part (first or last name).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name, MAX_NAME_LEN)
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Exactly one `@`, with a non-empty local part and a dotted domain
///
/// ## Example
/// ```rust
/// use hotelier_core::validation::validate_email;
///
/// assert!(validate_email("guest@example.com").is_ok());
/// assert!(validate_email("guest@localhost").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("email", email, MAX_EMAIL_LEN)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let email = email.trim();
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing '@'"))?;

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must look like name@domain"));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    Ok(())
}

/// Validates a phone number.
///
/// ## Rules
/// - Digits plus optional `+`, spaces, hyphens and parentheses
/// - At least 7 digits
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    required("phone", phone, MAX_PHONE_LEN)?;

    let phone = phone.trim();
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces, '+', '-' and parentheses".to_string(),
        });
    }

    if phone.chars().filter(char::is_ascii_digit).count() < 7 {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain at least 7 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates the identity document against the guest's residency.
///
/// ## Rules
/// ```text
/// ┌──────────────┬───────────────────┬────────────────────┐
/// │  Residency   │   national_id     │  passport_number   │
/// ├──────────────┼───────────────────┼────────────────────┤
/// │  Resident    │   required        │  must be absent    │
/// │  NonResident │   must be absent  │  required          │
/// └──────────────┴───────────────────┴────────────────────┘
/// ```
///
/// ## Example
/// ```rust
/// use hotelier_core::types::Residency;
/// use hotelier_core::validation::validate_identity;
///
/// assert!(validate_identity(Residency::Resident, Some("199012345678"), None).is_ok());
/// assert!(validate_identity(Residency::NonResident, None, Some("N1234567")).is_ok());
/// assert!(validate_identity(Residency::NonResident, Some("199012345678"), Some("N1234567")).is_err());
/// ```
pub fn validate_identity(
    residency: Residency,
    national_id: Option<&str>,
    passport_number: Option<&str>,
) -> ValidationResult<()> {
    let national_id = national_id.map(str::trim).filter(|s| !s.is_empty());
    let passport_number = passport_number.map(str::trim).filter(|s| !s.is_empty());

    let (field, value, other_field, other) = match residency {
        Residency::Resident => ("national_id", national_id, "passport_number", passport_number),
        Residency::NonResident => ("passport_number", passport_number, "national_id", national_id),
    };

    if other.is_some() {
        return Err(ValidationError::MutuallyExclusive {
            field: other_field.to_string(),
            other: field.to_string(),
        });
    }

    let value = value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })?;

    if value.len() > MAX_DOCUMENT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_DOCUMENT_LEN,
        });
    }

    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a room number (the room's external key).
pub fn validate_room_number(room_number: &str) -> ValidationResult<()> {
    required("room_number", room_number, MAX_ROOM_NUMBER_LEN)?;

    if !room_number
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "room_number".to_string(),
            reason: "must contain only letters, numbers and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a free-text description (extra charges, catalog entries).
pub fn validate_description(field: &str, text: &str) -> ValidationResult<()> {
    required(field, text, MAX_DESCRIPTION_LEN)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the party size.
///
/// ## Rules
/// - At least one adult
/// - Children must not be negative
pub fn validate_guest_counts(adults: i64, children: i64) -> ValidationResult<()> {
    if adults < 1 {
        return Err(ValidationError::MustBePositive {
            field: "adults".to_string(),
        });
    }

    if children < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "children".to_string(),
        });
    }

    Ok(())
}

/// Validates an activity participant count (1 to [`MAX_PARTICIPANTS`]).
pub fn validate_participants(participants: i64) -> ValidationResult<()> {
    if participants < 1 {
        return Err(ValidationError::MustBePositive {
            field: "participants".to_string(),
        });
    }

    if participants > MAX_PARTICIPANTS {
        return Err(ValidationError::OutOfRange {
            field: "participants".to_string(),
            min: 1,
            max: MAX_PARTICIPANTS,
        });
    }

    Ok(())
}

/// Validates a charge or price amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (complimentary items)
/// - At most [`MAX_AMOUNT_CENTS`]
///
/// ## Example
/// ```rust
/// use hotelier_core::validation::{validate_amount_cents, MAX_AMOUNT_CENTS};
///
/// assert!(validate_amount_cents("amount", 2_500).is_ok());
/// assert!(validate_amount_cents("amount", 0).is_ok());
/// assert!(validate_amount_cents("amount", -100).is_err());
/// assert!(validate_amount_cents("amount", MAX_AMOUNT_CENTS + 1).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a package multiplier in basis points (≥ 10000, i.e. ×1.00).
pub fn validate_multiplier_bps(bps: i64) -> ValidationResult<()> {
    if !(10_000..=100_000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "multiplier_bps".to_string(),
            min: 10_000,
            max: 100_000,
        });
    }

    Ok(())
}

/// Validates a room's maximum occupancy (≥ 1).
pub fn validate_max_occupancy(max_occupancy: i64) -> ValidationResult<()> {
    if max_occupancy < 1 {
        return Err(ValidationError::MustBePositive {
            field: "max_occupancy".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a requested stay and returns its length in nights.
///
/// ## Rules
/// - check_out strictly after check_in
/// - At most `MAX_STAY_NIGHTS`
pub fn validate_stay(stay: &StayDates) -> ValidationResult<u32> {
    let nights = (stay.check_out - stay.check_in).num_days();

    if nights < 1 || nights > MAX_STAY_NIGHTS as i64 {
        return Err(ValidationError::OutOfRange {
            field: "nights".to_string(),
            min: 1,
            max: MAX_STAY_NIGHTS as i64,
        });
    }

    Ok(nights as u32)
}

/// Validates that an activity date falls within `[check_in, check_out]`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use hotelier_core::types::StayDates;
/// use hotelier_core::validation::validate_activity_date;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
/// let stay = StayDates::new(d(10), d(15));
///
/// assert!(validate_activity_date(&stay, d(15)).is_ok());
/// assert!(validate_activity_date(&stay, d(16)).is_err());
/// ```
pub fn validate_activity_date(stay: &StayDates, date: NaiveDate) -> ValidationResult<()> {
    if !stay.contains(date) {
        return Err(ValidationError::OutsideStay {
            field: "scheduled_date".to_string(),
            date: date.to_string(),
            check_in: stay.check_in.to_string(),
            check_out: stay.check_out.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("first_name", "Nimal").is_ok());
        assert!(validate_name("first_name", "   ").is_err());
        assert!(validate_name("first_name", &"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("guest@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.lk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("guest.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("guest@example").is_err());
        assert!(validate_email("guest@@example.com").is_err());
        assert!(validate_email("gu est@example.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+94 77 123 4567").is_ok());
        assert!(validate_phone("(011) 234-5678").is_ok());

        assert!(validate_phone("").is_err());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_identity_by_residency() {
        assert!(validate_identity(Residency::Resident, Some("852341234V"), None).is_ok());
        assert!(validate_identity(Residency::NonResident, None, Some("X9876543")).is_ok());

        // Wrong document for residency
        assert!(matches!(
            validate_identity(Residency::Resident, None, Some("X9876543")),
            Err(ValidationError::MutuallyExclusive { .. })
        ));
        // Missing document
        assert!(matches!(
            validate_identity(Residency::NonResident, None, None),
            Err(ValidationError::Required { .. })
        ));
        // Blank strings count as absent
        assert!(validate_identity(Residency::Resident, Some("852341234V"), Some("  ")).is_ok());
        assert!(validate_identity(Residency::Resident, Some("85-234"), None).is_err());
    }

    #[test]
    fn test_validate_room_number() {
        assert!(validate_room_number("101").is_ok());
        assert!(validate_room_number("A-12").is_ok());
        assert!(validate_room_number("").is_err());
        assert!(validate_room_number("1 01").is_err());
    }

    #[test]
    fn test_validate_guest_counts() {
        assert!(validate_guest_counts(1, 0).is_ok());
        assert!(validate_guest_counts(2, 3).is_ok());
        assert!(validate_guest_counts(0, 2).is_err());
        assert!(validate_guest_counts(2, -1).is_err());
    }

    #[test]
    fn test_validate_participants() {
        assert!(validate_participants(1).is_ok());
        assert!(validate_participants(0).is_err());
        assert!(validate_participants(-3).is_err());
        assert!(validate_participants(MAX_PARTICIPANTS).is_ok());
        assert!(matches!(
            validate_participants(i64::MAX / 10),
            Err(ValidationError::OutOfRange { max: MAX_PARTICIPANTS, .. })
        ));
    }

    #[test]
    fn test_validate_amount_cents_bounds() {
        assert!(validate_amount_cents("amount", MAX_AMOUNT_CENTS).is_ok());
        assert!(matches!(
            validate_amount_cents("amount", i64::MAX / 2 + 1),
            Err(ValidationError::OutOfRange { max: MAX_AMOUNT_CENTS, .. })
        ));
        assert!(matches!(
            validate_amount_cents("amount", -1),
            Err(ValidationError::MustNotBeNegative { .. })
        ));
    }

    #[test]
    fn test_validate_multiplier_bps() {
        assert!(validate_multiplier_bps(10_000).is_ok());
        assert!(validate_multiplier_bps(13_000).is_ok());
        assert!(validate_multiplier_bps(9_999).is_err());
    }

    #[test]
    fn test_validate_stay() {
        assert_eq!(validate_stay(&StayDates::new(d(10), d(15))).unwrap(), 5);
        assert!(validate_stay(&StayDates::new(d(10), d(10))).is_err());
        assert!(validate_stay(&StayDates::new(d(15), d(10))).is_err());

        let long = StayDates::new(d(1), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert!(validate_stay(&long).is_err());
    }

    #[test]
    fn test_validate_activity_date() {
        let stay = StayDates::new(d(10), d(15));
        assert!(validate_activity_date(&stay, d(10)).is_ok());
        assert!(validate_activity_date(&stay, d(12)).is_ok());
        assert!(validate_activity_date(&stay, d(15)).is_ok());
        assert!(matches!(
            validate_activity_date(&stay, d(9)),
            Err(ValidationError::OutsideStay { .. })
        ));
    }
}
