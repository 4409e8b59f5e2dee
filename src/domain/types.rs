//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce the input rules the booking screens rely on
//! (positive identifiers, e-mail and phone formats, password strength) so that
//! once a value reaches the domain layer it can be treated as trusted.
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

/// Characters accepted as the "special" class of a password.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided email failed format validation.
    #[error("Please enter a valid email address")]
    InvalidEmail,
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Phone number did not meet expected format.
    #[error("Phone number must be exactly 10 digits")]
    InvalidPhone,
    /// Username is shorter than the minimum length.
    #[error("Username must be at least 3 characters")]
    UsernameTooShort,
    /// Password does not satisfy the strength rule.
    #[error(
        "Password must be at least 8 characters long and contain at least 1 uppercase letter, 1 lowercase letter, 1 number, and 1 special character"
    )]
    WeakPassword,
}

/// Returns `true` for an address that passes the usual e-mail check and
/// ends in a top-level domain of 2 to 6 letters.
pub fn is_valid_email(email: &str) -> bool {
    let tld = email
        .rsplit_once('@')
        .and_then(|(_, domain)| domain.rsplit_once('.'))
        .map(|(_, tld)| tld);
    email.validate_email()
        && tld.is_some_and(|tld| {
            (2..=6).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic())
        })
}

/// Returns `true` for exactly ten ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit())
}

/// Returns `true` when `password` satisfies the strength rule.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c))
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[serde(try_from = "i32", into = "i32")]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(AreaId, "Unique identifier for a parking area.");
id_newtype!(SlotId, "Unique identifier for a parking slot.");
id_newtype!(BookingId, "Unique identifier for a booking.");
id_newtype!(UserId, "Unique identifier for a user account.");
id_newtype!(StaffId, "Unique identifier for a security staff member.");

/// Wrapper for non-empty, trimmed strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Trims whitespace and rejects empty inputs.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        Ok(Self(trimmed))
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let inner = NonEmptyString::new(value)?;
                Ok(Self(inner.into_inner()))
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

non_empty_string_newtype!(AreaName, "Parking area name enforcing non-empty values.");
non_empty_string_newtype!(StaffName, "Security staff name enforcing non-empty values.");
non_empty_string_newtype!(
    DriverName,
    "Name entered on the booking form, trimmed and non-empty."
);

/// Lower-cased e-mail address matching the accepted address pattern.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserEmail(String);

impl UserEmail {
    /// Validates and normalizes an email string.
    pub fn new<S: Into<String>>(email: S) -> Result<Self, TypeConstraintError> {
        let normalized = email.into().trim().to_lowercase();
        if is_valid_email(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(TypeConstraintError::InvalidEmail)
        }
    }

    /// Borrow the email as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the owned inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for UserEmail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for UserEmail {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Ten-digit phone number.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Trims the input and requires exactly ten digits.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if is_valid_phone(&trimmed) {
            Ok(Self(trimmed))
        } else {
            Err(TypeConstraintError::InvalidPhone)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account name, trimmed and at least three characters long.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let inner = NonEmptyString::new(value)?.into_inner();
        if inner.chars().count() < 3 {
            return Err(TypeConstraintError::UsernameTooShort);
        }
        Ok(Self(inner))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Password satisfying the strength rule. Never trimmed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let value = value.into();
        if is_strong_password(&value) {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::WeakPassword)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Vehicle registration number, trimmed and upper-cased.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VehicleNumber(String);

impl VehicleNumber {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let inner = NonEmptyString::new(value)?;
        Ok(Self(inner.into_inner().to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for VehicleNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-text description with markup stripped to a safe subset.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Description(String);

impl Description {
    /// Sanitizes and trims the value. Empty descriptions are allowed.
    pub fn new<S: Into<String>>(value: S) -> Self {
        let sanitized = ammonia::clean(&value.into());
        Self(sanitized.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_non_positive_values() {
        assert_eq!(AreaId::new(0), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(SlotId::new(-4), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(BookingId::new(7).map(BookingId::get), Ok(7));
    }

    #[test]
    fn ids_deserialize_through_validation() {
        let id: SlotId = serde_json::from_str("3").expect("valid id");
        assert_eq!(id.get(), 3);
        assert!(serde_json::from_str::<SlotId>("0").is_err());
    }

    #[test]
    fn email_pattern_matches_expected_addresses() {
        assert!(is_valid_email("john.doe@example.com"));
        assert!(is_valid_email("a_b-c@mail.co.in"));
        assert!(!is_valid_email("john@example"));
        assert!(!is_valid_email("john@example.c"));
        assert!(!is_valid_email("john@example.company"));
        assert!(!is_valid_email("jo hn@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn email_is_normalized() {
        let email = UserEmail::new("  John@Example.COM ").expect("valid email");
        assert_eq!(email.as_str(), "john@example.com");
    }

    #[test]
    fn phone_requires_ten_digits() {
        assert!(PhoneNumber::new("9876543210").is_ok());
        assert_eq!(
            PhoneNumber::new("98765-43210"),
            Err(TypeConstraintError::InvalidPhone)
        );
        assert_eq!(
            PhoneNumber::new("123"),
            Err(TypeConstraintError::InvalidPhone)
        );
    }

    #[test]
    fn password_strength_rule() {
        assert!(is_strong_password("Secret1!"));
        assert!(!is_strong_password("secret1!"));
        assert!(!is_strong_password("SECRET1!"));
        assert!(!is_strong_password("Secret!!"));
        assert!(!is_strong_password("Secret12"));
        assert!(!is_strong_password("Se1!"));
        assert!(!is_strong_password("Secret1! "));
    }

    #[test]
    fn username_needs_three_characters() {
        assert_eq!(
            Username::new("  ab "),
            Err(TypeConstraintError::UsernameTooShort)
        );
        assert_eq!(Username::new("   "), Err(TypeConstraintError::EmptyString));
        assert_eq!(Username::new(" bob ").map(Username::into_inner), Ok("bob".into()));
    }

    #[test]
    fn vehicle_number_is_upper_cased() {
        let number = VehicleNumber::new(" ka-01-1234 ").expect("valid number");
        assert_eq!(number.as_str(), "KA-01-1234");
    }

    #[test]
    fn description_strips_scripts() {
        let description = Description::new("Near gate <script>alert(1)</script>");
        assert_eq!(description.as_str(), "Near gate");
    }
}
