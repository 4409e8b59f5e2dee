//! Form definitions backing the ParkEase routes.
//!
//! Every form is a plain `Deserialize` struct converted into a validated
//! payload with `TryFrom`. Conversions never touch the backend, so a form that
//! fails here never results in a network call.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::pricing::{MAX_BOOKING_HOURS, parse_duration_hours};
use crate::domain::types::{
    TypeConstraintError, Username, is_strong_password, is_valid_email, is_valid_phone,
};

pub mod areas;
pub mod auth;
pub mod booking;
pub mod history;
pub mod profile;
pub mod security;

pub const REQUIRED_FIELD: &str = "This field is required";
pub const INVALID_HOURS: &str = "Parking hours must be a positive number";

const REQUIRED_CODE: &str = "required";

/// Inline error messages keyed by form field name.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless the field already has one.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_message(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    /// Records the first message of every failed field, preferring the
    /// required-field message when a field failed several rules.
    fn extend_from(&mut self, errors: &ValidationErrors) {
        for (field, errors) in errors.field_errors() {
            let error = errors
                .iter()
                .find(|error| error.code == REQUIRED_CODE)
                .or_else(|| errors.first());
            if let Some(error) = error {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                self.add(&field, message);
            }
        }
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        fields.extend_from(errors);
        fields
    }
}

fn has_blank_field(errors: &ValidationErrors) -> bool {
    errors
        .field_errors()
        .values()
        .any(|errors| errors.iter().any(|error| error.code == REQUIRED_CODE))
}

#[derive(Debug, Error, PartialEq)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("Please fill in all required fields")]
    MissingFields(FieldErrors),

    #[error("{message}")]
    Invalid {
        message: String,
        fields: FieldErrors,
    },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),
}

impl From<ValidationErrors> for FormError {
    fn from(errors: ValidationErrors) -> Self {
        FormError::from_validation(std::slice::from_ref(&errors))
    }
}

impl FormError {
    /// Blank required fields get the generic banner, anything else repeats
    /// the first field message.
    fn from_validation(failures: &[ValidationErrors]) -> Self {
        let mut fields = FieldErrors::new();
        for errors in failures {
            fields.extend_from(errors);
        }
        if failures.iter().any(has_blank_field) {
            FormError::MissingFields(fields)
        } else {
            FormError::from_fields(fields)
        }
    }

    /// Invalid form whose banner repeats the first field error.
    pub fn from_fields(fields: FieldErrors) -> Self {
        let message = fields
            .first_message()
            .unwrap_or("Invalid form data")
            .to_string();
        FormError::Invalid { message, fields }
    }

    pub fn field_errors(&self) -> FieldErrors {
        match self {
            FormError::MissingFields(fields) | FormError::Invalid { fields, .. } => fields.clone(),
            FormError::PasswordMismatch => {
                let mut fields = FieldErrors::new();
                fields.add("confirm_password", "Passwords do not match");
                fields
            }
            FormError::TypeConstraint(_) => FieldErrors::new(),
        }
    }
}

/// Validates every form part and reports all failures together.
pub(crate) fn validate_all(parts: &[&dyn Validate]) -> Result<(), FormError> {
    let failures: Vec<ValidationErrors> = parts
        .iter()
        .filter_map(|part| part.validate().err())
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(FormError::from_validation(&failures))
    }
}

/// Form error attaching a failed value-object conversion to `field`.
pub(crate) fn field_error(field: &str, err: TypeConstraintError) -> FormError {
    let mut fields = FieldErrors::new();
    fields.add(field, err.to_string());
    FormError::from_fields(fields)
}

fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Rejects blank and whitespace-only values.
pub fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid(REQUIRED_CODE, REQUIRED_FIELD));
    }
    Ok(())
}

pub fn email_address(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    if !is_valid_email(&value.trim().to_lowercase()) {
        return Err(invalid("email", TypeConstraintError::InvalidEmail.to_string()));
    }
    Ok(())
}

pub fn phone_number(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    if !is_valid_phone(value.trim()) {
        return Err(invalid("phone", TypeConstraintError::InvalidPhone.to_string()));
    }
    Ok(())
}

pub fn username(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    Username::new(value).map_err(|err| invalid("username", err.to_string()))?;
    Ok(())
}

pub fn strong_password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid(REQUIRED_CODE, REQUIRED_FIELD));
    }
    if !is_strong_password(value) {
        return Err(invalid("password", TypeConstraintError::WeakPassword.to_string()));
    }
    Ok(())
}

fn too_long(value: &str) -> Option<ValidationError> {
    let hours: f64 = value.trim().parse().ok()?;
    (hours > MAX_BOOKING_HOURS).then(|| {
        invalid(
            "hours",
            format!("Parking hours cannot exceed {MAX_BOOKING_HOURS}"),
        )
    })
}

/// A required duration between zero and [`MAX_BOOKING_HOURS`].
pub fn duration_hours(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    if parse_duration_hours(value).is_some() {
        return Ok(());
    }
    Err(too_long(value).unwrap_or_else(|| invalid("hours", INVALID_HOURS)))
}

/// Duration of the search form. Blank, zero and unreadable values mean "not
/// chosen yet", only an over-long stay is an error.
pub fn optional_duration_hours(value: &str) -> Result<(), ValidationError> {
    too_long(value).map_or(Ok(()), Err)
}
