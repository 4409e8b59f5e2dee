//! Use cases behind the routes.
//!
//! Services are generic over the repository traits they need, check the
//! caller's role, turn forms into validated payloads and log failures before
//! handing them back to the route.

use thiserror::Error;

use crate::domain::booking_flow::FlowError;
use crate::domain::types::UserId;
use crate::forms::FormError;
use crate::models::auth::AuthenticatedUser;
use crate::repository::errors::RepositoryError;

pub mod areas;
pub mod auth;
pub mod booking;
pub mod bookings;
pub mod dashboard;
pub mod history;
pub mod live;
pub mod profile;
pub mod staff;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("You do not have permission to do that")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("{0}")]
    TypeConstraint(String),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Banner text: the validation message, the backend's own message, or
    /// `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ServiceError::Form(err) => err.to_string(),
            ServiceError::Flow(err) => err.to_string(),
            ServiceError::TypeConstraint(message) => message.clone(),
            ServiceError::Repository(err) => err
                .user_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
            ServiceError::Unauthorized | ServiceError::NotFound => self.to_string(),
            ServiceError::Internal(_) => fallback.to_string(),
        }
    }

    /// Inline errors for the form that caused this failure.
    pub fn field_errors(&self) -> crate::forms::FieldErrors {
        match self {
            ServiceError::Form(err) => err.field_errors(),
            _ => crate::forms::FieldErrors::new(),
        }
    }
}

/// Admin-only screens: areas and security staff.
pub fn ensure_manager(user: &AuthenticatedUser) -> ServiceResult<()> {
    if user.role.can_manage() {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

/// Security and admin screens: live occupancy, cameras, walk-ins.
pub fn ensure_monitor(user: &AuthenticatedUser) -> ServiceResult<()> {
    if user.role.can_monitor() {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

pub(crate) fn user_id(user: &AuthenticatedUser) -> ServiceResult<UserId> {
    Ok(user.user_id()?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};

    use crate::domain::booking::{Booking, BookingStatus};
    use crate::domain::types::{AreaId, BookingId, SlotId, UserId};
    use crate::domain::user::Role;
    use crate::models::auth::AuthenticatedUser;

    pub fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id: 7,
            username: "asha".to_string(),
            email: "asha@example.com".to_string(),
            phone_number: Some("9876543210".to_string()),
            role,
            token: Some("token".to_string()),
        }
    }

    pub fn booking(id: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
        Booking {
            id: BookingId::new(id).unwrap(),
            user_id: Some(UserId::new(7).unwrap()),
            area_id: AreaId::new(1).unwrap(),
            slot_id: SlotId::new(id).unwrap(),
            area_name: Some("Main Entrance".to_string()),
            slot_number: Some(format!("A{id}")),
            vehicle_number: format!("KA-01-{id:04}"),
            start_time: start,
            end_time: end,
            actual_end_time: None,
            amount: 100.0,
            status: BookingStatus::Upcoming,
        }
    }
}
