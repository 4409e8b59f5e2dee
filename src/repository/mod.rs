//! Ports to the ParkEase backend.
//!
//! Every backend capability is a reader or writer trait. Two adapters
//! implement them: [`http::HttpRepository`] talks to the real backend and
//! [`local::DieselRepository`] keeps the mock-data store in SQLite.
//! Repositories are scoped to the user they act for, so methods only take the
//! identifiers that appear in the backend's own endpoints.
#![allow(async_fn_in_trait)]

use crate::domain::area::{AreaDraft, ParkingArea};
use crate::domain::booking::{
    Booking, BookingExtension, DashboardStats, HistoryScope, NewBooking,
};
use crate::domain::slot::{ParkingSlot, SlotPosition, SlotQuery};
use crate::domain::staff::{NewSecurityStaff, SecurityStaff};
use crate::domain::types::{AreaId, BookingId, Password, StaffId, UserEmail, UserId};
use crate::domain::user::{AuthSession, Credentials, NewUser, PasswordReset, ProfileUpdate, User};
use crate::repository::errors::RepositoryResult;

#[cfg(feature = "server")]
pub mod backend;
pub mod errors;
#[cfg(feature = "server")]
pub mod http;
pub mod local;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;

#[cfg(feature = "server")]
pub use backend::AppBackend;
pub use local::DieselRepository;

pub trait AuthGateway {
    async fn login(&self, credentials: &Credentials) -> RepositoryResult<AuthSession>;
    async fn register(&self, new_user: &NewUser) -> RepositoryResult<User>;
    /// Sends a one-time code to `email`.
    async fn request_password_reset(&self, email: &UserEmail) -> RepositoryResult<()>;
    async fn verify_otp(&self, email: &UserEmail, otp: &str) -> RepositoryResult<()>;
    async fn reset_password(&self, reset: &PasswordReset) -> RepositoryResult<()>;
}

pub trait ProfileReader {
    /// The user the repository acts for.
    async fn fetch_profile(&self) -> RepositoryResult<User>;
}

pub trait ProfileWriter {
    async fn update_profile(&self, update: &ProfileUpdate) -> RepositoryResult<User>;
    async fn change_password(&self, username: &str, password: &Password) -> RepositoryResult<()>;
    async fn delete_account(&self, username: &str) -> RepositoryResult<()>;
}

pub trait AreaReader {
    async fn list_areas(&self) -> RepositoryResult<Vec<ParkingArea>>;
    async fn get_area(&self, id: AreaId) -> RepositoryResult<Option<ParkingArea>>;
}

pub trait AreaWriter {
    async fn create_area(&self, draft: &AreaDraft) -> RepositoryResult<ParkingArea>;
    async fn update_area(&self, id: AreaId, draft: &AreaDraft) -> RepositoryResult<ParkingArea>;
    async fn delete_area(&self, id: AreaId) -> RepositoryResult<()>;
}

pub trait SlotReader {
    /// Slots of an area with their availability for the query window.
    async fn list_slots(&self, query: &SlotQuery) -> RepositoryResult<Vec<ParkingSlot>>;
}

pub trait SlotWriter {
    async fn save_positions(
        &self,
        area_id: AreaId,
        positions: &[SlotPosition],
    ) -> RepositoryResult<()>;
}

pub trait BookingReader {
    async fn list_user_bookings(&self, user_id: UserId) -> RepositoryResult<Vec<Booking>>;
    async fn booking_history(&self, scope: HistoryScope) -> RepositoryResult<Vec<Booking>>;
    async fn dashboard_stats(&self) -> RepositoryResult<DashboardStats>;
}

pub trait BookingWriter {
    /// Creates the booking and returns it with its backend-assigned id.
    async fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<Booking>;
    async fn cancel_booking(&self, id: BookingId) -> RepositoryResult<()>;
    async fn extend_booking(
        &self,
        id: BookingId,
        extension: &BookingExtension,
    ) -> RepositoryResult<()>;
}

pub trait StaffReader {
    async fn list_staff(&self) -> RepositoryResult<Vec<SecurityStaff>>;
}

pub trait StaffWriter {
    async fn add_staff(&self, staff: &NewSecurityStaff) -> RepositoryResult<SecurityStaff>;
    async fn remove_staff(&self, id: StaffId) -> RepositoryResult<()>;
}
