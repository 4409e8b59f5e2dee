//! Backend selected at start-up.

use crate::domain::area::{AreaDraft, ParkingArea};
use crate::domain::booking::{Booking, BookingExtension, DashboardStats, HistoryScope, NewBooking};
use crate::domain::slot::{ParkingSlot, SlotPosition, SlotQuery};
use crate::domain::staff::{NewSecurityStaff, SecurityStaff};
use crate::domain::types::{AreaId, BookingId, Password, StaffId, UserEmail, UserId};
use crate::domain::user::{AuthSession, Credentials, NewUser, PasswordReset, ProfileUpdate, User};
use crate::models::auth::AuthenticatedUser;
use crate::repository::errors::RepositoryResult;
use crate::repository::http::HttpRepository;
use crate::repository::local::DieselRepository;
use crate::repository::{
    AreaReader, AreaWriter, AuthGateway, BookingReader, BookingWriter, ProfileReader,
    ProfileWriter, SlotReader, SlotWriter, StaffReader, StaffWriter,
};

#[derive(Clone)]
pub enum AppBackend {
    Http(HttpRepository),
    Local(DieselRepository),
}

macro_rules! delegate {
    ($backend:expr, $repo:ident => $call:expr) => {
        match $backend {
            AppBackend::Http($repo) => $call,
            AppBackend::Local($repo) => $call,
        }
    };
}

impl AppBackend {
    /// Copy of the backend acting for `user`.
    pub fn for_user(&self, user: &AuthenticatedUser) -> Self {
        match self {
            AppBackend::Http(repo) => match &user.token {
                Some(token) => AppBackend::Http(repo.with_token(token.clone())),
                None => AppBackend::Http(repo.clone()),
            },
            AppBackend::Local(repo) => match user.user_id() {
                Ok(user_id) => AppBackend::Local(repo.as_user(user_id)),
                Err(_) => AppBackend::Local(repo.clone()),
            },
        }
    }
}

impl AuthGateway for AppBackend {
    async fn login(&self, credentials: &Credentials) -> RepositoryResult<AuthSession> {
        delegate!(self, repo => repo.login(credentials).await)
    }

    async fn register(&self, new_user: &NewUser) -> RepositoryResult<User> {
        delegate!(self, repo => repo.register(new_user).await)
    }

    async fn request_password_reset(&self, email: &UserEmail) -> RepositoryResult<()> {
        delegate!(self, repo => repo.request_password_reset(email).await)
    }

    async fn verify_otp(&self, email: &UserEmail, otp: &str) -> RepositoryResult<()> {
        delegate!(self, repo => repo.verify_otp(email, otp).await)
    }

    async fn reset_password(&self, reset: &PasswordReset) -> RepositoryResult<()> {
        delegate!(self, repo => repo.reset_password(reset).await)
    }
}

impl ProfileReader for AppBackend {
    async fn fetch_profile(&self) -> RepositoryResult<User> {
        delegate!(self, repo => repo.fetch_profile().await)
    }
}

impl ProfileWriter for AppBackend {
    async fn update_profile(&self, update: &ProfileUpdate) -> RepositoryResult<User> {
        delegate!(self, repo => repo.update_profile(update).await)
    }

    async fn change_password(&self, username: &str, password: &Password) -> RepositoryResult<()> {
        delegate!(self, repo => repo.change_password(username, password).await)
    }

    async fn delete_account(&self, username: &str) -> RepositoryResult<()> {
        delegate!(self, repo => repo.delete_account(username).await)
    }
}

impl AreaReader for AppBackend {
    async fn list_areas(&self) -> RepositoryResult<Vec<ParkingArea>> {
        delegate!(self, repo => repo.list_areas().await)
    }

    async fn get_area(&self, id: AreaId) -> RepositoryResult<Option<ParkingArea>> {
        delegate!(self, repo => repo.get_area(id).await)
    }
}

impl AreaWriter for AppBackend {
    async fn create_area(&self, draft: &AreaDraft) -> RepositoryResult<ParkingArea> {
        delegate!(self, repo => repo.create_area(draft).await)
    }

    async fn update_area(&self, id: AreaId, draft: &AreaDraft) -> RepositoryResult<ParkingArea> {
        delegate!(self, repo => repo.update_area(id, draft).await)
    }

    async fn delete_area(&self, id: AreaId) -> RepositoryResult<()> {
        delegate!(self, repo => repo.delete_area(id).await)
    }
}

impl SlotReader for AppBackend {
    async fn list_slots(&self, query: &SlotQuery) -> RepositoryResult<Vec<ParkingSlot>> {
        delegate!(self, repo => repo.list_slots(query).await)
    }
}

impl SlotWriter for AppBackend {
    async fn save_positions(
        &self,
        area_id: AreaId,
        positions: &[SlotPosition],
    ) -> RepositoryResult<()> {
        delegate!(self, repo => repo.save_positions(area_id, positions).await)
    }
}

impl BookingReader for AppBackend {
    async fn list_user_bookings(&self, user_id: UserId) -> RepositoryResult<Vec<Booking>> {
        delegate!(self, repo => repo.list_user_bookings(user_id).await)
    }

    async fn booking_history(&self, scope: HistoryScope) -> RepositoryResult<Vec<Booking>> {
        delegate!(self, repo => repo.booking_history(scope).await)
    }

    async fn dashboard_stats(&self) -> RepositoryResult<DashboardStats> {
        delegate!(self, repo => repo.dashboard_stats().await)
    }
}

impl BookingWriter for AppBackend {
    async fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<Booking> {
        delegate!(self, repo => repo.create_booking(booking).await)
    }

    async fn cancel_booking(&self, id: BookingId) -> RepositoryResult<()> {
        delegate!(self, repo => repo.cancel_booking(id).await)
    }

    async fn extend_booking(
        &self,
        id: BookingId,
        extension: &BookingExtension,
    ) -> RepositoryResult<()> {
        delegate!(self, repo => repo.extend_booking(id, extension).await)
    }
}

impl StaffReader for AppBackend {
    async fn list_staff(&self) -> RepositoryResult<Vec<SecurityStaff>> {
        delegate!(self, repo => repo.list_staff().await)
    }
}

impl StaffWriter for AppBackend {
    async fn add_staff(&self, staff: &NewSecurityStaff) -> RepositoryResult<SecurityStaff> {
        delegate!(self, repo => repo.add_staff(staff).await)
    }

    async fn remove_staff(&self, id: StaffId) -> RepositoryResult<()> {
        delegate!(self, repo => repo.remove_staff(id).await)
    }
}
