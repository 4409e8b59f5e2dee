//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::area::{AreaDraft, ParkingArea};
use crate::domain::booking::{Booking, BookingExtension, DashboardStats, HistoryScope, NewBooking};
use crate::domain::slot::{ParkingSlot, SlotPosition, SlotQuery};
use crate::domain::staff::{NewSecurityStaff, SecurityStaff};
use crate::domain::types::{AreaId, BookingId, Password, StaffId, UserEmail, UserId};
use crate::domain::user::{AuthSession, Credentials, NewUser, PasswordReset, ProfileUpdate, User};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    AreaReader, AreaWriter, AuthGateway, BookingReader, BookingWriter, ProfileReader,
    ProfileWriter, SlotReader, SlotWriter, StaffReader, StaffWriter,
};

mock! {
    pub Repository {}

    impl AuthGateway for Repository {
        async fn login(&self, credentials: &Credentials) -> RepositoryResult<AuthSession>;
        async fn register(&self, new_user: &NewUser) -> RepositoryResult<User>;
        async fn request_password_reset(&self, email: &UserEmail) -> RepositoryResult<()>;
        async fn verify_otp(&self, email: &UserEmail, otp: &str) -> RepositoryResult<()>;
        async fn reset_password(&self, reset: &PasswordReset) -> RepositoryResult<()>;
    }

    impl ProfileReader for Repository {
        async fn fetch_profile(&self) -> RepositoryResult<User>;
    }

    impl ProfileWriter for Repository {
        async fn update_profile(&self, update: &ProfileUpdate) -> RepositoryResult<User>;
        async fn change_password(
            &self,
            username: &str,
            password: &Password,
        ) -> RepositoryResult<()>;
        async fn delete_account(&self, username: &str) -> RepositoryResult<()>;
    }

    impl AreaReader for Repository {
        async fn list_areas(&self) -> RepositoryResult<Vec<ParkingArea>>;
        async fn get_area(&self, id: AreaId) -> RepositoryResult<Option<ParkingArea>>;
    }

    impl AreaWriter for Repository {
        async fn create_area(&self, draft: &AreaDraft) -> RepositoryResult<ParkingArea>;
        async fn update_area(&self, id: AreaId, draft: &AreaDraft) -> RepositoryResult<ParkingArea>;
        async fn delete_area(&self, id: AreaId) -> RepositoryResult<()>;
    }

    impl SlotReader for Repository {
        async fn list_slots(&self, query: &SlotQuery) -> RepositoryResult<Vec<ParkingSlot>>;
    }

    impl SlotWriter for Repository {
        async fn save_positions(
            &self,
            area_id: AreaId,
            positions: &[SlotPosition],
        ) -> RepositoryResult<()>;
    }

    impl BookingReader for Repository {
        async fn list_user_bookings(&self, user_id: UserId) -> RepositoryResult<Vec<Booking>>;
        async fn booking_history(&self, scope: HistoryScope) -> RepositoryResult<Vec<Booking>>;
        async fn dashboard_stats(&self) -> RepositoryResult<DashboardStats>;
    }

    impl BookingWriter for Repository {
        async fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<Booking>;
        async fn cancel_booking(&self, id: BookingId) -> RepositoryResult<()>;
        async fn extend_booking(
            &self,
            id: BookingId,
            extension: &BookingExtension,
        ) -> RepositoryResult<()>;
    }

    impl StaffReader for Repository {
        async fn list_staff(&self) -> RepositoryResult<Vec<SecurityStaff>>;
    }

    impl StaffWriter for Repository {
        async fn add_staff(&self, staff: &NewSecurityStaff) -> RepositoryResult<SecurityStaff>;
        async fn remove_staff(&self, id: StaffId) -> RepositoryResult<()>;
    }
}
