//! Diesel-backed mock-data store.
//!
//! Used when no backend is configured. It keeps the same areas, slots and
//! bookings the backend would serve, computing slot availability from the
//! bookings that overlap the requested window.

use chrono::{DateTime, Utc};

use crate::db::{DbConnection, DbPool, get_connection};
use crate::domain::booking::BookingStatus;
use crate::domain::types::UserId;
use crate::repository::errors::{RepositoryError, RepositoryResult};

mod areas;
mod auth;
mod bookings;
mod seed;
mod staff;

pub use auth::{hash_password, verify_password};

#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
    acting_user: Option<UserId>,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            acting_user: None,
        }
    }

    /// Copy of this repository acting for `user_id`.
    pub fn as_user(&self, user_id: UserId) -> Self {
        Self {
            pool: self.pool.clone(),
            acting_user: Some(user_id),
        }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }

    fn acting_user(&self) -> RepositoryResult<UserId> {
        self.acting_user.ok_or(RepositoryError::Unauthenticated)
    }
}

/// Status of a stored booking as of `now`. Open bookings move from upcoming
/// to active to completed with the clock.
pub(crate) fn effective_status(
    stored: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> BookingStatus {
    let status = BookingStatus::from(stored);
    match status {
        BookingStatus::Upcoming | BookingStatus::Active => {
            if end < now {
                BookingStatus::Completed
            } else if start > now {
                BookingStatus::Upcoming
            } else {
                BookingStatus::Active
            }
        }
        other => other,
    }
}

/// Stored statuses that no longer hold a slot.
pub(crate) const CLOSED_STATUSES: [&str; 3] = ["completed", "cancelled", "expired"];

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn open_bookings_follow_the_clock() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let hour = Duration::hours(1);
        assert_eq!(
            effective_status("upcoming", now - hour, now + hour, now),
            BookingStatus::Active
        );
        assert_eq!(
            effective_status("active", now - hour * 2, now - hour, now),
            BookingStatus::Completed
        );
        assert_eq!(
            effective_status("upcoming", now + hour, now + hour * 2, now),
            BookingStatus::Upcoming
        );
        assert_eq!(
            effective_status("cancelled", now - hour, now + hour, now),
            BookingStatus::Cancelled
        );
    }
}
