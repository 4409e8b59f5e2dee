use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::booking::DashboardStats;
use crate::dto::booking::BookingRow;
use crate::models::auth::AuthenticatedUser;
use crate::repository::BookingReader;
use crate::services::ServiceResult;

/// Data required to render the dashboard.
#[derive(Serialize)]
pub struct DashboardData {
    pub active_bookings: u32,
    pub total_bookings: u32,
    pub total_spent: f64,
    pub recent: Vec<BookingRow>,
}

pub async fn load_dashboard<R>(
    repo: &R,
    user: &AuthenticatedUser,
    now: DateTime<Utc>,
) -> ServiceResult<DashboardData>
where
    R: BookingReader + ?Sized,
{
    let DashboardStats {
        active_bookings,
        total_bookings,
        total_spent,
        recent_bookings,
    } = repo.dashboard_stats().await.map_err(|err| {
        log::error!("Failed to load dashboard of user {}: {err}", user.id);
        err
    })?;

    Ok(DashboardData {
        active_bookings,
        total_bookings,
        total_spent,
        recent: recent_bookings
            .into_iter()
            .map(|booking| BookingRow::new(booking, now))
            .collect(),
    })
}
