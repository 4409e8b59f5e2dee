//! Live occupancy and camera screens.

use crate::domain::area::ParkingArea;
use crate::domain::occupancy::OccupancySnapshot;
use crate::models::auth::AuthenticatedUser;
use crate::repository::AreaReader;
use crate::services::{ServiceResult, ensure_monitor};

pub struct LivePageData {
    /// Areas offered in the walk-in form.
    pub areas: Vec<ParkingArea>,
    pub snapshot: OccupancySnapshot,
}

pub async fn load_live_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    snapshot: OccupancySnapshot,
) -> ServiceResult<LivePageData>
where
    R: AreaReader + ?Sized,
{
    ensure_monitor(user)?;
    let areas = repo.list_areas().await.map_err(|err| {
        log::error!("Failed to list parking areas: {err}");
        err
    })?;
    Ok(LivePageData { areas, snapshot })
}

/// The latest frames, for staff only.
pub fn camera_snapshot(
    user: &AuthenticatedUser,
    snapshot: OccupancySnapshot,
) -> ServiceResult<OccupancySnapshot> {
    ensure_monitor(user)?;
    Ok(snapshot)
}
