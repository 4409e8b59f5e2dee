use serde::Serialize;

use crate::domain::occupancy::OccupancySnapshot;
use crate::dto::display_time;

/// Live occupancy as pushed to the browser.
#[derive(Serialize)]
pub struct LiveView<'a> {
    pub free_count: usize,
    pub free_slots: &'a [u32],
    pub frame: Option<&'a str>,
    pub frame_original: Option<&'a str>,
    pub updates_received: u64,
    pub last_update: Option<String>,
    pub connected: bool,
}

impl<'a> From<&'a OccupancySnapshot> for LiveView<'a> {
    fn from(snapshot: &'a OccupancySnapshot) -> Self {
        Self {
            free_count: snapshot.free_count(),
            free_slots: &snapshot.free_slots,
            frame: snapshot.frame.as_deref(),
            frame_original: snapshot.frame_original.as_deref(),
            updates_received: snapshot.updates_received,
            last_update: snapshot.last_update_at.map(display_time),
            connected: snapshot.connected,
        }
    }
}
