use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::pricing::duration_for_hours;
use crate::domain::types::{AreaId, SlotId, TypeConstraintError};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParkingSlot {
    pub id: SlotId,
    #[serde(alias = "number")]
    pub slot_number: String,
    #[serde(alias = "areaId")]
    pub area_id: AreaId,
    pub status: SlotStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum SlotStatus {
    Available,
    Booked,
    Reserved,
    Broken,
    /// Taken by a walk-in vehicle.
    Occupied,
    NotAvailable,
    /// Display-only status of the slot the user picked.
    Selected,
    Other(String),
}

impl SlotStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Booked => "booked",
            SlotStatus::Reserved => "reserved",
            SlotStatus::Broken => "broken",
            SlotStatus::Occupied => "occupied",
            SlotStatus::NotAvailable => "not_available",
            SlotStatus::Selected => "selected",
            SlotStatus::Other(s) => s,
        }
    }
}

impl Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SlotStatus {
    fn from(s: &str) -> Self {
        match s {
            "available" => SlotStatus::Available,
            "booked" => SlotStatus::Booked,
            "reserved" => SlotStatus::Reserved,
            "broken" => SlotStatus::Broken,
            "occupied" => SlotStatus::Occupied,
            "not_available" => SlotStatus::NotAvailable,
            "selected" => SlotStatus::Selected,
            _ => SlotStatus::Other(s.to_string()),
        }
    }
}

impl From<String> for SlotStatus {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl From<SlotStatus> for String {
    fn from(status: SlotStatus) -> Self {
        status.as_str().to_string()
    }
}

impl ParkingSlot {
    /// Only available slots can be picked on the grid.
    pub fn is_selectable(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

/// A slot as drawn on the grid.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SlotTile {
    pub id: SlotId,
    pub slot_number: String,
    pub status: SlotStatus,
    pub selectable: bool,
}

impl SlotTile {
    pub fn build(slots: &[ParkingSlot], selected: Option<SlotId>) -> Vec<SlotTile> {
        slots
            .iter()
            .map(|slot| {
                let status = if selected == Some(slot.id) {
                    SlotStatus::Selected
                } else {
                    slot.status.clone()
                };
                SlotTile {
                    id: slot.id,
                    slot_number: slot.slot_number.clone(),
                    status,
                    selectable: slot.is_selectable(),
                }
            })
            .collect()
    }
}

/// Time span a booking would occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BookingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TypeConstraintError> {
        if end <= start {
            return Err(TypeConstraintError::InvalidValue(
                "end time must be after start time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Window starting at `start` and lasting `hours`, one hour when no
    /// duration has been chosen yet.
    pub fn starting_at(
        start: DateTime<Utc>,
        hours: Option<f64>,
    ) -> Result<Self, TypeConstraintError> {
        let end = duration_for_hours(hours.unwrap_or(1.0))
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| {
                TypeConstraintError::InvalidValue("booking duration is out of range".to_string())
            })?;
        Ok(Self { start, end })
    }

    /// Builds the window from the date and time fields of the search form,
    /// read in the server's local time zone.
    pub fn from_local(date: NaiveDate, time: NaiveTime, hours: Option<f64>) -> Option<Self> {
        let start = Local
            .from_local_datetime(&date.and_time(time))
            .earliest()?
            .with_timezone(&Utc);
        Self::starting_at(start, hours).ok()
    }

    pub fn hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}

/// Parameters of a slot listing request.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotQuery {
    pub area_id: AreaId,
    pub window: Option<BookingWindow>,
}

impl SlotQuery {
    pub fn new(area_id: AreaId) -> Self {
        Self {
            area_id,
            window: None,
        }
    }

    pub fn window(mut self, window: BookingWindow) -> Self {
        self.window = Some(window);
        self
    }
}

/// Rectangle drawn over a camera frame to mark one slot, in frame pixels.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "[i32; 5]", into = "[i32; 5]")]
pub struct SlotPosition {
    pub index: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl SlotPosition {
    /// Builds a rectangle from a drag gesture; dragging up or left yields
    /// negative extents which are folded back into the origin.
    pub fn from_drag(index: i32, x: i32, y: i32, width: i32, height: i32) -> Self {
        let (x, width) = if width < 0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0 {
            (y + height, -height)
        } else {
            (y, height)
        };
        Self {
            index,
            x,
            y,
            width,
            height,
        }
    }
}

// Wire order is [x, y, index, width, height].
impl From<[i32; 5]> for SlotPosition {
    fn from([x, y, index, width, height]: [i32; 5]) -> Self {
        Self::from_drag(index, x, y, width, height)
    }
}

impl From<SlotPosition> for [i32; 5] {
    fn from(p: SlotPosition) -> Self {
        [p.x, p.y, p.index, p.width, p.height]
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn slot(id: i32, status: &str) -> ParkingSlot {
        ParkingSlot {
            id: SlotId::new(id).unwrap(),
            slot_number: format!("A{id}"),
            area_id: AreaId::new(1).unwrap(),
            status: status.into(),
        }
    }

    #[test]
    fn unknown_status_is_preserved() {
        let parsed: ParkingSlot = serde_json::from_str(
            r#"{"id":3,"slot_number":"B3","area_id":2,"status":"under_repair"}"#,
        )
        .unwrap();
        assert_eq!(parsed.status, SlotStatus::Other("under_repair".into()));
        assert!(!parsed.is_selectable());
        assert_eq!(
            serde_json::to_value(&parsed.status).unwrap(),
            serde_json::json!("under_repair")
        );
    }

    #[test]
    fn tiles_mark_selected_slot() {
        let slots = vec![slot(1, "available"), slot(2, "booked")];
        let tiles = SlotTile::build(&slots, SlotId::new(1).ok());
        assert_eq!(tiles[0].status, SlotStatus::Selected);
        assert!(tiles[0].selectable);
        assert_eq!(tiles[1].status, SlotStatus::Booked);
        assert!(!tiles[1].selectable);
    }

    #[test]
    fn window_defaults_to_one_hour() {
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap();
        let window = BookingWindow::starting_at(start, None).unwrap();
        assert_eq!(window.end - window.start, Duration::hours(1));
        let window = BookingWindow::starting_at(start, Some(2.5)).unwrap();
        assert_eq!(window.end - window.start, Duration::minutes(150));
        assert!(window.overlaps(start + Duration::hours(2), start + Duration::hours(3)));
        assert!(!window.overlaps(window.end, window.end + Duration::hours(1)));
    }

    #[test]
    fn huge_durations_are_an_error() {
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 10, 0, 0).unwrap();
        assert!(BookingWindow::starting_at(start, Some(1e10)).is_err());
        assert!(BookingWindow::starting_at(DateTime::<Utc>::MAX_UTC, Some(1.0)).is_err());
    }

    #[test]
    fn position_uses_wire_order_and_normalizes_drag() {
        let position: SlotPosition = serde_json::from_str("[120, 80, 3, -40, 30]").unwrap();
        assert_eq!(
            position,
            SlotPosition {
                index: 3,
                x: 80,
                y: 80,
                width: 40,
                height: 30
            }
        );
        assert_eq!(
            serde_json::to_string(&position).unwrap(),
            "[80,80,3,40,30]"
        );
    }
}
