use diesel::prelude::*;

use crate::domain::slot::{ParkingSlot as DomainSlot, SlotPosition as DomainPosition, SlotStatus};
use crate::domain::types::{AreaId, SlotId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::slots)]
/// Diesel model for [`crate::domain::slot::ParkingSlot`]. `status` is the
/// physical state of the slot; bookings are overlaid when listing.
pub struct Slot {
    pub id: i32,
    pub area_id: i32,
    pub slot_number: String,
    pub status: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::slots)]
pub struct NewSlot {
    pub area_id: i32,
    pub slot_number: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::slot_positions)]
pub struct SlotPosition {
    pub area_id: i32,
    pub slot_index: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Slot {
    pub fn into_domain(self, status: SlotStatus) -> Result<DomainSlot, TypeConstraintError> {
        Ok(DomainSlot {
            id: SlotId::new(self.id)?,
            slot_number: self.slot_number,
            area_id: AreaId::new(self.area_id)?,
            status,
        })
    }
}

impl SlotPosition {
    pub fn new(area_id: AreaId, position: &DomainPosition) -> Self {
        Self {
            area_id: area_id.get(),
            slot_index: position.index,
            x: position.x,
            y: position.y,
            width: position.width,
            height: position.height,
        }
    }
}

impl From<SlotPosition> for DomainPosition {
    fn from(row: SlotPosition) -> Self {
        DomainPosition::from_drag(row.slot_index, row.x, row.y, row.width, row.height)
    }
}

/// Slot numbers of a freshly created area: `A1`, `A2`, ...
pub fn slot_numbers(prefix: char, count: u32) -> impl Iterator<Item = String> {
    (1..=count).map(move |n| format!("{prefix}{n}"))
}
