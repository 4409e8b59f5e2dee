use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;

use crate::domain::area::{AreaDraft, ParkingArea};
use crate::domain::slot::{BookingWindow, ParkingSlot, SlotPosition, SlotQuery, SlotStatus};
use crate::domain::types::AreaId;
use crate::models::area::{Area as DbArea, AreaValues};
use crate::models::slot::{
    NewSlot, Slot as DbSlot, SlotPosition as DbSlotPosition, slot_numbers,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::local::{CLOSED_STATUSES, DieselRepository};
use crate::repository::{AreaReader, AreaWriter, SlotReader, SlotWriter};

/// Status of every slot in `slots` for `window`: the stored physical status
/// unless it is `available`, otherwise derived from overlapping bookings.
pub(super) fn slot_statuses(
    conn: &mut SqliteConnection,
    slots: &[DbSlot],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> QueryResult<HashMap<i32, SlotStatus>> {
    use crate::schema::bookings;

    let ids: Vec<i32> = slots.iter().map(|slot| slot.id).collect();
    let taken: Vec<(i32, String)> = bookings::table
        .filter(bookings::slot_id.eq_any(&ids))
        .filter(bookings::status.ne_all(CLOSED_STATUSES))
        .filter(bookings::start_time.lt(end.naive_utc()))
        .filter(bookings::end_time.gt(start.naive_utc()))
        .select((bookings::slot_id, bookings::kind))
        .load(conn)?;

    let mut taken_by_slot: HashMap<i32, SlotStatus> = HashMap::new();
    for (slot_id, kind) in taken {
        let status = if kind == "walk_in" {
            SlotStatus::Occupied
        } else {
            SlotStatus::Booked
        };
        taken_by_slot
            .entry(slot_id)
            .and_modify(|current| {
                if status == SlotStatus::Occupied {
                    *current = SlotStatus::Occupied;
                }
            })
            .or_insert(status);
    }

    Ok(slots
        .iter()
        .map(|slot| {
            let base = SlotStatus::from(slot.status.as_str());
            let status = if base == SlotStatus::Available {
                taken_by_slot
                    .remove(&slot.id)
                    .unwrap_or(SlotStatus::Available)
            } else {
                base
            };
            (slot.id, status)
        })
        .collect())
}

fn free_now(conn: &mut SqliteConnection, area_id: i32) -> QueryResult<u32> {
    use crate::schema::slots;

    let area_slots = slots::table
        .filter(slots::area_id.eq(area_id))
        .select(DbSlot::as_select())
        .load(conn)?;
    let now = Utc::now();
    let statuses = slot_statuses(conn, &area_slots, now, now + Duration::minutes(1))?;
    Ok(statuses
        .values()
        .filter(|status| **status == SlotStatus::Available)
        .count() as u32)
}

fn slot_prefix(name: &str) -> char {
    name.chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('P')
}

/// Adds or removes slots so the area has exactly `total` of them.
fn resize_slots(
    conn: &mut SqliteConnection,
    area_id: i32,
    name: &str,
    total: u32,
) -> RepositoryResult<()> {
    use crate::schema::{bookings, slots};

    let existing = slots::table
        .filter(slots::area_id.eq(area_id))
        .order(slots::id.asc())
        .select(DbSlot::as_select())
        .load(conn)?;
    let current = existing.len() as u32;

    if total > current {
        let prefix = existing
            .first()
            .and_then(|slot| slot.slot_number.chars().next())
            .unwrap_or_else(|| slot_prefix(name));
        let new_slots: Vec<NewSlot> = slot_numbers(prefix, total)
            .skip(current as usize)
            .map(|slot_number| NewSlot {
                area_id,
                slot_number,
                status: "available",
            })
            .collect();
        diesel::insert_into(slots::table)
            .values(&new_slots)
            .execute(conn)?;
    } else if total < current {
        let removable: Vec<i32> = existing
            .iter()
            .rev()
            .take((current - total) as usize)
            .map(|slot| slot.id)
            .collect();
        let open_bookings: i64 = bookings::table
            .filter(bookings::slot_id.eq_any(&removable))
            .filter(bookings::status.ne_all(CLOSED_STATUSES))
            .filter(bookings::end_time.gt(Utc::now().naive_utc()))
            .count()
            .get_result(conn)?;
        if open_bookings > 0 {
            return Err(RepositoryError::ConstraintViolation(
                "Cannot remove slots that still have bookings".to_string(),
            ));
        }
        diesel::delete(slots::table.filter(slots::id.eq_any(&removable))).execute(conn)?;
    }
    Ok(())
}

impl AreaReader for DieselRepository {
    async fn list_areas(&self) -> RepositoryResult<Vec<ParkingArea>> {
        use crate::schema::areas;

        let mut conn = self.conn()?;
        let rows = areas::table
            .order(areas::name.asc())
            .select(DbArea::as_select())
            .load(&mut conn)?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let free = free_now(&mut conn, row.id)?;
            result.push(row.into_domain(Some(free))?);
        }
        Ok(result)
    }

    async fn get_area(&self, id: AreaId) -> RepositoryResult<Option<ParkingArea>> {
        use crate::schema::areas;

        let mut conn = self.conn()?;
        let row = areas::table
            .find(id.get())
            .select(DbArea::as_select())
            .first(&mut conn)
            .optional()?;

        match row {
            Some(row) => {
                let free = free_now(&mut conn, row.id)?;
                Ok(Some(row.into_domain(Some(free))?))
            }
            None => Ok(None),
        }
    }
}

impl AreaWriter for DieselRepository {
    async fn create_area(&self, draft: &AreaDraft) -> RepositoryResult<ParkingArea> {
        use crate::schema::areas;

        let mut conn = self.conn()?;
        let row = conn.transaction::<DbArea, RepositoryError, _>(|conn| {
            let row = diesel::insert_into(areas::table)
                .values(AreaValues::from(draft))
                .returning(DbArea::as_returning())
                .get_result(conn)?;
            resize_slots(conn, row.id, &row.name, draft.total_slots)?;
            Ok(row)
        })?;
        Ok(row.into_domain(Some(draft.total_slots))?)
    }

    async fn update_area(&self, id: AreaId, draft: &AreaDraft) -> RepositoryResult<ParkingArea> {
        use crate::schema::areas;

        let mut conn = self.conn()?;
        let row = conn.transaction::<DbArea, RepositoryError, _>(|conn| {
            let row = diesel::update(areas::table.find(id.get()))
                .set((
                    AreaValues::from(draft),
                    areas::updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(DbArea::as_returning())
                .get_result(conn)?;
            resize_slots(conn, row.id, &row.name, draft.total_slots)?;
            Ok(row)
        })?;
        let free = free_now(&mut conn, row.id)?;
        Ok(row.into_domain(Some(free))?)
    }

    async fn delete_area(&self, id: AreaId) -> RepositoryResult<()> {
        use crate::schema::areas;

        let mut conn = self.conn()?;
        let deleted = diesel::delete(areas::table.find(id.get())).execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl SlotReader for DieselRepository {
    async fn list_slots(&self, query: &SlotQuery) -> RepositoryResult<Vec<ParkingSlot>> {
        use crate::schema::slots;

        let mut conn = self.conn()?;
        let rows = slots::table
            .filter(slots::area_id.eq(query.area_id.get()))
            .order(slots::id.asc())
            .select(DbSlot::as_select())
            .load(&mut conn)?;

        let window = match query.window {
            Some(window) => window,
            None => BookingWindow::starting_at(Utc::now(), None)?,
        };
        let mut statuses = slot_statuses(&mut conn, &rows, window.start, window.end)?;

        rows.into_iter()
            .map(|row| {
                let status = statuses.remove(&row.id).unwrap_or(SlotStatus::Available);
                row.into_domain(status).map_err(RepositoryError::from)
            })
            .collect()
    }
}

impl SlotWriter for DieselRepository {
    async fn save_positions(
        &self,
        area_id: AreaId,
        positions: &[SlotPosition],
    ) -> RepositoryResult<()> {
        use crate::schema::{areas, slot_positions};

        let mut conn = self.conn()?;
        let rows: Vec<DbSlotPosition> = positions
            .iter()
            .map(|position| DbSlotPosition::new(area_id, position))
            .collect();

        conn.transaction::<(), RepositoryError, _>(|conn| {
            let exists: i64 = areas::table
                .filter(areas::id.eq(area_id.get()))
                .count()
                .get_result(conn)?;
            if exists == 0 {
                return Err(RepositoryError::NotFound);
            }
            diesel::delete(slot_positions::table.filter(slot_positions::area_id.eq(area_id.get())))
                .execute(conn)?;
            diesel::insert_into(slot_positions::table)
                .values(&rows)
                .execute(conn)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_uses_first_letter() {
        assert_eq!(slot_prefix("north lot"), 'N');
        assert_eq!(slot_prefix("42"), 'P');
    }
}
