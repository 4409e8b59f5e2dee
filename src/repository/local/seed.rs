use chrono::{Duration, Utc};
use diesel::prelude::*;
use rand::Rng;

use crate::domain::pricing::fee_for_window;
use crate::models::area::Area as DbArea;
use crate::models::slot::{NewSlot, Slot as DbSlot, slot_numbers};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::local::DieselRepository;

/// Areas created in an empty store: name, description, slot prefix.
const DEFAULT_AREAS: [(&str, &str, char); 2] = [
    ("Main Entrance", "Covered parking next to the main gate", 'A'),
    ("Side Parking", "Open-air lot along the east wing", 'B'),
];
const SLOTS_PER_AREA: u32 = 10;
/// Share of seeded slots that start out occupied.
const OCCUPIED_SHARE: f64 = 0.2;

#[derive(Insertable)]
#[diesel(table_name = crate::schema::bookings)]
struct SeedBooking<'a> {
    area_id: i32,
    slot_id: i32,
    vehicle_number: &'a str,
    start_time: chrono::NaiveDateTime,
    end_time: chrono::NaiveDateTime,
    amount: f64,
    status: &'a str,
    kind: &'a str,
}

impl DieselRepository {
    /// Fills an empty store with the default areas, their slots and a few
    /// walk-in bookings in progress. Returns the number of areas created.
    pub fn seed_defaults(&self) -> RepositoryResult<usize> {
        use crate::schema::{areas, bookings, slots};

        let mut conn = self.conn()?;
        let existing: i64 = areas::table.count().get_result(&mut conn)?;
        if existing > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        let start = now - Duration::hours(1);
        let end = now + Duration::hours(2);
        let amount = f64::from(fee_for_window(start, end));
        let mut rng = rand::thread_rng();

        conn.transaction::<usize, RepositoryError, _>(|conn| {
            for (name, description, prefix) in DEFAULT_AREAS {
                let area = diesel::insert_into(areas::table)
                    .values((
                        areas::name.eq(name),
                        areas::description.eq(description),
                        areas::total_slots.eq(SLOTS_PER_AREA as i32),
                        areas::status.eq("active"),
                    ))
                    .returning(DbArea::as_returning())
                    .get_result(conn)?;

                let new_slots: Vec<NewSlot> = slot_numbers(prefix, SLOTS_PER_AREA)
                    .map(|slot_number| NewSlot {
                        area_id: area.id,
                        slot_number,
                        status: "available",
                    })
                    .collect();
                diesel::insert_into(slots::table)
                    .values(&new_slots)
                    .execute(conn)?;
                let created: Vec<DbSlot> = slots::table
                    .filter(slots::area_id.eq(area.id))
                    .order(slots::id.asc())
                    .select(DbSlot::as_select())
                    .load(conn)?;

                let vehicles: Vec<String> = created
                    .iter()
                    .map(|slot| format!("KA-01-{:04}", 1000 + slot.id))
                    .collect();
                let occupied: Vec<SeedBooking> = created
                    .iter()
                    .zip(&vehicles)
                    .filter(|_| rng.gen_bool(OCCUPIED_SHARE))
                    .map(|(slot, vehicle)| SeedBooking {
                        area_id: area.id,
                        slot_id: slot.id,
                        vehicle_number: vehicle,
                        start_time: start.naive_utc(),
                        end_time: end.naive_utc(),
                        amount,
                        status: "active",
                        kind: "walk_in",
                    })
                    .collect();
                if !occupied.is_empty() {
                    diesel::insert_into(bookings::table)
                        .values(&occupied)
                        .execute(conn)?;
                }
                log::info!(
                    "Seeded area {name} with {} slots, {} occupied",
                    created.len(),
                    occupied.len()
                );
            }
            Ok(DEFAULT_AREAS.len())
        })
    }
}
