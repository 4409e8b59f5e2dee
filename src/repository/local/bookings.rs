use std::cmp::Reverse;

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::booking::{
    Booking, BookingExtension, BookingKind, BookingStatus, DashboardStats, HistoryScope,
    NewBooking,
};
use crate::domain::pricing::fee_for_window;
use crate::domain::types::{BookingId, UserId};
use crate::models::booking::{Booking as DbBooking, NewBooking as DbNewBooking};
use crate::models::slot::Slot as DbSlot;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::local::{CLOSED_STATUSES, DieselRepository, effective_status};
use crate::repository::{BookingReader, BookingWriter};

const RECENT_BOOKINGS: usize = 5;

fn slot_taken() -> RepositoryError {
    RepositoryError::ConstraintViolation("Slot is not available for the selected time".to_string())
}

/// Bookings joined with their area and slot names, newest start first.
fn load_bookings(
    conn: &mut SqliteConnection,
    user_id: Option<UserId>,
) -> RepositoryResult<Vec<Booking>> {
    use crate::schema::{areas, bookings, slots};

    let mut query = bookings::table
        .inner_join(areas::table)
        .inner_join(slots::table)
        .select((DbBooking::as_select(), areas::name, slots::slot_number))
        .order(bookings::start_time.desc())
        .into_boxed();
    if let Some(user_id) = user_id {
        query = query.filter(bookings::user_id.eq(user_id.get()));
    }
    let rows: Vec<(DbBooking, String, String)> = query.load(conn)?;

    let now = Utc::now();
    rows.into_iter()
        .map(|(row, area_name, slot_number)| {
            let mut booking = row.into_domain(Some(area_name), Some(slot_number))?;
            booking.status = effective_status(
                booking.status.as_str(),
                booking.start_time,
                booking.end_time,
                now,
            );
            Ok(booking)
        })
        .collect()
}

/// Open bookings of `slot_id` that overlap `[start, end)`, optionally
/// ignoring one booking.
fn overlapping(
    conn: &mut SqliteConnection,
    slot_id: i32,
    start: NaiveDateTime,
    end: NaiveDateTime,
    except: Option<i32>,
) -> QueryResult<i64> {
    use crate::schema::bookings;

    let mut query = bookings::table
        .filter(bookings::slot_id.eq(slot_id))
        .filter(bookings::status.ne_all(CLOSED_STATUSES))
        .filter(bookings::start_time.lt(end))
        .filter(bookings::end_time.gt(start))
        .into_boxed();
    if let Some(id) = except {
        query = query.filter(bookings::id.ne(id));
    }
    query.count().get_result(conn)
}

fn initial_status(booking: &NewBooking, now: DateTime<Utc>) -> &'static str {
    match booking.kind {
        BookingKind::Pre if booking.start_time > now => "upcoming",
        _ => "active",
    }
}

impl BookingReader for DieselRepository {
    async fn list_user_bookings(&self, user_id: UserId) -> RepositoryResult<Vec<Booking>> {
        let mut conn = self.conn()?;
        load_bookings(&mut conn, Some(user_id))
    }

    async fn booking_history(&self, scope: HistoryScope) -> RepositoryResult<Vec<Booking>> {
        let mut conn = self.conn()?;
        match scope {
            HistoryScope::All => load_bookings(&mut conn, None),
            HistoryScope::User(user_id) => load_bookings(&mut conn, Some(user_id)),
        }
    }

    async fn dashboard_stats(&self) -> RepositoryResult<DashboardStats> {
        let user_id = self.acting_user()?;
        let mut conn = self.conn()?;
        let mut bookings = load_bookings(&mut conn, Some(user_id))?;

        let active_bookings = bookings
            .iter()
            .filter(|b| matches!(b.status, BookingStatus::Active | BookingStatus::Upcoming))
            .count() as u32;
        let total_spent = bookings
            .iter()
            .filter(|b| b.status != BookingStatus::Cancelled)
            .map(|b| b.amount)
            .sum();
        let total_bookings = bookings.len() as u32;

        bookings.sort_by_key(|b| Reverse(b.start_time));
        bookings.truncate(RECENT_BOOKINGS);

        Ok(DashboardStats {
            active_bookings,
            total_bookings,
            total_spent,
            recent_bookings: bookings,
        })
    }
}

impl BookingWriter for DieselRepository {
    async fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<Booking> {
        use crate::schema::{areas, bookings, slots};

        let user_id = match booking.kind {
            BookingKind::Pre => Some(self.acting_user()?),
            BookingKind::WalkIn => None,
        };
        let now = Utc::now();
        let mut conn = self.conn()?;

        conn.transaction::<Booking, RepositoryError, _>(|conn| {
            let slot = slots::table
                .find(booking.slot_id.get())
                .select(DbSlot::as_select())
                .first(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;
            if slot.area_id != booking.area_id.get() {
                return Err(RepositoryError::ValidationError(
                    "Slot does not belong to the selected area".to_string(),
                ));
            }
            if slot.status != "available" {
                return Err(slot_taken());
            }

            let start = booking.start_time.naive_utc();
            let end = booking.end_time.naive_utc();
            if overlapping(conn, slot.id, start, end, None)? > 0 {
                return Err(slot_taken());
            }

            let row = diesel::insert_into(bookings::table)
                .values(DbNewBooking::new(booking, user_id, initial_status(booking, now)))
                .returning(DbBooking::as_returning())
                .get_result(conn)?;
            let area_name: String = areas::table
                .find(row.area_id)
                .select(areas::name)
                .first(conn)?;

            Ok(row.into_domain(Some(area_name), Some(slot.slot_number))?)
        })
    }

    async fn cancel_booking(&self, id: BookingId) -> RepositoryResult<()> {
        use crate::schema::bookings;

        let user_id = self.acting_user()?;
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        let updated = diesel::update(
            bookings::table
                .find(id.get())
                .filter(bookings::user_id.eq(user_id.get()))
                .filter(bookings::status.ne_all(CLOSED_STATUSES))
                .filter(bookings::end_time.gt(now)),
        )
        .set((
            bookings::status.eq("cancelled"),
            bookings::actual_end_time.eq(Some(now)),
        ))
        .execute(&mut conn)?;

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn extend_booking(
        &self,
        id: BookingId,
        extension: &BookingExtension,
    ) -> RepositoryResult<()> {
        use crate::schema::bookings;

        let user_id = self.acting_user()?;
        let mut conn = self.conn()?;

        conn.transaction::<(), RepositoryError, _>(|conn| {
            let row = bookings::table
                .find(id.get())
                .filter(bookings::user_id.eq(user_id.get()))
                .filter(bookings::status.ne_all(CLOSED_STATUSES))
                .select(DbBooking::as_select())
                .first(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            let new_end = extension.new_end_time.naive_utc();
            if new_end <= row.end_time {
                return Err(RepositoryError::ValidationError(
                    "The new end time must be after the current one".to_string(),
                ));
            }
            if overlapping(conn, row.slot_id, row.end_time, new_end, Some(row.id))? > 0 {
                return Err(slot_taken());
            }

            let amount = fee_for_window(row.start_time.and_utc(), extension.new_end_time);
            diesel::update(bookings::table.find(row.id))
                .set((
                    bookings::end_time.eq(new_end),
                    bookings::amount.eq(f64::from(amount)),
                ))
                .execute(conn)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::domain::types::{AreaId, SlotId, VehicleNumber};

    fn new_booking(kind: BookingKind, start: DateTime<Utc>) -> NewBooking {
        NewBooking {
            slot_id: SlotId::new(1).unwrap(),
            area_id: AreaId::new(1).unwrap(),
            vehicle_number: VehicleNumber::new("KA-01-1234").unwrap(),
            start_time: start,
            end_time: start + Duration::hours(2),
            amount: 100,
            kind,
        }
    }

    #[test]
    fn future_pre_bookings_start_upcoming() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let later = now + Duration::hours(3);
        assert_eq!(initial_status(&new_booking(BookingKind::Pre, later), now), "upcoming");
        assert_eq!(initial_status(&new_booking(BookingKind::Pre, now), now), "active");
        assert_eq!(initial_status(&new_booking(BookingKind::WalkIn, later), now), "active");
    }
}
