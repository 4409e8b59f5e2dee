use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::booking::{
    Booking as DomainBooking, BookingKind, BookingStatus, NewBooking as DomainNewBooking,
};
use crate::domain::types::{AreaId, BookingId, SlotId, TypeConstraintError, UserId};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::bookings)]
/// Diesel model for [`crate::domain::booking::Booking`].
pub struct Booking {
    pub id: i32,
    pub user_id: Option<i32>,
    pub area_id: i32,
    pub slot_id: i32,
    pub vehicle_number: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub actual_end_time: Option<NaiveDateTime>,
    pub amount: f64,
    pub status: String,
    pub kind: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct NewBooking<'a> {
    pub user_id: Option<i32>,
    pub area_id: i32,
    pub slot_id: i32,
    pub vehicle_number: &'a str,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub amount: f64,
    pub status: &'a str,
    pub kind: &'a str,
}

impl<'a> NewBooking<'a> {
    pub fn new(booking: &'a DomainNewBooking, user_id: Option<UserId>, status: &'a str) -> Self {
        Self {
            user_id: user_id.map(UserId::get),
            area_id: booking.area_id.get(),
            slot_id: booking.slot_id.get(),
            vehicle_number: booking.vehicle_number.as_str(),
            start_time: booking.start_time.naive_utc(),
            end_time: booking.end_time.naive_utc(),
            amount: f64::from(booking.amount),
            status,
            kind: match booking.kind {
                BookingKind::Pre => "pre",
                BookingKind::WalkIn => "walk_in",
            },
        }
    }
}

fn utc(value: NaiveDateTime) -> DateTime<Utc> {
    value.and_utc()
}

impl Booking {
    /// Converts the row; `area_name` and `slot_number` come from joins.
    pub fn into_domain(
        self,
        area_name: Option<String>,
        slot_number: Option<String>,
    ) -> Result<DomainBooking, TypeConstraintError> {
        Ok(DomainBooking {
            id: BookingId::new(self.id)?,
            user_id: self.user_id.map(UserId::new).transpose()?,
            area_id: AreaId::new(self.area_id)?,
            slot_id: SlotId::new(self.slot_id)?,
            area_name,
            slot_number,
            vehicle_number: self.vehicle_number,
            start_time: utc(self.start_time),
            end_time: utc(self.end_time),
            actual_end_time: self.actual_end_time.map(utc),
            amount: self.amount,
            status: BookingStatus::from(self.status),
        })
    }
}
