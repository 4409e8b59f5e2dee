use serde::Serialize;

use crate::domain::booking::Booking;
use crate::dto::booking::BookingRow;
use crate::forms::history::HistoryQuery;
use crate::pagination::Paginated;

/// Data required to render the booking history page.
#[derive(Serialize)]
pub struct HistoryPageData {
    pub bookings: Paginated<BookingRow>,
    /// Filters echoed back into the filter bar.
    pub query: HistoryQuery,
    pub total_matching: usize,
    pub total_amount: f64,
    /// Whether the list covers every user's bookings.
    pub all_users: bool,
}

/// One line of the CSV report.
#[derive(Serialize)]
pub struct ReportRow<'a> {
    pub booking_id: i32,
    pub area: &'a str,
    pub slot: &'a str,
    pub vehicle_number: &'a str,
    pub start_time: String,
    pub end_time: String,
    pub amount: f64,
    pub status: &'a str,
}

impl<'a> From<&'a Booking> for ReportRow<'a> {
    fn from(booking: &'a Booking) -> Self {
        Self {
            booking_id: booking.id.get(),
            area: booking.area_name.as_deref().unwrap_or(""),
            slot: booking.slot_number.as_deref().unwrap_or(""),
            vehicle_number: &booking.vehicle_number,
            start_time: booking.start_time.to_rfc3339(),
            end_time: booking.end_time.to_rfc3339(),
            amount: booking.amount,
            status: booking.status.as_str(),
        }
    }
}
