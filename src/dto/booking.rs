use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::area::ParkingArea;
use crate::domain::booking::{Booking, BookingTab};
use crate::domain::booking_flow::BookingFlow;
use crate::domain::slot::SlotTile;
use crate::dto::display_time;
use crate::forms::booking::SlotSearchForm;
use crate::pagination::Paginated;

/// Data required to render the slot grid and the booking dialog.
#[derive(Serialize)]
pub struct SlotPageData {
    pub area: ParkingArea,
    pub tiles: Vec<SlotTile>,
    /// Search the grid was loaded for, echoed into links and hidden fields.
    pub search: SlotSearchForm,
    /// Fee for the searched duration; zero disables confirmation.
    pub fee: u32,
    pub hourly_rate: u32,
    pub flow: BookingFlow,
    pub flow_state: &'static str,
    pub dialog_open: bool,
    pub free_count: usize,
}

/// A booking row with the actions the user may take on it.
#[derive(Serialize)]
pub struct BookingRow {
    #[serde(flatten)]
    pub booking: Booking,
    pub start_display: String,
    pub end_display: String,
    pub duration_hours: f64,
    pub cancellable: bool,
    pub extendable: bool,
}

impl BookingRow {
    pub fn new(booking: Booking, now: DateTime<Utc>) -> Self {
        Self {
            start_display: display_time(booking.start_time),
            end_display: display_time(booking.end_time),
            duration_hours: (booking.duration_hours() * 100.0).round() / 100.0,
            cancellable: booking.is_cancellable(now),
            extendable: booking.is_extendable(now),
            booking,
        }
    }
}

/// Number of bookings on each tab, for the tab badges.
#[derive(Serialize, Default, Debug, PartialEq, Eq)]
pub struct TabCounts {
    pub active: usize,
    pub upcoming: usize,
    pub past: usize,
}

/// Data required to render the bookings page.
#[derive(Serialize)]
pub struct BookingsPageData {
    pub tab: BookingTab,
    pub counts: TabCounts,
    pub bookings: Paginated<BookingRow>,
}

/// Data required to render the booking search screen.
#[derive(Serialize)]
pub struct SearchPageData {
    pub areas: Vec<ParkingArea>,
    pub search: SlotSearchForm,
}
