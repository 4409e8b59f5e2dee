use std::cmp::Reverse;
use std::fmt::Display;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::types::{AreaId, BookingId, SlotId, UserId, VehicleNumber};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub area_id: AreaId,
    pub slot_id: SlotId,
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default)]
    pub slot_number: Option<String>,
    pub vehicle_number: String,
    #[serde(with = "crate::domain::time")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "crate::domain::time")]
    pub end_time: DateTime<Utc>,
    #[serde(default, with = "crate::domain::time::option")]
    pub actual_end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    pub status: BookingStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
    Expired,
    Other(String),
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Upcoming,
        BookingStatus::Active,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Expired,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Upcoming => "upcoming",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Expired => "expired",
            BookingStatus::Other(s) => s,
        }
    }

    /// Statuses that no longer hold a slot.
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Expired
        )
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for BookingStatus {
    fn from(s: &str) -> Self {
        match s {
            "upcoming" | "confirmed" => BookingStatus::Upcoming,
            "active" => BookingStatus::Active,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            "expired" => BookingStatus::Expired,
            _ => BookingStatus::Other(s.to_string()),
        }
    }
}

impl From<String> for BookingStatus {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Option::<Amount>::deserialize(deserializer)? {
        Some(Amount::Number(value)) => Ok(value),
        Some(Amount::Text(raw)) => raw
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {raw}"))),
        None => Ok(0.0),
    }
}

impl Booking {
    /// Bookings that have not ended and are still open can be cancelled.
    pub fn is_cancellable(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_closed() && self.end_time > now
    }

    /// Only a stay in progress can be extended.
    pub fn is_extendable(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_closed() && BookingTab::classify(self, now) == BookingTab::Active
    }

    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_seconds() as f64 / 3600.0
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    /// Booked ahead of arrival by the driver.
    #[default]
    Pre,
    /// Registered by staff for a vehicle already on site.
    WalkIn,
}

/// Request to create a booking. Serializes to the backend request body.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewBooking {
    pub slot_id: SlotId,
    pub area_id: AreaId,
    pub vehicle_number: VehicleNumber,
    #[serde(with = "crate::domain::time")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "crate::domain::time")]
    pub end_time: DateTime<Utc>,
    pub amount: u32,
    #[serde(skip)]
    pub kind: BookingKind,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BookingExtension {
    #[serde(with = "crate::domain::time")]
    pub new_end_time: DateTime<Utc>,
}

/// Tabs of the bookings page.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingTab {
    #[default]
    Active,
    Upcoming,
    Past,
}

impl BookingTab {
    pub const ALL: [BookingTab; 3] = [BookingTab::Active, BookingTab::Upcoming, BookingTab::Past];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingTab::Active => "active",
            BookingTab::Upcoming => "upcoming",
            BookingTab::Past => "past",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "upcoming" => BookingTab::Upcoming,
            "past" => BookingTab::Past,
            _ => BookingTab::Active,
        }
    }

    pub fn classify(booking: &Booking, now: DateTime<Utc>) -> Self {
        if booking.end_time < now {
            BookingTab::Past
        } else if booking.start_time > now {
            BookingTab::Upcoming
        } else {
            BookingTab::Active
        }
    }

    /// Bookings belonging to this tab, in display order: latest end first for
    /// past stays, nearest start first for upcoming ones.
    pub fn filter_and_sort(self, bookings: &[Booking], now: DateTime<Utc>) -> Vec<Booking> {
        let mut selected: Vec<Booking> = bookings
            .iter()
            .filter(|booking| Self::classify(booking, now) == self)
            .cloned()
            .collect();
        match self {
            BookingTab::Past => selected.sort_by_key(|b| Reverse(b.end_time)),
            BookingTab::Upcoming => selected.sort_by_key(|b| b.start_time),
            BookingTab::Active => selected.sort_by_key(|b| b.end_time),
        }
        selected
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[default]
    All,
    Week,
    Month,
}

impl DateRange {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "week" => DateRange::Week,
            "month" => DateRange::Month,
            _ => DateRange::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::All => "all",
            DateRange::Week => "week",
            DateRange::Month => "month",
        }
    }

    /// Earliest start time included by the range.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DateRange::All => None,
            DateRange::Week => Some(now - Duration::days(7)),
            DateRange::Month => now.checked_sub_months(Months::new(1)),
        }
    }
}

/// Filters of the booking history page. All set filters must match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryFilter {
    pub status: Option<BookingStatus>,
    pub range: DateRange,
    pub search: Option<String>,
}

impl HistoryFilter {
    pub fn matches(&self, booking: &Booking, now: DateTime<Utc>) -> bool {
        if let Some(status) = &self.status
            && &booking.status != status
        {
            return false;
        }
        if let Some(since) = self.range.since(now)
            && booking.start_time < since
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                booking.vehicle_number.to_lowercase().contains(&term)
                    || booking
                        .area_name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }

    /// Matching bookings, most recent start first.
    pub fn apply(&self, bookings: &[Booking], now: DateTime<Utc>) -> Vec<Booking> {
        let mut matching: Vec<Booking> = bookings
            .iter()
            .filter(|booking| self.matches(booking, now))
            .cloned()
            .collect();
        matching.sort_by_key(|b| Reverse(b.start_time));
        matching
    }
}

/// Whose bookings a history request covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryScope {
    All,
    User(UserId),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    #[serde(default)]
    pub active_bookings: u32,
    #[serde(default)]
    pub total_bookings: u32,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_spent: f64,
    #[serde(default)]
    pub recent_bookings: Vec<Booking>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn booking(id: i32, start_offset_hours: i64, hours: i64, now: DateTime<Utc>) -> Booking {
        let start = now + Duration::hours(start_offset_hours);
        Booking {
            id: BookingId::new(id).unwrap(),
            user_id: None,
            area_id: AreaId::new(1).unwrap(),
            slot_id: SlotId::new(id).unwrap(),
            area_name: Some("Main Entrance".into()),
            slot_number: Some(format!("A{id}")),
            vehicle_number: format!("KA-01-{id:04}"),
            start_time: start,
            end_time: start + Duration::hours(hours),
            actual_end_time: None,
            amount: 50.0 * hours as f64,
            status: BookingStatus::Upcoming,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn confirmed_is_upcoming_and_amount_is_lenient() {
        let parsed: Booking = serde_json::from_str(
            r#"{"id":9,"area_id":1,"slot_id":4,"vehicle_number":"KA-01-1234",
                "start_time":"2024-03-20T10:00:00","end_time":"2024-03-20T12:00:00Z",
                "amount":"100.00","status":"confirmed"}"#,
        )
        .unwrap();
        assert_eq!(parsed.status, BookingStatus::Upcoming);
        assert_eq!(parsed.amount, 100.0);
        assert_eq!(parsed.duration_hours(), 2.0);

        let parsed: Booking = serde_json::from_str(
            r#"{"id":9,"area_id":1,"slot_id":4,"vehicle_number":"KA-01-1234",
                "start_time":"2024-03-20T10:00:00","end_time":"2024-03-20T12:00:00Z",
                "amount":null,"status":"upcoming"}"#,
        )
        .unwrap();
        assert_eq!(parsed.amount, 0.0);
    }

    #[test]
    fn tabs_partition_by_time() {
        let now = now();
        let bookings = vec![
            booking(1, -5, 1, now),
            booking(2, -10, 2, now),
            booking(3, -1, 3, now),
            booking(4, 6, 1, now),
            booking(5, 2, 1, now),
        ];

        let past = BookingTab::Past.filter_and_sort(&bookings, now);
        assert_eq!(past.iter().map(|b| b.id.get()).collect::<Vec<_>>(), vec![1, 2]);

        let upcoming = BookingTab::Upcoming.filter_and_sort(&bookings, now);
        assert_eq!(
            upcoming.iter().map(|b| b.id.get()).collect::<Vec<_>>(),
            vec![5, 4]
        );

        let active = BookingTab::Active.filter_and_sort(&bookings, now);
        assert_eq!(active.iter().map(|b| b.id.get()).collect::<Vec<_>>(), vec![3]);
        assert!(active[0].is_extendable(now));
        assert!(!past[0].is_cancellable(now));
    }

    #[test]
    fn boundary_instants_are_active() {
        let now = now();
        let starts_now = booking(1, 0, 1, now);
        let mut ends_now = booking(2, -1, 1, now);
        ends_now.end_time = now;
        assert_eq!(BookingTab::classify(&starts_now, now), BookingTab::Active);
        assert_eq!(BookingTab::classify(&ends_now, now), BookingTab::Active);
    }

    #[test]
    fn history_filters_are_conjunctive() {
        let now = now();
        let mut old = booking(1, -24 * 20, 1, now);
        old.status = BookingStatus::Completed;
        let mut recent = booking(2, -24 * 2, 1, now);
        recent.status = BookingStatus::Completed;
        recent.area_name = Some("Side Parking".into());
        let mut cancelled = booking(3, -24, 1, now);
        cancelled.status = BookingStatus::Cancelled;
        let bookings = vec![old, recent, cancelled];

        let filter = HistoryFilter {
            status: Some(BookingStatus::Completed),
            range: DateRange::Week,
            search: None,
        };
        let ids: Vec<i32> = filter.apply(&bookings, now).iter().map(|b| b.id.get()).collect();
        assert_eq!(ids, vec![2]);

        let filter = HistoryFilter {
            status: None,
            range: DateRange::Month,
            search: Some("side".into()),
        };
        let ids: Vec<i32> = filter.apply(&bookings, now).iter().map(|b| b.id.get()).collect();
        assert_eq!(ids, vec![2]);

        let filter = HistoryFilter {
            search: Some("ka-01-0003".into()),
            ..HistoryFilter::default()
        };
        let ids: Vec<i32> = filter.apply(&bookings, now).iter().map(|b| b.id.get()).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn new_booking_request_body() {
        let start = now();
        let request = NewBooking {
            slot_id: SlotId::new(1).unwrap(),
            area_id: AreaId::new(2).unwrap(),
            vehicle_number: VehicleNumber::new("KA-01-1234").unwrap(),
            start_time: start,
            end_time: start + Duration::hours(2),
            amount: 100,
            kind: BookingKind::Pre,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "slot_id": 1,
                "area_id": 2,
                "vehicle_number": "KA-01-1234",
                "start_time": "2024-03-20T12:00:00+00:00",
                "end_time": "2024-03-20T14:00:00+00:00",
                "amount": 100
            })
        );
    }
}
