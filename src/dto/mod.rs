//! DTO modules that bridge services with templates and APIs.

use chrono::{DateTime, Local, Utc};

pub mod booking;
pub mod history;
pub mod live;

/// Timestamp as shown in tables, in server local time.
pub fn display_time(value: DateTime<Utc>) -> String {
    value.with_timezone(&Local).format("%d %b %Y, %H:%M").to_string()
}
