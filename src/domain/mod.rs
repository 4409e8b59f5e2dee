//! Domain entities and rules of the parking booking front end.

pub mod area;
pub mod booking;
pub mod booking_flow;
pub mod occupancy;
pub mod pricing;
pub mod slot;
pub mod staff;
pub mod time;
pub mod types;
pub mod user;
