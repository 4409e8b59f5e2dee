//! Database rows of the local store, plus the web layer's session and
//! configuration models.

pub mod area;
#[cfg(feature = "server")]
pub mod auth;
pub mod booking;
#[cfg(feature = "server")]
pub mod config;
pub mod slot;
pub mod staff;
pub mod user;
