use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::types::{AreaId, AreaName, Description};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParkingArea {
    pub id: AreaId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "totalSlots")]
    pub total_slots: u32,
    #[serde(default)]
    pub available_slots: Option<u32>,
    #[serde(default)]
    pub status: AreaStatus,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum AreaStatus {
    #[default]
    Active,
    Inactive,
    Maintenance,
    Other(String),
}

/// Data submitted when creating or editing an area.
#[derive(Clone, Debug, PartialEq)]
pub struct AreaDraft {
    pub name: AreaName,
    pub description: Description,
    pub total_slots: u32,
    pub status: AreaStatus,
}

impl ParkingArea {
    /// Areas in maintenance or inactive areas cannot take new bookings.
    pub fn is_bookable(&self) -> bool {
        self.status == AreaStatus::Active
    }
}

impl AreaStatus {
    pub const ALL: [AreaStatus; 3] = [
        AreaStatus::Active,
        AreaStatus::Inactive,
        AreaStatus::Maintenance,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            AreaStatus::Active => "active",
            AreaStatus::Inactive => "inactive",
            AreaStatus::Maintenance => "maintenance",
            AreaStatus::Other(s) => s,
        }
    }
}

impl Display for AreaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for AreaStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => AreaStatus::Active,
            "inactive" => AreaStatus::Inactive,
            "maintenance" => AreaStatus::Maintenance,
            _ => AreaStatus::Other(s.to_string()),
        }
    }
}

impl From<String> for AreaStatus {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl From<AreaStatus> for String {
    fn from(status: AreaStatus) -> Self {
        status.as_str().to_string()
    }
}
