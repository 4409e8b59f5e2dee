use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::area::{AreaDraft, AreaStatus, ParkingArea as DomainArea};
use crate::domain::types::{AreaId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::areas)]
/// Diesel model for [`crate::domain::area::ParkingArea`].
pub struct Area {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub total_slots: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::areas)]
pub struct AreaValues<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub total_slots: i32,
    pub status: &'a str,
}

impl<'a> From<&'a AreaDraft> for AreaValues<'a> {
    fn from(draft: &'a AreaDraft) -> Self {
        Self {
            name: draft.name.as_str(),
            description: draft.description.as_str(),
            total_slots: i32::try_from(draft.total_slots).unwrap_or(i32::MAX),
            status: draft.status.as_str(),
        }
    }
}

impl Area {
    /// Converts the row, attaching the number of slots free right now.
    pub fn into_domain(self, available_slots: Option<u32>) -> Result<DomainArea, TypeConstraintError> {
        Ok(DomainArea {
            id: AreaId::new(self.id)?,
            name: self.name,
            description: self.description,
            total_slots: u32::try_from(self.total_slots)
                .map_err(|_| TypeConstraintError::InvalidValue("negative slot count".into()))?,
            available_slots,
            status: AreaStatus::from(self.status),
        })
    }
}
