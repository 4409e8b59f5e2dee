use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::staff::{NewSecurityStaff, SecurityStaff as DomainStaff};
use crate::domain::types::{StaffId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::security_staff)]
pub struct SecurityStaff {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::security_staff)]
pub struct NewStaff<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

impl<'a> From<&'a NewSecurityStaff> for NewStaff<'a> {
    fn from(staff: &'a NewSecurityStaff) -> Self {
        Self {
            name: staff.name.as_str(),
            email: staff.email.as_str(),
            phone: staff.phone.as_str(),
        }
    }
}

impl TryFrom<SecurityStaff> for DomainStaff {
    type Error = TypeConstraintError;

    fn try_from(staff: SecurityStaff) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StaffId::new(staff.id)?,
            name: staff.name,
            email: staff.email,
            phone: staff.phone,
        })
    }
}
