use serde::{Deserialize, Serialize};

use crate::domain::types::{PhoneNumber, StaffId, StaffName, UserEmail};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SecurityStaff {
    pub id: StaffId,
    pub name: String,
    pub email: String,
    #[serde(default, alias = "phoneNumber")]
    pub phone: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewSecurityStaff {
    pub name: StaffName,
    pub email: UserEmail,
    pub phone: PhoneNumber,
}
