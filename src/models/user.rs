use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{TypeConstraintError, UserId};
use crate::domain::user::{Role, User as DomainUser};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
/// Diesel model for [`crate::domain::user::User`] with its password hash.
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub phone_number: Option<&'a str>,
    pub role: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::password_resets)]
pub struct PasswordReset {
    pub email: String,
    pub otp: String,
    pub expires_at: NaiveDateTime,
    pub verified: bool,
}

impl TryFrom<User> for DomainUser {
    type Error = TypeConstraintError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(user.id)?,
            username: user.username,
            email: user.email,
            phone_number: user.phone_number,
            role: Role::try_from(user.role.as_str())?,
            profile_image: user.profile_image,
        })
    }
}
