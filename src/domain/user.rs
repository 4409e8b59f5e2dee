use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::types::{
    Password, PhoneNumber, TypeConstraintError, UserEmail, UserId, Username,
};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Parker,
    Security,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parker => "parker",
            Role::Security => "security",
            Role::Admin => "admin",
        }
    }

    /// Admins manage areas and staff.
    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admins and security staff watch the cameras and register walk-ins.
    pub fn can_monitor(&self) -> bool {
        matches!(self, Role::Admin | Role::Security)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "parker" | "" => Ok(Role::Parker),
            "security" => Ok(Role::Security),
            "admin" => Ok(Role::Admin),
            other => Err(TypeConstraintError::InvalidValue(format!("unknown role {other}"))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, alias = "profileImage")]
    pub profile_image: Option<String>,
}

/// Validated registration request.
#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub username: Username,
    pub email: UserEmail,
    pub phone_number: PhoneNumber,
    pub password: Password,
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Credentials {
    pub email: UserEmail,
    pub password: String,
}

/// Result of a successful login: the user and the bearer token for later calls.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProfileUpdate {
    pub username: Username,
    pub email: UserEmail,
    pub phone_number: PhoneNumber,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PasswordReset {
    pub email: UserEmail,
    pub otp: String,
    pub new_password: Password,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_accepts_camel_case_phone() {
        let user: User = serde_json::from_str(
            r#"{"id":1,"username":"bob","email":"bob@example.com","phoneNumber":"9876543210","role":"security"}"#,
        )
        .unwrap();
        assert_eq!(user.phone_number.as_deref(), Some("9876543210"));
        assert_eq!(user.role, Role::Security);
        assert!(user.role.can_monitor());
        assert!(!user.role.can_manage());
    }

    #[test]
    fn role_parsing() {
        assert_eq!(Role::try_from(""), Ok(Role::Parker));
        assert_eq!(Role::try_from("Admin"), Ok(Role::Admin));
        assert!(Role::try_from("root").is_err());
    }
}
