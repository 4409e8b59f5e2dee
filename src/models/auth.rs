//! Signed-in user carried in the identity cookie.

use std::future::{Ready, ready};

use actix_identity::IdentityExt;
use actix_web::dev::Payload;
use actix_web::error::ErrorUnauthorized;
use actix_web::{FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::domain::types::{TypeConstraintError, UserId};
use crate::domain::user::{AuthSession, Role, User};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub role: Role,
    /// Backend bearer token; absent when running on the local store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthenticatedUser {
    pub fn from_session(session: &AuthSession) -> Self {
        let mut user = Self::from(&session.user);
        if !session.token.is_empty() {
            user.token = Some(session.token.clone());
        }
        user
    }

    pub fn user_id(&self) -> Result<UserId, TypeConstraintError> {
        UserId::new(self.id)
    }

    /// Keeps the token while refreshing the profile fields.
    pub fn refreshed(&self, user: &User) -> Self {
        Self {
            token: self.token.clone(),
            ..Self::from(user)
        }
    }

    pub fn to_identity(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_identity(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.get(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role,
            token: None,
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .get_identity()
            .ok()
            .and_then(|identity| identity.id().ok())
            .and_then(|raw| match Self::from_identity(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    log::warn!("Discarding unreadable identity: {err}");
                    None
                }
            });

        ready(user.ok_or_else(|| ErrorUnauthorized("Authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AuthSession {
        AuthSession {
            token: "tok-123".to_string(),
            user: User {
                id: UserId::new(7).unwrap(),
                username: "ravi".to_string(),
                email: "ravi@example.com".to_string(),
                phone_number: Some("9876543210".to_string()),
                role: Role::Security,
                profile_image: None,
            },
        }
    }

    #[test]
    fn identity_round_trip_keeps_token() {
        let user = AuthenticatedUser::from_session(&session());
        let raw = user.to_identity().unwrap();
        let back = AuthenticatedUser::from_identity(&raw).unwrap();
        assert_eq!(back, user);
        assert_eq!(back.token.as_deref(), Some("tok-123"));
        assert_eq!(back.user_id().unwrap().get(), 7);
    }

    #[test]
    fn refresh_keeps_token() {
        let user = AuthenticatedUser::from_session(&session());
        let mut profile = session().user;
        profile.username = "ravi.k".to_string();
        let refreshed = user.refreshed(&profile);
        assert_eq!(refreshed.username, "ravi.k");
        assert_eq!(refreshed.token, user.token);
    }
}
