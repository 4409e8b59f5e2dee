//! REST adapter for the ParkEase backend.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::area::{AreaDraft, ParkingArea};
use crate::domain::booking::{
    Booking, BookingExtension, BookingKind, DashboardStats, HistoryScope, NewBooking,
};
use crate::domain::slot::{ParkingSlot, SlotPosition, SlotQuery};
use crate::domain::staff::{NewSecurityStaff, SecurityStaff};
use crate::domain::types::{AreaId, BookingId, Password, StaffId, UserEmail, UserId};
use crate::domain::user::{AuthSession, Credentials, NewUser, PasswordReset, ProfileUpdate, User};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    AreaReader, AreaWriter, AuthGateway, BookingReader, BookingWriter, ProfileReader,
    ProfileWriter, SlotReader, SlotWriter, StaffReader, StaffWriter,
};

/// Backend client. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpRepository {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserResponse {
    Wrapped(UserEnvelope),
    Bare(User),
}

impl From<UserResponse> for User {
    fn from(response: UserResponse) -> Self {
        match response {
            UserResponse::Wrapped(envelope) => envelope.user,
            UserResponse::Bare(user) => user,
        }
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    phone_number: &'a str,
    password: &'a str,
    role: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct OtpBody<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Serialize)]
struct ResetBody<'a> {
    email: &'a str,
    otp: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileBody<'a> {
    username: &'a str,
    email: &'a str,
    phone_number: &'a str,
}

#[derive(Serialize)]
struct PasswordBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct UsernameBody<'a> {
    username: &'a str,
}

#[derive(Serialize)]
struct AreaBody<'a> {
    name: &'a str,
    description: &'a str,
    total_slots: u32,
    status: &'a str,
}

impl<'a> From<&'a AreaDraft> for AreaBody<'a> {
    fn from(draft: &'a AreaDraft) -> Self {
        Self {
            name: draft.name.as_str(),
            description: draft.description.as_str(),
            total_slots: draft.total_slots,
            status: draft.status.as_str(),
        }
    }
}

#[derive(Serialize)]
struct PositionsBody<'a> {
    area_id: AreaId,
    positions: &'a [SlotPosition],
}

#[derive(Serialize)]
struct SlotWindowParams {
    start_time: String,
    end_time: String,
}

impl HttpRepository {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RepositoryResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepositoryError::ConnectionError(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Copy of this client sending `token` as bearer credentials.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> RepositoryResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> RepositoryResult<T> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(request: RequestBuilder) -> RepositoryResult<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }
}

/// Maps a failed response to an error, keeping the body's `error` or
/// `message` string.
pub(crate) fn status_error(status: StatusCode, body: &str) -> RepositoryError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.trim().is_empty());
    match status {
        StatusCode::UNAUTHORIZED if message.is_none() => RepositoryError::Unauthenticated,
        StatusCode::FORBIDDEN if message.is_none() => RepositoryError::Forbidden,
        StatusCode::NOT_FOUND if message.is_none() => RepositoryError::NotFound,
        _ => RepositoryError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

impl AuthGateway for HttpRepository {
    async fn login(&self, credentials: &Credentials) -> RepositoryResult<AuthSession> {
        let body = LoginBody {
            email: credentials.email.as_str(),
            password: &credentials.password,
        };
        Self::send_json(self.request(Method::POST, "/api/auth/login").json(&body)).await
    }

    async fn register(&self, new_user: &NewUser) -> RepositoryResult<User> {
        let body = RegisterBody {
            username: new_user.username.as_str(),
            email: new_user.email.as_str(),
            phone_number: new_user.phone_number.as_str(),
            password: new_user.password.as_str(),
            role: new_user.role.as_str(),
        };
        let response: UserResponse =
            Self::send_json(self.request(Method::POST, "/api/auth/register").json(&body)).await?;
        Ok(response.into())
    }

    async fn request_password_reset(&self, email: &UserEmail) -> RepositoryResult<()> {
        let body = EmailBody {
            email: email.as_str(),
        };
        Self::send_empty(
            self.request(Method::POST, "/api/auth/forgot-password")
                .json(&body),
        )
        .await
    }

    async fn verify_otp(&self, email: &UserEmail, otp: &str) -> RepositoryResult<()> {
        let body = OtpBody {
            email: email.as_str(),
            otp,
        };
        Self::send_empty(self.request(Method::POST, "/api/auth/verify-otp").json(&body)).await
    }

    async fn reset_password(&self, reset: &PasswordReset) -> RepositoryResult<()> {
        let body = ResetBody {
            email: reset.email.as_str(),
            otp: &reset.otp,
            password: reset.new_password.as_str(),
        };
        Self::send_empty(
            self.request(Method::POST, "/api/auth/reset-password")
                .json(&body),
        )
        .await
    }
}

impl ProfileReader for HttpRepository {
    async fn fetch_profile(&self) -> RepositoryResult<User> {
        let response: UserResponse =
            Self::send_json(self.request(Method::GET, "/api/auth/profile")).await?;
        Ok(response.into())
    }
}

impl ProfileWriter for HttpRepository {
    async fn update_profile(&self, update: &ProfileUpdate) -> RepositoryResult<User> {
        let body = ProfileBody {
            username: update.username.as_str(),
            email: update.email.as_str(),
            phone_number: update.phone_number.as_str(),
        };
        let response: UserResponse = Self::send_json(
            self.request(Method::PUT, "/api/auth/profile/update")
                .json(&body),
        )
        .await?;
        Ok(response.into())
    }

    async fn change_password(&self, username: &str, password: &Password) -> RepositoryResult<()> {
        let body = PasswordBody {
            username,
            password: password.as_str(),
        };
        Self::send_empty(
            self.request(Method::PUT, "/api/auth/profile/update")
                .json(&body),
        )
        .await
    }

    async fn delete_account(&self, username: &str) -> RepositoryResult<()> {
        Self::send_empty(
            self.request(Method::DELETE, "/api/auth/profile/delete")
                .json(&UsernameBody { username }),
        )
        .await
    }
}

impl AreaReader for HttpRepository {
    async fn list_areas(&self) -> RepositoryResult<Vec<ParkingArea>> {
        Self::send_json(self.request(Method::GET, "/api/parking/areas")).await
    }

    async fn get_area(&self, id: AreaId) -> RepositoryResult<Option<ParkingArea>> {
        let areas = self.list_areas().await?;
        Ok(areas.into_iter().find(|area| area.id == id))
    }
}

impl AreaWriter for HttpRepository {
    async fn create_area(&self, draft: &AreaDraft) -> RepositoryResult<ParkingArea> {
        Self::send_json(
            self.request(Method::POST, "/api/parking/areas")
                .json(&AreaBody::from(draft)),
        )
        .await
    }

    async fn update_area(&self, id: AreaId, draft: &AreaDraft) -> RepositoryResult<ParkingArea> {
        Self::send_json(
            self.request(Method::PUT, &format!("/api/parking/areas/{id}"))
                .json(&AreaBody::from(draft)),
        )
        .await
    }

    async fn delete_area(&self, id: AreaId) -> RepositoryResult<()> {
        Self::send_empty(self.request(Method::DELETE, &format!("/api/parking/areas/{id}"))).await
    }
}

impl SlotReader for HttpRepository {
    async fn list_slots(&self, query: &SlotQuery) -> RepositoryResult<Vec<ParkingSlot>> {
        let mut request = self.request(
            Method::GET,
            &format!("/api/parking/areas/{}/slots", query.area_id),
        );
        if let Some(window) = &query.window {
            request = request.query(&SlotWindowParams {
                start_time: window.start.to_rfc3339(),
                end_time: window.end.to_rfc3339(),
            });
        }
        Self::send_json(request).await
    }
}

impl SlotWriter for HttpRepository {
    async fn save_positions(
        &self,
        area_id: AreaId,
        positions: &[SlotPosition],
    ) -> RepositoryResult<()> {
        let body = PositionsBody { area_id, positions };
        Self::send_empty(
            self.request(Method::POST, "/api/parking/save-positions")
                .json(&body),
        )
        .await
    }
}

impl BookingReader for HttpRepository {
    async fn list_user_bookings(&self, user_id: UserId) -> RepositoryResult<Vec<Booking>> {
        Self::send_json(self.request(
            Method::GET,
            &format!("/api/parking/bookings/user/{user_id}"),
        ))
        .await
    }

    async fn booking_history(&self, scope: HistoryScope) -> RepositoryResult<Vec<Booking>> {
        let path = match scope {
            HistoryScope::All => "/api/parking/bookings/history".to_string(),
            HistoryScope::User(user_id) => format!("/api/parking/bookings/history/{user_id}"),
        };
        Self::send_json(self.request(Method::GET, &path)).await
    }

    async fn dashboard_stats(&self) -> RepositoryResult<DashboardStats> {
        Self::send_json(self.request(Method::GET, "/api/booking/dashboard/stats")).await
    }
}

impl BookingWriter for HttpRepository {
    async fn create_booking(&self, booking: &NewBooking) -> RepositoryResult<Booking> {
        let path = match booking.kind {
            BookingKind::Pre => "/api/parking/book",
            BookingKind::WalkIn => "/api/parking/book/walkin",
        };
        let response = Self::check(
            self.request(Method::POST, path)
                .json(booking)
                .send()
                .await?,
        )
        .await?;
        if response.status() != StatusCode::CREATED {
            log::warn!(
                "Booking endpoint answered {} instead of 201",
                response.status()
            );
        }
        Ok(response.json().await?)
    }

    async fn cancel_booking(&self, id: BookingId) -> RepositoryResult<()> {
        Self::send_empty(self.request(
            Method::POST,
            &format!("/api/parking/bookings/{id}/cancel"),
        ))
        .await
    }

    async fn extend_booking(
        &self,
        id: BookingId,
        extension: &BookingExtension,
    ) -> RepositoryResult<()> {
        Self::send_empty(
            self.request(Method::POST, &format!("/api/parking/bookings/{id}/extend"))
                .json(extension),
        )
        .await
    }
}

impl StaffReader for HttpRepository {
    async fn list_staff(&self) -> RepositoryResult<Vec<SecurityStaff>> {
        Self::send_json(self.request(Method::GET, "/api/security/staff")).await
    }
}

impl StaffWriter for HttpRepository {
    async fn add_staff(&self, staff: &NewSecurityStaff) -> RepositoryResult<SecurityStaff> {
        Self::send_json(self.request(Method::POST, "/api/security/staff").json(staff)).await
    }

    async fn remove_staff(&self, id: StaffId) -> RepositoryResult<()> {
        Self::send_empty(self.request(Method::DELETE, &format!("/api/security/staff/{id}"))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_message_is_kept() {
        let err = status_error(StatusCode::CONFLICT, r#"{"error":"Slot already booked"}"#);
        assert_eq!(err.user_message(), Some("Slot already booked"));

        let err = status_error(StatusCode::BAD_REQUEST, r#"{"message":"Invalid time range"}"#);
        assert_eq!(err.user_message(), Some("Invalid time range"));

        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(
            err,
            RepositoryError::Api {
                status: 500,
                message: None
            }
        );
        assert_eq!(err.user_message(), None);
    }

    #[test]
    fn bare_statuses_map_to_kinds() {
        assert_eq!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            RepositoryError::Unauthenticated
        );
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, "{}"),
            RepositoryError::Forbidden
        );
        assert_eq!(status_error(StatusCode::NOT_FOUND, ""), RepositoryError::NotFound);
    }

    #[test]
    fn profile_responses_may_be_wrapped() {
        let wrapped: UserResponse = serde_json::from_str(
            r#"{"user":{"id":1,"username":"bob","email":"bob@example.com"}}"#,
        )
        .unwrap();
        let bare: UserResponse =
            serde_json::from_str(r#"{"id":1,"username":"bob","email":"bob@example.com"}"#)
                .unwrap();
        assert_eq!(User::from(wrapped), User::from(bare));
    }
}
