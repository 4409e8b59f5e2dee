//! HTTP handlers and the helpers they share.

use actix_web::HttpResponse;
use actix_web::http::header;
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use serde::Serialize;
use tera::{Context, Tera};

use crate::forms::FieldErrors;
use crate::models::auth::AuthenticatedUser;
use crate::repository::errors::RepositoryError;
use crate::services::ServiceError;

pub mod admin;
pub mod auth;
pub mod booking;
pub mod bookings;
pub mod dashboard;
pub mod history;
pub mod live;
pub mod profile;

#[derive(Serialize)]
struct Alert {
    level: &'static str,
    content: String,
}

/// Bootstrap alert class for a flash message level.
pub fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        _ => "info",
    }
}

/// Context for pages reachable without logging in.
pub fn public_context(flash_messages: &IncomingFlashMessages) -> Context {
    let alerts: Vec<Alert> = flash_messages
        .iter()
        .map(|message| Alert {
            level: alert_level_to_str(&message.level()),
            content: message.content().to_string(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("alerts", &alerts);
    context.insert("errors", &FieldErrors::new());
    context
}

/// Context shared by every page of the signed-in area.
pub fn base_context(
    flash_messages: &IncomingFlashMessages,
    user: &AuthenticatedUser,
    current_page: &str,
) -> Context {
    let mut context = public_context(flash_messages);
    context.insert("current_user", user);
    context.insert("current_page", current_page);
    context
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err:?}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Permission-denied page for signed-in users without the required role.
pub fn forbidden(tera: &Tera, user: &AuthenticatedUser) -> HttpResponse {
    let mut context = Context::new();
    context.insert("alerts", &Vec::<Alert>::new());
    context.insert("current_user", user);
    context.insert("current_page", "");
    match tera.render("errors/forbidden.html", &context) {
        Ok(body) => HttpResponse::Forbidden()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render forbidden page: {err:?}");
            HttpResponse::Forbidden().finish()
        }
    }
}

/// Turns a failed action into a response: the permission page for role
/// failures, a fresh login when the backend dropped the session, otherwise a
/// banner on `back`.
pub fn failure(
    err: ServiceError,
    tera: &Tera,
    user: &AuthenticatedUser,
    fallback: &str,
    back: &str,
) -> HttpResponse {
    match err {
        ServiceError::Unauthorized => forbidden(tera, user),
        ServiceError::Repository(RepositoryError::Unauthenticated) => {
            redirect("/logout?expired=true")
        }
        err => {
            FlashMessage::error(err.user_message(fallback)).send();
            redirect(back)
        }
    }
}
