use actix_web::{Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use chrono::Utc;
use tera::Tera;

use crate::models::auth::AuthenticatedUser;
use crate::repository::AppBackend;
use crate::repository::errors::RepositoryError;
use crate::routes::{base_context, failure, redirect, render_template};
use crate::services::{ServiceError, dashboard as dashboard_service};

#[get("/")]
pub async fn index() -> impl Responder {
    redirect("/dashboard")
}

#[get("/dashboard")]
pub async fn show_dashboard(
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match dashboard_service::load_dashboard(&repo, &user, Utc::now()).await {
        Ok(data) => {
            let mut context = base_context(&flash_messages, &user, "dashboard");
            context.insert("stats", &data);
            render_template(&tera, "dashboard.html", &context)
        }
        Err(
            err @ (ServiceError::Unauthorized
            | ServiceError::Repository(RepositoryError::Unauthenticated)),
        ) => failure(err, &tera, &user, "Failed to load dashboard", "/login"),
        // Other pages redirect here on failure, so never redirect back.
        Err(err) => {
            let mut context = base_context(&flash_messages, &user, "dashboard");
            context.insert("load_error", &err.user_message("Failed to load dashboard"));
            render_template(&tera, "dashboard.html", &context)
        }
    }
}
