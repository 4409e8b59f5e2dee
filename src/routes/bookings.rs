use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use chrono::Utc;
use serde::Deserialize;
use tera::Tera;

use crate::forms::booking::ExtendBookingForm;
use crate::forms::history::BookingsQuery;
use crate::models::auth::AuthenticatedUser;
use crate::repository::AppBackend;
use crate::routes::{base_context, failure, redirect, render_template};
use crate::services::bookings as bookings_service;

#[derive(Deserialize)]
pub struct BookingsPageQuery {
    #[serde(default)]
    tab: Option<String>,
    #[serde(default)]
    page: Option<usize>,
    /// Booking whose cancel dialog is open.
    #[serde(default)]
    confirm_cancel: Option<i32>,
}

#[get("/bookings")]
pub async fn show_bookings(
    user: AuthenticatedUser,
    query: web::Query<BookingsPageQuery>,
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let BookingsPageQuery {
        tab,
        page,
        confirm_cancel,
    } = query.into_inner();
    let list = BookingsQuery { tab, page };

    let repo = backend.for_user(&user);
    match bookings_service::load_bookings_page(&repo, &user, list, Utc::now()).await {
        Ok(data) => {
            let mut context = base_context(&flash_messages, &user, "bookings");
            context.insert("tab", data.tab.as_str());
            context.insert("counts", &data.counts);
            context.insert("bookings", &data.bookings);
            context.insert("confirm_cancel", &confirm_cancel);
            render_template(&tera, "bookings/index.html", &context)
        }
        Err(err) => failure(err, &tera, &user, "Failed to load bookings", "/dashboard"),
    }
}

#[post("/bookings/{booking_id}/cancel")]
pub async fn cancel_booking(
    user: AuthenticatedUser,
    booking_id: web::Path<i32>,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match bookings_service::cancel_booking(&repo, &user, booking_id.into_inner(), Utc::now())
        .await
    {
        Ok(()) => {
            FlashMessage::success("Booking cancelled successfully").send();
            redirect("/bookings")
        }
        Err(err) => failure(err, &tera, &user, "Failed to cancel booking", "/bookings"),
    }
}

#[post("/bookings/{booking_id}/extend")]
pub async fn extend_booking(
    user: AuthenticatedUser,
    booking_id: web::Path<i32>,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ExtendBookingForm>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match bookings_service::extend_booking(
        &repo,
        &user,
        booking_id.into_inner(),
        form,
        Utc::now(),
    )
    .await
    {
        Ok(()) => {
            FlashMessage::success("Booking extended successfully").send();
            redirect("/bookings?tab=active")
        }
        Err(err) => failure(err, &tera, &user, "Failed to extend booking", "/bookings?tab=active"),
    }
}
