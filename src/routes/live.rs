//! Live occupancy, camera view, the push stream and walk-ins.

use actix_web::http::header;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use chrono::Utc;
use futures::StreamExt;
use tera::Tera;

use crate::domain::occupancy::OccupancySnapshot;
use crate::dto::live::LiveView;
use crate::forms::booking::WalkInForm;
use crate::live::LiveFeed;
use crate::models::auth::AuthenticatedUser;
use crate::repository::AppBackend;
use crate::routes::{base_context, failure, forbidden, redirect, render_template};
use crate::services::{booking as booking_service, ensure_monitor, live as live_service};

#[get("/live")]
pub async fn show_live(
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    feed: web::Data<LiveFeed>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match live_service::load_live_page(&repo, &user, feed.snapshot()).await {
        Ok(data) => {
            let mut context = base_context(&flash_messages, &user, "live");
            context.insert("areas", &data.areas);
            context.insert("live", &LiveView::from(&data.snapshot));
            render_template(&tera, "live/index.html", &context)
        }
        Err(err) => failure(err, &tera, &user, "Failed to load live occupancy", "/dashboard"),
    }
}

#[get("/camera")]
pub async fn show_camera(
    user: AuthenticatedUser,
    feed: web::Data<LiveFeed>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match live_service::camera_snapshot(&user, feed.snapshot()) {
        Ok(snapshot) => {
            let mut context = base_context(&flash_messages, &user, "camera");
            context.insert("live", &LiveView::from(&snapshot));
            render_template(&tera, "live/camera.html", &context)
        }
        Err(_) => forbidden(&tera, &user),
    }
}

#[get("/api/live")]
pub async fn live_json(user: AuthenticatedUser, feed: web::Data<LiveFeed>) -> impl Responder {
    match live_service::camera_snapshot(&user, feed.snapshot()) {
        Ok(snapshot) => HttpResponse::Ok().json(LiveView::from(&snapshot)),
        Err(_) => HttpResponse::Forbidden().finish(),
    }
}

fn event_bytes(snapshot: &OccupancySnapshot) -> web::Bytes {
    match serde_json::to_string(&LiveView::from(snapshot)) {
        Ok(json) => web::Bytes::from(format!("event: update_slots\ndata: {json}\n\n")),
        Err(err) => {
            log::error!("Failed to serialize live snapshot: {err}");
            web::Bytes::from_static(b": skipped\n\n")
        }
    }
}

/// Server-sent events mirroring the live feed. The subscription ends when the
/// browser disconnects and the stream is dropped.
#[get("/api/live/stream")]
pub async fn live_stream(user: AuthenticatedUser, feed: web::Data<LiveFeed>) -> impl Responder {
    if ensure_monitor(&user).is_err() {
        return HttpResponse::Forbidden().finish();
    }

    let first = event_bytes(&feed.snapshot());
    let updates = futures::stream::unfold(feed.subscribe(), |mut receiver| async move {
        receiver.changed().await.ok()?;
        let bytes = event_bytes(&receiver.borrow_and_update());
        Some((Ok::<_, actix_web::Error>(bytes), receiver))
    });
    let stream = futures::stream::once(async move { Ok::<_, actix_web::Error>(first) }).chain(updates);

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::CONTENT_ENCODING, "identity"))
        .streaming(stream)
}

#[post("/walk-in")]
pub async fn walk_in(
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<WalkInForm>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match booking_service::walk_in(&repo, &user, form, Utc::now()).await {
        Ok(booking) => {
            FlashMessage::success(format!(
                "Walk-in registered for {} (booking {})",
                booking.vehicle_number, booking.id
            ))
            .send();
            redirect("/live")
        }
        Err(err) => failure(err, &tera, &user, "Failed to register walk-in", "/live"),
    }
}
