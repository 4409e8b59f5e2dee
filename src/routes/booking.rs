//! Search screen, slot grid and the booking dialog.
//!
//! The search, the dialog state and the dialog draft live in the cookie
//! session, so every transition is a POST followed by a redirect back to the
//! grid.

use actix_session::Session;
use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use chrono::{Duration, Local, Timelike};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tera::Tera;

use crate::domain::booking_flow::BookingFlow;
use crate::forms::FormError;
use crate::forms::booking::{BookingForm, SelectSlotForm, SlotSearchForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::AppBackend;
use crate::repository::errors::RepositoryError;
use crate::routes::{base_context, failure, redirect, render_template};
use crate::services::{ServiceError, booking as booking_service};

const SEARCH_KEY: &str = "slot_search";
const FLOW_KEY: &str = "booking_flow";
const DRAFT_KEY: &str = "booking_draft";

fn session_value<T: DeserializeOwned + Default>(session: &Session, key: &str) -> T {
    match session.get::<T>(key) {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => {
            log::warn!("Discarding unreadable session value {key}: {err}");
            T::default()
        }
    }
}

fn store<T: Serialize>(session: &Session, key: &str, value: &T) {
    if let Err(err) = session.insert(key, value) {
        log::error!("Failed to store {key} in session: {err}");
    }
}

/// Grid url for a search.
pub fn slots_url(search: &SlotSearchForm) -> String {
    format!(
        "/slots?area_id={}&date={}&time={}&hours={}",
        search.area_id.trim(),
        search.date.trim(),
        search.time.trim(),
        search.hours.trim()
    )
}

/// Today at the next full hour, for one hour.
fn default_search() -> SlotSearchForm {
    let next_hour = Local::now() + Duration::hours(1);
    SlotSearchForm {
        area_id: String::new(),
        date: next_hour.format("%Y-%m-%d").to_string(),
        time: format!("{:02}:00", next_hour.hour()),
        hours: "1".to_string(),
    }
}

/// Forgets the selection and the dialog draft.
fn reset_flow(session: &Session) {
    store(session, FLOW_KEY, &BookingFlow::default());
    session.remove(DRAFT_KEY);
}

/// Search to show on the grid and whether the visit starts over with nothing
/// selected. Every step of the dialog redirects back with the stored search
/// as query, so a visit without a query or with a different search is a
/// fresh navigation.
fn search_for_visit(query: SlotSearchForm, stored: SlotSearchForm) -> (SlotSearchForm, bool) {
    if query.area_id.trim().is_empty() {
        (stored, true)
    } else {
        let changed = query != stored;
        (query, changed)
    }
}

#[get("/booking")]
pub async fn show_search(
    user: AuthenticatedUser,
    session: Session,
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let search = session
        .get::<SlotSearchForm>(SEARCH_KEY)
        .ok()
        .flatten()
        .unwrap_or_else(default_search);
    reset_flow(&session);

    let repo = backend.for_user(&user);
    match booking_service::load_search_page(&repo, search).await {
        Ok(data) => {
            let mut context = base_context(&flash_messages, &user, "booking");
            context.insert("areas", &data.areas);
            context.insert("search", &data.search);
            render_template(&tera, "booking/search.html", &context)
        }
        Err(err) => failure(err, &tera, &user, "Failed to load parking areas", "/dashboard"),
    }
}

#[post("/booking/search")]
pub async fn search_slots(
    _user: AuthenticatedUser,
    session: Session,
    web::Form(form): web::Form<SlotSearchForm>,
) -> impl Responder {
    store(&session, SEARCH_KEY, &form);
    reset_flow(&session);
    redirect(&slots_url(&form))
}

#[get("/slots")]
pub async fn show_slots(
    user: AuthenticatedUser,
    session: Session,
    query: web::Query<SlotSearchForm>,
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let stored: SlotSearchForm = session_value(&session, SEARCH_KEY);
    let (search, fresh) = search_for_visit(query.into_inner(), stored);
    if fresh {
        store(&session, SEARCH_KEY, &search);
        reset_flow(&session);
    }

    render_slots(&user, &session, &backend, &flash_messages, &tera, search, None).await
}

async fn render_slots(
    user: &AuthenticatedUser,
    session: &Session,
    backend: &AppBackend,
    flash_messages: &IncomingFlashMessages,
    tera: &Tera,
    search: SlotSearchForm,
    invalid: Option<FormError>,
) -> actix_web::HttpResponse {
    let flow: BookingFlow = session_value(session, FLOW_KEY);
    let draft: BookingForm = session_value(session, DRAFT_KEY);
    let url = slots_url(&search);

    let repo = backend.for_user(user);
    match booking_service::load_slot_page(&repo, search, &flow).await {
        Ok(page) => {
            let mut context = base_context(flash_messages, user, "booking");
            context.insert("page", &page);
            context.insert("draft", &draft);
            if let Some(err) = &invalid {
                context.insert("form_error", &err.to_string());
                context.insert("errors", &err.field_errors());
            }
            context.insert("slots_url", &url);
            render_template(tera, "booking/slots.html", &context)
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Parking area not found").send();
            redirect("/booking")
        }
        Err(err) => failure(err, tera, user, "Failed to load parking slots", "/booking"),
    }
}

#[post("/slots/select")]
pub async fn select_slot(
    user: AuthenticatedUser,
    session: Session,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<SelectSlotForm>,
) -> impl Responder {
    let search: SlotSearchForm = session_value(&session, SEARCH_KEY);
    let mut flow: BookingFlow = session_value(&session, FLOW_KEY);
    let url = slots_url(&search);

    let repo = backend.for_user(&user);
    match booking_service::select_slot(&repo, search, &mut flow, form.slot_id).await {
        Ok(true) => {
            store(&session, FLOW_KEY, &flow);
            redirect(&url)
        }
        Ok(false) => {
            FlashMessage::warning("This slot is not available").send();
            redirect(&url)
        }
        Err(err) => failure(err, &tera, &user, "Failed to select the slot", &url),
    }
}

#[post("/slots/confirm")]
pub async fn open_confirmation(_user: AuthenticatedUser, session: Session) -> impl Responder {
    let search: SlotSearchForm = session_value(&session, SEARCH_KEY);
    let mut flow: BookingFlow = session_value(&session, FLOW_KEY);
    let url = slots_url(&search);
    match booking_service::open_confirmation(search, &mut flow) {
        Ok(()) => store(&session, FLOW_KEY, &flow),
        Err(err) => FlashMessage::error(err.user_message("Cannot open the booking dialog")).send(),
    }
    redirect(&url)
}

#[post("/slots/close")]
pub async fn close_dialog(_user: AuthenticatedUser, session: Session) -> impl Responder {
    let search: SlotSearchForm = session_value(&session, SEARCH_KEY);
    let mut flow: BookingFlow = session_value(&session, FLOW_KEY);
    match flow.close_dialog() {
        Ok(()) => {
            store(&session, FLOW_KEY, &flow);
            session.remove(DRAFT_KEY);
        }
        Err(err) => log::debug!("Ignoring dialog close: {err}"),
    }
    redirect(&slots_url(&search))
}

#[post("/slots/book")]
pub async fn book_slot(
    user: AuthenticatedUser,
    session: Session,
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<BookingForm>,
) -> impl Responder {
    let search: SlotSearchForm = session_value(&session, SEARCH_KEY);
    let mut flow: BookingFlow = session_value(&session, FLOW_KEY);
    store(&session, DRAFT_KEY, &form.draft());

    let repo = backend.for_user(&user);
    let result = booking_service::submit_booking(&repo, &mut flow, search.clone(), form).await;
    store(&session, FLOW_KEY, &flow);

    match result {
        Ok(booking) => {
            session.remove(DRAFT_KEY);
            log::info!("User {} booked {}", user.id, booking.id);
            redirect(&slots_url(&search))
        }
        Err(ServiceError::Form(err)) => {
            render_slots(&user, &session, &backend, &flash_messages, &tera, search, Some(err)).await
        }
        // The dialog shows the backend's message from the failed flow.
        Err(ServiceError::Repository(err))
            if flow.error_message().is_some() && err != RepositoryError::Unauthenticated =>
        {
            log::debug!("Booking attempt failed: {err}");
            redirect(&slots_url(&search))
        }
        Err(err) => failure(
            err,
            &tera,
            &user,
            booking_service::BOOKING_FAILED,
            &slots_url(&search),
        ),
    }
}

#[derive(Deserialize)]
pub struct DismissForm {
    #[serde(default)]
    next: Option<String>,
}

#[post("/slots/dismiss")]
pub async fn dismiss_success(
    _user: AuthenticatedUser,
    session: Session,
    web::Form(form): web::Form<DismissForm>,
) -> impl Responder {
    let search: SlotSearchForm = session_value(&session, SEARCH_KEY);
    let mut flow: BookingFlow = session_value(&session, FLOW_KEY);
    if let Err(err) = flow.dismiss_success() {
        log::debug!("Ignoring dismiss: {err}");
    }
    store(&session, FLOW_KEY, &flow);
    session.remove(DRAFT_KEY);

    match form.next.as_deref() {
        Some("bookings") => redirect("/bookings"),
        Some("home") => redirect("/dashboard"),
        _ => redirect(&slots_url(&search)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(area_id: &str, hours: &str) -> SlotSearchForm {
        SlotSearchForm {
            area_id: area_id.into(),
            date: "2030-03-20".into(),
            time: "10:00".into(),
            hours: hours.into(),
        }
    }

    #[test]
    fn visit_without_query_starts_over_with_stored_search() {
        let stored = search("1", "2");
        let (shown, fresh) = search_for_visit(SlotSearchForm::default(), stored.clone());
        assert_eq!(shown, stored);
        assert!(fresh);
    }

    #[test]
    fn redirect_back_keeps_the_selection() {
        let stored = search("1", "2");
        let (shown, fresh) = search_for_visit(stored.clone(), stored.clone());
        assert_eq!(shown, stored);
        assert!(!fresh);

        let (shown, fresh) = search_for_visit(search("1", "3"), stored);
        assert_eq!(shown.hours, "3");
        assert!(fresh);
    }

    #[test]
    fn slots_url_round_trips_the_search() {
        assert_eq!(
            slots_url(&search(" 1 ", "2")),
            "/slots?area_id=1&date=2030-03-20&time=10:00&hours=2"
        );
    }
}
