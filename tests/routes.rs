use std::collections::HashMap;

use actix_identity::IdentityMiddleware;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use actix_web_flash_messages::{FlashMessagesFramework, Level, storage::CookieMessageStore};
use chrono::{Duration, DurationRound, Local, NaiveTime, Utc};
use tera::Tera;

use parkease::domain::booking::{BookingKind, BookingStatus, NewBooking};
use parkease::domain::slot::{BookingWindow, SlotQuery, SlotStatus};
use parkease::domain::types::{Password, PhoneNumber, UserEmail, UserId, Username, VehicleNumber};
use parkease::domain::user::{NewUser, Role};
use parkease::live::LiveFeed;
use parkease::repository::{
    AppBackend, AreaReader, AuthGateway, BookingReader, BookingWriter, DieselRepository,
    SlotReader,
};
use parkease::routes::alert_level_to_str;

mod common;

const PASSWORD: &str = "Secret@123";

/// Cookies carried from one request to the next, like a browser would.
#[derive(Default)]
struct CookieJar(HashMap<String, Cookie<'static>>);

impl CookieJar {
    fn attach(&self, mut req: test::TestRequest) -> test::TestRequest {
        for cookie in self.0.values() {
            req = req.cookie(cookie.clone());
        }
        req
    }

    fn keep<B>(&mut self, resp: &ServiceResponse<B>) {
        for cookie in resp.response().cookies() {
            if cookie.value().is_empty() {
                self.0.remove(cookie.name());
            } else {
                self.0
                    .insert(cookie.name().to_string(), cookie.into_owned());
            }
        }
    }
}

macro_rules! parkease_app {
    ($backend:expr) => {{
        let key = Key::generate();
        let messages = FlashMessagesFramework::builder(
            CookieMessageStore::builder(key.clone()).build(),
        )
        .build();
        let tera = Tera::new("templates/**/*.html").expect("templates parse");
        test::init_service(
            App::new()
                .wrap(messages)
                .wrap(IdentityMiddleware::default())
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), key)
                        .cookie_secure(false)
                        .build(),
                )
                .configure(parkease::configure)
                .app_data(web::Data::new(tera))
                .app_data(web::Data::new($backend))
                .app_data(web::Data::new(LiveFeed::new())),
        )
        .await
    }};
}

macro_rules! send {
    ($app:expr, $jar:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $jar.attach($req).to_request()).await;
        $jar.keep(&resp);
        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = test::read_body(resp).await;
        (
            status,
            location,
            String::from_utf8_lossy(&body).into_owned(),
        )
    }};
}

/// Seeded local store with one registered parker.
async fn store(db: &common::TestDb) -> (DieselRepository, UserId) {
    let repo = DieselRepository::new(db.pool());
    repo.seed_defaults().expect("seed areas");
    let user = repo
        .register(&NewUser {
            username: Username::new("asha").unwrap(),
            email: UserEmail::new("asha@example.com").unwrap(),
            phone_number: PhoneNumber::new("9876543210").unwrap(),
            password: Password::new(PASSWORD).unwrap(),
            role: Role::Parker,
        })
        .await
        .expect("register parker");
    (repo, user.id)
}

/// Two hours starting tomorrow at a full hour.
fn tomorrow() -> BookingWindow {
    let start = (Utc::now() + Duration::days(1))
        .duration_trunc(Duration::hours(1))
        .unwrap();
    BookingWindow::new(start, start + Duration::hours(2)).unwrap()
}

#[::core::prelude::v1::test]
fn test_alert_level_to_str_mappings() {
    assert_eq!(alert_level_to_str(&Level::Error), "danger");
    assert_eq!(alert_level_to_str(&Level::Warning), "warning");
    assert_eq!(alert_level_to_str(&Level::Success), "success");
    assert_eq!(alert_level_to_str(&Level::Info), "info");
    assert_eq!(alert_level_to_str(&Level::Debug), "info");
}

#[actix_web::test]
async fn booking_pages_require_login() {
    let db = common::TestDb::new("routes_login_wall.db");
    let (repo, _) = store(&db).await;
    let app = parkease_app!(AppBackend::Local(repo));
    let mut jar = CookieJar::default();

    for uri in ["/bookings", "/booking", "/slots"] {
        let (status, location, _) = send!(app, jar, test::TestRequest::get().uri(uri));
        assert_eq!(status, StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location.as_deref(), Some("/login"), "{uri}");
    }
}

#[actix_web::test]
async fn closing_the_cancel_dialog_keeps_the_booking() {
    let db = common::TestDb::new("routes_cancel_dialog.db");
    let (repo, user_id) = store(&db).await;

    let window = tomorrow();
    let area = repo.list_areas().await.unwrap().remove(0);
    let slot = repo
        .list_slots(&SlotQuery::new(area.id).window(window))
        .await
        .unwrap()
        .into_iter()
        .find(|slot| slot.status == SlotStatus::Available)
        .expect("a free slot");
    let parker = repo.as_user(user_id);
    let booking = parker
        .create_booking(&NewBooking {
            slot_id: slot.id,
            area_id: area.id,
            vehicle_number: VehicleNumber::new("KA-01-1234").unwrap(),
            start_time: window.start,
            end_time: window.end,
            amount: 100,
            kind: BookingKind::Pre,
        })
        .await
        .unwrap();

    let app = parkease_app!(AppBackend::Local(repo));
    let mut jar = CookieJar::default();
    let (status, location, _) = send!(
        app,
        jar,
        test::TestRequest::post()
            .uri("/login")
            .set_form([("email", "asha@example.com"), ("password", PASSWORD)])
    );
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/dashboard"));

    let cancel_action = format!("/bookings/{}/cancel", booking.id);
    let (status, _, body) = send!(
        app,
        jar,
        test::TestRequest::get().uri(&format!(
            "/bookings?tab=upcoming&confirm_cancel={}",
            booking.id
        ))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&cancel_action));

    // "Keep booking" is a plain link back to the list.
    let (status, _, body) = send!(
        app,
        jar,
        test::TestRequest::get().uri("/bookings?tab=upcoming")
    );
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains(&cancel_action));

    let bookings = parker.list_user_bookings(user_id).await.unwrap();
    let kept = bookings
        .iter()
        .find(|row| row.id == booking.id)
        .expect("booking still listed");
    assert_eq!(kept.status, BookingStatus::Upcoming);
}

#[actix_web::test]
async fn leaving_the_grid_clears_the_selection() {
    let db = common::TestDb::new("routes_selection.db");
    let (repo, _) = store(&db).await;
    let area = repo.list_areas().await.unwrap().remove(0);
    let day = (Local::now() + Duration::days(1)).date_naive();
    let date = day.format("%Y-%m-%d").to_string();
    let window = BookingWindow::from_local(day, NaiveTime::from_hms_opt(10, 0, 0).unwrap(), Some(2.0))
        .expect("local time exists");
    let slots = repo
        .list_slots(&SlotQuery::new(area.id).window(window))
        .await
        .unwrap();
    let slot = slots
        .iter()
        .find(|slot| slot.status == SlotStatus::Available)
        .expect("a free slot");

    let app = parkease_app!(AppBackend::Local(repo));
    let mut jar = CookieJar::default();
    send!(
        app,
        jar,
        test::TestRequest::post()
            .uri("/login")
            .set_form([("email", "asha@example.com"), ("password", PASSWORD)])
    );

    let area_id = area.id.to_string();
    let (status, grid, _) = send!(
        app,
        jar,
        test::TestRequest::post().uri("/booking/search").set_form([
            ("area_id", area_id.as_str()),
            ("date", date.as_str()),
            ("time", "10:00"),
            ("hours", "2"),
        ])
    );
    assert_eq!(status, StatusCode::SEE_OTHER);
    let grid = grid.expect("grid url");

    let slot_id = slot.id.to_string();
    send!(
        app,
        jar,
        test::TestRequest::post()
            .uri("/slots/select")
            .set_form([("slot_id", slot_id.as_str())])
    );
    let (_, _, body) = send!(app, jar, test::TestRequest::get().uri(&grid));
    assert!(body.contains(&format!("Slot <strong>{}</strong> selected.", slot.slot_number)));

    let (status, _, _) = send!(app, jar, test::TestRequest::get().uri("/booking"));
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send!(app, jar, test::TestRequest::get().uri(&grid));
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Pick an available slot."));
}
