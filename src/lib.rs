//! ParkEase web front end: parking search and booking, booking history,
//! profile maintenance, admin screens and live occupancy, rendered on the
//! server in front of the ParkEase backend or of a local mock-data store.

#[cfg(feature = "server")]
use std::time::Duration;

#[cfg(feature = "server")]
use actix_cors::Cors;
#[cfg(feature = "server")]
use actix_files::Files;
#[cfg(feature = "server")]
use actix_identity::IdentityMiddleware;
#[cfg(feature = "server")]
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
#[cfg(feature = "server")]
use actix_web::cookie::Key;
#[cfg(feature = "server")]
use actix_web::{App, HttpServer, middleware as actix_middleware, web};
#[cfg(feature = "server")]
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
#[cfg(feature = "server")]
use tera::Tera;

#[cfg(feature = "server")]
use crate::live::LiveFeed;
#[cfg(feature = "server")]
use crate::models::config::{BackendConfig, BackendMode, ServerConfig};
#[cfg(feature = "server")]
use crate::repository::http::HttpRepository;
#[cfg(feature = "server")]
use crate::repository::{AppBackend, DieselRepository};
#[cfg(feature = "server")]
use crate::routes::admin::{
    add_staff, create_area, delete_area, remove_staff, save_positions, show_areas, show_security,
    update_area,
};
#[cfg(feature = "server")]
use crate::routes::auth::{
    forgot_password, login, logout, register, reset_password, show_forgot_password, show_login,
    show_register, verify_otp,
};
#[cfg(feature = "server")]
use crate::routes::booking::{
    book_slot, close_dialog, dismiss_success, open_confirmation, search_slots, select_slot,
    show_search, show_slots,
};
#[cfg(feature = "server")]
use crate::routes::bookings::{cancel_booking, extend_booking, show_bookings};
#[cfg(feature = "server")]
use crate::routes::dashboard::{index, show_dashboard};
#[cfg(feature = "server")]
use crate::routes::history::{history_report, show_history};
#[cfg(feature = "server")]
use crate::routes::live::{live_json, live_stream, show_camera, show_live, walk_in};
#[cfg(feature = "server")]
use crate::routes::profile::{change_password, delete_account, show_profile, update_profile};

pub mod db;
pub mod domain;
#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod error_conversions;
pub mod forms;
#[cfg(feature = "server")]
pub mod live;
#[cfg(feature = "server")]
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod repository;
#[cfg(feature = "server")]
pub mod routes;
pub mod schema;
#[cfg(feature = "server")]
pub mod services;

/// Picks the backend adapter. The local store is migrated and seeded first.
#[cfg(feature = "server")]
fn build_backend(config: &BackendConfig) -> std::io::Result<AppBackend> {
    match config.mode {
        BackendMode::Http => {
            let repo = HttpRepository::new(
                config.api_url.clone(),
                Duration::from_secs(config.timeout_secs),
            )
            .map_err(|e| std::io::Error::other(format!("Failed to build backend client: {e}")))?;
            log::info!("Using ParkEase backend at {}", config.api_url);
            Ok(AppBackend::Http(repo))
        }
        BackendMode::Local => {
            let pool = db::establish_connection_pool(&config.database_url).map_err(|e| {
                std::io::Error::other(format!("Failed to establish database connection: {e}"))
            })?;
            let applied = db::run_migrations(&pool)
                .map_err(|e| std::io::Error::other(format!("Failed to run migrations: {e}")))?;
            let repo = DieselRepository::new(pool);
            let seeded = repo
                .seed_defaults()
                .map_err(|e| std::io::Error::other(format!("Failed to seed mock data: {e}")))?;
            log::info!(
                "Using local store at {} ({applied} migrations applied, {seeded} areas seeded)",
                config.database_url
            );
            Ok(AppBackend::Local(repo))
        }
    }
}

/// Registers the public auth pages and every page behind the login wall.
#[cfg(feature = "server")]
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(show_login)
        .service(login)
        .service(show_register)
        .service(register)
        .service(logout)
        .service(show_forgot_password)
        .service(forgot_password)
        .service(verify_otp)
        .service(reset_password)
        .service(
            web::scope("")
                .wrap(middleware::require_login())
                .service(index)
                .service(show_dashboard)
                .service(show_search)
                .service(search_slots)
                .service(show_slots)
                .service(select_slot)
                .service(open_confirmation)
                .service(close_dialog)
                .service(book_slot)
                .service(dismiss_success)
                .service(show_bookings)
                .service(cancel_booking)
                .service(extend_booking)
                .service(show_history)
                .service(history_report)
                .service(show_profile)
                .service(update_profile)
                .service(change_password)
                .service(delete_account)
                .service(show_areas)
                .service(create_area)
                .service(update_area)
                .service(delete_area)
                .service(save_positions)
                .service(show_security)
                .service(add_staff)
                .service(remove_staff)
                .service(show_live)
                .service(show_camera)
                .service(live_json)
                .service(live_stream)
                .service(walk_in),
        );
}

/// Builds and runs the Actix-Web HTTP server using the provided configuration.
#[cfg(feature = "server")]
pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
    let backend = build_backend(&server_config.backend)?;

    let feed = LiveFeed::new();
    if server_config.live.enabled {
        live::listener::spawn(&server_config.live.url, feed.clone());
    } else {
        log::info!("Live occupancy feed disabled");
    }

    // Keys and stores for identity, sessions, and flash messages.
    let secret_key = Key::try_from(server_config.secret.as_bytes()).map_err(|e| {
        std::io::Error::other(format!("Secret must be at least 64 bytes long: {e}"))
    })?;

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = Tera::new(&server_config.templates_dir)
        .map_err(|e| std::io::Error::other(format!("Template parsing error(s): {e}")))?;

    let bind_address = (server_config.address.clone(), server_config.port);
    log::info!("Listening on {}:{}", bind_address.0, bind_address.1);

    let cookie_domain = match server_config.domain.as_str() {
        "" | "localhost" => None,
        domain => Some(domain.to_string()),
    };

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(message_framework.clone())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false)
                    .cookie_domain(cookie_domain.clone())
                    .build(),
            )
            .wrap(actix_middleware::Compress::default())
            .wrap(actix_middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .configure(configure)
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(backend.clone()))
            .app_data(web::Data::new(feed.clone()))
    })
    .bind(bind_address)?
    .run()
    .await
}
