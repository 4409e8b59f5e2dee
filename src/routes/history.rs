use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use chrono::Utc;
use tera::Tera;

use crate::forms::history::HistoryQuery;
use crate::models::auth::AuthenticatedUser;
use crate::repository::AppBackend;
use crate::routes::{base_context, failure, render_template};
use crate::services::history as history_service;

#[get("/history")]
pub async fn show_history(
    user: AuthenticatedUser,
    query: web::Query<HistoryQuery>,
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match history_service::load_history(&repo, &user, query.into_inner(), Utc::now()).await {
        Ok(data) => {
            let mut context = base_context(&flash_messages, &user, "history");
            context.insert("history", &data);
            render_template(&tera, "history.html", &context)
        }
        Err(err) => failure(err, &tera, &user, "Failed to load booking history", "/dashboard"),
    }
}

#[get("/history/report.csv")]
pub async fn history_report(
    user: AuthenticatedUser,
    query: web::Query<HistoryQuery>,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match history_service::history_report(&repo, &user, query.into_inner(), Utc::now()).await {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(format!(
                    "parking-history-{}.csv",
                    Utc::now().format("%Y-%m-%d")
                ))],
            })
            .body(body),
        Err(err) => failure(err, &tera, &user, "Failed to generate report", "/history"),
    }
}
