//! Admin screens: parking areas, slot annotation and security staff.

use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde::Deserialize;
use serde_json::json;
use tera::Tera;

use crate::dto::live::LiveView;
use crate::forms::areas::{AreaForm, SavePositionsRequest};
use crate::forms::security::AddStaffForm;
use crate::live::LiveFeed;
use crate::models::auth::AuthenticatedUser;
use crate::repository::AppBackend;
use crate::routes::{base_context, failure, redirect, render_template};
use crate::services::{ServiceError, areas as areas_service, staff as staff_service};

#[derive(Deserialize)]
pub struct AreasQuery {
    #[serde(default)]
    edit: Option<i32>,
    #[serde(default)]
    annotate: Option<i32>,
}

#[get("/admin/areas")]
pub async fn show_areas(
    user: AuthenticatedUser,
    query: web::Query<AreasQuery>,
    backend: web::Data<AppBackend>,
    feed: web::Data<LiveFeed>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    let areas = match areas_service::list_areas(&repo, &user).await {
        Ok(areas) => areas,
        Err(err) => return failure(err, &tera, &user, "Failed to load parking areas", "/dashboard"),
    };

    let find = |id: Option<i32>| id.and_then(|id| areas.iter().find(|area| area.id.get() == id));

    let mut context = base_context(&flash_messages, &user, "areas");
    context.insert("areas", &areas);
    context.insert("editing", &find(query.edit));
    if let Some(area) = find(query.annotate) {
        let snapshot = feed.snapshot();
        context.insert("annotating", area);
        context.insert("live", &LiveView::from(&snapshot));
    }
    render_template(&tera, "admin/areas.html", &context)
}

#[post("/admin/areas")]
pub async fn create_area(
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<AreaForm>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match areas_service::create_area(&repo, &user, form).await {
        Ok(area) => {
            FlashMessage::success(format!("Parking area {} created", area.name)).send();
            redirect("/admin/areas")
        }
        Err(err) => failure(err, &tera, &user, "Failed to create parking area", "/admin/areas"),
    }
}

#[post("/admin/areas/{area_id}")]
pub async fn update_area(
    user: AuthenticatedUser,
    area_id: web::Path<i32>,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<AreaForm>,
) -> impl Responder {
    let area_id = area_id.into_inner();
    let repo = backend.for_user(&user);
    match areas_service::update_area(&repo, &user, area_id, form).await {
        Ok(area) => {
            FlashMessage::success(format!("Parking area {} updated", area.name)).send();
            redirect("/admin/areas")
        }
        Err(err) => failure(
            err,
            &tera,
            &user,
            "Failed to update parking area",
            &format!("/admin/areas?edit={area_id}"),
        ),
    }
}

#[post("/admin/areas/{area_id}/delete")]
pub async fn delete_area(
    user: AuthenticatedUser,
    area_id: web::Path<i32>,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match areas_service::delete_area(&repo, &user, area_id.into_inner()).await {
        Ok(()) => {
            FlashMessage::success("Parking area deleted").send();
            redirect("/admin/areas")
        }
        Err(err) => failure(err, &tera, &user, "Failed to delete parking area", "/admin/areas"),
    }
}

/// JSON endpoint used by the slot annotator.
#[post("/admin/areas/{area_id}/positions")]
pub async fn save_positions(
    user: AuthenticatedUser,
    area_id: web::Path<i32>,
    backend: web::Data<AppBackend>,
    web::Json(request): web::Json<SavePositionsRequest>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match areas_service::save_positions(&repo, &user, area_id.into_inner(), request).await {
        Ok(saved) => HttpResponse::Ok().json(json!({ "saved": saved })),
        Err(ServiceError::Unauthorized) => {
            HttpResponse::Forbidden().json(json!({ "error": ServiceError::Unauthorized.to_string() }))
        }
        Err(err @ ServiceError::Form(_)) | Err(err @ ServiceError::TypeConstraint(_)) => {
            HttpResponse::BadRequest()
                .json(json!({ "error": err.user_message("Invalid slot positions") }))
        }
        Err(ServiceError::NotFound) => {
            HttpResponse::NotFound().json(json!({ "error": "Parking area not found" }))
        }
        Err(err) => HttpResponse::BadGateway()
            .json(json!({ "error": err.user_message("Failed to save slot positions") })),
    }
}

#[get("/admin/security")]
pub async fn show_security(
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match staff_service::list_staff(&repo, &user).await {
        Ok(staff) => {
            let mut context = base_context(&flash_messages, &user, "security");
            context.insert("staff", &staff);
            render_template(&tera, "admin/security.html", &context)
        }
        Err(err) => failure(err, &tera, &user, "Failed to load security staff", "/dashboard"),
    }
}

#[post("/admin/security")]
pub async fn add_staff(
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<AddStaffForm>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match staff_service::add_staff(&repo, &user, form).await {
        Ok(staff) => {
            FlashMessage::success(format!("{} added to security staff", staff.name)).send();
            redirect("/admin/security")
        }
        Err(err) => failure(err, &tera, &user, "Failed to add security staff", "/admin/security"),
    }
}

#[post("/admin/security/{staff_id}/delete")]
pub async fn remove_staff(
    user: AuthenticatedUser,
    staff_id: web::Path<i32>,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match staff_service::remove_staff(&repo, &user, staff_id.into_inner()).await {
        Ok(()) => {
            FlashMessage::success("Security staff member removed").send();
            redirect("/admin/security")
        }
        Err(err) => failure(err, &tera, &user, "Failed to remove security staff", "/admin/security"),
    }
}
