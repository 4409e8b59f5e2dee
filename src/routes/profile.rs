use actix_identity::Identity;
use actix_web::{HttpMessage, HttpRequest, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::forms::profile::{ChangePasswordForm, DeleteAccountForm, ProfileForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::AppBackend;
use crate::routes::{base_context, failure, redirect, render_template};
use crate::services::profile as profile_service;

#[get("/profile")]
pub async fn show_profile(
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match profile_service::load_profile(&repo, &user).await {
        Ok(profile) => {
            let mut context = base_context(&flash_messages, &user, "profile");
            context.insert("profile", &profile);
            render_template(&tera, "profile.html", &context)
        }
        Err(err) => failure(err, &tera, &user, "Failed to load profile", "/dashboard"),
    }
}

#[post("/profile")]
pub async fn update_profile(
    request: HttpRequest,
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ProfileForm>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match profile_service::update_profile(&repo, &user, form).await {
        Ok(updated) => {
            // The identity cookie carries the profile shown in the header.
            match updated.to_identity() {
                Ok(identity) => {
                    if let Err(err) = Identity::login(&request.extensions(), identity) {
                        log::error!("Failed to refresh identity of user {}: {err}", user.id);
                    }
                }
                Err(err) => log::error!("Failed to serialize identity: {err}"),
            }
            FlashMessage::success("Profile updated successfully").send();
            redirect("/profile")
        }
        Err(err) => failure(err, &tera, &user, "Failed to update profile", "/profile"),
    }
}

#[post("/profile/password")]
pub async fn change_password(
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ChangePasswordForm>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match profile_service::change_password(&repo, &user, form).await {
        Ok(()) => {
            FlashMessage::success("Password changed successfully").send();
            redirect("/profile")
        }
        Err(err) => failure(err, &tera, &user, "Failed to change password", "/profile"),
    }
}

#[post("/profile/delete")]
pub async fn delete_account(
    identity: Identity,
    user: AuthenticatedUser,
    backend: web::Data<AppBackend>,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<DeleteAccountForm>,
) -> impl Responder {
    let repo = backend.for_user(&user);
    match profile_service::delete_account(&repo, &user, form).await {
        Ok(()) => {
            identity.logout();
            FlashMessage::info("Your account has been deleted").send();
            redirect("/login")
        }
        Err(err) => failure(err, &tera, &user, "Failed to delete account", "/profile"),
    }
}
