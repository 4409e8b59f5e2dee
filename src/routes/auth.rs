use actix_identity::Identity;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use serde::{Deserialize, Serialize};
use tera::Tera;

use crate::forms::auth::{
    ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm, VerifyOtpForm,
};
use crate::repository::AppBackend;
use crate::routes::{public_context, redirect, render_template};
use crate::services::{ServiceError, auth as auth_service};

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const REGISTER_FAILED: &str = "Registration failed. Please try again.";
const RESET_FAILED: &str = "Something went wrong. Please try again.";

/// Values echoed back into the login and registration forms.
#[derive(Default, Serialize)]
struct Entered {
    username: String,
    email: String,
    phone_number: String,
    role: String,
}

#[get("/login")]
pub async fn show_login(
    user: Option<Identity>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    if user.is_some() {
        return redirect("/dashboard");
    }
    let mut context = public_context(&flash_messages);
    context.insert("form", &Entered::default());
    render_template(&tera, "auth/login.html", &context)
}

#[post("/login")]
pub async fn login(
    request: HttpRequest,
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<LoginForm>,
) -> impl Responder {
    let entered = Entered {
        email: form.email.clone(),
        ..Entered::default()
    };

    let message = match auth_service::login(backend.get_ref(), form).await {
        Ok(user) => {
            let identity = match user.to_identity() {
                Ok(identity) => identity,
                Err(err) => {
                    log::error!("Failed to serialize identity: {err}");
                    return HttpResponse::InternalServerError().finish();
                }
            };
            if let Err(err) = Identity::login(&request.extensions(), identity) {
                log::error!("Failed to start session for {}: {err}", user.email);
                return HttpResponse::InternalServerError().finish();
            }
            log::info!("User {} logged in", user.id);
            return redirect("/dashboard");
        }
        Err(err) => err,
    };

    let mut context = public_context(&flash_messages);
    context.insert("error", &message.user_message(LOGIN_FAILED));
    context.insert("errors", &message.field_errors());
    context.insert("form", &entered);
    render_template(&tera, "auth/login.html", &context)
}

#[get("/register")]
pub async fn show_register(
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let mut context = public_context(&flash_messages);
    context.insert("form", &Entered::default());
    render_template(&tera, "auth/register.html", &context)
}

#[post("/register")]
pub async fn register(
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<RegisterForm>,
) -> impl Responder {
    let entered = Entered {
        username: form.username.clone(),
        email: form.email.clone(),
        phone_number: form.phone_number.clone(),
        role: form.role.clone(),
    };

    match auth_service::register(backend.get_ref(), form).await {
        Ok(_) => {
            FlashMessage::success("Registration successful. Please log in.").send();
            redirect("/login")
        }
        Err(err) => {
            let mut context = public_context(&flash_messages);
            context.insert("error", &err.user_message(REGISTER_FAILED));
            context.insert("errors", &err.field_errors());
            context.insert("form", &entered);
            render_template(&tera, "auth/register.html", &context)
        }
    }
}

#[derive(Deserialize)]
pub struct LogoutQuery {
    #[serde(default)]
    expired: bool,
}

#[get("/logout")]
pub async fn logout(user: Option<Identity>, query: web::Query<LogoutQuery>) -> impl Responder {
    if let Some(user) = user {
        user.logout();
    }
    if query.expired {
        FlashMessage::warning("Your session has expired. Please log in again.").send();
    }
    redirect("/login")
}

/// Which of the three reset steps to show, with what was entered so far.
#[derive(Default, Serialize)]
struct ResetStep<'a> {
    step: &'a str,
    email: String,
    otp: String,
    notice: Option<String>,
}

fn render_reset_step(
    tera: &Tera,
    flash_messages: &IncomingFlashMessages,
    step: ResetStep<'_>,
    err: Option<ServiceError>,
) -> HttpResponse {
    let mut context = public_context(flash_messages);
    if let Some(err) = err {
        context.insert("error", &err.user_message(RESET_FAILED));
        context.insert("errors", &err.field_errors());
    }
    context.insert("reset", &step);
    render_template(tera, "auth/forgot_password.html", &context)
}

#[get("/forgot-password")]
pub async fn show_forgot_password(
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let step = ResetStep {
        step: "email",
        ..ResetStep::default()
    };
    render_reset_step(&tera, &flash_messages, step, None)
}

#[post("/forgot-password")]
pub async fn forgot_password(
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ForgotPasswordForm>,
) -> impl Responder {
    let email = form.email.clone();
    match auth_service::request_password_reset(backend.get_ref(), form).await {
        Ok(email) => {
            let step = ResetStep {
                step: "otp",
                notice: Some(format!("A verification code was sent to {email}.")),
                email: email.into_inner(),
                ..ResetStep::default()
            };
            render_reset_step(&tera, &flash_messages, step, None)
        }
        Err(err) => {
            let step = ResetStep {
                step: "email",
                email,
                ..ResetStep::default()
            };
            render_reset_step(&tera, &flash_messages, step, Some(err))
        }
    }
}

#[post("/forgot-password/verify")]
pub async fn verify_otp(
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<VerifyOtpForm>,
) -> impl Responder {
    let email = form.email.clone();
    match auth_service::verify_otp(backend.get_ref(), form).await {
        Ok(check) => {
            let step = ResetStep {
                step: "reset",
                email: check.email.into_inner(),
                otp: check.otp,
                notice: Some("Code verified. Choose a new password.".to_string()),
            };
            render_reset_step(&tera, &flash_messages, step, None)
        }
        Err(err) => {
            let step = ResetStep {
                step: "otp",
                email,
                ..ResetStep::default()
            };
            render_reset_step(&tera, &flash_messages, step, Some(err))
        }
    }
}

#[post("/forgot-password/reset")]
pub async fn reset_password(
    backend: web::Data<AppBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    web::Form(form): web::Form<ResetPasswordForm>,
) -> impl Responder {
    let step = ResetStep {
        step: "reset",
        email: form.email.clone(),
        otp: form.otp.clone(),
        notice: None,
    };
    match auth_service::reset_password(backend.get_ref(), form).await {
        Ok(()) => {
            FlashMessage::success("Password reset successfully. Please log in.").send();
            redirect("/login")
        }
        Err(err) => render_reset_step(&tera, &flash_messages, step, Some(err)),
    }
}
