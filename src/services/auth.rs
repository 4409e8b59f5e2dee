use crate::domain::types::UserEmail;
use crate::domain::user::{Credentials, NewUser, PasswordReset, User};
use crate::forms::auth::{
    ForgotPasswordForm, LoginForm, OtpCheck, RegisterForm, ResetPasswordForm, VerifyOtpForm,
};
use crate::models::auth::AuthenticatedUser;
use crate::repository::AuthGateway;
use crate::services::ServiceResult;

/// Checks the credentials and returns the user to keep in the session.
pub async fn login<R>(repo: &R, form: LoginForm) -> ServiceResult<AuthenticatedUser>
where
    R: AuthGateway + ?Sized,
{
    let credentials = Credentials::try_from(form)?;
    let session = repo.login(&credentials).await.map_err(|err| {
        log::warn!("Failed to log in {}: {err}", credentials.email);
        err
    })?;
    log::info!("User {} logged in", session.user.id);
    Ok(AuthenticatedUser::from_session(&session))
}

/// Creates the account. Nothing is sent when the form is invalid.
pub async fn register<R>(repo: &R, form: RegisterForm) -> ServiceResult<User>
where
    R: AuthGateway + ?Sized,
{
    let new_user = NewUser::try_from(form)?;
    let user = repo.register(&new_user).await.map_err(|err| {
        log::error!("Failed to register {}: {err}", new_user.email);
        err
    })?;
    Ok(user)
}

/// Step one of the password reset: mail a one-time code.
pub async fn request_password_reset<R>(repo: &R, form: ForgotPasswordForm) -> ServiceResult<UserEmail>
where
    R: AuthGateway + ?Sized,
{
    let email = UserEmail::try_from(form)?;
    repo.request_password_reset(&email).await.map_err(|err| {
        log::error!("Failed to send reset code to {email}: {err}");
        err
    })?;
    Ok(email)
}

/// Step two: check the code the user received.
pub async fn verify_otp<R>(repo: &R, form: VerifyOtpForm) -> ServiceResult<OtpCheck>
where
    R: AuthGateway + ?Sized,
{
    let check = OtpCheck::try_from(form)?;
    repo.verify_otp(&check.email, &check.otp).await?;
    Ok(check)
}

/// Step three: set the new password.
pub async fn reset_password<R>(repo: &R, form: ResetPasswordForm) -> ServiceResult<()>
where
    R: AuthGateway + ?Sized,
{
    let reset = PasswordReset::try_from(form)?;
    repo.reset_password(&reset).await.map_err(|err| {
        log::error!("Failed to reset password for {}: {err}", reset.email);
        err
    })?;
    Ok(())
}
