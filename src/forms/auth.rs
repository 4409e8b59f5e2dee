use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{Password, PhoneNumber, UserEmail, Username};
use crate::domain::user::{Credentials, NewUser, PasswordReset, Role};
use crate::forms::{FormError, field_error};

#[derive(Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::email_address"))]
    pub email: String,
    #[serde(default)]
    #[validate(
        custom(function = "crate::forms::required"),
        length(max = 128, message = "Password is too long")
    )]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        custom(function = "crate::forms::username"),
        length(max = 64, message = "Username is too long")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::email_address"))]
    pub email: String,
    #[serde(default, alias = "phoneNumber")]
    #[validate(custom(function = "crate::forms::phone_number"))]
    pub phone_number: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::strong_password"))]
    pub password: String,
    #[serde(default, alias = "confirmPassword")]
    #[validate(custom(function = "crate::forms::required"))]
    pub confirm_password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Deserialize, Validate)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::email_address"))]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct VerifyOtpForm {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::email_address"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::auth::six_digit_code"))]
    pub otp: String,
}

#[derive(Deserialize, Validate)]
pub struct ResetPasswordForm {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::email_address"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::auth::six_digit_code"))]
    pub otp: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::strong_password"))]
    pub new_password: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub confirm_password: String,
}

/// One-time code received by e-mail: six digits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OtpCheck {
    pub email: UserEmail,
    pub otp: String,
}

pub fn six_digit_code(value: &str) -> Result<(), validator::ValidationError> {
    crate::forms::required(value)?;
    let otp = value.trim();
    if otp.len() != 6 || !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(validator::ValidationError::new("otp")
            .with_message("Please enter the 6-digit code".into()));
    }
    Ok(())
}

fn email(raw: String) -> Result<UserEmail, FormError> {
    UserEmail::new(raw).map_err(|err| field_error("email", err))
}

impl TryFrom<LoginForm> for Credentials {
    type Error = FormError;

    fn try_from(form: LoginForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Credentials {
            email: email(form.email)?,
            password: form.password,
        })
    }
}

impl TryFrom<RegisterForm> for NewUser {
    type Error = FormError;

    fn try_from(form: RegisterForm) -> Result<Self, Self::Error> {
        form.validate()?;
        if form.password != form.confirm_password {
            return Err(FormError::PasswordMismatch);
        }

        Ok(NewUser {
            username: Username::new(form.username).map_err(|err| field_error("username", err))?,
            email: email(form.email)?,
            phone_number: PhoneNumber::new(form.phone_number)
                .map_err(|err| field_error("phone_number", err))?,
            password: Password::new(form.password).map_err(|err| field_error("password", err))?,
            role: Role::try_from(form.role.as_str()).map_err(|err| field_error("role", err))?,
        })
    }
}

impl TryFrom<ForgotPasswordForm> for UserEmail {
    type Error = FormError;

    fn try_from(form: ForgotPasswordForm) -> Result<Self, Self::Error> {
        form.validate()?;
        email(form.email)
    }
}

impl TryFrom<VerifyOtpForm> for OtpCheck {
    type Error = FormError;

    fn try_from(form: VerifyOtpForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(OtpCheck {
            email: email(form.email)?,
            otp: form.otp.trim().to_string(),
        })
    }
}

impl TryFrom<ResetPasswordForm> for PasswordReset {
    type Error = FormError;

    fn try_from(form: ResetPasswordForm) -> Result<Self, Self::Error> {
        form.validate()?;
        if form.new_password != form.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Ok(PasswordReset {
            email: email(form.email)?,
            otp: form.otp.trim().to_string(),
            new_password: Password::new(form.new_password)
                .map_err(|err| field_error("new_password", err))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            username: "parker".into(),
            email: "Parker@Example.com".into(),
            phone_number: "9876543210".into(),
            password: "Secret1!".into(),
            confirm_password: "Secret1!".into(),
            role: String::new(),
        }
    }

    #[test]
    fn register_form_builds_new_user() {
        let user = NewUser::try_from(register_form()).expect("valid form");
        assert_eq!(user.email.as_str(), "parker@example.com");
        assert_eq!(user.role, Role::Parker);
    }

    #[test]
    fn register_rejects_mismatched_passwords() {
        let mut form = register_form();
        form.confirm_password = "Secret2!".into();
        let err = NewUser::try_from(form).expect_err("mismatch");
        assert_eq!(err, FormError::PasswordMismatch);
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn register_collects_field_errors() {
        let mut form = register_form();
        form.username = "ab".into();
        form.phone_number = "12345".into();
        let err = NewUser::try_from(form).expect_err("invalid");
        let fields = err.field_errors();
        assert_eq!(
            fields.get("username"),
            Some("Username must be at least 3 characters")
        );
        assert_eq!(
            fields.get("phone_number"),
            Some("Phone number must be exactly 10 digits")
        );
    }

    #[test]
    fn login_requires_both_fields() {
        let err = Credentials::try_from(LoginForm {
            email: "bob@example.com".into(),
            password: String::new(),
        })
        .expect_err("missing password");
        assert!(matches!(err, FormError::MissingFields(_)));
    }

    #[test]
    fn register_rejects_unknown_role_and_blank_fields() {
        let mut form = register_form();
        form.role = "superuser".into();
        let err = NewUser::try_from(form).expect_err("unknown role");
        assert!(err.field_errors().get("role").is_some());

        let mut form = register_form();
        form.email = "   ".into();
        let err = NewUser::try_from(form).expect_err("blank email");
        assert!(matches!(err, FormError::MissingFields(_)));
        assert_eq!(err.field_errors().get("email"), Some(crate::forms::REQUIRED_FIELD));
    }

    #[test]
    fn otp_must_be_six_digits() {
        let err = OtpCheck::try_from(VerifyOtpForm {
            email: "bob@example.com".into(),
            otp: "12ab".into(),
        })
        .expect_err("bad otp");
        assert_eq!(err.to_string(), "Please enter the 6-digit code");

        let check = OtpCheck::try_from(VerifyOtpForm {
            email: "bob@example.com".into(),
            otp: " 123456 ".into(),
        })
        .expect("valid otp");
        assert_eq!(check.otp, "123456");
    }
}
