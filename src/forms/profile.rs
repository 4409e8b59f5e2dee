use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{Password, PhoneNumber, UserEmail, Username};
use crate::domain::user::ProfileUpdate;
use crate::forms::{FieldErrors, FormError, field_error};

#[derive(Deserialize, Validate)]
pub struct ProfileForm {
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
}

#[derive(Deserialize, Validate)]
pub struct ChangePasswordForm {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::strong_password"))]
    pub new_password: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub confirm_password: String,
}

#[derive(Deserialize, Validate)]
pub struct DeleteAccountForm {
    /// The account's username, typed again to confirm.
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub confirm_username: String,
}

impl TryFrom<ProfileForm> for ProfileUpdate {
    type Error = FormError;

    fn try_from(form: ProfileForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(ProfileUpdate {
            username: Username::new(form.username).map_err(|err| field_error("username", err))?,
            email: UserEmail::new(form.email).map_err(|err| field_error("email", err))?,
            phone_number: PhoneNumber::new(form.phone_number)
                .map_err(|err| field_error("phone_number", err))?,
        })
    }
}

impl TryFrom<ChangePasswordForm> for Password {
    type Error = FormError;

    fn try_from(form: ChangePasswordForm) -> Result<Self, Self::Error> {
        form.validate()?;
        if form.new_password != form.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Password::new(form.new_password).map_err(|err| field_error("new_password", err))
    }
}

impl DeleteAccountForm {
    /// The typed name must match the account being deleted.
    pub fn confirms(&self, username: &str) -> Result<(), FormError> {
        self.validate()?;
        if self.confirm_username.trim() != username {
            let mut fields = FieldErrors::new();
            fields.add("confirm_username", "Username does not match");
            return Err(FormError::from_fields(fields));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_new_password_is_rejected() {
        let err = Password::try_from(ChangePasswordForm {
            new_password: "password".into(),
            confirm_password: "password".into(),
        })
        .expect_err("weak");
        assert!(err.field_errors().get("new_password").is_some());
    }

    #[test]
    fn delete_requires_matching_username() {
        let form = DeleteAccountForm {
            confirm_username: "bob".into(),
        };
        assert!(form.confirms("bob").is_ok());
        assert!(form.confirms("alice").is_err());

        let blank = DeleteAccountForm {
            confirm_username: "  ".into(),
        };
        assert!(matches!(
            blank.confirms("bob"),
            Err(FormError::MissingFields(_))
        ));
    }

    #[test]
    fn profile_form_checks_contacts() {
        let err = ProfileUpdate::try_from(ProfileForm {
            username: "bob".into(),
            email: "bob@example.company".into(),
            phone_number: "9876543210".into(),
        })
        .expect_err("bad tld");
        assert_eq!(err.to_string(), "Please enter a valid email address");

        let update = ProfileUpdate::try_from(ProfileForm {
            username: " bob ".into(),
            email: "Bob@Example.com".into(),
            phone_number: "9876543210".into(),
        })
        .expect("valid profile");
        assert_eq!(update.username.as_str(), "bob");
        assert_eq!(update.email.as_str(), "bob@example.com");
    }
}
