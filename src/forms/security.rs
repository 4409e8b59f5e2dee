use serde::Deserialize;
use validator::Validate;

use crate::domain::staff::NewSecurityStaff;
use crate::domain::types::{PhoneNumber, StaffName, UserEmail};
use crate::forms::{FormError, field_error};

#[derive(Deserialize, Validate)]
/// Form data for adding a security staff member.
pub struct AddStaffForm {
    #[serde(default)]
    #[validate(
        custom(function = "crate::forms::required"),
        length(max = 100, message = "Name is too long")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::email_address"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::phone_number"))]
    pub phone: String,
}

impl TryFrom<AddStaffForm> for NewSecurityStaff {
    type Error = FormError;

    fn try_from(form: AddStaffForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(NewSecurityStaff {
            name: StaffName::new(form.name).map_err(|err| field_error("name", err))?,
            email: UserEmail::new(form.email).map_err(|err| field_error("email", err))?,
            phone: PhoneNumber::new(form.phone).map_err(|err| field_error("phone", err))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_form_validates_contacts() {
        let err = NewSecurityStaff::try_from(AddStaffForm {
            name: "Ravi".into(),
            email: "ravi@site".into(),
            phone: "9876543210".into(),
        })
        .expect_err("bad email");
        assert_eq!(
            err.field_errors().get("email"),
            Some("Please enter a valid email address")
        );

        let staff = NewSecurityStaff::try_from(AddStaffForm {
            name: " Ravi ".into(),
            email: "Ravi@Site.com".into(),
            phone: "9876543210".into(),
        })
        .expect("valid staff");
        assert_eq!(staff.name.as_str(), "Ravi");
        assert_eq!(staff.email.as_str(), "ravi@site.com");
    }

    #[test]
    fn staff_form_reports_every_blank_field() {
        let err = NewSecurityStaff::try_from(AddStaffForm {
            name: " ".into(),
            email: String::new(),
            phone: "98765".into(),
        })
        .expect_err("blank fields");
        assert_eq!(err.to_string(), "Please fill in all required fields");
        let fields = err.field_errors();
        assert!(fields.get("name").is_some());
        assert!(fields.get("email").is_some());
        assert_eq!(
            fields.get("phone"),
            Some("Phone number must be exactly 10 digits")
        );
    }
}
