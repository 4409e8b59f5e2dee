use crate::domain::staff::{NewSecurityStaff, SecurityStaff};
use crate::domain::types::StaffId;
use crate::forms::security::AddStaffForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::{StaffReader, StaffWriter};
use crate::services::{ServiceResult, ensure_manager};

pub async fn list_staff<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<SecurityStaff>>
where
    R: StaffReader + ?Sized,
{
    ensure_manager(user)?;
    let staff = repo.list_staff().await.map_err(|err| {
        log::error!("Failed to list security staff: {err}");
        err
    })?;
    Ok(staff)
}

pub async fn add_staff<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: AddStaffForm,
) -> ServiceResult<SecurityStaff>
where
    R: StaffWriter + ?Sized,
{
    ensure_manager(user)?;
    let new_staff = NewSecurityStaff::try_from(form)?;
    let staff = repo.add_staff(&new_staff).await.map_err(|err| {
        log::error!("Failed to add security staff {}: {err}", new_staff.email);
        err
    })?;
    Ok(staff)
}

pub async fn remove_staff<R>(repo: &R, user: &AuthenticatedUser, staff_id: i32) -> ServiceResult<()>
where
    R: StaffWriter + ?Sized,
{
    ensure_manager(user)?;
    let staff_id = StaffId::new(staff_id)?;
    repo.remove_staff(staff_id).await.map_err(|err| {
        log::error!("Failed to remove security staff {staff_id}: {err}");
        err
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::domain::user::Role;
    use crate::repository::mock::MockRepository;
    use crate::services::ServiceError;
    use crate::services::test_support::user;

    #[test]
    fn invalid_phone_is_not_sent() {
        let mut repo = MockRepository::new();
        repo.expect_add_staff().never();

        let err = block_on(add_staff(
            &repo,
            &user(Role::Admin),
            AddStaffForm {
                name: "Ravi".into(),
                email: "ravi@example.com".into(),
                phone: "12345".into(),
            },
        ))
        .unwrap_err();
        assert!(err.field_errors().get("phone").is_some());
    }

    #[test]
    fn security_cannot_remove_staff() {
        let mut repo = MockRepository::new();
        repo.expect_remove_staff().never();

        let err = block_on(remove_staff(&repo, &user(Role::Security), 4)).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }

    #[test]
    fn admin_adds_staff() {
        let mut repo = MockRepository::new();
        repo.expect_add_staff().times(1).returning(|staff| {
            Ok(SecurityStaff {
                id: StaffId::new(5).unwrap(),
                name: staff.name.as_str().to_string(),
                email: staff.email.as_str().to_string(),
                phone: staff.phone.as_str().to_string(),
            })
        });

        let staff = block_on(add_staff(
            &repo,
            &user(Role::Admin),
            AddStaffForm {
                name: "Ravi".into(),
                email: "ravi@example.com".into(),
                phone: "9876543210".into(),
            },
        ))
        .unwrap();
        assert_eq!(staff.id.get(), 5);
    }
}
