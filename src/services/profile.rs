use crate::domain::types::Password;
use crate::domain::user::{ProfileUpdate, User};
use crate::forms::profile::{ChangePasswordForm, DeleteAccountForm, ProfileForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{ProfileReader, ProfileWriter};
use crate::services::ServiceResult;

pub async fn load_profile<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<User>
where
    R: ProfileReader + ?Sized,
{
    let profile = repo.fetch_profile().await.map_err(|err| {
        log::error!("Failed to load profile of user {}: {err}", user.id);
        err
    })?;
    Ok(profile)
}

/// Saves the profile and returns the session user with the new details.
pub async fn update_profile<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: ProfileForm,
) -> ServiceResult<AuthenticatedUser>
where
    R: ProfileWriter + ?Sized,
{
    let update = ProfileUpdate::try_from(form)?;
    let profile = repo.update_profile(&update).await.map_err(|err| {
        log::error!("Failed to update profile of user {}: {err}", user.id);
        err
    })?;
    Ok(user.refreshed(&profile))
}

pub async fn change_password<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: ChangePasswordForm,
) -> ServiceResult<()>
where
    R: ProfileWriter + ?Sized,
{
    let password = Password::try_from(form)?;
    repo.change_password(&user.username, &password)
        .await
        .map_err(|err| {
            log::error!("Failed to change password of user {}: {err}", user.id);
            err
        })?;
    Ok(())
}

/// Deletes the account once the user has typed their username.
pub async fn delete_account<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: DeleteAccountForm,
) -> ServiceResult<()>
where
    R: ProfileWriter + ?Sized,
{
    form.confirms(&user.username)?;
    repo.delete_account(&user.username).await.map_err(|err| {
        log::error!("Failed to delete account of user {}: {err}", user.id);
        err
    })?;
    log::info!("User {} deleted their account", user.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::domain::types::UserId;
    use crate::domain::user::Role;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::user;

    #[test]
    fn update_refreshes_session_user() {
        let mut repo = MockRepository::new();
        repo.expect_update_profile()
            .withf(|update| update.username.as_str() == "asha.k")
            .returning(|update| {
                Ok(User {
                    id: UserId::new(7).unwrap(),
                    username: update.username.as_str().to_string(),
                    email: update.email.as_str().to_string(),
                    phone_number: Some(update.phone_number.as_str().to_string()),
                    role: Role::Parker,
                    profile_image: None,
                })
            });

        let refreshed = block_on(update_profile(
            &repo,
            &user(Role::Parker),
            ProfileForm {
                username: "asha.k".into(),
                email: "asha@example.com".into(),
                phone_number: "9123456780".into(),
            },
        ))
        .unwrap();
        assert_eq!(refreshed.username, "asha.k");
        assert_eq!(refreshed.token.as_deref(), Some("token"));
    }

    #[test]
    fn delete_requires_typed_username() {
        let mut repo = MockRepository::new();
        repo.expect_delete_account().never();

        let result = block_on(delete_account(
            &repo,
            &user(Role::Parker),
            DeleteAccountForm {
                confirm_username: "someone".into(),
            },
        ));
        assert!(result.is_err());
    }

    #[test]
    fn password_change_uses_session_username() {
        let mut repo = MockRepository::new();
        repo.expect_change_password()
            .withf(|username, _| username == "asha")
            .times(1)
            .returning(|_, _| Ok(()));

        block_on(change_password(
            &repo,
            &user(Role::Parker),
            ChangePasswordForm {
                new_password: "Newpass1!".into(),
                confirm_password: "Newpass1!".into(),
            },
        ))
        .unwrap();
    }
}
