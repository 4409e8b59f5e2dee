use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rand::Rng;

use crate::domain::types::{Password, UserEmail};
use crate::domain::user::{AuthSession, Credentials, NewUser, PasswordReset, ProfileUpdate, User};
use crate::models::user::{
    NewUser as DbNewUser, PasswordReset as DbPasswordReset, User as DbUser,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::local::DieselRepository;
use crate::repository::{AuthGateway, ProfileReader, ProfileWriter};

const OTP_LIFETIME_MINUTES: i64 = 10;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn hash_or_unexpected(password: &Password) -> RepositoryResult<String> {
    hash_password(password.as_str())
        .map_err(|e| RepositoryError::Unexpected(format!("Failed to hash password: {e}")))
}

fn bad_request(message: &str) -> RepositoryError {
    RepositoryError::Api {
        status: 400,
        message: Some(message.to_string()),
    }
}

fn account_taken(err: DieselError) -> RepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            bad_request("An account with this email or username already exists")
        }
        other => other.into(),
    }
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

impl AuthGateway for DieselRepository {
    async fn login(&self, credentials: &Credentials) -> RepositoryResult<AuthSession> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let row = users::table
            .filter(users::email.eq(credentials.email.as_str()))
            .select(DbUser::as_select())
            .first(&mut conn)
            .optional()?;

        let invalid = || RepositoryError::Api {
            status: 401,
            message: Some("Invalid email or password".to_string()),
        };
        let row = row.ok_or_else(invalid)?;
        if !verify_password(&credentials.password, &row.password_hash) {
            return Err(invalid());
        }

        Ok(AuthSession {
            token: uuid::Uuid::new_v4().to_string(),
            user: User::try_from(row)?,
        })
    }

    async fn register(&self, new_user: &NewUser) -> RepositoryResult<User> {
        use crate::schema::users;

        let password_hash = hash_or_unexpected(&new_user.password)?;
        let mut conn = self.conn()?;
        let row = diesel::insert_into(users::table)
            .values(DbNewUser {
                username: new_user.username.as_str(),
                email: new_user.email.as_str(),
                phone_number: Some(new_user.phone_number.as_str()),
                role: new_user.role.as_str(),
                password_hash: &password_hash,
            })
            .returning(DbUser::as_returning())
            .get_result(&mut conn)
            .map_err(account_taken)?;

        Ok(User::try_from(row)?)
    }

    async fn request_password_reset(&self, email: &UserEmail) -> RepositoryResult<()> {
        use crate::schema::{password_resets, users};

        let mut conn = self.conn()?;
        let known: i64 = users::table
            .filter(users::email.eq(email.as_str()))
            .count()
            .get_result(&mut conn)?;
        if known == 0 {
            return Err(RepositoryError::Api {
                status: 404,
                message: Some("No account found with this email".to_string()),
            });
        }

        let reset = DbPasswordReset {
            email: email.as_str().to_string(),
            otp: generate_otp(),
            expires_at: (Utc::now() + Duration::minutes(OTP_LIFETIME_MINUTES)).naive_utc(),
            verified: false,
        };
        diesel::replace_into(password_resets::table)
            .values(&reset)
            .execute(&mut conn)?;

        log::info!("Password reset code for {}: {}", reset.email, reset.otp);
        Ok(())
    }

    async fn verify_otp(&self, email: &UserEmail, otp: &str) -> RepositoryResult<()> {
        use crate::schema::password_resets;

        let mut conn = self.conn()?;
        let reset = password_resets::table
            .find(email.as_str())
            .select(DbPasswordReset::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| bad_request("Invalid OTP"))?;

        if reset.expires_at < Utc::now().naive_utc() {
            return Err(bad_request("OTP has expired"));
        }
        if reset.otp != otp {
            return Err(bad_request("Invalid OTP"));
        }

        diesel::update(password_resets::table.find(email.as_str()))
            .set(password_resets::verified.eq(true))
            .execute(&mut conn)?;
        Ok(())
    }

    async fn reset_password(&self, reset: &PasswordReset) -> RepositoryResult<()> {
        use crate::schema::{password_resets, users};

        let password_hash = hash_or_unexpected(&reset.new_password)?;
        let mut conn = self.conn()?;
        conn.transaction::<(), RepositoryError, _>(|conn| {
            let pending = password_resets::table
                .find(reset.email.as_str())
                .select(DbPasswordReset::as_select())
                .first(conn)
                .optional()?;
            match pending {
                Some(pending) if pending.verified && pending.otp == reset.otp => {}
                _ => return Err(bad_request("Please verify the code first")),
            }

            diesel::update(users::table.filter(users::email.eq(reset.email.as_str())))
                .set(users::password_hash.eq(&password_hash))
                .execute(conn)?;
            diesel::delete(password_resets::table.find(reset.email.as_str())).execute(conn)?;
            Ok(())
        })
    }
}

impl ProfileReader for DieselRepository {
    async fn fetch_profile(&self) -> RepositoryResult<User> {
        use crate::schema::users;

        let user_id = self.acting_user()?;
        let mut conn = self.conn()?;
        let row = users::table
            .find(user_id.get())
            .select(DbUser::as_select())
            .first(&mut conn)?;
        Ok(User::try_from(row)?)
    }
}

impl ProfileWriter for DieselRepository {
    async fn update_profile(&self, update: &ProfileUpdate) -> RepositoryResult<User> {
        use crate::schema::users;

        let user_id = self.acting_user()?;
        let mut conn = self.conn()?;
        let row = diesel::update(users::table.find(user_id.get()))
            .set((
                users::username.eq(update.username.as_str()),
                users::email.eq(update.email.as_str()),
                users::phone_number.eq(Some(update.phone_number.as_str())),
            ))
            .returning(DbUser::as_returning())
            .get_result(&mut conn)
            .map_err(account_taken)?;
        Ok(User::try_from(row)?)
    }

    async fn change_password(&self, username: &str, password: &Password) -> RepositoryResult<()> {
        use crate::schema::users;

        let user_id = self.acting_user()?;
        let password_hash = hash_or_unexpected(password)?;
        let mut conn = self.conn()?;
        let updated = diesel::update(
            users::table
                .find(user_id.get())
                .filter(users::username.eq(username)),
        )
        .set(users::password_hash.eq(&password_hash))
        .execute(&mut conn)?;
        if updated == 0 {
            return Err(RepositoryError::Forbidden);
        }
        Ok(())
    }

    async fn delete_account(&self, username: &str) -> RepositoryResult<()> {
        use crate::schema::users;

        let user_id = self.acting_user()?;
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            users::table
                .find(user_id.get())
                .filter(users::username.eq(username)),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::Forbidden);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("Secret#123").unwrap();
        assert!(verify_password("Secret#123", &hash));
        assert!(!verify_password("secret#123", &hash));
        assert!(!verify_password("Secret#123", "not-a-hash"));
    }

    #[test]
    fn otp_has_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
