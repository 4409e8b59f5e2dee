use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::domain::staff::{NewSecurityStaff, SecurityStaff};
use crate::domain::types::StaffId;
use crate::models::staff::{NewStaff, SecurityStaff as DbStaff};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::local::DieselRepository;
use crate::repository::{StaffReader, StaffWriter};

impl StaffReader for DieselRepository {
    async fn list_staff(&self) -> RepositoryResult<Vec<SecurityStaff>> {
        use crate::schema::security_staff;

        let mut conn = self.conn()?;
        let rows = security_staff::table
            .order(security_staff::name.asc())
            .select(DbStaff::as_select())
            .load(&mut conn)?;

        rows.into_iter()
            .map(|row| SecurityStaff::try_from(row).map_err(RepositoryError::from))
            .collect()
    }
}

impl StaffWriter for DieselRepository {
    async fn add_staff(&self, staff: &NewSecurityStaff) -> RepositoryResult<SecurityStaff> {
        use crate::schema::security_staff;

        let mut conn = self.conn()?;
        let row = diesel::insert_into(security_staff::table)
            .values(NewStaff::from(staff))
            .returning(DbStaff::as_returning())
            .get_result(&mut conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    RepositoryError::ConstraintViolation(
                        "A staff member with this email already exists".to_string(),
                    )
                }
                other => other.into(),
            })?;

        Ok(SecurityStaff::try_from(row)?)
    }

    async fn remove_staff(&self, id: StaffId) -> RepositoryResult<()> {
        use crate::schema::security_staff;

        let mut conn = self.conn()?;
        let deleted = diesel::delete(security_staff::table.find(id.get())).execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
