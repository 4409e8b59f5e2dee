//! Parking area administration and slot annotation.

use crate::domain::area::{AreaDraft, ParkingArea};
use crate::domain::types::AreaId;
use crate::forms::areas::{AreaForm, SavePositionsRequest};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{AreaReader, AreaWriter, SlotWriter};
use crate::services::{ServiceResult, ensure_manager};

pub async fn list_areas<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<ParkingArea>>
where
    R: AreaReader + ?Sized,
{
    ensure_manager(user)?;
    let areas = repo.list_areas().await.map_err(|err| {
        log::error!("Failed to list parking areas: {err}");
        err
    })?;
    Ok(areas)
}

pub async fn create_area<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: AreaForm,
) -> ServiceResult<ParkingArea>
where
    R: AreaWriter + ?Sized,
{
    ensure_manager(user)?;
    let draft = AreaDraft::try_from(form)?;
    let area = repo.create_area(&draft).await.map_err(|err| {
        log::error!("Failed to create parking area {}: {err}", draft.name);
        err
    })?;
    log::info!("Parking area {} created by user {}", area.id, user.id);
    Ok(area)
}

pub async fn update_area<R>(
    repo: &R,
    user: &AuthenticatedUser,
    area_id: i32,
    form: AreaForm,
) -> ServiceResult<ParkingArea>
where
    R: AreaWriter + ?Sized,
{
    ensure_manager(user)?;
    let area_id = AreaId::new(area_id)?;
    let draft = AreaDraft::try_from(form)?;
    let area = repo.update_area(area_id, &draft).await.map_err(|err| {
        log::error!("Failed to update parking area {area_id}: {err}");
        err
    })?;
    Ok(area)
}

pub async fn delete_area<R>(repo: &R, user: &AuthenticatedUser, area_id: i32) -> ServiceResult<()>
where
    R: AreaWriter + ?Sized,
{
    ensure_manager(user)?;
    let area_id = AreaId::new(area_id)?;
    repo.delete_area(area_id).await.map_err(|err| {
        log::error!("Failed to delete parking area {area_id}: {err}");
        err
    })?;
    log::info!("Parking area {area_id} deleted by user {}", user.id);
    Ok(())
}

/// Stores the slot rectangles drawn over the camera frame. Returns how many
/// were saved.
pub async fn save_positions<R>(
    repo: &R,
    user: &AuthenticatedUser,
    area_id: i32,
    request: SavePositionsRequest,
) -> ServiceResult<usize>
where
    R: SlotWriter + ?Sized,
{
    ensure_manager(user)?;
    let area_id = AreaId::new(area_id)?;
    let positions = request.into_positions()?;
    repo.save_positions(area_id, &positions)
        .await
        .map_err(|err| {
            log::error!("Failed to save slot positions of area {area_id}: {err}");
            err
        })?;
    Ok(positions.len())
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::domain::area::AreaStatus;
    use crate::domain::slot::SlotPosition;
    use crate::domain::user::Role;
    use crate::repository::mock::MockRepository;
    use crate::services::ServiceError;
    use crate::services::test_support::user;

    fn form() -> AreaForm {
        AreaForm {
            name: "North Lot".into(),
            description: "<b>Near</b> the gate<script>x</script>".into(),
            total_slots: 12,
            status: "active".into(),
        }
    }

    #[test]
    fn only_admins_create_areas() {
        let mut repo = MockRepository::new();
        repo.expect_create_area().never();

        let err = block_on(create_area(&repo, &user(Role::Security), form())).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }

    #[test]
    fn create_sends_sanitized_draft() {
        let mut repo = MockRepository::new();
        repo.expect_create_area()
            .withf(|draft| {
                draft.name.as_str() == "North Lot"
                    && !draft.description.as_str().contains("script")
                    && draft.total_slots == 12
            })
            .times(1)
            .returning(|draft| {
                Ok(ParkingArea {
                    id: AreaId::new(3).unwrap(),
                    name: draft.name.as_str().to_string(),
                    description: draft.description.as_str().to_string(),
                    total_slots: draft.total_slots,
                    available_slots: Some(draft.total_slots),
                    status: AreaStatus::Active,
                })
            });

        let area = block_on(create_area(&repo, &user(Role::Admin), form())).unwrap();
        assert_eq!(area.id.get(), 3);
    }

    #[test]
    fn positions_are_validated_before_saving() {
        let mut repo = MockRepository::new();
        repo.expect_save_positions().never();

        let request = SavePositionsRequest {
            positions: vec![
                SlotPosition::from([10, 10, 0, 40, 80]),
                SlotPosition::from([60, 10, 0, 40, 80]),
            ],
        };
        let err = block_on(save_positions(&repo, &user(Role::Admin), 1, request)).unwrap_err();
        assert!(err.field_errors().get("positions").is_some());
    }

    #[test]
    fn positions_are_saved_for_the_area() {
        let mut repo = MockRepository::new();
        repo.expect_save_positions()
            .withf(|area_id, positions| area_id.get() == 2 && positions.len() == 2)
            .times(1)
            .returning(|_, _| Ok(()));

        let request = SavePositionsRequest {
            positions: vec![
                SlotPosition::from([10, 10, 0, 40, 80]),
                SlotPosition::from([60, 10, 1, 40, 80]),
            ],
        };
        let saved = block_on(save_positions(&repo, &user(Role::Admin), 2, request)).unwrap();
        assert_eq!(saved, 2);
    }
}
