//! Slot grid and booking dialog.

use chrono::{DateTime, Utc};

use crate::domain::booking::Booking;
use crate::domain::booking_flow::BookingFlow;
use crate::domain::pricing::HOURLY_RATE;
use crate::domain::slot::{ParkingSlot, SlotQuery, SlotStatus, SlotTile};
use crate::domain::types::SlotId;
use crate::dto::booking::{SearchPageData, SlotPageData};
use crate::forms::booking::{
    BookingForm, BookingPayload, SlotSearch, SlotSearchForm, WalkInForm, WalkInPayload,
};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{AreaReader, BookingWriter, SlotReader};
use crate::services::{ServiceError, ServiceResult, ensure_monitor};

pub const BOOKING_FAILED: &str = "Failed to create booking. Please try again.";

/// Areas offered on the search screen.
pub async fn load_search_page<R>(repo: &R, search: SlotSearchForm) -> ServiceResult<SearchPageData>
where
    R: AreaReader + ?Sized,
{
    let areas = repo.list_areas().await.map_err(|err| {
        log::error!("Failed to list parking areas: {err}");
        err
    })?;
    Ok(SearchPageData { areas, search })
}

async fn slots_for<R>(repo: &R, search: &SlotSearch) -> ServiceResult<Vec<ParkingSlot>>
where
    R: SlotReader + ?Sized,
{
    let query = SlotQuery::new(search.area_id).window(search.window);
    let slots = repo.list_slots(&query).await.map_err(|err| {
        log::error!("Failed to list slots of area {}: {err}", search.area_id);
        err
    })?;
    Ok(slots)
}

/// Loads the grid for the searched window with the flow's selection marked.
pub async fn load_slot_page<R>(
    repo: &R,
    form: SlotSearchForm,
    flow: &BookingFlow,
) -> ServiceResult<SlotPageData>
where
    R: AreaReader + SlotReader + ?Sized,
{
    let search = SlotSearch::try_from(form.clone())?;
    let area = repo
        .get_area(search.area_id)
        .await?
        .ok_or(ServiceError::NotFound)?;
    let slots = slots_for(repo, &search).await?;

    let selected = flow.selected().map(|slot| slot.slot_id);
    let free_count = slots
        .iter()
        .filter(|slot| slot.status == SlotStatus::Available)
        .count();

    Ok(SlotPageData {
        tiles: SlotTile::build(&slots, selected),
        area,
        fee: search.fee(),
        hourly_rate: HOURLY_RATE,
        search: form,
        flow_state: flow.state_name(),
        dialog_open: flow.is_dialog_open(),
        flow: flow.clone(),
        free_count,
    })
}

/// Picks a slot on the grid. Unavailable slots leave the flow untouched and
/// return `false`.
pub async fn select_slot<R>(
    repo: &R,
    form: SlotSearchForm,
    flow: &mut BookingFlow,
    slot_id: i32,
) -> ServiceResult<bool>
where
    R: SlotReader + ?Sized,
{
    let search = SlotSearch::try_from(form)?;
    let slot_id = SlotId::new(slot_id)?;
    let slots = slots_for(repo, &search).await?;
    let slot = slots
        .iter()
        .find(|slot| slot.id == slot_id)
        .ok_or(ServiceError::NotFound)?;
    Ok(flow.select_slot(slot)?)
}

/// Opens the booking dialog for the selected slot. A search without a
/// chargeable duration keeps the flow in `Selecting`.
pub fn open_confirmation(search: SlotSearchForm, flow: &mut BookingFlow) -> ServiceResult<()> {
    SlotSearch::try_from(search)?.require_duration()?;
    flow.open_confirmation()?;
    Ok(())
}

/// Submits the booking dialog for the searched window.
///
/// Invalid forms are rejected before anything is sent and leave the dialog
/// open. A backend failure moves the flow to `Failure` with the message to
/// show; success moves it to `Success` carrying the booking id.
pub async fn submit_booking<R>(
    repo: &R,
    flow: &mut BookingFlow,
    search: SlotSearchForm,
    form: BookingForm,
) -> ServiceResult<Booking>
where
    R: BookingWriter + ?Sized,
{
    let search = SlotSearch::try_from(search)?;
    search.require_duration()?;
    let payload = BookingPayload::try_from(form)?;

    if matches!(flow, BookingFlow::Failure { .. }) {
        flow.retry()?;
    }
    let slot = flow.begin_submit()?;
    let new_booking = payload.into_domain(&slot, &search);

    match repo.create_booking(&new_booking).await {
        Ok(booking) => {
            log::info!(
                "Booked slot {} for {} (booking {})",
                slot.slot_number,
                new_booking.vehicle_number,
                booking.id
            );
            flow.succeed(booking.id)?;
            Ok(booking)
        }
        Err(err) => {
            log::error!("Failed to create booking: {err}");
            let message = err.user_message().unwrap_or(BOOKING_FAILED).to_string();
            flow.fail(message)?;
            Err(err.into())
        }
    }
}

/// Registers a vehicle that is already parked, starting now.
pub async fn walk_in<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: WalkInForm,
    now: DateTime<Utc>,
) -> ServiceResult<Booking>
where
    R: BookingWriter + ?Sized,
{
    ensure_monitor(user)?;
    let new_booking = WalkInPayload::try_from(form)?.into_domain(now)?;
    let booking = repo
        .create_booking(&new_booking)
        .await
        .map_err(|err| {
            log::error!("Failed to register walk-in: {err}");
            err
        })?;
    Ok(booking)
}
