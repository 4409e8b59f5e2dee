//! The user's bookings: tabs, cancellation and extension.

use chrono::{DateTime, Utc};

use crate::domain::booking::{Booking, BookingTab};
use crate::domain::types::BookingId;
use crate::dto::booking::{BookingRow, BookingsPageData, TabCounts};
use crate::forms::FormError;
use crate::forms::booking::ExtendBookingForm;
use crate::forms::history::BookingsQuery;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{BookingReader, BookingWriter};
use crate::services::{ServiceError, ServiceResult, user_id};

async fn own_bookings<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<Booking>>
where
    R: BookingReader + ?Sized,
{
    let bookings = repo
        .list_user_bookings(user_id(user)?)
        .await
        .map_err(|err| {
            log::error!("Failed to list bookings of user {}: {err}", user.id);
            err
        })?;
    Ok(bookings)
}

pub async fn load_bookings_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: BookingsQuery,
    now: DateTime<Utc>,
) -> ServiceResult<BookingsPageData>
where
    R: BookingReader + ?Sized,
{
    let bookings = own_bookings(repo, user).await?;
    let tab = query.tab();

    let count = |tab: BookingTab| {
        bookings
            .iter()
            .filter(|booking| BookingTab::classify(booking, now) == tab)
            .count()
    };
    let counts = TabCounts {
        active: count(BookingTab::Active),
        upcoming: count(BookingTab::Upcoming),
        past: count(BookingTab::Past),
    };

    let rows = Paginated::paginate(tab.filter_and_sort(&bookings, now), query.page.unwrap_or(1))
        .map(|booking| BookingRow::new(booking, now));

    Ok(BookingsPageData {
        tab,
        counts,
        bookings: rows,
    })
}

/// Cancels one of the user's bookings.
pub async fn cancel_booking<R>(
    repo: &R,
    user: &AuthenticatedUser,
    booking_id: i32,
    now: DateTime<Utc>,
) -> ServiceResult<()>
where
    R: BookingReader + BookingWriter + ?Sized,
{
    let booking_id = BookingId::new(booking_id)?;
    let booking = own_bookings(repo, user)
        .await?
        .into_iter()
        .find(|booking| booking.id == booking_id)
        .ok_or(ServiceError::NotFound)?;
    if !booking.is_cancellable(now) {
        return Err(ServiceError::Form(FormError::Invalid {
            message: "This booking can no longer be cancelled".to_string(),
            fields: Default::default(),
        }));
    }

    repo.cancel_booking(booking_id).await.map_err(|err| {
        log::error!("Failed to cancel booking {booking_id}: {err}");
        err
    })?;
    log::info!("User {} cancelled booking {booking_id}", user.id);
    Ok(())
}

/// Adds hours to a stay in progress.
pub async fn extend_booking<R>(
    repo: &R,
    user: &AuthenticatedUser,
    booking_id: i32,
    form: ExtendBookingForm,
    now: DateTime<Utc>,
) -> ServiceResult<()>
where
    R: BookingReader + BookingWriter + ?Sized,
{
    let booking_id = BookingId::new(booking_id)?;
    let booking = own_bookings(repo, user)
        .await?
        .into_iter()
        .find(|booking| booking.id == booking_id)
        .ok_or(ServiceError::NotFound)?;
    if !booking.is_extendable(now) {
        return Err(ServiceError::Form(FormError::Invalid {
            message: "Only active bookings can be extended".to_string(),
            fields: Default::default(),
        }));
    }

    let extension = form.extension(booking.end_time)?;
    repo.extend_booking(booking_id, &extension)
        .await
        .map_err(|err| {
            log::error!("Failed to extend booking {booking_id}: {err}");
            err
        })?;
    Ok(())
}
