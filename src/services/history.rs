//! Booking history with filters, and its CSV report.

use chrono::{DateTime, Utc};

use crate::domain::booking::{Booking, HistoryFilter, HistoryScope};
use crate::dto::booking::BookingRow;
use crate::dto::history::{HistoryPageData, ReportRow};
use crate::forms::history::HistoryQuery;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::BookingReader;
use crate::services::{ServiceError, ServiceResult, user_id};

/// Admins see every booking; everyone else sees their own.
fn scope_for(user: &AuthenticatedUser) -> ServiceResult<HistoryScope> {
    if user.role.can_manage() {
        Ok(HistoryScope::All)
    } else {
        Ok(HistoryScope::User(user_id(user)?))
    }
}

async fn filtered<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: &HistoryQuery,
    now: DateTime<Utc>,
) -> ServiceResult<(HistoryScope, Vec<Booking>)>
where
    R: BookingReader + ?Sized,
{
    let scope = scope_for(user)?;
    let bookings = repo.booking_history(scope).await.map_err(|err| {
        log::error!("Failed to load booking history: {err}");
        err
    })?;
    Ok((scope, HistoryFilter::from(query).apply(&bookings, now)))
}

pub async fn load_history<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: HistoryQuery,
    now: DateTime<Utc>,
) -> ServiceResult<HistoryPageData>
where
    R: BookingReader + ?Sized,
{
    let (scope, matching) = filtered(repo, user, &query, now).await?;
    let total_matching = matching.len();
    let total_amount = matching.iter().map(|booking| booking.amount).sum();
    let bookings = Paginated::paginate(matching, query.page.unwrap_or(1))
        .map(|booking| BookingRow::new(booking, now));

    Ok(HistoryPageData {
        bookings,
        query,
        total_matching,
        total_amount,
        all_users: scope == HistoryScope::All,
    })
}

/// All bookings matching the filters as CSV, header included.
pub async fn history_report<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: HistoryQuery,
    now: DateTime<Utc>,
) -> ServiceResult<Vec<u8>>
where
    R: BookingReader + ?Sized,
{
    let (_, matching) = filtered(repo, user, &query, now).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    for booking in &matching {
        writer.serialize(ReportRow::from(booking)).map_err(|err| {
            log::error!("Failed to write report row: {err}");
            ServiceError::Internal(err.to_string())
        })?;
    }
    writer
        .into_inner()
        .map_err(|err| ServiceError::Internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use futures::executor::block_on;

    use super::*;
    use crate::domain::booking::BookingStatus;
    use crate::domain::user::Role;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{booking, user};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    fn history() -> Vec<Booking> {
        let day = Duration::days(1);
        let now = now();
        let mut old = booking(1, now - day * 40, now - day * 40 + Duration::hours(2));
        old.status = BookingStatus::Completed;
        let mut recent = booking(2, now - day * 2, now - day * 2 + Duration::hours(1));
        recent.status = BookingStatus::Completed;
        recent.area_name = Some("Side Parking".into());
        let mut cancelled = booking(3, now - day, now - day + Duration::hours(1));
        cancelled.status = BookingStatus::Cancelled;
        vec![old, recent, cancelled]
    }

    #[test]
    fn parkers_only_see_their_own_history() {
        let mut repo = MockRepository::new();
        repo.expect_booking_history()
            .withf(|scope| matches!(scope, HistoryScope::User(id) if id.get() == 7))
            .times(1)
            .returning(|_| Ok(history()));

        let page = block_on(load_history(
            &repo,
            &user(Role::Parker),
            HistoryQuery::default(),
            now(),
        ))
        .unwrap();
        assert!(!page.all_users);
        assert_eq!(page.total_matching, 3);
        let ids: Vec<i32> = page.bookings.items.iter().map(|r| r.booking.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn filters_combine() {
        let mut repo = MockRepository::new();
        repo.expect_booking_history()
            .withf(|scope| *scope == HistoryScope::All)
            .returning(|_| Ok(history()));

        let page = block_on(load_history(
            &repo,
            &user(Role::Admin),
            HistoryQuery {
                status: Some("completed".into()),
                range: Some("week".into()),
                q: Some("side".into()),
                page: None,
            },
            now(),
        ))
        .unwrap();
        assert!(page.all_users);
        assert_eq!(page.total_matching, 1);
        assert_eq!(page.bookings.items[0].booking.id.get(), 2);
    }

    #[test]
    fn report_has_header_and_rows() {
        let mut repo = MockRepository::new();
        repo.expect_booking_history().returning(|_| Ok(history()));

        let csv = block_on(history_report(
            &repo,
            &user(Role::Parker),
            HistoryQuery {
                status: Some("cancelled".into()),
                ..HistoryQuery::default()
            },
            now(),
        ))
        .unwrap();
        let text = String::from_utf8(csv).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("booking_id,area,slot,vehicle_number,start_time,end_time,amount,status")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("3,Main Entrance,A3,KA-01-0003,"));
        assert!(row.ends_with(",100.0,cancelled"));
        assert_eq!(lines.next(), None);
    }
}
