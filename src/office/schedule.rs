//! Scheduling helpers: the advisory conflict probe and the dashboard's
//! week window.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::db::ScheduleStore;
use crate::error::StoreError;

/// True when the user is double-booked: two or more `scheduled` sessions at
/// exactly this date and time across their assigned cases. Advisory; nothing
/// blocks a booking that creates the collision.
pub async fn has_conflict(
    store: &dyn ScheduleStore,
    user_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<bool, StoreError> {
    let booked = store.count_scheduled_sessions_at(date, time, user_id).await?;
    let conflict = booked >= 2;
    if conflict {
        tracing::debug!(
            user_id = %user_id,
            date = %date,
            time = %time,
            booked,
            "session slot double-booked"
        );
    }
    Ok(conflict)
}

/// Monday-through-Sunday window containing `today`, both ends inclusive.
pub fn week_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::week_window;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn week_window_starts_monday() {
        // 2025-03-05 is a Wednesday.
        let (start, end) = week_window(date(2025, 3, 5));
        assert_eq!(start, date(2025, 3, 3));
        assert_eq!(end, date(2025, 3, 9));
    }

    #[test]
    fn week_window_on_monday_and_sunday_edges() {
        let (start, end) = week_window(date(2025, 3, 3));
        assert_eq!((start, end), (date(2025, 3, 3), date(2025, 3, 9)));

        let (start, end) = week_window(date(2025, 3, 9));
        assert_eq!((start, end), (date(2025, 3, 3), date(2025, 3, 9)));
    }

    #[test]
    fn week_window_spans_month_boundary() {
        // 2025-04-01 is a Tuesday; its week starts in March.
        let (start, end) = week_window(date(2025, 4, 1));
        assert_eq!((start, end), (date(2025, 3, 31), date(2025, 4, 6)));
    }
}
