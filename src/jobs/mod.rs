pub mod aggregate_forecasts;
pub mod download_forecasts;
pub mod download_market;
pub mod live;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crate::errors::ValidationError;

/// Returns the given calendar date
///
/// # Arguments
///
/// * 'year' - year
/// * 'month' - month, 1 to 12
/// * 'day' - day of month
fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, ValidationError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ValidationError(format!("invalid date {}-{:02}-{:02}", year, month, day)))
}

/// Midnight UTC at the start of the given day
fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
