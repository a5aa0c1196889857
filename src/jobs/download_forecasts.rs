use std::ops::Range;
use chrono::{Datelike, NaiveDate};
use log::info;
use crate::errors::{JobError, ValidationError};
use crate::jobs::{date, day_start};
use crate::manager_db::schema::FORECAST_TABLE;
use crate::manager_db::{RangeQuery, TimeSeriesStore};
use crate::manager_open_meteo::ForecastSource;
use crate::models::geo::GeoLocation;

/// Downloads the historical hourly forecasts of all completed months of one year, for
/// every region. Months already present in the store are skipped.
/// Returns the number of new rows.
///
/// # Arguments
///
/// * 'store' - the time series store
/// * 'source' - forecast source
/// * 'regions' - the locations to download forecasts for
/// * 'search_radius' - max distance in degrees between a region and its stored rows
/// * 'year' - year to download
/// * 'reset' - whether to drop and re-create the forecast table first
/// * 'today' - current date, limits the months of the current year
pub fn download_forecasts(
    store: &mut TimeSeriesStore,
    source: &impl ForecastSource,
    regions: &[GeoLocation],
    search_radius: f64,
    year: i32,
    reset: bool,
    today: NaiveDate) -> Result<usize, JobError> {

    info!("download Open-Meteo historical forecasts for {} regions in {}", regions.len(), year);
    if reset {
        store.init_table(&FORECAST_TABLE)?;
    } else {
        store.ensure_table(&FORECAST_TABLE)?;
    }

    let months = months_to_download(year, today)?;
    let mut total: usize = 0;
    for region in regions {
        for month in months.clone() {
            let (start, end) = month_bounds(year, month)?;
            let days = end.day() as usize;

            let query = RangeQuery::new(day_start(start), day_start(end))
                .near(region.lat(), region.lon(), search_radius);
            if store.count_range(&FORECAST_TABLE, &query)? >= (days - 1) * 24 {
                info!("{}-{:02}: up to date [{}]", year, month, region.name());
                continue;
            }

            let series = source.historical_forecast(region.lat(), region.lon(), start, end)?;
            let inserted = store.upsert_many(&FORECAST_TABLE, &series.to_rows())?;
            info!("{}-{:02}: {} data points, {} new [{}]", year, month, series.len(), inserted, region.name());
            total += inserted;
        }
    }

    info!("forecast download done, {} new rows", total);
    Ok(total)
}

/// Returns the months of the year that are completed by 'today'
///
/// # Arguments
///
/// * 'year' - the year
/// * 'today' - current date
pub fn months_to_download(year: i32, today: NaiveDate) -> Result<Range<u32>, ValidationError> {
    if year > today.year() {
        return Err(ValidationError(format!("year {} is in the future", year)));
    }

    Ok(if year == today.year() { 1..today.month() } else { 1..13 })
}

/// First and last day of a month
///
/// # Arguments
///
/// * 'year' - the year
/// * 'month' - the month, 1 to 12
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let first = date(year, month, 1)?;
    let next = if month == 12 { date(year + 1, 1, 1)? } else { date(year, month + 1, 1)? };
    let last = next.pred_opt().ok_or("date out of range")?;

    Ok((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::tests::{regions, StubForecasts};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(2024, 2).unwrap(), (day(2024, 2, 1), day(2024, 2, 29)));
        assert_eq!(month_bounds(2023, 12).unwrap(), (day(2023, 12, 1), day(2023, 12, 31)));
        assert!(month_bounds(2023, 13).is_err());
    }

    #[test]
    fn test_months_to_download() {
        assert_eq!(months_to_download(2024, day(2024, 3, 15)).unwrap(), 1..3);
        assert_eq!(months_to_download(2023, day(2024, 3, 15)).unwrap(), 1..13);
        assert!(months_to_download(2024, day(2024, 1, 15)).unwrap().is_empty());
        assert!(months_to_download(2025, day(2024, 3, 15)).is_err());
    }

    #[test]
    fn test_download_forecasts_skips_stored_months() {
        let mut store = TimeSeriesStore::in_memory().unwrap();
        let source = StubForecasts::default();
        let regions = regions();

        let inserted = download_forecasts(&mut store, &source, &regions, 0.1, 2024, false, day(2024, 3, 15)).unwrap();
        assert_eq!(inserted, (31 + 29) * 24 * 2);
        assert_eq!(source.calls.borrow().len(), 4);
        assert_eq!(source.calls.borrow()[1], (50.0, day(2024, 2, 1), day(2024, 2, 29)));

        let inserted = download_forecasts(&mut store, &source, &regions, 0.1, 2024, false, day(2024, 3, 15)).unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(source.calls.borrow().len(), 4);

        let inserted = download_forecasts(&mut store, &source, &regions, 0.1, 2024, true, day(2024, 2, 15)).unwrap();
        assert_eq!(inserted, 31 * 24 * 2);
        assert_eq!(source.calls.borrow().len(), 6);
    }
}
