use std::ops::Range;
use chrono::{Datelike, NaiveDate, Weekday};
use log::info;
use crate::errors::{JobError, ValidationError};
use crate::manager_db::schema::MARKET_TABLE;
use crate::manager_db::TimeSeriesStore;
use crate::manager_energy_charts::MarketSource;
use crate::models::series_row::SeriesRow;

/// Downloads all completed weeks of one year of spot market data into the store.
/// Returns the number of new rows.
///
/// # Arguments
///
/// * 'store' - the time series store
/// * 'source' - market data source
/// * 'year' - year to download
/// * 'reset' - whether to drop and re-create the market table first
/// * 'today' - current date, limits the weeks of the current year
pub fn download_market(store: &mut TimeSeriesStore, source: &impl MarketSource, year: i32, reset: bool, today: NaiveDate)
    -> Result<usize, JobError> {

    info!("download EPEX spot market data for {}", year);
    if reset {
        store.init_table(&MARKET_TABLE)?;
    } else {
        store.ensure_table(&MARKET_TABLE)?;
    }

    let mut total: usize = 0;
    for week in weeks_to_download(year, today)? {
        let data = source.weekly_market_data(year, week)?;
        let rows = data.iter().map(|d| d.to_row()).collect::<Vec<SeriesRow>>();
        let inserted = store.upsert_many(&MARKET_TABLE, &rows)?;
        info!("{}-{:02}: {} data points, {} new", year, week, data.len(), inserted);
        total += inserted;
    }

    info!("market download done, {} new rows", total);
    Ok(total)
}

/// Returns the ISO weeks of the year that are completed by 'today'
///
/// # Arguments
///
/// * 'year' - the year
/// * 'today' - current date
pub fn weeks_to_download(year: i32, today: NaiveDate) -> Result<Range<u32>, ValidationError> {
    if year > today.year() {
        return Err(ValidationError(format!("year {} is in the future", year)));
    }

    let current = today.iso_week();
    let weeks = if year > current.year() {
        1..1
    } else if year == current.year() {
        1..current.week()
    } else if NaiveDate::from_isoywd_opt(year, 53, Weekday::Mon).is_some() {
        1..54
    } else {
        1..53
    };

    Ok(weeks)
}
