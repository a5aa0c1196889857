use chrono::Datelike;
use log::{info, warn};
use crate::aggregation::SeriesAggregator;
use crate::errors::JobError;
use crate::jobs::{date, day_start};
use crate::manager_db::schema::{AGGREGATE_TABLE, FORECAST_TABLE};
use crate::manager_db::{RangeQuery, TimeSeriesStore};
use crate::models::forecast::ForecastSeries;
use crate::models::geo::GeoLocation;

/// Merges the stored regional forecasts, year by year, into one weighted country wide
/// forecast and stores it in the aggregate table. Returns the number of new rows.
///
/// Years where any region has no stored rows are skipped.
///
/// # Arguments
///
/// * 'store' - the time series store
/// * 'aggregator' - merges the regional forecasts
/// * 'regions' - regions to merge, weighted by their weight
/// * 'first_year' - no year before this is aggregated
/// * 'search_radius' - max distance in degrees between a region and its stored rows
/// * 'reset' - whether to drop and re-create the aggregate table first
pub fn aggregate_forecasts(
    store: &mut TimeSeriesStore,
    aggregator: &SeriesAggregator,
    regions: &[GeoLocation],
    first_year: i32,
    search_radius: f64,
    reset: bool) -> Result<usize, JobError> {

    info!("aggregate forecasts for {} regions", regions.len());
    if reset {
        store.init_table(&AGGREGATE_TABLE)?;
    } else {
        store.ensure_table(&AGGREGATE_TABLE)?;
    }
    store.ensure_table(&FORECAST_TABLE)?;

    let Some((start, end)) = store.time_bounds(&FORECAST_TABLE)? else {
        warn!("no forecasts stored, nothing to aggregate");
        return Ok(0);
    };

    let weights = regions.iter().map(|r| r.weight()).collect::<Vec<f64>>();
    let mut total: usize = 0;
    'years: for year in first_year.max(start.year())..=end.year() {
        let query = RangeQuery::new(day_start(date(year, 1, 1)?), day_start(date(year + 1, 1, 1)?));

        let mut forecasts: Vec<ForecastSeries> = Vec::with_capacity(regions.len());
        for region in regions {
            let rows = store.query_range(
                &FORECAST_TABLE, &query.near(region.lat(), region.lon(), search_radius))?;
            if rows.is_empty() {
                warn!("{}: no forecasts stored for region {}, year skipped", year, region.name());
                continue 'years;
            }
            forecasts.push(ForecastSeries::from_rows(FORECAST_TABLE.attributes, &rows)?);
        }

        let merged = aggregator.merge(&forecasts, Some(weights.as_slice()))?;
        let inserted = store.upsert_many(&AGGREGATE_TABLE, &merged.to_rows())?;
        info!("{}: merged {} data points, {} new", year, merged.len(), inserted);
        total += inserted;
    }

    info!("aggregation done, {} new rows", total);
    Ok(total)
}
