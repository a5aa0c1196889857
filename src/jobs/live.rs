use log::info;
use crate::aggregation::SeriesAggregator;
use crate::errors::JobError;
use crate::manager_open_meteo::ForecastSource;
use crate::models::forecast::ForecastSeries;
use crate::models::geo::GeoLocation;

const TEMPERATURE: &str = "temperature_2m_degc";
const IRRADIANCE: &str = "global_tilted_irradiance_wm2";

/// Fetches the current forecast for all regions, merges it and logs the merged hourly
/// temperature and tilted irradiance
///
/// # Arguments
///
/// * 'source' - forecast source
/// * 'aggregator' - merges the regional forecasts
/// * 'regions' - regions to merge, weighted by their weight
pub fn live_forecast(source: &impl ForecastSource, aggregator: &SeriesAggregator, regions: &[GeoLocation])
    -> Result<ForecastSeries, JobError> {

    let positions = regions.iter().map(|r| (r.lat(), r.lon())).collect::<Vec<(f64, f64)>>();
    let weights = regions.iter().map(|r| r.weight()).collect::<Vec<f64>>();

    let forecasts = source.forecasts(&positions)?;
    let merged = aggregator.merge(&forecasts, Some(weights.as_slice()))?;
    info!("{}", merged);

    let temperature = merged.values(TEMPERATURE).unwrap_or_default();
    let irradiance = merged.values(IRRADIANCE).unwrap_or_default();
    for (i, ts) in merged.timestamps().iter().enumerate() {
        info!("{}: {} degC, {} W/m2",
            ts.format("%Y-%m-%d %H:%M"),
            fmt_value(temperature.get(i).copied().flatten()),
            fmt_value(irradiance.get(i).copied().flatten()));
    }

    Ok(merged)
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or("-".to_string(), |v| format!("{:.1}", v))
}
