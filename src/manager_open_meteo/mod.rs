use std::time::Duration;
use chrono::NaiveDate;
use log::debug;
use ureq::Agent;
use crate::config::OpenMeteoParameters;
use crate::errors::FetchError;
use crate::models::attributes::FORECAST_ATTRIBUTES;
use crate::models::forecast::ForecastSeries;
use crate::models::open_meteo::ForecastResponse;

/// Source of hourly weather forecasts
pub trait ForecastSource {
    /// Current forecasts for several locations, one series per location in the given order
    ///
    /// # Arguments
    ///
    /// * 'positions' - (lat, lon) pairs
    fn forecasts(&self, positions: &[(f64, f64)]) -> Result<Vec<ForecastSeries>, FetchError>;

    /// Forecast as it was issued for the given location and date range (both inclusive)
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude of the location
    /// * 'lon' - longitude of the location
    /// * 'start' - first day
    /// * 'end' - last day
    fn historical_forecast(&self, lat: f64, lon: f64, start: NaiveDate, end: NaiveDate)
        -> Result<ForecastSeries, FetchError>;

    /// Current forecast for one location
    fn forecast(&self, lat: f64, lon: f64) -> Result<ForecastSeries, FetchError> {
        self.forecasts(&[(lat, lon)])?
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::from("empty forecast response"))
    }
}

/// Struct for fetching hourly forecasts from the Open-Meteo forecast APIs
pub struct OpenMeteo {
    agent: Agent,
    forecast_url: String,
    historical_url: String,
    tilt: f64,
}

impl OpenMeteo {
    /// Returns an OpenMeteo struct ready for fetching forecasts
    ///
    /// # Arguments
    ///
    /// * 'params' - endpoints, panel tilt for the tilted irradiance and request timeout
    pub fn new(params: &OpenMeteoParameters) -> OpenMeteo {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(params.timeout_secs)))
            .build();

        let agent = config.into();

        OpenMeteo {
            agent,
            forecast_url: params.forecast_url.clone(),
            historical_url: params.historical_url.clone(),
            tilt: params.tilt,
        }
    }

    /// Requests the hourly attributes for all positions and returns one series per position
    ///
    /// # Arguments
    ///
    /// * 'url' - endpoint to call
    /// * 'positions' - (lat, lon) pairs
    /// * 'range' - optional inclusive date range
    fn fetch(&self, url: &str, positions: &[(f64, f64)], range: Option<(NaiveDate, NaiveDate)>)
        -> Result<Vec<ForecastSeries>, FetchError> {

        let lats = positions.iter().map(|p| p.0.to_string()).collect::<Vec<String>>().join(",");
        let lons = positions.iter().map(|p| p.1.to_string()).collect::<Vec<String>>().join(",");

        let mut request = self.agent
            .get(url)
            .query("latitude", &lats)
            .query("longitude", &lons)
            .query("hourly", hourly_attributes())
            .query("tilt", self.tilt.to_string())
            .query("timezone", "GMT");
        if let Some((start, end)) = range {
            request = request
                .query("start_date", start.format("%Y-%m-%d").to_string())
                .query("end_date", end.format("%Y-%m-%d").to_string());
        }

        let json = request
            .call()?
            .body_mut()
            .read_to_string()?;
        debug!("open-meteo answered {} bytes for {} location(s)", json.len(), positions.len());

        let series = parse_forecasts(&json)?;
        if series.len() != positions.len() {
            return Err(FetchError(format!(
                "requested {} locations but got {} forecasts", positions.len(), series.len())));
        }

        Ok(series)
    }
}

impl ForecastSource for OpenMeteo {
    fn forecasts(&self, positions: &[(f64, f64)]) -> Result<Vec<ForecastSeries>, FetchError> {
        self.fetch(&self.forecast_url, positions, None)
    }

    fn historical_forecast(&self, lat: f64, lon: f64, start: NaiveDate, end: NaiveDate)
        -> Result<ForecastSeries, FetchError> {

        self.fetch(&self.historical_url, &[(lat, lon)], Some((start, end)))?
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::from("empty forecast response"))
    }
}

/// Comma separated source field names of the canonical forecast attributes
pub fn hourly_attributes() -> String {
    FORECAST_ATTRIBUTES.iter().map(|a| a.source).collect::<Vec<&str>>().join(",")
}

/// Parses an Open-Meteo answer, single-location object or multi-location array
///
/// # Arguments
///
/// * 'json' - the response body
pub fn parse_forecasts(json: &str) -> Result<Vec<ForecastSeries>, FetchError> {
    let response: ForecastResponse = serde_json::from_str(json)?;

    let mut series: Vec<ForecastSeries> = Vec::new();
    for payload in response.into_vec() {
        series.push(ForecastSeries::from_raw_payload(&payload)?);
    }

    Ok(series)
}
