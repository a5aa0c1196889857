use std::time::Duration;
use chrono::{DateTime, Datelike, Utc};
use log::warn;
use ureq::Agent;
use crate::config::EnergyChartsParameters;
use crate::errors::{FetchError, ValidationError};
use crate::models::attributes::MARKET_ATTRIBUTES;
use crate::models::energy_charts::MarketSeries;
use crate::models::market::MarketDataPoint;

/// First year with spot market data
pub const FIRST_YEAR: i32 = 2015;

/// English name fragments identifying each market series, in market attribute order
const SERIES_LABELS: [&str; 11] = [
    "pumped storage",
    "Cross border",
    "Non-Renewable",
    "Renewable",
    "Load",
    "Day Ahead",
    "Intraday Continuous Average",
    "Intraday Continuous Low",
    "Intraday Continuous High",
    "Intraday Continuous ID3",
    "Intraday Continuous ID1",
];

/// Source of weekly electricity spot market data
pub trait MarketSource {
    /// Market data for one calendar week
    ///
    /// # Arguments
    ///
    /// * 'year' - the year, from 2015 up to the current year
    /// * 'week' - the week within the year, 1 to 53
    fn weekly_market_data(&self, year: i32, week: u32) -> Result<Vec<MarketDataPoint>, FetchError>;
}

/// Struct for fetching EPEX spot market data from energy-charts.info
pub struct EnergyCharts {
    agent: Agent,
    base_url: String,
    country: String,
}

impl EnergyCharts {
    /// Returns an EnergyCharts struct ready for fetching market data
    ///
    /// # Arguments
    ///
    /// * 'params' - endpoint, country code and request timeout
    pub fn new(params: &EnergyChartsParameters) -> EnergyCharts {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(params.timeout_secs)))
            .build();

        let agent = config.into();

        EnergyCharts {
            agent,
            base_url: params.base_url.clone(),
            country: params.country.clone(),
        }
    }
}

impl MarketSource for EnergyCharts {
    fn weekly_market_data(&self, year: i32, week: u32) -> Result<Vec<MarketDataPoint>, FetchError> {
        check_week(year, week, Utc::now().year())?;

        let url = format!("{}/{}/week_{}_{:02}.json", self.base_url, self.country, year, week);
        let json = self.agent
            .get(url)
            .call()?
            .body_mut()
            .read_to_string()?;

        let series: Vec<MarketSeries> = serde_json::from_str(&json)?;

        parse_market_data(&series)
    }
}

/// Checks that the requested week can hold market data
///
/// # Arguments
///
/// * 'year' - requested year
/// * 'week' - requested week
/// * 'current_year' - the current year
pub fn check_week(year: i32, week: u32, current_year: i32) -> Result<(), ValidationError> {
    if year < FIRST_YEAR || year > current_year {
        return Err(ValidationError(format!("year must be in [{}, {}]", FIRST_YEAR, current_year)));
    }
    if !(1..=53).contains(&week) {
        return Err(ValidationError::from("week must be in [1, 53]"));
    }

    Ok(())
}

/// Returns the index of the most specific label contained in the series name
///
/// # Arguments
///
/// * 'name' - english series name
fn label_index(name: &str) -> Option<usize> {
    SERIES_LABELS
        .iter()
        .enumerate()
        .filter(|(_, label)| name.contains(*label))
        .max_by_key(|(_, label)| label.len())
        .map(|(i, _)| i)
}

/// Transforms the chart series into market data points, one per time axis value
///
/// # Arguments
///
/// * 'series' - the series as delivered by energy-charts.info
pub fn parse_market_data(series: &[MarketSeries]) -> Result<Vec<MarketDataPoint>, FetchError> {
    let times = series
        .iter()
        .find_map(|s| s.x_axis_values.as_ref())
        .ok_or_else(|| FetchError::from("data is missing time axis"))?;
    if times.is_empty() {
        return Err(FetchError::from("data has an empty time axis"));
    }

    let mut columns: Vec<Option<&Vec<Option<f64>>>> = vec![None; SERIES_LABELS.len()];
    for s in series {
        let name = s.name.english();
        if let Some(i) = label_index(name) {
            if columns[i].is_some() {
                warn!("ignoring duplicate market series '{}'", name);
                continue;
            }
            columns[i] = Some(&s.data);
        }
    }

    let mut data: Vec<&Vec<Option<f64>>> = Vec::with_capacity(columns.len());
    for (i, c) in columns.into_iter().enumerate() {
        let c = c.ok_or_else(|| FetchError(format!("series '{}' is missing", SERIES_LABELS[i])))?;
        if c.len() != times.len() {
            return Err(FetchError(format!(
                "series '{}' has {} values but the time axis has {}", SERIES_LABELS[i], c.len(), times.len())));
        }
        data.push(c);
    }

    let mut points: Vec<MarketDataPoint> = Vec::with_capacity(times.len());
    for (idx, t) in times.iter().enumerate() {
        let ts = DateTime::from_timestamp_millis(*t)
            .ok_or_else(|| FetchError(format!("time stamp {} out of range", t)))?;
        let values = data.iter().map(|c| c[idx]).collect::<Vec<Option<f64>>>();
        debug_assert_eq!(values.len(), MARKET_ATTRIBUTES.len());
        points.push(MarketDataPoint::new(ts, values)?);
    }

    Ok(points)
}
