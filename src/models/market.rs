use std::fmt;
use std::fmt::Formatter;
use chrono::{DateTime, Utc};
use crate::errors::ValidationError;
use crate::models::attributes::{position_of, MARKET_ATTRIBUTES};
use crate::models::series_row::SeriesRow;

/// EPEX spot market prices with associated power production figures for one time slot
#[derive(Clone, Debug, PartialEq)]
pub struct MarketDataPoint {
    ts: DateTime<Utc>,
    values: Vec<Option<f64>>,
}

impl MarketDataPoint {
    /// Returns a validated market data point
    ///
    /// # Arguments
    ///
    /// * 'ts' - start of the time slot, must be after the unix epoch
    /// * 'values' - one value per market attribute, in attribute order
    pub fn new(ts: DateTime<Utc>, values: Vec<Option<f64>>) -> Result<MarketDataPoint, ValidationError> {
        if ts.timestamp() <= 0 {
            return Err(ValidationError(format!("timestamp {} is not a valid instant", ts)));
        }
        if values.len() != MARKET_ATTRIBUTES.len() {
            return Err(ValidationError(format!(
                "expected {} market values, got {}", MARKET_ATTRIBUTES.len(), values.len())));
        }

        Ok(MarketDataPoint { ts, values })
    }

    pub fn ts(&self) -> DateTime<Utc> {
        self.ts
    }

    /// Returns the value for the given attribute output name, None if absent or unknown
    ///
    /// # Arguments
    ///
    /// * 'name' - output name including unit suffix, e.g. 'ren_prod_kw'
    pub fn value(&self, name: &str) -> Option<f64> {
        position_of(MARKET_ATTRIBUTES, name).and_then(|i| self.values[i])
    }

    pub fn to_row(&self) -> SeriesRow {
        SeriesRow { ts: self.ts, position: None, values: self.values.clone() }
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for MarketDataPoint {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.value("idc_av_price_eurmwh") {
            Some(price) => write!(f, "EpexData: ({}) {:.2} EUR/MWh", self.ts.timestamp_millis(), price),
            None => write!(f, "EpexData: ({}) n/a EUR/MWh", self.ts.timestamp_millis()),
        }
    }
}
