use std::collections::HashMap;
use std::fmt;
use std::fmt::Formatter;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use crate::errors::ValidationError;
use crate::models::attributes::{position_of, Attribute, FORECAST_ATTRIBUTES};
use crate::models::geo::Position;
use crate::models::open_meteo::ForecastPayload;
use crate::models::series_row::SeriesRow;

/// Parses an ISO-8601 stamp into an instant.
/// Stamps without offset are taken as UTC, date only stamps as midnight UTC.
///
/// # Arguments
///
/// * 'stamp' - the string to parse
pub fn parse_instant(stamp: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(stamp) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(stamp, format) {
            return Ok(dt.and_utc());
        }
    }
    let date = NaiveDate::parse_from_str(stamp, "%Y-%m-%d")?;

    Ok(date.and_hms_opt(0, 0, 0).ok_or("invalid midnight")?.and_utc())
}

/// Hourly forecast for one location held as parallel columns, one per attribute.
///
/// Absent upstream values are kept as `None`, they are never coerced to zero.
/// A series is immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastSeries {
    position: Position,
    attributes: &'static [Attribute],
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<Vec<Option<f64>>>,
}

impl ForecastSeries {
    /// Returns a validated series over the canonical forecast attributes
    ///
    /// # Arguments
    ///
    /// * 'position' - location of the series
    /// * 'timestamps' - ordered, non-empty time axis
    /// * 'values' - one column per attribute output name, each as long as the time axis
    pub fn new(position: Position, timestamps: Vec<DateTime<Utc>>, values: HashMap<String, Vec<Option<f64>>>)
        -> Result<ForecastSeries, ValidationError> {

        ForecastSeries::with_attributes(FORECAST_ATTRIBUTES, position, timestamps, values)
    }

    /// Returns a validated series over the given attribute set
    ///
    /// # Arguments
    ///
    /// * 'attributes' - the declared attribute set
    /// * 'position' - location of the series
    /// * 'timestamps' - ordered, non-empty time axis
    /// * 'values' - one column per attribute output name, no missing or extra keys
    pub fn with_attributes(
        attributes: &'static [Attribute],
        position: Position,
        timestamps: Vec<DateTime<Utc>>,
        mut values: HashMap<String, Vec<Option<f64>>>) -> Result<ForecastSeries, ValidationError> {

        let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(attributes.len());
        for a in attributes {
            let name = a.name();
            let column = values.remove(&name)
                .ok_or_else(|| ValidationError(format!("attribute '{}' is missing", name)))?;
            columns.push(column);
        }

        if let Some(extra) = values.keys().next() {
            return Err(ValidationError(format!("attribute '{}' is not declared", extra)));
        }

        ForecastSeries::from_columns(attributes, position, timestamps, columns)
    }

    /// Returns a validated series from columns given in attribute order
    ///
    /// # Arguments
    ///
    /// * 'attributes' - the declared attribute set
    /// * 'position' - location of the series
    /// * 'timestamps' - ordered, non-empty time axis
    /// * 'columns' - one column per attribute, in the order of 'attributes'
    pub fn from_columns(
        attributes: &'static [Attribute],
        position: Position,
        timestamps: Vec<DateTime<Utc>>,
        columns: Vec<Vec<Option<f64>>>) -> Result<ForecastSeries, ValidationError> {

        let position = Position::new(position.lat, position.lon, position.elevation)?;

        if timestamps.is_empty() {
            return Err(ValidationError::from("no timestamps in time series"));
        }
        if let Some(ts) = timestamps.iter().find(|ts| ts.timestamp() <= 0) {
            return Err(ValidationError(format!("timestamp {} is not a valid instant", ts)));
        }
        if let Some(w) = timestamps.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ValidationError(format!("timestamps not strictly increasing at {}", w[1])));
        }
        if columns.len() != attributes.len() {
            return Err(ValidationError(format!(
                "expected {} attribute columns, got {}", attributes.len(), columns.len())));
        }
        for (a, c) in attributes.iter().zip(columns.iter()) {
            if c.len() != timestamps.len() {
                return Err(ValidationError(format!(
                    "attribute '{}' has {} values but there are {} timestamps",
                    a.name(), c.len(), timestamps.len())));
            }
        }

        Ok(ForecastSeries { position, attributes, timestamps, columns })
    }

    /// Builds a series from a raw Open-Meteo payload using the canonical attributes
    ///
    /// # Arguments
    ///
    /// * 'payload' - the deserialized API document
    pub fn from_raw_payload(payload: &ForecastPayload) -> Result<ForecastSeries, ValidationError> {
        ForecastSeries::from_raw_payload_with(FORECAST_ATTRIBUTES, payload)
    }

    /// Builds a series from a raw Open-Meteo payload.
    ///
    /// Every output attribute is looked up by its source field name, time stamps are
    /// local to the payload's UTC offset and converted to UTC. Any length mismatch
    /// between the time axis and a source column fails, nothing is truncated.
    ///
    /// # Arguments
    ///
    /// * 'attributes' - the attributes to extract
    /// * 'payload' - the deserialized API document
    pub fn from_raw_payload_with(attributes: &'static [Attribute], payload: &ForecastPayload)
        -> Result<ForecastSeries, ValidationError> {

        let offset = TimeDelta::seconds(payload.utc_offset_seconds);
        let timestamps = payload.hourly.time
            .iter()
            .map(|t| parse_instant(t).map(|ts| ts - offset))
            .collect::<Result<Vec<DateTime<Utc>>, ValidationError>>()?;

        let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(attributes.len());
        for a in attributes {
            let source = payload.hourly.values.get(a.source)
                .ok_or_else(|| ValidationError(format!("source field '{}' missing in payload", a.source)))?;
            if source.len() != timestamps.len() {
                return Err(ValidationError(format!(
                    "source field '{}' has {} values but the time axis has {}",
                    a.source, source.len(), timestamps.len())));
            }
            columns.push(source.clone());
        }

        let position = Position::new(payload.latitude, payload.longitude, payload.elevation)?;

        ForecastSeries::from_columns(attributes, position, timestamps, columns)
    }

    /// Reconstructs a series from stored rows, rows must be ordered by time and
    /// belong to one location. The position of the first row is used.
    ///
    /// # Arguments
    ///
    /// * 'attributes' - the attribute set of the table the rows come from
    /// * 'rows' - the stored rows
    pub fn from_rows(attributes: &'static [Attribute], rows: &[SeriesRow]) -> Result<ForecastSeries, ValidationError> {
        let first = rows.first().ok_or("no rows to build a time series from")?;
        let position = first.position.ok_or("rows carry no position")?;

        let mut timestamps: Vec<DateTime<Utc>> = Vec::with_capacity(rows.len());
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(rows.len()); attributes.len()];
        for row in rows {
            if row.values.len() != attributes.len() {
                return Err(ValidationError(format!(
                    "row at {} has {} values, expected {}", row.ts, row.values.len(), attributes.len())));
            }
            timestamps.push(row.ts);
            for (c, v) in columns.iter_mut().zip(row.values.iter()) {
                c.push(*v);
            }
        }

        ForecastSeries::from_columns(attributes, position, timestamps, columns)
    }

    /// Returns one row per time stamp, ready for persisting
    pub fn to_rows(&self) -> Vec<SeriesRow> {
        self.timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| SeriesRow {
                ts: *ts,
                position: Some(self.position),
                values: self.columns.iter().map(|c| c[i]).collect(),
            })
            .collect()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn attributes(&self) -> &'static [Attribute] {
        self.attributes
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns the column at the given attribute index
    pub fn column(&self, index: usize) -> &[Option<f64>] {
        &self.columns[index]
    }

    /// Returns the column for the given attribute output name
    ///
    /// # Arguments
    ///
    /// * 'name' - output name including unit suffix, e.g. 'cloud_cover_mid_perc'
    pub fn values(&self, name: &str) -> Option<&[Option<f64>]> {
        position_of(self.attributes, name).map(|i| self.columns[i].as_slice())
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for ForecastSeries {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let first = self.timestamps[0].format("%Y-%m-%dT%H:%M");
        let last = self.timestamps[self.timestamps.len() - 1].format("%Y-%m-%dT%H:%M");
        write!(f, "ForecastSeries {} {} - {} ({} points)", self.position, first, last, self.timestamps.len())
    }
}
