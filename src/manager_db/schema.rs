use crate::models::attributes::{Attribute, FORECAST_ATTRIBUTES, MARKET_ATTRIBUTES};

/// Primary key layout of a table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    /// Keyed by time stamp alone
    Time,
    /// Keyed by (time stamp, lat, lon), rows also carry an elevation
    TimeAndPosition,
}

/// Declared layout of a time series table
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableSchema {
    pub name: &'static str,
    pub key: KeyKind,
    pub attributes: &'static [Attribute],
}

/// EPEX spot market data
pub const MARKET_TABLE: TableSchema = TableSchema {
    name: "epex_market",
    key: KeyKind::Time,
    attributes: MARKET_ATTRIBUTES,
};

/// Hourly forecasts per location
pub const FORECAST_TABLE: TableSchema = TableSchema {
    name: "open_meteo_hourly",
    key: KeyKind::TimeAndPosition,
    attributes: FORECAST_ATTRIBUTES,
};

/// Country wide weighted aggregate of the hourly forecasts
pub const AGGREGATE_TABLE: TableSchema = TableSchema {
    name: "open_meteo_agg_hourly",
    key: KeyKind::TimeAndPosition,
    attributes: FORECAST_ATTRIBUTES,
};

impl TableSchema {
    pub fn is_spatial(&self) -> bool {
        self.key == KeyKind::TimeAndPosition
    }

    /// All column names in storage order
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec!["ts".to_string()];
        if self.is_spatial() {
            columns.extend(["lat", "lon", "elevation"].iter().map(|c| c.to_string()));
        }
        columns.extend(self.attributes.iter().map(|a| a.name()));

        columns
    }

    /// Column definitions for CREATE TABLE, attribute columns are nullable to hold data gaps
    pub fn create_definition(&self) -> String {
        let mut defs = vec!["ts TIMESTAMP NOT NULL".to_string()];
        if self.is_spatial() {
            defs.push("lat DOUBLE NOT NULL".to_string());
            defs.push("lon DOUBLE NOT NULL".to_string());
            defs.push("elevation DOUBLE".to_string());
        }
        defs.extend(self.attributes.iter().map(|a| format!("{} DOUBLE", a.name())));
        match self.key {
            KeyKind::Time => defs.push("PRIMARY KEY (ts)".to_string()),
            KeyKind::TimeAndPosition => defs.push("PRIMARY KEY (ts, lat, lon)".to_string()),
        }

        format!("{} ({})", self.name, defs.join(", "))
    }

    /// Parameterized insert statement that skips rows with an existing key
    pub fn insert_statement(&self) -> String {
        let columns = self.columns();
        let placeholders = vec!["?"; columns.len()].join(", ");

        format!("INSERT OR IGNORE INTO {} ({}) VALUES ({})", self.name, columns.join(", "), placeholders)
    }
}
