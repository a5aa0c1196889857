use chrono::{DateTime, Utc};
use crate::models::geo::Position;

/// One persisted row: key columns plus one value per schema attribute, in schema order
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesRow {
    pub ts: DateTime<Utc>,
    pub position: Option<Position>,
    pub values: Vec<Option<f64>>,
}
