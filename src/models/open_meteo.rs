use std::collections::HashMap;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct HourlyTimeSeries {
    pub time: Vec<String>,
    #[serde(flatten)]
    pub values: HashMap<String, Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
pub struct ForecastPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    #[serde(default)]
    pub utc_offset_seconds: i64,
    pub hourly: HourlyTimeSeries,
}

/// The API answers multi-location requests with an array and single-location requests with an object
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ForecastResponse {
    Many(Vec<ForecastPayload>),
    One(ForecastPayload),
}

impl ForecastResponse {
    pub fn into_vec(self) -> Vec<ForecastPayload> {
        match self {
            ForecastResponse::Many(v) => v,
            ForecastResponse::One(p) => vec![p],
        }
    }
}
