use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use crate::aggregation::GapPolicy;
use crate::errors::ConfigError;

#[derive(Deserialize)]
pub struct OpenMeteoParameters {
    pub forecast_url: String,
    pub historical_url: String,
    pub tilt: f64,
    pub timeout_secs: u64,
}

#[derive(Deserialize)]
pub struct EnergyChartsParameters {
    pub base_url: String,
    pub country: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize)]
pub struct AggregationParameters {
    pub first_year: i32,
    pub search_radius: f64,
    #[serde(default)]
    pub gap_policy: GapPolicy,
}

#[derive(Deserialize)]
pub struct Files {
    pub db_path: String,
    pub regions_file: String,
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

#[derive(Deserialize)]
pub struct Config {
    pub open_meteo: OpenMeteoParameters,
    pub energy_charts: EnergyChartsParameters,
    pub aggregation: AggregationParameters,
    pub files: Files,
    pub general: General,
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {

    let toml = fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&toml)?;

    if config.aggregation.search_radius <= 0.0 {
        return Err(ConfigError::from("aggregation search radius must be > 0"));
    }

    Ok(config)
}
