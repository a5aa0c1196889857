use chrono::{DateTime, Utc};
use thiserror::Error;

/// Raised when a value object or a merge precondition is violated
#[derive(Error, Debug, PartialEq)]
#[error("validation error: {0}")]
pub struct ValidationError(pub String);
impl From<&str> for ValidationError {
    fn from(e: &str) -> Self { ValidationError(e.to_string()) }
}
impl From<chrono::ParseError> for ValidationError {
    fn from(e: chrono::ParseError) -> Self { ValidationError(format!("timestamp parse error: {}", e)) }
}

/// Raised when a merge input carries an absent value at a contributing index
#[derive(Error, Debug, PartialEq)]
#[error("data gap in '{attribute}' at {timestamp}")]
pub struct DataGapError {
    pub attribute: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    DataGap(#[from] DataGapError),
}

#[derive(Error, Debug)]
#[error("persistence error: {0}")]
pub struct PersistenceError(pub String);
impl From<duckdb::Error> for PersistenceError {
    fn from(e: duckdb::Error) -> Self { PersistenceError(format!("database error: {}", e)) }
}
impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self { PersistenceError(format!("io error: {}", e)) }
}
impl From<&str> for PersistenceError {
    fn from(e: &str) -> Self { PersistenceError(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("error fetching upstream data: {0}")]
pub struct FetchError(pub String);
impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self { FetchError(format!("http request error: {}", e)) }
}
impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self { FetchError(format!("json document error: {}", e)) }
}
impl From<ValidationError> for FetchError {
    fn from(e: ValidationError) -> Self { FetchError(e.to_string()) }
}
impl From<&str> for FetchError {
    fn from(e: &str) -> Self { FetchError(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub String);
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<ValidationError> for ConfigError {
    fn from(e: ValidationError) -> Self { ConfigError(e.to_string()) }
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}

#[derive(Error, Debug)]
#[error("logging setup error: {0}")]
pub struct LoggingError(pub String);
impl From<std::io::Error> for LoggingError {
    fn from(e: std::io::Error) -> Self { LoggingError(e.to_string()) }
}
impl From<log4rs::config::runtime::ConfigErrors> for LoggingError {
    fn from(e: log4rs::config::runtime::ConfigErrors) -> Self { LoggingError(e.to_string()) }
}
impl From<log::SetLoggerError> for LoggingError {
    fn from(e: log::SetLoggerError) -> Self { LoggingError(e.to_string()) }
}

/// Error returned by the batch jobs, any failure aborts the running job
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
