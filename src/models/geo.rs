use std::fmt;
use std::fmt::Formatter;
use serde::Deserialize;
use crate::errors::ValidationError;

fn check_lat(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(ValidationError(format!("latitude {} not within [-90, 90]", lat)))
    }
}

fn check_lon(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(ValidationError(format!("longitude {} not within [-180, 180]", lon)))
    }
}

/// Geographic position of a series, elevation is optional
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
}

impl Position {
    /// Returns a validated position
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude in [-90, 90]
    /// * 'lon' - longitude in [-180, 180]
    /// * 'elevation' - elevation in meters, if known
    pub fn new(lat: f64, lon: f64, elevation: Option<f64>) -> Result<Position, ValidationError> {
        check_lat(lat)?;
        check_lon(lon)?;

        Ok(Position { lat, lon, elevation })
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for Position {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.lat, self.lon)?;
        if let Some(elevation) = self.elevation {
            write!(f, "@{}m", elevation)?;
        }
        Ok(())
    }
}

/// A named point with a weight, used as (position, weight) pair when merging forecasts
#[derive(Clone, Debug, PartialEq)]
pub struct GeoLocation {
    name: String,
    lat: f64,
    lon: f64,
    weight: f64,
}

impl GeoLocation {
    /// Returns a validated location
    ///
    /// # Arguments
    ///
    /// * 'name' - non-empty name, metadata only
    /// * 'lat' - latitude in [-90, 90]
    /// * 'lon' - longitude in [-180, 180]
    /// * 'weight' - relative weight, must be > 0
    pub fn new(name: &str, lat: f64, lon: f64, weight: f64) -> Result<GeoLocation, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::from("location name must not be empty"));
        }
        check_lat(lat)?;
        check_lon(lon)?;
        if !(weight > 0.0 && weight.is_finite()) {
            return Err(ValidationError(format!("location weight {} must be > 0", weight)));
        }

        Ok(GeoLocation { name: name.to_string(), lat, lon, weight })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "GeoLocation '{}' ({:.6}, {:.6}) W: {:.2}", self.name, self.lat, self.lon, self.weight)
    }
}

/// Raw bounding box as stored in the regions file
#[derive(Deserialize)]
pub struct GeoJsonBBox {
    #[serde(rename = "minLat")]
    pub min_lat: f64,
    #[serde(rename = "maxLat")]
    pub max_lat: f64,
    #[serde(rename = "minLon")]
    pub min_lon: f64,
    #[serde(rename = "maxLon")]
    pub max_lon: f64,
}

/// A geographic bounding box delimited by its southwest (min) and northeast (max) corners
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

impl BBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<BBox, ValidationError> {
        check_lat(min_lat)?;
        check_lat(max_lat)?;
        check_lon(min_lon)?;
        check_lon(max_lon)?;
        if max_lat <= min_lat {
            return Err(ValidationError::from("max latitude must be greater than min latitude"));
        }
        if max_lon <= min_lon {
            return Err(ValidationError::from("max longitude must be greater than min longitude"));
        }

        Ok(BBox { min_lat, min_lon, max_lat, max_lon })
    }

    /// Midpoint of the box as (lat, lon)
    pub fn center(&self) -> (f64, f64) {
        ((self.max_lat + self.min_lat) / 2.0, (self.max_lon + self.min_lon) / 2.0)
    }

    /// Area based weight of the box, a full 360x180 degree box yields 1e6
    pub fn weight(&self) -> f64 {
        (self.max_lon - self.min_lon) / 0.36 * (self.max_lat - self.min_lat) / 0.18
    }
}

impl TryFrom<&GeoJsonBBox> for BBox {
    type Error = ValidationError;

    fn try_from(raw: &GeoJsonBBox) -> Result<Self, Self::Error> {
        BBox::new(raw.min_lat, raw.min_lon, raw.max_lat, raw.max_lon)
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for BBox {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "GeoBoundingBox ({}, {}) - ({}, {})", self.min_lat, self.min_lon, self.max_lat, self.max_lon)
    }
}
