use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use crate::errors::ConfigError;
use crate::models::geo::{BBox, GeoJsonBBox, GeoLocation};

/// Loads the regions file and returns one forecast location per region.
///
/// Each region is placed at the center of its bounding box and weighted by the
/// box area. Regions are returned ordered by name.
///
/// # Arguments
///
/// * 'regions_file' - path to a JSON object mapping region names to bounding boxes
pub fn load_regions(regions_file: &str) -> Result<Vec<GeoLocation>, ConfigError> {
    let path = Path::new(regions_file);
    if !path.exists() {
        return Err(ConfigError(format!("regions file {} not found", regions_file)));
    }

    let json = fs::read_to_string(path)?;
    let raw: BTreeMap<String, GeoJsonBBox> = serde_json::from_str(&json)?;

    let mut regions: Vec<GeoLocation> = Vec::with_capacity(raw.len());
    for (name, bb) in raw.iter() {
        let bbox = BBox::try_from(bb)?;
        let (lat, lon) = bbox.center();
        regions.push(GeoLocation::new(name, lat, lon, bbox.weight())?);
    }

    if regions.is_empty() {
        return Err(ConfigError(format!("no regions in {}", regions_file)));
    }

    Ok(regions)
}
