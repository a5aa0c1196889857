use std::fmt;
use std::fmt::Formatter;

/// Physical unit of an attribute, carried as explicit metadata instead of being
/// encoded ad hoc in field names
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    DegC,
    Wm2,
    Perc,
    M,
    Mm,
    Kmh,
    Kw,
    EurMwh,
}

impl Unit {
    /// Suffix appended to the source field name to form a column name
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::DegC   => "degc",
            Unit::Wm2    => "wm2",
            Unit::Perc   => "perc",
            Unit::M      => "m",
            Unit::Mm     => "mm",
            Unit::Kmh    => "kmh",
            Unit::Kw     => "kw",
            Unit::EurMwh => "eurmwh",
        }
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for Unit {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Unit::DegC   => write!(f, "°C"),
            Unit::Wm2    => write!(f, "W/m²"),
            Unit::Perc   => write!(f, "%"),
            Unit::M      => write!(f, "m"),
            Unit::Mm     => write!(f, "mm"),
            Unit::Kmh    => write!(f, "km/h"),
            Unit::Kw     => write!(f, "kW"),
            Unit::EurMwh => write!(f, "EUR/MWh"),
        }
    }
}

/// A statically declared series attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub source: &'static str,
    pub unit: Unit,
}

impl Attribute {
    pub const fn new(source: &'static str, unit: Unit) -> Attribute {
        Attribute { source, unit }
    }

    /// Output and column name, e.g. `temperature_2m_degc`
    pub fn name(&self) -> String {
        format!("{}_{}", self.source, self.unit.suffix())
    }
}

/// Canonical hourly weather forecast attributes
pub const FORECAST_ATTRIBUTES: &[Attribute] = &[
    Attribute::new("temperature_2m", Unit::DegC),
    Attribute::new("shortwave_radiation", Unit::Wm2),
    Attribute::new("direct_radiation", Unit::Wm2),
    Attribute::new("diffuse_radiation", Unit::Wm2),
    Attribute::new("direct_normal_irradiance", Unit::Wm2),
    Attribute::new("global_tilted_irradiance", Unit::Wm2),
    Attribute::new("terrestrial_radiation", Unit::Wm2),
    Attribute::new("cloud_cover", Unit::Perc),
    Attribute::new("cloud_cover_low", Unit::Perc),
    Attribute::new("cloud_cover_mid", Unit::Perc),
    Attribute::new("cloud_cover_high", Unit::Perc),
    Attribute::new("visibility", Unit::M),
    Attribute::new("precipitation", Unit::Mm),
    Attribute::new("wind_speed_10m", Unit::Kmh),
];

/// EPEX spot market prices with associated power production figures
pub const MARKET_ATTRIBUTES: &[Attribute] = &[
    Attribute::new("pumped_hydro_cons", Unit::Kw),
    Attribute::new("x_border_trading", Unit::Kw),
    Attribute::new("non_ren_prod", Unit::Kw),
    Attribute::new("ren_prod", Unit::Kw),
    Attribute::new("load", Unit::Kw),
    Attribute::new("daa_price", Unit::EurMwh),
    Attribute::new("idc_av_price", Unit::EurMwh),
    Attribute::new("idc_low_price", Unit::EurMwh),
    Attribute::new("idc_high_price", Unit::EurMwh),
    Attribute::new("idc_id3_price", Unit::EurMwh),
    Attribute::new("idc_id1_price", Unit::EurMwh),
];

/// Returns the index of the attribute with the given output name
///
/// # Arguments
///
/// * 'attributes' - the attribute set to search
/// * 'name' - output name including unit suffix
pub fn position_of(attributes: &[Attribute], name: &str) -> Option<usize> {
    attributes.iter().position(|a| a.name() == name)
}
