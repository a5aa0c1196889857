pub mod attributes;
pub mod energy_charts;
pub mod forecast;
pub mod geo;
pub mod market;
pub mod open_meteo;
pub mod series_row;
