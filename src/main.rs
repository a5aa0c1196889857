mod aggregation;
mod cli;
mod config;
mod errors;
mod geography;
mod jobs;
mod logging;
mod manager_db;
mod manager_energy_charts;
mod manager_open_meteo;
mod models;

use std::env;
use std::process::exit;
use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::Parser;
use log::{error, info};
use crate::aggregation::SeriesAggregator;
use crate::cli::{Cli, Commands};
use crate::config::load_config;
use crate::geography::load_regions;
use crate::jobs::aggregate_forecasts::aggregate_forecasts;
use crate::jobs::download_forecasts::download_forecasts;
use crate::jobs::download_market::download_market;
use crate::jobs::live::live_forecast;
use crate::logging::setup_logger;
use crate::manager_db::{open_connection, TimeSeriesStore};
use crate::manager_energy_charts::EnergyCharts;
use crate::manager_open_meteo::OpenMeteo;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = env::var("CONFIG_PATH").unwrap_or("config/config.toml".to_string());
    let config = load_config(&config_path)?;

    setup_logger(&config.general.log_path, config.general.log_level, config.general.log_to_stdout)?;
    info!("weathergrid version: {}", env!("CARGO_PKG_VERSION"));

    let regions = load_regions(&config.files.regions_file)?;
    let aggregator = SeriesAggregator::new(config.aggregation.gap_policy);
    let today = Utc::now().date_naive();

    match cli.command {
        Commands::DownloadMarket(args) => {
            let mut store = TimeSeriesStore::new(open_connection(&config.files.db_path)?);
            let source = EnergyCharts::new(&config.energy_charts);
            let year = args.year.unwrap_or(today.year());
            download_market(&mut store, &source, year, args.reset, today)?;
        },
        Commands::DownloadForecasts(args) => {
            let mut store = TimeSeriesStore::new(open_connection(&config.files.db_path)?);
            let source = OpenMeteo::new(&config.open_meteo);
            let year = args.year.unwrap_or(today.year());
            download_forecasts(
                &mut store, &source, &regions, config.aggregation.search_radius, year, args.reset, today)?;
        },
        Commands::Aggregate(args) => {
            let mut store = TimeSeriesStore::new(open_connection(&config.files.db_path)?);
            aggregate_forecasts(
                &mut store, &aggregator, &regions,
                config.aggregation.first_year, config.aggregation.search_radius, args.reset)?;
        },
        Commands::Live => {
            let source = OpenMeteo::new(&config.open_meteo);
            live_forecast(&source, &aggregator, &regions)?;
        },
    }

    Ok(())
}
