use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "weathergrid", version, about = "Weather forecast and spot market data collector")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download weekly EPEX spot market data
    DownloadMarket(DownloadArgs),
    /// Download historical hourly forecasts for all regions
    DownloadForecasts(DownloadArgs),
    /// Merge the stored regional forecasts into one country wide forecast
    Aggregate(ResetArgs),
    /// Fetch, merge and log the current forecast
    Live,
}

#[derive(Args)]
pub struct DownloadArgs {
    /// Year to download, defaults to the current year
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long, default_value_t = false)]
    pub reset: bool,
}

#[derive(Args)]
pub struct ResetArgs {
    #[arg(long, default_value_t = false)]
    pub reset: bool,
}
