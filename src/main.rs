use biomass_forecast::cli::{run, Cli};
use biomass_forecast::error::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
