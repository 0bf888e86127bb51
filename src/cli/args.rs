use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "biomass-forecast")]
#[command(about = "Weekly biomass consumption forecaster for heating installations")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "TOML settings file")]
    pub config: Option<PathBuf>,
}

/// Input selection shared by the model commands
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    #[arg(
        short,
        long,
        help = "Directory with hdd-anual/, produccion-energetica/ and consumo-biomasa.xlsx [default: data]"
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Installation codes separated by commas, or 'all' [default: all]"
    )]
    pub inst: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit the models, fetch the 7-day forecast and write the weekly prediction
    Predict {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, allow_hyphen_values = true, help = "Latitude [default: 40.9701039]")]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true, help = "Longitude [default: -5.6635397]")]
        lon: Option<f64>,

        #[arg(long, allow_hyphen_values = true, help = "Base temperature in °C [default: 18]")]
        base_temp: Option<f64>,

        #[arg(
            short,
            long,
            help = "Output JSON file path [default: output/prediccion-semanal-{YYMMDD}.json]"
        )]
        out: Option<PathBuf>,
    },

    /// Fit the models and print them, without fetching a forecast
    Fit {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Load every source and print a data profile
    Profile {
        #[arg(short, long, help = "Data directory [default: data]")]
        data_dir: Option<PathBuf>,
    },

    /// Preview the sheets of one spreadsheet
    Inspect {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "5")]
        rows: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_predict() {
        let cli = Cli::parse_from([
            "biomass-forecast",
            "--verbose",
            "predict",
            "--inst",
            "M1,M2",
            "--lon",
            "-5.66",
            "--out",
            "out.json",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Predict { data, lon, out, .. } => {
                assert_eq!(data.inst.as_deref(), Some("M1,M2"));
                assert_eq!(lon, Some(-5.66));
                assert_eq!(out, Some(PathBuf::from("out.json")));
            }
            _ => panic!("expected predict"),
        }
    }
}
