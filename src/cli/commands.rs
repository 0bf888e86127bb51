use crate::cli::args::{Cli, Commands, DataArgs};
use crate::error::{ProcessingError, Result};
use crate::forecast::ForecastChain;
use crate::models::ModelSet;
use crate::processors::{IntegrityChecker, Pipeline};
use crate::readers::workbook::is_blank;
use crate::readers::Workbook;
use crate::settings::{InstallationFilter, PipelineSettings, SettingsOverrides};
use crate::utils::progress::ProgressReporter;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    let config_file = cli.config.as_deref();
    let silent = cli.verbose;

    match cli.command {
        Commands::Predict {
            data,
            lat,
            lon,
            base_temp,
            out,
        } => {
            let overrides = SettingsOverrides {
                latitude: lat,
                longitude: lon,
                base_temperature: base_temp,
                output: out,
                ..data_overrides(data)
            };
            let settings = PipelineSettings::load(config_file, &overrides)?;
            let output_path = settings.output_path();
            let forecast = ForecastChain::from_settings(&settings)?;
            let pipeline = Pipeline::new(settings);

            let progress =
                ProgressReporter::new_spinner("Predicting weekly consumption...", silent);
            let report = pipeline.predict(&forecast, Some(&progress)).await?;
            progress.finish_and_clear();

            let json = pipeline.write_report(&report, &output_path)?;
            if report.biomass_factor_weeks == 0 {
                info!("Biomass factor is the default, not estimated from deliveries");
            }
            println!("{}", json);
        }

        Commands::Fit { data } => {
            let settings = PipelineSettings::load(config_file, &data_overrides(data))?;
            let filter = settings.installation_filter();
            let pipeline = Pipeline::new(settings);

            let progress = ProgressReporter::new_spinner("Fitting models...", silent);
            let (_, models) = pipeline.load_and_build(Some(&progress))?;
            progress.finish_and_clear();

            println!("{}", format_models_table(&models, &filter));
        }

        Commands::Profile { data_dir } => {
            let overrides = SettingsOverrides {
                data_dir,
                ..Default::default()
            };
            let pipeline = Pipeline::new(PipelineSettings::load(config_file, &overrides)?);

            let progress = ProgressReporter::new_spinner("Profiling data...", silent);
            let input = pipeline.load_inputs(Some(&progress))?;
            progress.finish_and_clear();

            let checker = IntegrityChecker::new();
            println!("{}", checker.generate_summary(&checker.check(&input)));
        }

        Commands::Inspect { file, rows } => {
            println!("{}", inspect_workbook(&file, rows)?);
        }
    }

    Ok(())
}

/// Diagnostics go to stderr, or to `log_file`, so stdout stays machine-readable
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if verbose {
        let directive: Directive = "biomass_forecast=debug"
            .parse()
            .map_err(|e| ProcessingError::Config(format!("log filter: {}", e)))?;
        filter = filter.add_directive(directive);
    }

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    installed.map_err(|e| ProcessingError::Config(format!("logging: {}", e)))
}

fn data_overrides(data: DataArgs) -> SettingsOverrides {
    SettingsOverrides {
        data_dir: data.data_dir,
        installations: data.inst,
        ..Default::default()
    }
}

/// Per-installation models plus the shared biomass factor
pub fn format_models_table(models: &ModelSet, filter: &InstallationFilter) -> String {
    let mut table = String::new();

    table.push_str(&format!(
        "{:<10} {:>10} {:>10} {:>7} {:>6} {:>8} {:>10}\n",
        "Inst", "Slope", "Intercept", "R²", "N", "Global", "Baseline"
    ));
    for (installation, model) in &models.energy_models {
        if !filter.matches(installation) {
            continue;
        }
        table.push_str(&format!(
            "{:<10} {:>10.4} {:>10.4} {:>7.3} {:>6} {:>8} {:>10.3}\n",
            installation.as_str(),
            model.slope,
            model.intercept,
            model.r2,
            model.n,
            if models.uses_global_fallback(installation.as_str()) {
                "yes"
            } else {
                "no"
            },
            models.baseline(installation.as_str())
        ));
    }

    table.push_str(&format!(
        "\nGlobal model: slope={:.4} intercept={:.4} r2={:.3} n={}\n",
        models.global.slope, models.global.intercept, models.global.r2, models.global.n
    ));
    if models.biomass.is_data_derived() {
        table.push_str(&format!(
            "Biomass factor: {:.4} t/MWh from {} weeks\n",
            models.biomass.factor_ton_per_mwh, models.biomass.n_weeks
        ));
    } else {
        table.push_str(&format!(
            "Biomass factor: {:.4} t/MWh (default, no usable delivery weeks)\n",
            models.biomass.factor_ton_per_mwh
        ));
    }

    table
}

/// Sheet names, sizes and the first `rows` non-blank rows of each sheet
pub fn inspect_workbook(path: &Path, rows: usize) -> Result<String> {
    let mut workbook = Workbook::open(path)?;
    let mut summary = format!("File: {}\n", display_path(workbook.path()));

    for name in workbook.sheet_names() {
        let sheet_rows = workbook.sheet_rows(&name)?;
        let width = sheet_rows.iter().map(|row| row.len()).max().unwrap_or(0);
        summary.push_str(&format!(
            "\nSheet '{}': {} rows x {} columns\n",
            name,
            sheet_rows.len(),
            width
        ));

        for row in sheet_rows.iter().filter(|row| !is_blank(row)).take(rows) {
            let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            summary.push_str(&format!("  {}\n", cells.join(" | ")));
        }
    }

    Ok(summary)
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| PathBuf::from(path))
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiomassConversionModel, EnergyModel, InstallationCode};
    use std::collections::{BTreeMap, BTreeSet};
    use tempfile::TempDir;

    #[test]
    fn test_format_models_table() {
        let global = EnergyModel {
            slope: 1.5,
            intercept: 0.25,
            r2: 0.8,
            n: 40,
        };
        let mut energy_models = BTreeMap::new();
        energy_models.insert(InstallationCode::new("M1"), global);
        energy_models.insert(InstallationCode::new("M2"), global);
        let models = ModelSet {
            energy_models,
            global,
            fallback_installations: BTreeSet::from([InstallationCode::new("M2")]),
            biomass: BiomassConversionModel::fallback(),
            baseline_energy: BTreeMap::new(),
        };

        let table = format_models_table(&models, &InstallationFilter::parse("m2"));

        assert!(table.contains("M2"));
        assert!(!table.contains("M1 "));
        assert!(table.contains("yes"));
        assert!(table.contains("(default, no usable delivery weeks)"));
    }

    #[test]
    fn test_inspect_workbook() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("m218807.csv");
        std::fs::write(&path, "Fecha;Energía\n;\n22 ene 2024 00:00:00 CET;1.234,5\n")?;

        let summary = inspect_workbook(&path, 5)?;

        assert!(summary.contains("Sheet 'm218807': 3 rows x 2 columns"));
        assert!(summary.contains("22 ene 2024 00:00:00 CET | 1.234,5"));
        Ok(())
    }
}
