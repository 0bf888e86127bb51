use crate::error::{PipelineStage, ProcessingError, Result, StageContext};
use crate::forecast::{compute_hdd_next7, ForecastSource};
use crate::models::{
    BiomassDelivery, EnergySeries, HeatingDegreeRecord, ModelSet, WeekForecast,
    WeeklyPredictionReport,
};
use crate::processors::forecaster::predict_installations;
use crate::processors::model_builder::ModelBuilder;
use crate::readers::{DegreeDayReader, DeliveryReader, EnergyReader, Loaded};
use crate::settings::PipelineSettings;
use crate::utils::progress::ProgressReporter;
use chrono::Utc;
use std::path::Path;
use tracing::info;

/// Everything the loaders produced for one run
#[derive(Debug, Clone)]
pub struct InputData {
    pub degree_days: Loaded<Vec<HeatingDegreeRecord>>,
    pub energy: Loaded<EnergySeries>,
    pub deliveries: Loaded<Vec<BiomassDelivery>>,
}

/// Runs load, fit and predict in sequence, each stage fully materialised before the next.
/// Any error leaving a stage is tagged with it.
pub struct Pipeline {
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Load the three input sources
    pub fn load_inputs(&self, progress: Option<&ProgressReporter>) -> Result<InputData> {
        if let Some(p) = progress {
            p.start_stage(PipelineStage::LoadDegreeDays);
        }
        let degree_days = DegreeDayReader::new()
            .read_directory(&self.settings.hdd_dir())
            .in_stage(PipelineStage::LoadDegreeDays)?;

        if let Some(p) = progress {
            p.start_stage(PipelineStage::LoadEnergy);
        }
        let energy = EnergyReader::new()
            .read_directory(&self.settings.energy_dir())
            .in_stage(PipelineStage::LoadEnergy)?;

        if let Some(p) = progress {
            p.start_stage(PipelineStage::LoadDeliveries);
        }
        let deliveries = DeliveryReader::new()
            .read_file(&self.settings.deliveries_file())
            .in_stage(PipelineStage::LoadDeliveries)?;

        info!(
            "Loaded {} heating-degree records, {} installations, {} deliveries",
            degree_days.data.len(),
            energy.data.len(),
            deliveries.data.len()
        );
        Ok(InputData {
            degree_days,
            energy,
            deliveries,
        })
    }

    /// Fit energy models, the biomass factor and baselines from loaded inputs
    pub fn build_models(
        &self,
        input: &InputData,
        progress: Option<&ProgressReporter>,
    ) -> ModelSet {
        if let Some(p) = progress {
            p.start_stage(PipelineStage::BuildModels);
        }
        ModelBuilder::new().build(
            &input.degree_days.data,
            &input.energy.data,
            &input.deliveries.data,
        )
    }

    /// Load everything and fit
    pub fn load_and_build(
        &self,
        progress: Option<&ProgressReporter>,
    ) -> Result<(InputData, ModelSet)> {
        let input = self.load_inputs(progress)?;
        let models = self.build_models(&input, progress);
        Ok((input, models))
    }

    /// Next week's heating degree-days at the configured location
    pub async fn fetch_forecast(
        &self,
        source: &dyn ForecastSource,
        progress: Option<&ProgressReporter>,
    ) -> Result<WeekForecast> {
        if let Some(p) = progress {
            p.start_stage(PipelineStage::FetchForecast);
        }
        compute_hdd_next7(
            source,
            self.settings.latitude,
            self.settings.longitude,
            self.settings.base_temperature,
        )
        .await
        .in_stage(PipelineStage::FetchForecast)
    }

    /// Assemble the weekly report from fitted models and a forecast
    pub fn report(&self, models: &ModelSet, forecast: WeekForecast) -> WeeklyPredictionReport {
        WeeklyPredictionReport {
            generated_at: Utc::now(),
            latitude: self.settings.latitude,
            longitude: self.settings.longitude,
            hdd_next7: forecast,
            biomass_factor_ton_per_mwh: models.biomass.factor_ton_per_mwh,
            biomass_factor_weeks: models.biomass.n_weeks,
            results: predict_installations(
                models,
                &forecast,
                &self.settings.installation_filter(),
            ),
        }
    }

    /// Full run: load, fit, fetch the forecast and predict
    pub async fn predict(
        &self,
        source: &dyn ForecastSource,
        progress: Option<&ProgressReporter>,
    ) -> Result<WeeklyPredictionReport> {
        let (_, models) = self.load_and_build(progress)?;
        let forecast = self.fetch_forecast(source, progress).await?;
        Ok(self.report(&models, forecast))
    }

    /// Write the report as pretty JSON, creating parent directories. Returns the JSON text.
    pub fn write_report(&self, report: &WeeklyPredictionReport, path: &Path) -> Result<String> {
        write_json(report, path).in_stage(PipelineStage::WriteReport)
    }
}

fn write_json(report: &WeeklyPredictionReport, path: &Path) -> Result<String> {
    let json = report.to_json_pretty()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &json).map_err(|e| {
        ProcessingError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    info!("Wrote prediction report to {}", path.display());
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::StaticForecast;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn write_inputs(root: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(root.join("hdd-anual"))?;
        std::fs::create_dir_all(root.join("produccion-energetica"))?;

        let mut hdd = String::from("fecha;hdd\n");
        let mut energy = String::from("Fecha;Energía\n");
        let mut total = 1000.0;
        for day in 1..=14u32 {
            let degree = (day % 7) as f64 + 1.0;
            hdd.push_str(&format!("2024-01-{:02};{}\n", day, degree));
            energy.push_str(&format!("{} ene 2024 00:00:00 CET;{}\n", day, total));
            total += 2.0 * degree;
            energy.push_str(&format!("{} ene 2024 23:00:00 CET;{}\n", day, total));
        }
        std::fs::write(root.join("hdd-anual/hdd.csv"), hdd)?;
        std::fs::write(root.join("produccion-energetica/m100.csv"), energy)?;
        std::fs::write(
            root.join("consumo-biomasa.csv"),
            "Instalación;Fecha;Cantidad\nM100;2024-01-03;12,6\n",
        )?;
        Ok(())
    }

    fn settings(root: &Path) -> PipelineSettings {
        PipelineSettings {
            deliveries_file: Some(root.join("consumo-biomasa.csv")),
            ..PipelineSettings::from_data_dir(root)
        }
    }

    #[tokio::test]
    async fn test_predict_end_to_end() -> Result<()> {
        let dir = TempDir::new()?;
        write_inputs(dir.path())?;
        let pipeline = Pipeline::new(settings(dir.path()));

        let forecast = StaticForecast::from_means(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            &[15.0, 14.0, 13.0, 12.0, 11.0, 10.0, 9.0],
        );
        let report = pipeline.predict(&forecast, None).await?;

        assert_eq!(report.hdd_next7.values(), &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].installation.as_str(), "M100");
        assert_eq!(report.results[0].weekly_energy_mwh, 84.0);
        assert_eq!(report.results[0].model_r2, 1.0);
        Ok(())
    }

    #[test]
    fn test_missing_energy_dir_names_stage() -> Result<()> {
        let dir = TempDir::new()?;
        write_inputs(dir.path())?;
        std::fs::remove_dir_all(dir.path().join("produccion-energetica"))?;

        let err = Pipeline::new(settings(dir.path()))
            .load_inputs(None)
            .unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::LoadEnergy));
        Ok(())
    }

    #[test]
    fn test_write_report_creates_parent_dirs() -> Result<()> {
        let dir = TempDir::new()?;
        write_inputs(dir.path())?;
        let pipeline = Pipeline::new(settings(dir.path()));
        let (_, models) = pipeline.load_and_build(None)?;

        let report = pipeline.report(&models, WeekForecast::new([1.0; 7]));
        let path = dir.path().join("out/nested/report.json");
        let json = pipeline.write_report(&report, &path)?;

        assert_eq!(std::fs::read_to_string(&path)?, json);
        assert!(json.contains("\"biomass_factor_ton_per_mwh\""));
        Ok(())
    }
}
