use biomass_forecast::error::{PipelineStage, Result};
use biomass_forecast::forecast::StaticForecast;
use biomass_forecast::models::{InstallationCode, InstallationPrediction};
use biomass_forecast::processors::{IntegrityChecker, Pipeline};
use biomass_forecast::readers::SkipReason;
use biomass_forecast::settings::PipelineSettings;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{ExcelDateTime, Format};
use std::path::Path;
use tempfile::TempDir;

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Two weeks of data for M100 (energy = 2 * hdd every day), three days for M200,
/// and a delivery log giving weekly ratios of 0.2 and 0.3 for M100.
fn write_data_dir(root: &Path) -> std::io::Result<()> {
    let hdd_dir = root.join("hdd-anual");
    let energy_dir = root.join("produccion-energetica");
    std::fs::create_dir_all(&hdd_dir)?;
    std::fs::create_dir_all(&energy_dir)?;

    let mut hdd = String::from("fecha;hdd\n");
    let mut m100 = String::from("Fecha;Energía acumulada\n");
    let mut total = 1000.0;
    for day in 1..=14u32 {
        let degree = (day % 7) as f64 + 1.0;
        hdd.push_str(&format!("2024-01-{:02};{}\n", day, degree));
        m100.push_str(&format!("{} ene 2024 00:00:00 CET;{}\n", day, total));
        total += 2.0 * degree;
        m100.push_str(&format!("{} ene 2024 23:00:00 CET;{}\n", day, total));
    }
    hdd.push_str("sin fecha;4\n");
    std::fs::write(hdd_dir.join("hdd_2024.csv"), hdd)?;
    std::fs::write(energy_dir.join("m100.csv"), m100)?;

    std::fs::write(
        energy_dir.join("M200-contador.csv"),
        "Fecha;Energía acumulada\n\
         1 ene 2024 00:00:00 CET;50\n\
         1 ene 2024 23:00:00 CET;55\n\
         2 ene 2024 23:00:00 CET;61\n\
         3 ene 2024 00:00:00 CET;61\n\
         3 ene 2024 23:00:00 CET;68\n\
         4 ene 2024 12:00:00 CET;n/d\n",
    )?;
    std::fs::write(energy_dir.join("resumen.csv"), "a;b\n1;2\n")?;

    std::fs::write(
        root.join("consumo-biomasa.csv"),
        "Instalación;Fecha;Cantidad (t)\n\
         M100;2024-01-02;5,6\n\
         M100;03/01/2024 10:00:00;5,6\n\
         M100;10 ene 2024 09:00:00;16,8\n\
         M404;2024-01-10;3\n\
         ;2024-01-11;1\n",
    )?;
    Ok(())
}

/// The same M100 data as `write_data_dir`, as native spreadsheets: date cells, numeric
/// cells, a blank header row in the degree-day workbook and `Descargas` as a second sheet.
fn write_xlsx_data_dir(root: &Path) -> TestResult {
    let hdd_dir = root.join("hdd-anual");
    let energy_dir = root.join("produccion-energetica");
    std::fs::create_dir_all(&hdd_dir)?;
    std::fs::create_dir_all(&energy_dir)?;
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut hdd = rust_xlsxwriter::Workbook::new();
    let hdd_sheet = hdd.add_worksheet();
    let mut energy = rust_xlsxwriter::Workbook::new();
    let energy_sheet = energy.add_worksheet();
    energy_sheet.write_string(0, 0, "Fecha")?;
    energy_sheet.write_string(0, 1, "Energía acumulada")?;

    let mut total = 1000.0;
    for day in 1..=14u8 {
        let degree = (day % 7) as f64 + 1.0;
        let row = day as u32;
        let morning = ExcelDateTime::from_ymd(2024, 1, day)?;
        hdd_sheet.write_datetime_with_format(row, 0, &morning, &date_format)?;
        hdd_sheet.write_number(row, 1, degree)?;

        let noon = ExcelDateTime::parse_from_str(&format!("2024-01-{:02} 12:00:00", day))?;
        energy_sheet.write_datetime_with_format(2 * row - 1, 0, &morning, &datetime_format)?;
        energy_sheet.write_number(2 * row - 1, 1, total)?;
        total += 2.0 * degree;
        energy_sheet.write_datetime_with_format(2 * row, 0, &noon, &datetime_format)?;
        energy_sheet.write_number(2 * row, 1, total)?;
    }
    hdd.save(hdd_dir.join("hdd_2024.xlsx"))?;
    energy.save(energy_dir.join("m100.xlsx"))?;

    let mut deliveries = rust_xlsxwriter::Workbook::new();
    deliveries
        .add_worksheet()
        .set_name("Resumen")?
        .write_string(0, 0, "Totales")?;
    let sheet = deliveries.add_worksheet().set_name("Descargas")?;
    sheet.write_string(0, 0, "Instalación")?;
    sheet.write_string(0, 1, "Fecha")?;
    sheet.write_string(0, 2, "Cantidad (t)")?;
    for (row, (day, quantity)) in [(2u8, 5.6), (3, 5.6), (10, 16.8)].into_iter().enumerate() {
        let row = row as u32 + 1;
        sheet.write_string(row, 0, "M100")?;
        let delivered_on = ExcelDateTime::from_ymd(2024, 1, day)?;
        sheet.write_datetime_with_format(row, 1, &delivered_on, &date_format)?;
        sheet.write_number(row, 2, quantity)?;
    }
    deliveries.save(root.join("consumo-biomasa.xlsx"))?;
    Ok(())
}

fn settings(root: &Path) -> PipelineSettings {
    PipelineSettings {
        deliveries_file: Some(root.join("consumo-biomasa.csv")),
        ..PipelineSettings::from_data_dir(root)
    }
}

fn forecast() -> StaticForecast {
    StaticForecast::from_means(
        NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
        &[15.0, 14.0, 13.0, 12.0, 11.0, 10.0, 9.0],
    )
}

#[tokio::test]
async fn test_weekly_prediction_end_to_end() -> Result<()> {
    let dir = TempDir::new()?;
    write_data_dir(dir.path())?;
    let pipeline = Pipeline::new(settings(dir.path()));

    let report = pipeline.predict(&forecast(), None).await?;

    assert_eq!(report.hdd_next7.values(), &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    assert!((report.biomass_factor_ton_per_mwh - 0.25).abs() < 1e-9);
    assert_eq!(report.biomass_factor_weeks, 2);
    assert_eq!(
        report.results,
        vec![
            InstallationPrediction::new(InstallationCode::new("M100"), 84.0, 21.0, 1.0),
            // Too few days for its own model, predicted with the global one
            InstallationPrediction::new(InstallationCode::new("M200"), 84.0, 21.0, 1.0),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_installation_filter_and_report_file() -> Result<()> {
    let dir = TempDir::new()?;
    write_data_dir(dir.path())?;
    let out = dir.path().join("output/prediccion.json");
    let pipeline = Pipeline::new(PipelineSettings {
        installations: " m200 ".to_string(),
        output: Some(out.clone()),
        ..settings(dir.path())
    });

    let report = pipeline.predict(&forecast(), None).await?;
    let json = pipeline.write_report(&report, &pipeline.settings().output_path())?;

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out)?)?;
    assert_eq!(written, serde_json::from_str::<serde_json::Value>(&json)?);

    let mut keys: Vec<&str> = written
        .as_object()
        .map(|object| object.keys().map(String::as_str).collect())
        .unwrap_or_default();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "biomass_factor_ton_per_mwh",
            "biomass_factor_weeks",
            "generated_at",
            "hdd_next7",
            "latitude",
            "longitude",
            "results",
        ]
    );
    assert_eq!(written["results"].as_array().map(Vec::len), Some(1));
    assert_eq!(written["results"][0]["installation"], "M200");
    assert_eq!(written["results"][0]["weekly_biomass_ton"], 21.0);
    Ok(())
}

#[test]
fn test_models_and_read_reports() -> Result<()> {
    let dir = TempDir::new()?;
    write_data_dir(dir.path())?;
    let pipeline = Pipeline::new(settings(dir.path()));

    let (input, models) = pipeline.load_and_build(None)?;

    assert_eq!(input.degree_days.report.rows_accepted, 14);
    assert_eq!(input.degree_days.report.skipped(SkipReason::InvalidTimestamp), 1);
    assert_eq!(input.energy.report.files_read, 2);
    assert_eq!(input.energy.report.files_skipped, 1);
    assert_eq!(input.energy.report.skipped(SkipReason::InvalidValue), 1);
    assert_eq!(
        input.deliveries.report.skipped(SkipReason::MissingInstallation),
        1
    );

    let m100 = models.energy_models["M100"];
    assert!((m100.slope - 2.0).abs() < 1e-9);
    assert!(m100.intercept.abs() < 1e-9);
    assert_eq!(m100.n, 14);
    assert!(models.uses_global_fallback("M200"));
    assert_eq!(models.global.n, 14);
    // M200 daily increments 5, 0, 7
    assert!((models.baseline("M200") - 5.1).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_profile_report() -> Result<()> {
    let dir = TempDir::new()?;
    write_data_dir(dir.path())?;
    let input = Pipeline::new(settings(dir.path())).load_inputs(None)?;

    let checker = IntegrityChecker::new();
    let report = checker.check(&input);

    assert_eq!(report.degree_days.records, 14);
    assert_eq!(report.degree_days.duplicate_dates, 0);
    assert_eq!(report.installation_statistics["M100"].days, 14);
    assert_eq!(report.installation_statistics["M100"].deliveries, 3);
    assert_eq!(report.installation_statistics["M200"].days, 3);
    assert_eq!(report.orphan_deliveries["M404"], 1);

    let summary = checker.generate_summary(&report);
    assert!(summary.contains("M404: 1"));
    Ok(())
}

#[test]
fn test_missing_degree_day_directory_fails_its_stage() -> Result<()> {
    let dir = TempDir::new()?;
    write_data_dir(dir.path())?;
    std::fs::remove_dir_all(dir.path().join("hdd-anual"))?;

    let err = Pipeline::new(settings(dir.path()))
        .load_inputs(None)
        .unwrap_err();

    assert_eq!(err.stage(), Some(PipelineStage::LoadDegreeDays));
    assert!(err.to_string().starts_with("Loading heating-degree-day records failed"));
    Ok(())
}

#[tokio::test]
async fn test_short_forecast_fails_forecast_stage() -> Result<()> {
    let dir = TempDir::new()?;
    write_data_dir(dir.path())?;
    let short =
        StaticForecast::from_means(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(), &[10.0; 4]);

    let err = Pipeline::new(settings(dir.path()))
        .predict(&short, None)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(PipelineStage::FetchForecast));
    Ok(())
}

#[tokio::test]
async fn test_weekly_prediction_from_xlsx_workbooks() -> TestResult {
    let dir = TempDir::new()?;
    write_xlsx_data_dir(dir.path())?;
    let pipeline = Pipeline::new(PipelineSettings::from_data_dir(dir.path()));

    let (input, models) = pipeline.load_and_build(None)?;
    assert_eq!(input.degree_days.data.len(), 14);
    assert_eq!(input.degree_days.report.skipped(SkipReason::Header), 1);
    assert_eq!(input.deliveries.data.len(), 3);
    assert!((models.energy_models["M100"].slope - 2.0).abs() < 1e-9);

    let report = pipeline.predict(&forecast(), None).await?;
    assert!((report.biomass_factor_ton_per_mwh - 0.25).abs() < 1e-9);
    assert_eq!(
        report.results,
        vec![InstallationPrediction::new(
            InstallationCode::new("M100"),
            84.0,
            21.0,
            1.0
        )]
    );
    Ok(())
}
