/// Directory and file names under the data directory
pub const HDD_DIR: &str = "hdd-anual";
pub const ENERGY_DIR: &str = "produccion-energetica";
pub const DELIVERIES_FILE: &str = "consumo-biomasa.xlsx";
pub const DELIVERIES_SHEET: &str = "Descargas";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Extensions opened as spreadsheets
pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "ods", "csv"];

/// Model fitting thresholds
pub const MIN_INSTALLATION_PAIRS: usize = 10;
pub const MIN_FIT_POINTS: usize = 5;

/// Biomass conversion factor (tonnes per MWh)
pub const MIN_PLAUSIBLE_RATIO: f64 = 0.05;
pub const MAX_PLAUSIBLE_RATIO: f64 = 0.8;
pub const FALLBACK_BIOMASS_FACTOR: f64 = 0.2; // ~1 t per 5 MWh

/// Percentile of positive daily increments used as baseline energy
pub const BASELINE_PERCENTILE: f64 = 5.0;

/// Forecast defaults
pub const FORECAST_DAYS: usize = 7;
pub const DEFAULT_BASE_TEMPERATURE: f64 = 18.0;
pub const DEFAULT_LATITUDE: f64 = 40.9701039;
pub const DEFAULT_LONGITUDE: f64 = -5.6635397;
pub const DEFAULT_FORECAST_TIMEOUT_SECS: u64 = 20;

/// Tukey fence multiplier for outlier days
pub const IQR_FACTOR: f64 = 1.5;
pub const MIN_DAYS_FOR_OUTLIERS: usize = 4;
