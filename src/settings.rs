use crate::error::Result;
use crate::models::InstallationCode;
use crate::utils::constants::{
    DEFAULT_BASE_TEMPERATURE, DEFAULT_DATA_DIR, DEFAULT_FORECAST_TIMEOUT_SECS, DEFAULT_LATITUDE,
    DEFAULT_LONGITUDE, DELIVERIES_FILE, ENERGY_DIR, HDD_DIR,
};
use crate::utils::filename::generate_default_report_filename;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use validator::Validate;

const ENV_PREFIX: &str = "BIOMASS";
const AEMET_KEY_VAR: &str = "AEMET_API_KEY";

/// Resolved pipeline configuration.
///
/// Paths left unset fall back to their conventional location under `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineSettings {
    pub data_dir: PathBuf,
    pub hdd_dir: Option<PathBuf>,
    pub energy_dir: Option<PathBuf>,
    pub deliveries_file: Option<PathBuf>,
    pub output: Option<PathBuf>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[validate(range(min = -30.0, max = 40.0))]
    pub base_temperature: f64,

    #[validate(range(min = 1, max = 300))]
    pub forecast_timeout_secs: u64,

    /// `all` or a comma separated list of installation codes
    pub installations: String,

    #[serde(skip_serializing)]
    pub aemet_api_key: Option<String>,
}

/// Values given on the command line, applied over every other layer
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub data_dir: Option<PathBuf>,
    pub installations: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub base_temperature: Option<f64>,
    pub output: Option<PathBuf>,
}

impl PipelineSettings {
    /// Layer defaults, the optional config file, `BIOMASS_*` environment variables and
    /// command-line overrides, then validate the result
    pub fn load(config_file: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("latitude", DEFAULT_LATITUDE)?
            .set_default("longitude", DEFAULT_LONGITUDE)?
            .set_default("base_temperature", DEFAULT_BASE_TEMPERATURE)?
            .set_default("forecast_timeout_secs", DEFAULT_FORECAST_TIMEOUT_SECS)?
            .set_default("installations", "all")?;

        if let Some(path) = config_file {
            debug!("Loading settings from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: PipelineSettings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("aemet_api_key", std::env::var(AEMET_KEY_VAR).ok())?
            .set_override_option("data_dir", overrides.data_dir.as_deref().map(path_value))?
            .set_override_option("installations", overrides.installations.clone())?
            .set_override_option("latitude", overrides.latitude)?
            .set_override_option("longitude", overrides.longitude)?
            .set_override_option("base_temperature", overrides.base_temperature)?
            .set_override_option("output", overrides.output.as_deref().map(path_value))?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Built-in defaults rooted at `data_dir`, without reading files or the environment
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn hdd_dir(&self) -> PathBuf {
        self.hdd_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(HDD_DIR))
    }

    pub fn energy_dir(&self) -> PathBuf {
        self.energy_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(ENERGY_DIR))
    }

    pub fn deliveries_file(&self) -> PathBuf {
        self.deliveries_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DELIVERIES_FILE))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(generate_default_report_filename)
    }

    pub fn forecast_timeout(&self) -> Duration {
        Duration::from_secs(self.forecast_timeout_secs)
    }

    pub fn installation_filter(&self) -> InstallationFilter {
        InstallationFilter::parse(&self.installations)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            hdd_dir: None,
            energy_dir: None,
            deliveries_file: None,
            output: None,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            base_temperature: DEFAULT_BASE_TEMPERATURE,
            forecast_timeout_secs: DEFAULT_FORECAST_TIMEOUT_SECS,
            installations: "all".to_string(),
            aemet_api_key: None,
        }
    }
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Which installations to predict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationFilter {
    All,
    Only(BTreeSet<InstallationCode>),
}

impl InstallationFilter {
    /// `all` (any case) or a comma list; codes are trimmed and upper-cased
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Self::All;
        }

        Self::Only(
            raw.split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(|code| InstallationCode::new(code.to_uppercase()))
                .collect(),
        )
    }

    pub fn matches(&self, installation: &InstallationCode) -> bool {
        match self {
            Self::All => true,
            Self::Only(codes) => codes.contains(installation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths_under_data_dir() {
        let settings = PipelineSettings::from_data_dir("/srv/biomasa");

        assert_eq!(settings.hdd_dir(), PathBuf::from("/srv/biomasa/hdd-anual"));
        assert_eq!(
            settings.energy_dir(),
            PathBuf::from("/srv/biomasa/produccion-energetica")
        );
        assert_eq!(
            settings.deliveries_file(),
            PathBuf::from("/srv/biomasa/consumo-biomasa.xlsx")
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_layers_file_and_overrides() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("biomass.toml");
        std::fs::write(
            &path,
            "data_dir = \"/srv/datos\"\nbase_temperature = 16.5\nenergy_dir = \"/mnt/contadores\"\n",
        )?;

        let overrides = SettingsOverrides {
            base_temperature: Some(15.0),
            installations: Some("m1, M2".to_string()),
            ..Default::default()
        };
        let settings = PipelineSettings::load(Some(&path), &overrides)?;

        assert_eq!(settings.data_dir, PathBuf::from("/srv/datos"));
        assert_eq!(settings.energy_dir(), PathBuf::from("/mnt/contadores"));
        assert_eq!(settings.hdd_dir(), PathBuf::from("/srv/datos/hdd-anual"));
        assert_eq!(settings.base_temperature, 15.0);
        assert_eq!(
            settings.installation_filter(),
            InstallationFilter::Only(
                [InstallationCode::new("M1"), InstallationCode::new("M2")].into()
            )
        );
        Ok(())
    }

    #[test]
    fn test_load_rejects_out_of_range_latitude() {
        let overrides = SettingsOverrides {
            latitude: Some(123.0),
            ..Default::default()
        };
        assert!(PipelineSettings::load(None, &overrides).is_err());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let result = PipelineSettings::load(
            Some(Path::new("/nonexistent/biomass.toml")),
            &SettingsOverrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_installation_filter() {
        assert_eq!(InstallationFilter::parse("ALL"), InstallationFilter::All);
        assert_eq!(InstallationFilter::parse("  "), InstallationFilter::All);

        let filter = InstallationFilter::parse(" m218807 ,,M218820");
        assert!(filter.matches(&InstallationCode::new("M218807")));
        assert!(filter.matches(&InstallationCode::new("M218820")));
        assert!(!filter.matches(&InstallationCode::new("M1")));
    }
}
