use crate::error::{ProcessingError, Result};
use crate::models::InstallationCode;
use crate::utils::constants::FORECAST_DAYS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Heating-degree values for the next seven days
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekForecast([f64; FORECAST_DAYS]);

impl WeekForecast {
    pub fn new(values: [f64; FORECAST_DAYS]) -> Self {
        Self(values)
    }

    /// Take the first seven values; fewer is an error
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let week: [f64; FORECAST_DAYS] = values
            .get(..FORECAST_DAYS)
            .and_then(|head| head.try_into().ok())
            .ok_or_else(|| {
                ProcessingError::ForecastFetch(format!(
                    "expected {} daily values, got {}",
                    FORECAST_DAYS,
                    values.len()
                ))
            })?;
        Ok(Self(week))
    }

    pub fn values(&self) -> &[f64; FORECAST_DAYS] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationPrediction {
    pub installation: InstallationCode,
    pub weekly_energy_mwh: f64,
    pub weekly_biomass_ton: f64,
    pub model_r2: f64,
}

impl InstallationPrediction {
    /// Rounded the way they are published: energy and biomass to 2 decimals, r² to 3
    pub fn new(
        installation: InstallationCode,
        weekly_energy_mwh: f64,
        weekly_biomass_ton: f64,
        model_r2: f64,
    ) -> Self {
        Self {
            installation,
            weekly_energy_mwh: round_to(weekly_energy_mwh, 2),
            weekly_biomass_ton: round_to(weekly_biomass_ton, 2),
            model_r2: round_to(model_r2, 3),
        }
    }
}

/// JSON document written by the `predict` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPredictionReport {
    pub generated_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub hdd_next7: WeekForecast,
    pub biomass_factor_ton_per_mwh: f64,
    pub biomass_factor_weeks: usize,
    pub results: Vec<InstallationPrediction>,
}

impl WeeklyPredictionReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
