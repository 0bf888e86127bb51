//! Daily mean temperature forecasts and their conversion to next-week heating degree-days.

mod aemet;
mod open_meteo;

pub use aemet::AemetSource;
pub use open_meteo::{parse_open_meteo_daily, OpenMeteoSource};

use crate::error::{ProcessingError, Result};
use crate::models::{hdd_from_tmean, WeekForecast};
use crate::settings::PipelineSettings;
use crate::utils::constants::FORECAST_DAYS;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub tmean: f64,
}

/// Provider of daily mean temperature forecasts
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Forecast days starting today, or `None` when this source cannot serve the location
    async fn daily_mean_temperatures(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Vec<ForecastDay>>>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Tries the primary source, if any, then the fallback. Errors are not retried.
pub struct ForecastChain {
    primary: Option<Box<dyn ForecastSource>>,
    fallback: Box<dyn ForecastSource>,
}

impl ForecastChain {
    pub fn new(
        primary: Option<Box<dyn ForecastSource>>,
        fallback: Box<dyn ForecastSource>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// AEMET first when an API key is configured, Open-Meteo otherwise
    pub fn from_settings(settings: &PipelineSettings) -> Result<Self> {
        let primary = settings
            .aemet_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| Box::new(AemetSource::new(key)) as Box<dyn ForecastSource>);
        let fallback = Box::new(OpenMeteoSource::new(settings.forecast_timeout())?);

        Ok(Self::new(primary, fallback))
    }
}

#[async_trait]
impl ForecastSource for ForecastChain {
    async fn daily_mean_temperatures(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Vec<ForecastDay>>> {
        if let Some(primary) = &self.primary {
            match primary.daily_mean_temperatures(latitude, longitude).await? {
                Some(days) if !days.is_empty() => {
                    info!("Forecast from {}", primary.name());
                    return Ok(Some(days));
                }
                _ => debug!("{} declined, trying {}", primary.name(), self.fallback.name()),
            }
        }

        let days = self
            .fallback
            .daily_mean_temperatures(latitude, longitude)
            .await?;
        if days.is_some() {
            info!("Forecast from {}", self.fallback.name());
        }
        Ok(days)
    }

    fn name(&self) -> &str {
        "forecast chain"
    }
}

/// Fixed forecast, for offline runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticForecast {
    days: Vec<ForecastDay>,
}

impl StaticForecast {
    /// Consecutive days starting at `start`
    pub fn from_means(start: NaiveDate, means: &[f64]) -> Self {
        let days = means
            .iter()
            .enumerate()
            .map(|(offset, tmean)| ForecastDay {
                date: start + Duration::days(offset as i64),
                tmean: *tmean,
            })
            .collect();
        Self { days }
    }
}

#[async_trait]
impl ForecastSource for StaticForecast {
    async fn daily_mean_temperatures(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<Vec<ForecastDay>>> {
        Ok(Some(self.days.clone()))
    }

    fn name(&self) -> &str {
        "static forecast"
    }
}

/// Heating degree-days for the next seven forecast days
pub async fn compute_hdd_next7(
    source: &dyn ForecastSource,
    latitude: f64,
    longitude: f64,
    base_temperature: f64,
) -> Result<WeekForecast> {
    let days = source
        .daily_mean_temperatures(latitude, longitude)
        .await?
        .ok_or_else(|| {
            ProcessingError::ForecastFetch(format!(
                "no forecast available for ({}, {})",
                latitude, longitude
            ))
        })?;

    let hdd: Vec<f64> = days
        .iter()
        .take(FORECAST_DAYS)
        .map(|day| hdd_from_tmean(day.tmean, base_temperature))
        .collect();
    WeekForecast::from_slice(&hdd)
}
