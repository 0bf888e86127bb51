use crate::error::{ProcessingError, Result};
use crate::forecast::{ForecastDay, ForecastSource};
use crate::utils::constants::FORECAST_DAYS;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
}

/// Parse the `daily` block of an Open-Meteo forecast response.
///
/// Dates and means are zipped; a missing block gives no days, a null mean is an error.
pub fn parse_open_meteo_daily(body: &str) -> Result<Vec<ForecastDay>> {
    let response: OpenMeteoResponse = serde_json::from_str(body)?;
    let Some(daily) = response.daily else {
        return Ok(Vec::new());
    };

    daily
        .time
        .iter()
        .zip(daily.temperature_2m_mean)
        .map(|(date, tmean)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                ProcessingError::InvalidFormat(format!("forecast date '{}': {}", date, e))
            })?;
            let tmean = tmean.ok_or_else(|| {
                ProcessingError::ForecastFetch(format!("no mean temperature for {}", date))
            })?;
            Ok(ForecastDay { date, tmean })
        })
        .collect()
}

/// Open-Meteo daily forecast client, keyless
pub struct OpenMeteoSource {
    client: Client,
}

impl OpenMeteoSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoSource {
    async fn daily_mean_temperatures(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Vec<ForecastDay>>> {
        debug!("Requesting Open-Meteo forecast for ({}, {})", latitude, longitude);

        let response = self
            .client
            .get(OPEN_METEO_URL)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("daily", "temperature_2m_mean".to_string()),
                ("forecast_days", FORECAST_DAYS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessingError::ForecastFetch(format!(
                "Open-Meteo returned HTTP {}",
                status
            )));
        }

        let body = response.text().await?;
        Ok(Some(parse_open_meteo_daily(&body)?))
    }

    fn name(&self) -> &str {
        "Open-Meteo"
    }
}
