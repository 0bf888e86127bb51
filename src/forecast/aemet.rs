use crate::error::Result;
use crate::forecast::{ForecastDay, ForecastSource};
use async_trait::async_trait;
use tracing::debug;

/// AEMET OpenData source.
///
/// AEMET publishes daily forecasts per municipality, not per coordinate, so a
/// latitude/longitude request is always declined and the chain moves on.
pub struct AemetSource {
    api_key: String,
}

impl AemetSource {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
        }
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl ForecastSource for AemetSource {
    async fn daily_mean_temperatures(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Vec<ForecastDay>>> {
        debug!(
            "AEMET key present ({}), but no municipality for ({}, {}); deferring",
            self.has_key(),
            latitude,
            longitude
        );
        Ok(None)
    }

    fn name(&self) -> &str {
        "AEMET"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_aemet_declines_coordinates() -> Result<()> {
        let source = AemetSource::new("secret");
        assert!(source.has_key());
        assert_eq!(source.daily_mean_temperatures(40.97, -5.66).await?, None);
        Ok(())
    }
}
