use crate::models::{EnergyModel, InstallationPrediction, ModelSet, WeekForecast};
use crate::settings::InstallationFilter;
use tracing::{debug, warn};

/// Energy expected over the forecast week: the sum of the floored daily predictions.
///
/// `baseline` is accepted but does not bound the prediction.
pub fn predict_week_energy(forecast: &WeekForecast, model: &EnergyModel, _baseline: f64) -> f64 {
    forecast
        .values()
        .iter()
        .map(|hdd| model.predict_day(*hdd))
        .sum()
}

pub fn predict_biomass(weekly_energy_mwh: f64, factor_ton_per_mwh: f64) -> f64 {
    weekly_energy_mwh * factor_ton_per_mwh
}

/// Predictions for every modelled installation the filter selects, sorted by code
pub fn predict_installations(
    models: &ModelSet,
    forecast: &WeekForecast,
    filter: &InstallationFilter,
) -> Vec<InstallationPrediction> {
    if let InstallationFilter::Only(codes) = filter {
        for code in codes {
            if !models.energy_models.contains_key(code) {
                warn!("No energy model for installation {}, ignoring", code);
            }
        }
    }

    let factor = models.biomass.factor_ton_per_mwh;
    models
        .energy_models
        .iter()
        .filter(|(installation, _)| filter.matches(installation))
        .map(|(installation, model)| {
            let energy =
                predict_week_energy(forecast, model, models.baseline(installation.as_str()));
            let biomass = predict_biomass(energy, factor);
            debug!(
                "{}: {:.2} MWh, {:.2} t over the week",
                installation, energy, biomass
            );
            InstallationPrediction::new(installation.clone(), energy, biomass, model.r2)
        })
        .collect()
}
