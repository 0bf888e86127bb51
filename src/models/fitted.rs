use crate::models::InstallationCode;
use crate::utils::constants::FALLBACK_BIOMASS_FACTOR;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Linear daily model `energy = slope * hdd + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyModel {
    pub slope: f64,
    pub intercept: f64,
    pub r2: f64,
    pub n: usize,
}

impl EnergyModel {
    /// Model that predicts nothing, returned when there are too few points to fit
    pub fn zero(n: usize) -> Self {
        Self {
            slope: 0.0,
            intercept: 0.0,
            r2: 0.0,
            n,
        }
    }

    /// Predicted daily energy for a heating-degree value, floored at zero
    pub fn predict_day(&self, hdd: f64) -> f64 {
        (self.slope * hdd + self.intercept).max(0.0)
    }
}

/// Tonnes of biomass per MWh, a single factor shared by all installations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiomassConversionModel {
    pub factor_ton_per_mwh: f64,
    pub n_weeks: usize,
}

impl BiomassConversionModel {
    pub fn fallback() -> Self {
        Self {
            factor_ton_per_mwh: FALLBACK_BIOMASS_FACTOR,
            n_weeks: 0,
        }
    }

    /// False when the factor is the fixed default rather than estimated from data
    pub fn is_data_derived(&self) -> bool {
        self.n_weeks > 0
    }
}

/// Everything a model-build run produces
#[derive(Debug, Clone)]
pub struct ModelSet {
    /// One model per installation with energy data; fallback installations hold a copy of `global`
    pub energy_models: BTreeMap<InstallationCode, EnergyModel>,
    pub global: EnergyModel,
    pub fallback_installations: BTreeSet<InstallationCode>,
    pub biomass: BiomassConversionModel,
    pub baseline_energy: BTreeMap<InstallationCode, f64>,
}

impl ModelSet {
    pub fn uses_global_fallback(&self, installation: &str) -> bool {
        self.fallback_installations.contains(installation)
    }

    pub fn baseline(&self, installation: &str) -> f64 {
        self.baseline_energy.get(installation).copied().unwrap_or(0.0)
    }
}
