use crate::models::{
    BiomassConversionModel, BiomassDelivery, DailyEnergyIncrement, EnergyModel, EnergySeries,
    HeatingDegreeRecord, InstallationCode, ModelSet,
};
use crate::processors::series_transformer::{degree_day_map, group_by_week, to_daily_increments};
use crate::utils::constants::{
    BASELINE_PERCENTILE, MAX_PLAUSIBLE_RATIO, MIN_FIT_POINTS, MIN_INSTALLATION_PAIRS,
    MIN_PLAUSIBLE_RATIO,
};
use crate::utils::stats::{median, percentile};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Response variance this small relative to `n * mean_y²` is rounding noise on a constant response
const RELATIVE_VARIANCE_TOLERANCE: f64 = 1e-20;

/// Ordinary least squares of `y` on `x`.
///
/// Fewer than 5 points gives the zero model. r² is 0 when `y` is constant.
pub fn fit_linear(x: &[f64], y: &[f64]) -> EnergyModel {
    let n = x.len().min(y.len());
    if n < MIN_FIT_POINTS {
        return EnergyModel::zero(n);
    }
    let (x, y) = (&x[..n], &y[..n]);

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        sxx += (xi - mean_x).powi(2);
        sxy += (xi - mean_x) * (yi - mean_y);
    }

    // All x equal: the best constant predictor
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        ss_res += (yi - (slope * xi + intercept)).powi(2);
        ss_tot += (yi - mean_y).powi(2);
    }
    let r2 = if ss_tot <= RELATIVE_VARIANCE_TOLERANCE * n as f64 * mean_y.powi(2) {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };

    EnergyModel {
        slope,
        intercept,
        r2,
        n,
    }
}

/// Pair each day's increment with that day's heating-degree value; days without one are dropped
pub fn align_with_degree_days(
    daily: &[DailyEnergyIncrement],
    degree_days: &BTreeMap<NaiveDate, f64>,
) -> (Vec<f64>, Vec<f64>) {
    daily
        .iter()
        .filter_map(|day| degree_days.get(&day.day).map(|hdd| (*hdd, day.increment)))
        .unzip()
}

/// Fits per-installation energy models, the global fallback model and the biomass factor
pub struct ModelBuilder {
    min_installation_pairs: usize,
    ratio_band: (f64, f64),
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            min_installation_pairs: MIN_INSTALLATION_PAIRS,
            ratio_band: (MIN_PLAUSIBLE_RATIO, MAX_PLAUSIBLE_RATIO),
        }
    }

    /// Build every model from freshly loaded inputs
    pub fn build(
        &self,
        degree_days: &[HeatingDegreeRecord],
        energy: &EnergySeries,
        deliveries: &[BiomassDelivery],
    ) -> ModelSet {
        let degree_day_map = degree_day_map(degree_days);
        let daily_by_installation: BTreeMap<InstallationCode, Vec<DailyEnergyIncrement>> = energy
            .iter()
            .map(|(installation, readings)| (installation.clone(), to_daily_increments(readings)))
            .collect();

        let (energy_models, global, fallback_installations) =
            self.fit_energy_models(&daily_by_installation, &degree_day_map);
        let biomass = self.estimate_biomass_factor(&daily_by_installation, deliveries);
        let baseline_energy = Self::baseline_energy(&daily_by_installation);

        ModelSet {
            energy_models,
            global,
            fallback_installations,
            biomass,
            baseline_energy,
        }
    }

    /// Per-installation models, with the global model standing in for installations
    /// that have fewer than the minimum number of aligned days.
    ///
    /// The global model is pooled from the installations that did get their own model.
    pub fn fit_energy_models(
        &self,
        daily_by_installation: &BTreeMap<InstallationCode, Vec<DailyEnergyIncrement>>,
        degree_days: &BTreeMap<NaiveDate, f64>,
    ) -> (
        BTreeMap<InstallationCode, EnergyModel>,
        EnergyModel,
        BTreeSet<InstallationCode>,
    ) {
        let mut models = BTreeMap::new();
        let mut fallback = BTreeSet::new();
        let mut pooled_x = Vec::new();
        let mut pooled_y = Vec::new();

        for (installation, daily) in daily_by_installation {
            let (x, y) = align_with_degree_days(daily, degree_days);

            if x.len() >= self.min_installation_pairs {
                let model = fit_linear(&x, &y);
                debug!(
                    "{}: slope={:.4} intercept={:.4} r2={:.3} n={}",
                    installation, model.slope, model.intercept, model.r2, model.n
                );
                models.insert(installation.clone(), model);
                pooled_x.extend(x);
                pooled_y.extend(y);
            } else {
                debug!(
                    "{}: only {} days aligned with degree-days, using global model",
                    installation,
                    x.len()
                );
                fallback.insert(installation.clone());
            }
        }

        let global = fit_linear(&pooled_x, &pooled_y);
        for installation in &fallback {
            models.insert(installation.clone(), global);
        }

        info!(
            "Fitted {} installation models, {} on the global model (n={}, r2={:.3})",
            models.len() - fallback.len(),
            fallback.len(),
            global.n,
            global.r2
        );
        (models, global, fallback)
    }

    /// Median of plausible weekly delivery/energy ratios across all installations
    pub fn estimate_biomass_factor(
        &self,
        daily_by_installation: &BTreeMap<InstallationCode, Vec<DailyEnergyIncrement>>,
        deliveries: &[BiomassDelivery],
    ) -> BiomassConversionModel {
        let mut deliveries_by_installation: BTreeMap<&str, Vec<(NaiveDateTime, f64)>> =
            BTreeMap::new();
        for delivery in deliveries {
            deliveries_by_installation
                .entry(delivery.installation.as_str())
                .or_default()
                .push((delivery.timestamp, delivery.quantity));
        }
        let delivered_weekly: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = deliveries_by_installation
            .into_iter()
            .map(|(installation, series)| (installation, group_by_week(series)))
            .collect();

        let (min_ratio, max_ratio) = self.ratio_band;
        let mut ratios = Vec::new();

        for (installation, daily) in daily_by_installation {
            let Some(delivered) = delivered_weekly.get(installation.as_str()) else {
                continue;
            };
            let energy_weekly = group_by_week(daily.iter().map(|d| (d.day, d.increment)));

            for (week, energy) in energy_weekly {
                if energy <= 0.0 {
                    continue;
                }
                let biomass = delivered.get(&week).copied().unwrap_or(0.0);
                if biomass <= 0.0 {
                    continue;
                }
                let ratio = biomass / energy;
                if (min_ratio..=max_ratio).contains(&ratio) {
                    ratios.push(ratio);
                }
            }
        }

        match median(&ratios) {
            Some(factor) => {
                info!(
                    "Biomass factor {:.4} t/MWh from {} weeks",
                    factor,
                    ratios.len()
                );
                BiomassConversionModel {
                    factor_ton_per_mwh: factor,
                    n_weeks: ratios.len(),
                }
            }
            None => {
                let fallback = BiomassConversionModel::fallback();
                warn!(
                    "No plausible delivery/energy weeks, using default biomass factor {} t/MWh",
                    fallback.factor_ton_per_mwh
                );
                fallback
            }
        }
    }

    /// 5th percentile of strictly positive daily increments per installation
    pub fn baseline_energy(
        daily_by_installation: &BTreeMap<InstallationCode, Vec<DailyEnergyIncrement>>,
    ) -> BTreeMap<InstallationCode, f64> {
        daily_by_installation
            .iter()
            .map(|(installation, daily)| {
                let positive: Vec<f64> = daily
                    .iter()
                    .map(|d| d.increment)
                    .filter(|increment| *increment > 0.0)
                    .collect();
                let baseline = percentile(&positive, BASELINE_PERCENTILE).unwrap_or(0.0);
                (installation.clone(), baseline)
            })
            .collect()
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
