use crate::models::InstallationCode;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cumulative meter reading; the installation is the key of the owning [`EnergySeries`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyReading {
    pub timestamp: NaiveDateTime,
    pub cumulative: f64,
}

impl EnergyReading {
    pub fn new(timestamp: NaiveDateTime, cumulative: f64) -> Self {
        Self {
            timestamp,
            cumulative,
        }
    }
}

/// Energy consumed during one calendar day, never negative
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyEnergyIncrement {
    pub day: NaiveDate,
    pub increment: f64,
}

/// Chronologically sorted readings per installation
pub type EnergySeries = BTreeMap<InstallationCode, Vec<EnergyReading>>;
