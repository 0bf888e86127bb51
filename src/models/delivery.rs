use crate::models::InstallationCode;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single biomass unload at an installation (tonnes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomassDelivery {
    pub installation: InstallationCode,
    pub timestamp: NaiveDateTime,
    pub quantity: f64,
}

impl BiomassDelivery {
    pub fn new(installation: InstallationCode, timestamp: NaiveDateTime, quantity: f64) -> Self {
        Self {
            installation,
            timestamp,
            quantity,
        }
    }
}
