use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One heating-degree-day value for a calendar day, as read from a weather export
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatingDegreeRecord {
    pub date: NaiveDate,
    pub value: f64,
}

impl HeatingDegreeRecord {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Heating-degree-days for a daily mean temperature: `max(0, base - mean)`
pub fn hdd_from_tmean(mean_temperature: f64, base_temperature: f64) -> f64 {
    (base_temperature - mean_temperature).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hdd_from_tmean() {
        assert_eq!(hdd_from_tmean(10.0, 18.0), 8.0);
        assert_eq!(hdd_from_tmean(18.0, 18.0), 0.0);
        assert_eq!(hdd_from_tmean(25.5, 18.0), 0.0);
        assert_eq!(hdd_from_tmean(-2.5, 15.5), 18.0);
    }
}
