use crate::models::{EnergyReading, HeatingDegreeRecord, InstallationCode};
use crate::processors::pipeline::InputData;
use crate::processors::series_transformer::daily_spans;
use crate::readers::ReadReport;
use crate::utils::constants::{IQR_FACTOR, MIN_DAYS_FOR_OUTLIERS};
use crate::utils::stats::quartiles;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub degree_days: DegreeDayStatistics,
    pub installation_statistics: BTreeMap<InstallationCode, InstallationStatistics>,
    /// Installations in the delivery log with no energy series
    pub orphan_deliveries: BTreeMap<InstallationCode, usize>,
    pub degree_day_report: ReadReport,
    pub energy_report: ReadReport,
    pub delivery_report: ReadReport,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DegreeDayStatistics {
    pub records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Dates that appear more than once, usually from overlapping files
    pub duplicate_dates: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallationStatistics {
    pub readings: usize,
    pub days: usize,
    pub zero_days: usize,
    /// Days where the counter ended below where it started
    pub floored_days: usize,
    pub outlier_days: usize,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub deliveries: usize,
    pub delivered_ton: f64,
}

pub struct IntegrityChecker {
    iqr_factor: f64,
    min_days_for_outliers: usize,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self {
            iqr_factor: IQR_FACTOR,
            min_days_for_outliers: MIN_DAYS_FOR_OUTLIERS,
        }
    }

    /// Profile loaded inputs
    pub fn check(&self, input: &InputData) -> IntegrityReport {
        let mut installation_statistics: BTreeMap<InstallationCode, InstallationStatistics> =
            input
                .energy
                .data
                .iter()
                .map(|(installation, readings)| {
                    (installation.clone(), self.check_installation(readings))
                })
                .collect();

        let mut orphan_deliveries = BTreeMap::new();
        for delivery in &input.deliveries.data {
            match installation_statistics.get_mut(&delivery.installation) {
                Some(stats) => {
                    stats.deliveries += 1;
                    stats.delivered_ton += delivery.quantity;
                }
                None => *orphan_deliveries
                    .entry(delivery.installation.clone())
                    .or_insert(0) += 1,
            }
        }

        IntegrityReport {
            degree_days: Self::check_degree_days(&input.degree_days.data),
            installation_statistics,
            orphan_deliveries,
            degree_day_report: input.degree_days.report.clone(),
            energy_report: input.energy.report.clone(),
            delivery_report: input.deliveries.report.clone(),
        }
    }

    fn check_degree_days(records: &[HeatingDegreeRecord]) -> DegreeDayStatistics {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for record in records {
            if !seen.insert(record.date) {
                duplicates.insert(record.date);
            }
        }

        DegreeDayStatistics {
            records: records.len(),
            first_date: seen.first().copied(),
            last_date: seen.last().copied(),
            duplicate_dates: duplicates.len(),
        }
    }

    /// Statistics over one installation's sorted readings
    pub fn check_installation(&self, readings: &[EnergyReading]) -> InstallationStatistics {
        let spans = daily_spans(readings);
        let increments: Vec<f64> = spans.iter().map(|span| span.increment()).collect();

        InstallationStatistics {
            readings: readings.len(),
            days: spans.len(),
            zero_days: increments.iter().filter(|v| **v == 0.0).count(),
            floored_days: spans.iter().filter(|span| span.is_floored()).count(),
            outlier_days: self.count_outliers(&increments),
            first_day: spans.first().map(|span| span.day),
            last_day: spans.last().map(|span| span.day),
            deliveries: 0,
            delivered_ton: 0.0,
        }
    }

    /// Positive increments outside the Tukey fences
    fn count_outliers(&self, increments: &[f64]) -> usize {
        let positive: Vec<f64> = increments.iter().copied().filter(|v| *v > 0.0).collect();
        if positive.len() < self.min_days_for_outliers {
            return 0;
        }
        let Some((q1, q3)) = quartiles(&positive) else {
            return 0;
        };
        let iqr = q3 - q1;
        let (low, high) = (q1 - self.iqr_factor * iqr, q3 + self.iqr_factor * iqr);

        positive.iter().filter(|v| **v < low || **v > high).count()
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Data Profile ===\n");
        summary.push_str(&format!(
            "Heating-degree records: {} ({})\n",
            report.degree_days.records,
            report.degree_day_report.summary_line()
        ));
        if let (Some(first), Some(last)) =
            (report.degree_days.first_date, report.degree_days.last_date)
        {
            summary.push_str(&format!("  Range: {} to {}\n", first, last));
        }
        if report.degree_days.duplicate_dates > 0 {
            summary.push_str(&format!(
                "  Duplicate dates: {}\n",
                report.degree_days.duplicate_dates
            ));
        }

        summary.push_str(&format!(
            "\nEnergy readings: {}\n",
            report.energy_report.summary_line()
        ));
        summary.push_str(&format!(
            "{:<10} {:>8} {:>6} {:>6} {:>8} {:>8} {:>12} {:>12} {:>6} {:>10}\n",
            "Inst", "Readings", "Days", "Zero", "Floored", "Outliers", "First", "Last", "Deliv",
            "Tonnes"
        ));
        for (installation, stats) in &report.installation_statistics {
            summary.push_str(&format!(
                "{:<10} {:>8} {:>6} {:>6} {:>8} {:>8} {:>12} {:>12} {:>6} {:>10.2}\n",
                installation.as_str(),
                stats.readings,
                stats.days,
                stats.zero_days,
                stats.floored_days,
                stats.outlier_days,
                display_day(stats.first_day),
                display_day(stats.last_day),
                stats.deliveries,
                stats.delivered_ton
            ));
        }

        summary.push_str(&format!(
            "\nDeliveries: {}\n",
            report.delivery_report.summary_line()
        ));
        if !report.orphan_deliveries.is_empty() {
            summary.push_str("Deliveries without energy data:\n");
            for (installation, count) in &report.orphan_deliveries {
                summary.push_str(&format!("  {}: {}\n", installation, count));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn display_day(day: Option<NaiveDate>) -> String {
    day.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}
