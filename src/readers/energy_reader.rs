use crate::error::Result;
use crate::models::{EnergyReading, EnergySeries, InstallationCode};
use crate::readers::report::{Loaded, ReadReport, SkipReason};
use crate::readers::workbook::{cell, is_blank, Workbook};
use crate::utils::filename::spreadsheet_files;
use crate::utils::locale::{parse_cell_datetime, parse_cell_spanish_number};
use calamine::Data;
use std::path::Path;
use tracing::debug;

/// Reads cumulative energy meter exports, one or more files per installation.
///
/// The installation is taken from the file name (`m<digits>`); files without it are
/// skipped whole. The first row of every file is a header, even when blank.
pub struct EnergyReader;

impl EnergyReader {
    pub fn new() -> Self {
        Self
    }

    /// Read every spreadsheet in `dir`, grouped by installation and sorted by timestamp
    pub fn read_directory(&self, dir: &Path) -> Result<Loaded<EnergySeries>> {
        let mut series = EnergySeries::new();
        let mut report = ReadReport::default();

        for path in spreadsheet_files(dir)? {
            let Some(installation) = InstallationCode::from_filename(&path) else {
                debug!("No installation code in {}, skipping", path.display());
                report.files_skipped += 1;
                continue;
            };
            let readings = self.read_file(&path, &mut report)?;
            if !readings.is_empty() {
                series.entry(installation).or_default().extend(readings);
            }
        }

        // Sort once all files of an installation are in
        for readings in series.values_mut() {
            readings.sort_by_key(|reading| reading.timestamp);
        }

        debug!(
            "Energy readings for {} installations: {}",
            series.len(),
            report.summary_line()
        );
        Ok(Loaded::new(series, report))
    }

    /// Read the readings of one file, in file order
    pub fn read_file(&self, path: &Path, report: &mut ReadReport) -> Result<Vec<EnergyReading>> {
        let rows = Workbook::open(path)?.first_sheet_rows()?;
        let mut readings = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            if index == 0 {
                report.record_skip(SkipReason::Header);
                continue;
            }
            match self.parse_row(row) {
                Ok(reading) => {
                    readings.push(reading);
                    report.record_accepted();
                }
                Err(reason) => report.record_skip(reason),
            }
        }

        report.files_read += 1;
        debug!("Read {} readings from {}", readings.len(), path.display());
        Ok(readings)
    }

    fn parse_row(&self, row: &[Data]) -> std::result::Result<EnergyReading, SkipReason> {
        if is_blank(row) {
            return Err(SkipReason::BlankRow);
        }
        let timestamp = parse_cell_datetime(cell(row, 0)).ok_or(SkipReason::InvalidTimestamp)?;
        let cumulative =
            parse_cell_spanish_number(cell(row, 1)).map_err(|_| SkipReason::InvalidValue)?;

        Ok(EnergyReading::new(timestamp, cumulative))
    }
}

impl Default for EnergyReader {
    fn default() -> Self {
        Self::new()
    }
}
