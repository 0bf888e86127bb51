use crate::error::Result;
use crate::models::{BiomassDelivery, InstallationCode};
use crate::readers::report::{Loaded, ReadReport, SkipReason};
use crate::readers::workbook::{cell, is_blank, Workbook};
use crate::utils::constants::DELIVERIES_SHEET;
use crate::utils::locale::{parse_cell_datetime, parse_cell_spanish_number};
use calamine::Data;
use std::path::Path;
use tracing::debug;

/// Reads the biomass delivery log: columns `installation, date, quantity`.
///
/// The `Descargas` sheet is read when present, otherwise the first sheet.
pub struct DeliveryReader;

impl DeliveryReader {
    pub fn new() -> Self {
        Self
    }

    /// Read all deliveries, in sheet order
    pub fn read_file(&self, path: &Path) -> Result<Loaded<Vec<BiomassDelivery>>> {
        let mut workbook = Workbook::open(path)?;
        let (sheet, rows) = workbook.preferred_sheet_rows(DELIVERIES_SHEET)?;
        drop(workbook);

        let mut deliveries = Vec::new();
        let mut report = ReadReport {
            files_read: 1,
            ..Default::default()
        };

        for (index, row) in rows.iter().enumerate() {
            if index == 0 {
                report.record_skip(SkipReason::Header);
                continue;
            }
            match Self::parse_row(row) {
                Ok(delivery) => {
                    deliveries.push(delivery);
                    report.record_accepted();
                }
                Err(reason) => report.record_skip(reason),
            }
        }

        debug!(
            "Read {} deliveries from sheet {:?} of {}",
            deliveries.len(),
            sheet.unwrap_or_default(),
            path.display()
        );
        Ok(Loaded::new(deliveries, report))
    }

    fn parse_row(row: &[Data]) -> std::result::Result<BiomassDelivery, SkipReason> {
        if is_blank(row) {
            return Err(SkipReason::BlankRow);
        }
        let installation = match cell(row, 0) {
            Data::String(text) if !text.trim().is_empty() => InstallationCode::new(text.trim()),
            _ => return Err(SkipReason::MissingInstallation),
        };
        let timestamp = parse_cell_datetime(cell(row, 1)).ok_or(SkipReason::InvalidTimestamp)?;
        let quantity =
            parse_cell_spanish_number(cell(row, 2)).map_err(|_| SkipReason::InvalidValue)?;

        Ok(BiomassDelivery::new(installation, timestamp, quantity))
    }
}

impl Default for DeliveryReader {
    fn default() -> Self {
        Self::new()
    }
}
