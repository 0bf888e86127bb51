use crate::error::Result;
use crate::models::HeatingDegreeRecord;
use crate::readers::report::{Loaded, ReadReport, SkipReason};
use crate::readers::workbook::{cell, is_blank, Workbook};
use crate::utils::filename::spreadsheet_files;
use crate::utils::locale::{parse_cell_datetime, parse_cell_number};
use calamine::Data;
use std::path::Path;
use tracing::debug;

/// Reads heating-degree-day exports: one sheet per file, columns `date, value`
///
/// The first row of every file is a header, even when blank.
pub struct DegreeDayReader;

impl DegreeDayReader {
    pub fn new() -> Self {
        Self
    }

    /// Read every spreadsheet in `dir` into one flat list, in file order.
    /// Dates repeated across files are kept.
    pub fn read_directory(&self, dir: &Path) -> Result<Loaded<Vec<HeatingDegreeRecord>>> {
        let mut records = Vec::new();
        let mut report = ReadReport::default();

        for path in spreadsheet_files(dir)? {
            self.read_file_into(&path, &mut records, &mut report)?;
        }

        debug!("Heating-degree records: {}", report.summary_line());
        Ok(Loaded::new(records, report))
    }

    fn read_file_into(
        &self,
        path: &Path,
        records: &mut Vec<HeatingDegreeRecord>,
        report: &mut ReadReport,
    ) -> Result<()> {
        let rows = Workbook::open(path)?.first_sheet_rows()?;
        let before = records.len();

        for (index, row) in rows.iter().enumerate() {
            if index == 0 {
                report.record_skip(SkipReason::Header);
                continue;
            }
            match self.parse_row(row) {
                Ok(record) => {
                    records.push(record);
                    report.record_accepted();
                }
                Err(reason) => report.record_skip(reason),
            }
        }

        report.files_read += 1;
        debug!(
            "Read {} heating-degree records from {}",
            records.len() - before,
            path.display()
        );
        Ok(())
    }

    fn parse_row(&self, row: &[Data]) -> std::result::Result<HeatingDegreeRecord, SkipReason> {
        if is_blank(row) {
            return Err(SkipReason::BlankRow);
        }
        let timestamp = parse_cell_datetime(cell(row, 0)).ok_or(SkipReason::InvalidTimestamp)?;
        let value = parse_cell_number(cell(row, 1)).ok_or(SkipReason::InvalidValue)?;

        Ok(HeatingDegreeRecord::new(timestamp.date(), value))
    }
}

impl Default for DegreeDayReader {
    fn default() -> Self {
        Self::new()
    }
}
