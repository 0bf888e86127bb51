use crate::error::Result;
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::warn;

static EMPTY_CELL: Data = Data::Empty;

pub type Row = Vec<Data>;

/// A spreadsheet export opened for reading.
///
/// Binary workbooks go through calamine; `.csv` exports are read as a single sheet
/// named after the file, with every non-empty field as a text cell. The file handle
/// lives as long as the `Workbook` and is released when it is dropped.
pub enum Workbook {
    Spreadsheet {
        path: PathBuf,
        sheets: Sheets<BufReader<File>>,
    },
    Delimited {
        path: PathBuf,
        sheet_name: String,
        rows: Vec<Row>,
    },
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self> {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            let sheet_name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(Workbook::Delimited {
                path: path.to_path_buf(),
                sheet_name,
                rows: read_delimited(path)?,
            })
        } else {
            Ok(Workbook::Spreadsheet {
                path: path.to_path_buf(),
                sheets: open_workbook_auto(path)?,
            })
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Workbook::Spreadsheet { path, .. } | Workbook::Delimited { path, .. } => path,
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            Workbook::Spreadsheet { sheets, .. } => sheets.sheet_names(),
            Workbook::Delimited { sheet_name, .. } => vec![sheet_name.clone()],
        }
    }

    /// Rows of the named sheet, anchored at A1
    pub fn sheet_rows(&mut self, name: &str) -> Result<Vec<Row>> {
        match self {
            Workbook::Spreadsheet { sheets, .. } => {
                let range = sheets.worksheet_range(name)?;
                Ok(anchor_at_origin(&range))
            }
            Workbook::Delimited { rows, .. } => Ok(rows.clone()),
        }
    }

    /// Rows of the first sheet; an empty workbook yields no rows
    pub fn first_sheet_rows(&mut self) -> Result<Vec<Row>> {
        match self.sheet_names().first() {
            Some(name) => self.sheet_rows(name),
            None => {
                warn!("Workbook {} has no sheets", self.path().display());
                Ok(Vec::new())
            }
        }
    }

    /// Rows of `preferred` if the workbook has such a sheet, else of the first sheet
    pub fn preferred_sheet_rows(&mut self, preferred: &str) -> Result<(Option<String>, Vec<Row>)> {
        let names = self.sheet_names();
        let chosen = names
            .iter()
            .find(|name| name.as_str() == preferred)
            .or_else(|| names.first())
            .cloned();

        match chosen {
            Some(name) => {
                let rows = self.sheet_rows(&name)?;
                Ok((Some(name), rows))
            }
            None => Ok((None, Vec::new())),
        }
    }
}

/// calamine ranges start at the first used cell; pad leading blank rows and columns back in
fn anchor_at_origin(range: &Range<Data>) -> Vec<Row> {
    let Some((top, left)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Row> = vec![Vec::new(); top as usize];
    rows.extend(range.rows().map(|cells| {
        let mut row = vec![Data::Empty; left as usize];
        row.extend_from_slice(cells);
        row
    }));
    rows
}

/// Cell at `index`, or an empty cell when the row is shorter
pub fn cell(row: &[Data], index: usize) -> &Data {
    row.get(index).unwrap_or(&EMPTY_CELL)
}

pub fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| matches!(cell, Data::Empty))
}

fn read_delimited(path: &Path) -> Result<Vec<Row>> {
    let bytes = std::fs::read(path)?;
    let text = decode_text(&bytes);

    // Spanish exports use ';' because ',' is the decimal separator
    let delimiter = if text.lines().next().is_some_and(|line| line.contains(';')) {
        b';'
    } else {
        b','
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Data::Empty
                    } else {
                        Data::String(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(rows)
}

/// UTF-8 (BOM stripped) or, failing that, Windows-1252 as written by older Excel versions
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text.trim_start_matches('\u{feff}')),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text
        }
    }
}
