use crate::error::{ProcessingError, Result};
use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime};

/// Spanish three-letter month abbreviations, January first
const SPANISH_MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

const TIMEZONE_SUFFIXES: [&str; 3] = ["CEST", "CET", "UTC"];

/// Tried in order once the Spanish pattern does not apply
const FALLBACK_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"];

/// Parse a number written with `.` as thousands separator and `,` as decimal separator
///
/// # Examples
/// ```
/// use biomass_forecast::utils::parse_spanish_number;
///
/// assert_eq!(parse_spanish_number("1.234,5").unwrap(), 1234.5);
/// assert!(parse_spanish_number("n/d").is_err());
/// ```
pub fn parse_spanish_number(text: &str) -> Result<f64> {
    let cleaned = text.trim().replace('.', "").replace(',', ".");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ProcessingError::InvalidNumber(text.to_string()))
}

/// Parse a timestamp as exported by Spanish-locale tools (e.g. `22 ene 2024 00:00:00 CET`).
///
/// Falls back to `YYYY-MM-DD HH:MM:SS`, `DD/MM/YYYY HH:MM:SS` and `YYYY-MM-DD`.
/// Returns `None` when nothing matches; callers skip the row.
pub fn parse_spanish_datetime(text: &str) -> Option<NaiveDateTime> {
    let cleaned = strip_timezone_suffix(text.trim());

    // A string shaped like the Spanish pattern is decided by it alone
    if let Some(parts) = SpanishTimestamp::split(cleaned) {
        return parts.to_datetime();
    }

    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(cleaned, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(cleaned, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Read a timestamp from a spreadsheet cell: native date cells are used directly,
/// text cells go through [`parse_spanish_datetime`].
pub fn parse_cell_datetime(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(value) => value.as_datetime(),
        Data::DateTimeIso(text) => text
            .parse::<NaiveDateTime>()
            .ok()
            .or_else(|| parse_spanish_datetime(text)),
        Data::String(text) => parse_spanish_datetime(text),
        _ => None,
    }
}

/// Read a quantity from a spreadsheet cell, interpreting text cells with the Spanish locale
pub fn parse_cell_spanish_number(cell: &Data) -> Result<f64> {
    match cell {
        Data::Float(value) => Ok(*value),
        Data::Int(value) => Ok(*value as f64),
        Data::String(text) => parse_spanish_number(text),
        other => Err(ProcessingError::InvalidNumber(other.to_string())),
    }
}

/// Read a plain numeric cell (text cells must use `.` as decimal separator)
pub fn parse_cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(value) => Some(*value),
        Data::Int(value) => Some(*value as f64),
        Data::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn strip_timezone_suffix(text: &str) -> &str {
    TIMEZONE_SUFFIXES
        .iter()
        .find_map(|suffix| text.strip_suffix(suffix))
        .map(str::trim_end)
        .unwrap_or(text)
}

/// `<day> <month abbreviation> <year> <HH:MM:SS>` split into its tokens
struct SpanishTimestamp<'a> {
    day: &'a str,
    month: &'a str,
    year: &'a str,
    time: &'a str,
}

impl<'a> SpanishTimestamp<'a> {
    fn split(text: &'a str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let parts = Self {
            day: tokens.next()?,
            month: tokens.next()?,
            year: tokens.next()?,
            time: tokens.next()?,
        };
        if tokens.next().is_some() {
            return None;
        }

        let day_ok = (1..=2).contains(&parts.day.len()) && is_digits(parts.day);
        let month_ok = parts.month.chars().count() == 3
            && parts.month.chars().all(|c| c.is_alphanumeric() || c == '_');
        let year_ok = parts.year.len() == 4 && is_digits(parts.year);
        let time_ok = parts.time.len() == 8
            && parts.time.split(':').count() == 3
            && parts.time.split(':').all(|t| t.len() == 2 && is_digits(t));

        (day_ok && month_ok && year_ok && time_ok).then_some(parts)
    }

    fn to_datetime(&self) -> Option<NaiveDateTime> {
        let month_name = self.month.to_lowercase();
        let month = SPANISH_MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;

        let mut clock = self.time.split(':').map(|t| t.parse::<u32>().ok());
        let (hour, minute, second) = (clock.next()??, clock.next()??, clock.next()??);

        NaiveDate::from_ymd_opt(self.year.parse().ok()?, month, self.day.parse().ok()?)?
            .and_hms_opt(hour, minute, second)
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
