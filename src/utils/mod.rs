pub mod constants;
pub mod filename;
pub mod locale;
pub mod progress;
pub mod stats;

pub use constants::*;
pub use filename::{generate_default_report_filename, spreadsheet_files};
pub use locale::{parse_cell_datetime, parse_spanish_datetime, parse_spanish_number};
pub use progress::ProgressReporter;
